//! Background chunk generation on a fixed pool of worker threads.
//!
//! The control thread submits coordinates and drains finished chunks once per
//! tick; it never blocks on a worker. A generation that panics is caught at
//! the task boundary and retried once on the same worker before a failed
//! result is reported.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use strata_voxel::{ChunkCoordinate, VoxelRun};

use crate::generator::TerrainGenerator;

/// Attempts per coordinate before a failure is reported.
pub const MAX_ATTEMPTS: u32 = 2;

/// Why a chunk could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Every attempt panicked.
    #[error("generation of chunk {coordinate} panicked after {attempts} attempts: {message}")]
    Panicked {
        /// The chunk that failed.
        coordinate: ChunkCoordinate,
        /// How many times it was tried.
        attempts: u32,
        /// Panic payload of the last attempt.
        message: String,
    },
}

/// A finished generation task.
#[derive(Debug)]
pub struct GeneratedChunk {
    /// The requested chunk.
    pub coordinate: ChunkCoordinate,
    /// The chunk contents, or why there are none.
    pub result: Result<VoxelRun, GenerationError>,
    /// Wall time across all attempts, in microseconds.
    pub generation_time_us: u64,
}

type GenerateFn = dyn Fn(ChunkCoordinate) -> VoxelRun + Send + Sync;

/// Worker pool that turns coordinates into [`VoxelRun`]s.
pub struct GenerationPool {
    task_sender: Option<Sender<ChunkCoordinate>>,
    result_receiver: Receiver<GeneratedChunk>,
    in_flight: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
}

impl GenerationPool {
    /// Spawns a pool running `generator`. A `thread_count` of zero picks a
    /// default from the CPU count.
    pub fn new(generator: Arc<TerrainGenerator>, thread_count: usize) -> Self {
        Self::with_fn(thread_count, move |coord| generator.generate(coord))
    }

    /// Spawns a pool around an arbitrary generation function.
    pub fn with_fn<F>(thread_count: usize, generate: F) -> Self
    where
        F: Fn(ChunkCoordinate) -> VoxelRun + Send + Sync + 'static,
    {
        let thread_count = if thread_count == 0 {
            default_thread_count()
        } else {
            thread_count
        };
        let generate: Arc<GenerateFn> = Arc::new(generate);
        let (task_sender, task_receiver) = unbounded::<ChunkCoordinate>();
        let (result_sender, result_receiver) = unbounded::<GeneratedChunk>();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let workers = (0..thread_count)
            .map(|i| {
                let receiver = task_receiver.clone();
                let sender = result_sender.clone();
                let generate = Arc::clone(&generate);
                std::thread::Builder::new()
                    .name(format!("strata-gen-{i}"))
                    .spawn(move || {
                        while let Ok(coordinate) = receiver.recv() {
                            let done = run_task(generate.as_ref(), coordinate);
                            if sender.send(done).is_err() {
                                break;
                            }
                        }
                    })
                    .expect("failed to spawn generation worker thread")
            })
            .collect();

        tracing::debug!(threads = thread_count, "generation pool started");

        Self {
            task_sender: Some(task_sender),
            result_receiver,
            in_flight,
            workers,
        }
    }

    /// Queues a coordinate. Returns `false` if the pool is shutting down.
    pub fn submit(&self, coordinate: ChunkCoordinate) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(coordinate).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Collects every finished task without blocking.
    pub fn drain_results(&self) -> Vec<GeneratedChunk> {
        let results: Vec<GeneratedChunk> = self.result_receiver.try_iter().collect();
        self.in_flight.fetch_sub(results.len(), Ordering::Relaxed);
        results
    }

    /// Tasks submitted but not yet drained.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for GenerationPool {
    fn drop(&mut self) {
        // Closing the task channel ends every worker loop.
        self.task_sender = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("generation worker exited with a panic");
            }
        }
    }
}

/// Leaves headroom for the control thread and the meshing pool.
pub fn default_thread_count() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

fn run_task(generate: &GenerateFn, coordinate: ChunkCoordinate) -> GeneratedChunk {
    let start = Instant::now();
    let mut last_message = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        match catch_unwind(AssertUnwindSafe(|| generate(coordinate))) {
            Ok(run) => {
                return GeneratedChunk {
                    coordinate,
                    result: Ok(run),
                    generation_time_us: start.elapsed().as_micros() as u64,
                };
            }
            Err(payload) => {
                last_message = panic_message(payload.as_ref());
                tracing::warn!(
                    chunk = %coordinate,
                    attempt,
                    message = %last_message,
                    "chunk generation panicked"
                );
            }
        }
    }

    GeneratedChunk {
        coordinate,
        result: Err(GenerationError::Panicked {
            coordinate,
            attempts: MAX_ATTEMPTS,
            message: last_message,
        }),
        generation_time_us: start.elapsed().as_micros() as u64,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
