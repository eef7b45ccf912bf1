//! Background meshing: snapshot-based tasks on a worker pool, results
//! delivered over a channel and tagged with the ticket they were issued under.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use strata_voxel::ChunkCoordinate;

use crate::geometry::ChunkGeometry;
use crate::greedy::greedy_mesh;
use crate::neighborhood::ChunkNeighborhood;

/// A self-contained meshing job.
pub struct MeshingTask {
    /// Chunk the geometry is for.
    pub coordinate: ChunkCoordinate,
    /// Ticket issued for this request; see [`crate::MeshTickets`].
    pub ticket: u64,
    /// Owned snapshot of the chunk and its neighbors' boundary layers.
    pub neighborhood: ChunkNeighborhood,
}

/// A finished meshing job.
pub struct MeshingResult {
    /// Chunk the geometry is for.
    pub coordinate: ChunkCoordinate,
    /// Ticket of the originating task.
    pub ticket: u64,
    /// The generated geometry.
    pub geometry: ChunkGeometry,
    /// Wall time spent meshing, in microseconds.
    pub mesh_time_us: u64,
}

/// Worker pool that turns [`MeshingTask`]s into [`MeshingResult`]s.
///
/// The control thread submits tasks and collects results once per tick via
/// [`drain_results`](Self::drain_results); it never waits on a worker.
pub struct MeshingPipeline {
    task_sender: Option<Sender<MeshingTask>>,
    result_receiver: Receiver<MeshingResult>,
    worker_handles: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl MeshingPipeline {
    /// Spawns `worker_count` threads (zero picks a default from the CPU
    /// count). `resolution` scales every vertex into world units.
    pub fn new(worker_count: usize, resolution: f32) -> Self {
        let worker_count = if worker_count == 0 {
            default_worker_count()
        } else {
            worker_count
        };
        let (task_tx, task_rx) = unbounded::<MeshingTask>();
        let (result_tx, result_rx) = unbounded::<MeshingResult>();

        let handles = (0..worker_count)
            .map(|i| {
                let rx = task_rx.clone();
                let tx = result_tx.clone();
                std::thread::Builder::new()
                    .name(format!("strata-mesh-{i}"))
                    .spawn(move || {
                        while let Ok(task) = rx.recv() {
                            let start = Instant::now();
                            let geometry = greedy_mesh(&task.neighborhood, resolution);
                            let result = MeshingResult {
                                coordinate: task.coordinate,
                                ticket: task.ticket,
                                geometry,
                                mesh_time_us: start.elapsed().as_micros() as u64,
                            };
                            if tx.send(result).is_err() {
                                break;
                            }
                        }
                    })
                    .expect("failed to spawn meshing worker thread")
            })
            .collect();

        tracing::debug!(threads = worker_count, "meshing pipeline started");

        Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: handles,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queues a task. Returns `false` once the pipeline is shut down.
    pub fn submit(&self, task: MeshingTask) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(task).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Collects every finished result without blocking.
    pub fn drain_results(&self) -> Vec<MeshingResult> {
        let results: Vec<MeshingResult> = self.result_receiver.try_iter().collect();
        self.in_flight.fetch_sub(results.len(), Ordering::Relaxed);
        results
    }

    /// Tasks submitted but not yet drained.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Closes the task channel and joins every worker.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("meshing worker exited with a panic");
            }
        }
    }
}

impl Drop for MeshingPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Half the cores, at least one.
pub fn default_worker_count() -> usize {
    (num_cpus::get() / 2).max(1)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_voxel::{ChunkDims, Voxel, VoxelType};

    use super::*;

    const DIMS: ChunkDims = ChunkDims::new(8, 8);

    fn task(x: i32, ticket: u64, fill: Voxel) -> MeshingTask {
        MeshingTask {
            coordinate: ChunkCoordinate::new(x, 0, 0),
            ticket,
            neighborhood: ChunkNeighborhood::isolated(DIMS, vec![fill; DIMS.volume()]),
        }
    }

    fn collect(pipeline: &MeshingPipeline, expected: usize) -> Vec<MeshingResult> {
        let mut results = Vec::new();
        let start = Instant::now();
        while results.len() < expected {
            results.extend(pipeline.drain_results());
            assert!(start.elapsed().as_secs() < 10, "timed out waiting for meshes");
            std::thread::sleep(Duration::from_millis(1));
        }
        results
    }

    #[test]
    fn test_task_produces_geometry_with_ticket() {
        let pipeline = MeshingPipeline::new(2, 1.0);
        assert!(pipeline.submit(task(0, 7, Voxel::new(VoxelType::Stone))));

        let results = collect(&pipeline, 1);
        assert_eq!(results[0].coordinate, ChunkCoordinate::new(0, 0, 0));
        assert_eq!(results[0].ticket, 7);
        assert_eq!(results[0].geometry.quad_count(), 6);
        assert_eq!(pipeline.in_flight_count(), 0);
    }

    #[test]
    fn test_concurrent_tasks_do_not_interfere() {
        let pipeline = MeshingPipeline::new(4, 1.0);
        for x in 0..8 {
            let fill = if x % 2 == 0 {
                Voxel::new(VoxelType::Stone)
            } else {
                Voxel::AIR
            };
            assert!(pipeline.submit(task(x, x as u64, fill)));
        }

        let results = collect(&pipeline, 8);
        let mut xs: Vec<i32> = results.iter().map(|r| r.coordinate.x).collect();
        xs.sort();
        assert_eq!(xs, (0..8).collect::<Vec<_>>());
        for r in &results {
            assert_eq!(r.ticket, r.coordinate.x as u64);
            assert_eq!(r.geometry.is_empty(), r.coordinate.x % 2 == 1);
        }
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let mut pipeline = MeshingPipeline::new(1, 1.0);
        pipeline.shutdown();
        assert!(!pipeline.submit(task(0, 1, Voxel::AIR)));
        assert_eq!(pipeline.worker_count(), 0);
    }
}
