//! Run-length-encoded voxel storage for one chunk.
//!
//! A [`VoxelRun`] covers the chunk's flat index space (see
//! [`ChunkDims::index`]) with `(voxel, length)` pairs. The list is kept
//! maximally compressed: every mutation is followed by a merge pass, so no two
//! neighbouring runs ever hold equal voxels.

use crate::coords::ChunkDims;
use crate::voxel::Voxel;

/// `length` consecutive copies of `voxel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// The repeated voxel.
    pub voxel: Voxel,
    /// Number of consecutive cells (always ≥ 1 inside a valid [`VoxelRun`]).
    pub length: u32,
}

impl Run {
    /// Creates a new run.
    pub fn new(voxel: Voxel, length: u32) -> Self {
        Self { voxel, length }
    }
}

/// Errors reported by [`VoxelRun`] access and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoxelRunError {
    /// The addressed range does not fit inside the chunk volume.
    #[error("range starting at {index} with length {length} is outside volume {volume}")]
    OutOfBounds {
        /// First addressed index.
        index: usize,
        /// Number of addressed cells.
        length: usize,
        /// Total chunk volume.
        volume: usize,
    },
    /// A set was requested over zero cells.
    #[error("cannot set an empty range")]
    EmptyRange,
    /// A run has length zero.
    #[error("run {run} has zero length")]
    ZeroLengthRun {
        /// Position of the offending run.
        run: usize,
    },
    /// Two neighbouring runs hold equal voxels.
    #[error("runs {run} and its successor hold the same voxel")]
    AdjacentEqualRuns {
        /// Position of the first of the two runs.
        run: usize,
    },
    /// Run lengths do not add up to the chunk volume.
    #[error("run lengths sum to {actual}, expected {expected}")]
    LengthMismatch {
        /// Chunk volume.
        expected: usize,
        /// Sum of all run lengths.
        actual: usize,
    },
}

/// Compressed voxel contents of a single chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelRun {
    runs: Vec<Run>,
    volume: usize,
}

impl VoxelRun {
    /// Creates a run list holding `volume` copies of `voxel`.
    pub fn filled(voxel: Voxel, volume: usize) -> Self {
        let runs = if volume == 0 {
            Vec::new()
        } else {
            vec![Run::new(voxel, volume as u32)]
        };
        Self { runs, volume }
    }

    /// Creates an all-air run list.
    pub fn air(volume: usize) -> Self {
        Self::filled(Voxel::AIR, volume)
    }

    /// Compresses a flat voxel buffer.
    pub fn from_flat(voxels: &[Voxel]) -> Self {
        let mut runs: Vec<Run> = Vec::new();
        for &voxel in voxels {
            match runs.last_mut() {
                Some(run) if run.voxel == voxel => run.length += 1,
                _ => runs.push(Run::new(voxel, 1)),
            }
        }
        Self {
            runs,
            volume: voxels.len(),
        }
    }

    /// Builds a run list from explicit runs, rejecting anything that breaks
    /// the compression invariants.
    pub fn from_runs(runs: Vec<Run>) -> Result<Self, VoxelRunError> {
        let volume = runs.iter().map(|r| r.length as usize).sum();
        let run = Self { runs, volume };
        run.validate()?;
        Ok(run)
    }

    /// Total number of cells covered.
    pub fn volume(&self) -> usize {
        self.volume
    }

    /// Number of runs in the list.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// The runs in index order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Returns the voxel if the whole chunk holds a single value.
    pub fn uniform(&self) -> Option<Voxel> {
        match self.runs.as_slice() {
            [only] => Some(only.voxel),
            _ => None,
        }
    }

    /// Returns `true` if every cell is air.
    pub fn is_all_air(&self) -> bool {
        self.uniform().is_some_and(|v| v.is_air()) || self.volume == 0
    }

    /// Returns the voxel at `index`.
    ///
    /// Scans from the head, so the cost grows with the number of runs before
    /// `index`.
    pub fn get(&self, index: usize) -> Result<Voxel, VoxelRunError> {
        self.locate(index)
            .map(|(run, _)| self.runs[run].voxel)
            .ok_or(VoxelRunError::OutOfBounds {
                index,
                length: 1,
                volume: self.volume,
            })
    }

    /// Sets a single cell. See [`set_range`](Self::set_range).
    pub fn set(&mut self, index: usize, voxel: Voxel) -> Result<bool, VoxelRunError> {
        self.set_range(index, voxel, 1)
    }

    /// Sets `length` cells starting at `index` to `voxel`.
    ///
    /// The covered runs are replaced by at most three runs: the untouched
    /// head of the first run, the new value, and the untouched tail of the
    /// last run. A merge pass then joins anything that became adjacent and
    /// equal.
    ///
    /// Returns `Ok(false)` without touching the list when the range already
    /// lies inside a single run of `voxel`.
    pub fn set_range(
        &mut self,
        index: usize,
        voxel: Voxel,
        length: usize,
    ) -> Result<bool, VoxelRunError> {
        if length == 0 {
            return Err(VoxelRunError::EmptyRange);
        }
        let out_of_bounds = VoxelRunError::OutOfBounds {
            index,
            length,
            volume: self.volume,
        };
        let end = index
            .checked_add(length)
            .filter(|&end| end <= self.volume)
            .ok_or_else(|| out_of_bounds.clone())?;

        let (first, first_start) = self.locate(index).ok_or_else(|| out_of_bounds.clone())?;
        let (last, last_start) = self.locate(end - 1).ok_or(out_of_bounds)?;

        if first == last && self.runs[first].voxel == voxel {
            return Ok(false);
        }

        let head = index - first_start;
        let tail = last_start + self.runs[last].length as usize - end;

        let mut replacement = Vec::with_capacity(3);
        if head > 0 {
            replacement.push(Run::new(self.runs[first].voxel, head as u32));
        }
        replacement.push(Run::new(voxel, length as u32));
        if tail > 0 {
            replacement.push(Run::new(self.runs[last].voxel, tail as u32));
        }

        self.runs.splice(first..=last, replacement);
        self.merge_adjacent();
        debug_assert_eq!(self.validate(), Ok(()));
        Ok(true)
    }

    /// Overwrites every cell with `voxel`.
    pub fn fill(&mut self, voxel: Voxel) {
        *self = Self::filled(voxel, self.volume);
    }

    /// Coalesces consecutive equal runs in one pass. Returns how many runs
    /// were absorbed into their predecessor.
    pub fn merge_adjacent(&mut self) -> usize {
        let before = self.runs.len();
        self.runs.dedup_by(|next, prev| {
            if next.voxel == prev.voxel {
                prev.length += next.length;
                true
            } else {
                false
            }
        });
        before - self.runs.len()
    }

    /// Expands the run list into a dense buffer indexed like [`ChunkDims::index`].
    pub fn to_flat(&self) -> Vec<Voxel> {
        let mut out = Vec::with_capacity(self.volume);
        for run in &self.runs {
            out.extend(std::iter::repeat_n(run.voxel, run.length as usize));
        }
        out
    }

    /// Checks the three run-list invariants.
    pub fn validate(&self) -> Result<(), VoxelRunError> {
        let mut total = 0usize;
        for (i, run) in self.runs.iter().enumerate() {
            if run.length == 0 {
                return Err(VoxelRunError::ZeroLengthRun { run: i });
            }
            if self.runs.get(i + 1).is_some_and(|next| next.voxel == run.voxel) {
                return Err(VoxelRunError::AdjacentEqualRuns { run: i });
            }
            total += run.length as usize;
        }
        if total != self.volume {
            return Err(VoxelRunError::LengthMismatch {
                expected: self.volume,
                actual: total,
            });
        }
        Ok(())
    }

    /// Finds the run containing `index` and the flat index where that run starts.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut start = 0usize;
        for (i, run) in self.runs.iter().enumerate() {
            let end = start + run.length as usize;
            if index < end {
                return Some((i, start));
            }
            start = end;
        }
        None
    }
}

/// Expands an optional run list into a dense buffer of `dims.volume()` voxels.
///
/// A missing run list is an all-air chunk.
pub fn to_flat_buffer(run: Option<&VoxelRun>, dims: ChunkDims) -> Vec<Voxel> {
    match run {
        Some(run) => {
            debug_assert_eq!(run.volume(), dims.volume());
            run.to_flat()
        }
        None => vec![Voxel::AIR; dims.volume()],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
