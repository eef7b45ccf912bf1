//! Voxel edits and point queries against loaded chunks.
//!
//! Positions are world-space. Anything that lands in an unloaded chunk is a
//! no-op. Every chunk whose data changes is remeshed synchronously, along with
//! any loaded neighbor whose boundary faces depend on the edited cells.

use glam::{IVec3, Vec3};
use rustc_hash::FxHashSet;
use strata_mesh::MeshInvalidator;
use strata_voxel::{
    ChunkCoordinate, Voxel, VoxelBatchEditEvent, VoxelEditEvent, VoxelRunError, VoxelType,
};

use crate::store::ChunkStore;

impl ChunkStore {
    /// Writes `voxel` at `position`. Returns `true` if the data changed.
    pub fn apply_edit(&mut self, position: Vec3, voxel: Voxel) -> bool {
        let (coordinate, local) = self.params.voxel_to_chunk(self.params.world_to_voxel(position));
        let dims = self.dims;
        let Some(chunk) = self.loaded.get_mut(&coordinate) else {
            tracing::debug!(chunk = %coordinate, "edit in unloaded chunk ignored");
            return false;
        };

        let index = dims.index(local.0, local.1, local.2);
        let old = match chunk.run().get(index) {
            Ok(old) => old,
            Err(err) => {
                report_run_error(coordinate, &err);
                return false;
            }
        };
        match chunk.run_mut().set(index, voxel) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                report_run_error(coordinate, &err);
                return false;
            }
        }
        chunk.mark_modified();

        self.events.send(VoxelEditEvent {
            chunk: coordinate,
            local: (local.0 as u16, local.1 as u16, local.2 as u16),
            old_type: old.voxel_type,
            new_type: voxel.voxel_type,
        });
        tracing::debug!(
            chunk = %coordinate,
            ?local,
            from = %old.voxel_type,
            to = %voxel.voxel_type,
            "voxel edited"
        );

        for dirty in MeshInvalidator::invalidate(coordinate, local, dims) {
            self.remesh_now(dirty);
        }
        true
    }

    /// Fills the inclusive world-space box `min..=max` with `voxel`.
    ///
    /// Corners are normalized per axis first, so swapped components still
    /// describe the same box. Each chunk is written one contiguous z-row at a
    /// time. Returns the number of chunks whose data changed.
    pub fn apply_range_edit(&mut self, min: Vec3, max: Vec3, voxel: Voxel) -> usize {
        let lo = self.params.world_to_voxel(min.min(max));
        let hi = self.params.world_to_voxel(min.max(max));
        let (first_chunk, _) = self.params.voxel_to_chunk(lo);
        let (last_chunk, _) = self.params.voxel_to_chunk(hi);
        let dims = self.dims;
        let extent = IVec3::new(dims.size as i32, dims.height as i32, dims.size as i32);

        let mut dirty = FxHashSet::default();
        let mut modified = 0;
        for cx in first_chunk.x..=last_chunk.x {
            for cy in first_chunk.y..=last_chunk.y {
                for cz in first_chunk.z..=last_chunk.z {
                    let coordinate = ChunkCoordinate::new(cx, cy, cz);
                    let origin = self.params.chunk_origin_voxel(coordinate);
                    let Some(chunk) = self.loaded.get_mut(&coordinate) else {
                        continue;
                    };
                    let local_lo = (lo - origin).max(IVec3::ZERO).as_uvec3();
                    let local_hi = (hi - origin).min(extent - 1).as_uvec3();
                    let row_len = (local_hi.z - local_lo.z + 1) as usize;

                    let mut changed = false;
                    for x in local_lo.x..=local_hi.x {
                        for y in local_lo.y..=local_hi.y {
                            let start = dims.index(x as usize, y as usize, local_lo.z as usize);
                            match chunk.run_mut().set_range(start, voxel, row_len) {
                                Ok(c) => changed |= c,
                                Err(err) => report_run_error(coordinate, &err),
                            }
                        }
                    }
                    if !changed {
                        continue;
                    }

                    chunk.mark_modified();
                    modified += 1;
                    let cells = (local_hi - local_lo + 1).element_product();
                    self.events.send_batch(VoxelBatchEditEvent {
                        chunk: coordinate,
                        new_type: voxel.voxel_type,
                        cells,
                    });
                    let as_local = |v: glam::UVec3| (v.x as usize, v.y as usize, v.z as usize);
                    MeshInvalidator::invalidate_box(
                        coordinate,
                        as_local(local_lo),
                        as_local(local_hi),
                        dims,
                        &mut dirty,
                    );
                }
            }
        }

        if modified > 0 {
            tracing::debug!(
                chunks = modified,
                remeshed = dirty.len(),
                to = %voxel.voxel_type,
                "range edited"
            );
        }
        let mut dirty: Vec<ChunkCoordinate> = dirty.into_iter().collect();
        dirty.sort();
        for coordinate in dirty {
            self.remesh_now(coordinate);
        }
        modified
    }

    /// Replaces the voxel at `position` with air.
    pub fn try_break(&mut self, position: Vec3) -> bool {
        self.apply_edit(position, Voxel::AIR)
    }

    /// Puts a `voxel_type` voxel at `position`.
    pub fn try_place(&mut self, position: Vec3, voxel_type: VoxelType) -> bool {
        self.apply_edit(position, Voxel::new(voxel_type))
    }

    /// Fills the box spanned by two corners with `voxel_type`. The corners
    /// may be given in any order; see
    /// [`apply_range_edit`](Self::apply_range_edit).
    pub fn try_two_point_replace(
        &mut self,
        corner1: Vec3,
        corner2: Vec3,
        voxel_type: VoxelType,
    ) -> usize {
        self.apply_range_edit(corner1, corner2, Voxel::new(voxel_type))
    }

    /// The voxel at `position`, or `None` if its chunk is not loaded.
    pub fn voxel_at(&self, position: Vec3) -> Option<Voxel> {
        let (coordinate, (x, y, z)) =
            self.params.voxel_to_chunk(self.params.world_to_voxel(position));
        let chunk = self.loaded.get(&coordinate)?;
        chunk.run().get(self.dims.index(x, y, z)).ok()
    }

    /// World-space height of the top face of the highest solid voxel in the
    /// column at `(x, z)`, searching loaded chunks from the top of the world
    /// down. Zero if there is none.
    pub fn height_at_column(&self, x: f32, z: f32) -> f32 {
        let column = self.params.world_to_voxel(Vec3::new(x, 0.0, z));
        let (base, (lx, _, lz)) = self.params.voxel_to_chunk(column);

        for cy in (0..self.params.world_height_chunks).rev() {
            let coordinate = ChunkCoordinate::new(base.x, cy, base.z);
            let Some(chunk) = self.loaded.get(&coordinate) else {
                continue;
            };
            if chunk.run().is_all_air() {
                continue;
            }
            for ly in (0..self.dims.height).rev() {
                let solid = chunk
                    .run()
                    .get(self.dims.index(lx, ly, lz))
                    .is_ok_and(|v| v.is_solid());
                if solid {
                    let top = self.params.chunk_origin_voxel(coordinate).y + ly as i32 + 1;
                    return top as f32 / self.params.resolution;
                }
            }
        }
        0.0
    }
}

fn report_run_error(coordinate: ChunkCoordinate, err: &VoxelRunError) {
    tracing::error!(chunk = %coordinate, error = %err, "voxel run access out of range");
    debug_assert!(false, "voxel run access failed in {coordinate}: {err}");
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use strata_mesh::{FaceDirection, MeshingPipeline};
    use strata_terrain::GenerationPool;
    use strata_voxel::{VoxelRun, WorldParameters};

    use super::*;
    use crate::observer::ObserverId;

    fn params() -> WorldParameters {
        WorldParameters {
            chunk_size: 4,
            chunk_height: 4,
            world_height_chunks: 2,
            ..Default::default()
        }
    }

    /// Bottom chunk layer is stone up to local y = 1, top layer is air.
    fn loaded_store() -> ChunkStore {
        let params = params();
        let dims = params.dims();
        let generation = GenerationPool::with_fn(2, move |c| {
            let mut run = VoxelRun::air(dims.volume());
            if c.y == 0 {
                for x in 0..dims.size {
                    for y in 0..2 {
                        let start = dims.index(x, y, 0);
                        run.set_range(start, Voxel::new(VoxelType::Stone), dims.size)
                            .unwrap();
                    }
                }
            }
            run
        });
        let mut store = ChunkStore::new(params, generation, MeshingPipeline::new(1, 1.0));
        store.update_observer_position(ObserverId(0), ChunkCoordinate::new(0, 0, 0), 2.0, 4.0);
        let start = Instant::now();
        while !store.is_idle() {
            assert!(start.elapsed() < Duration::from_secs(10), "store never settled");
            store.tick();
            std::thread::sleep(Duration::from_millis(1));
        }
        store
    }

    #[test]
    fn test_place_and_break() {
        let mut store = loaded_store();
        let pos = Vec3::new(1.5, 2.5, 1.5);
        assert_eq!(store.voxel_at(pos), Some(Voxel::AIR));
        assert!(store.try_place(pos, VoxelType::Wood));
        assert_eq!(store.voxel_at(pos), Some(Voxel::new(VoxelType::Wood)));
        assert!(!store.try_place(pos, VoxelType::Wood));
        assert_eq!(store.events().len(), 1);

        let chunk = store.chunk(ChunkCoordinate::new(0, 0, 0)).unwrap();
        assert_eq!(chunk.version(), 1);
        assert!(chunk.run().validate().is_ok());

        assert!(store.try_break(pos));
        assert_eq!(store.voxel_at(pos), Some(Voxel::AIR));
    }

    #[test]
    fn test_edit_in_unloaded_chunk_is_noop() {
        let mut store = loaded_store();
        let far = Vec3::new(100.0, 1.0, 100.0);
        assert_eq!(store.voxel_at(far), None);
        assert!(!store.try_place(far, VoxelType::Stone));
        assert_eq!(store.try_two_point_replace(far, far + 2.0, VoxelType::Stone), 0);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_edit_remeshes_synchronously() {
        let mut store = loaded_store();
        let origin = ChunkCoordinate::new(0, 0, 0);
        let before = store.chunk(origin).unwrap().geometry().unwrap().quad_count();
        assert!(store.try_place(Vec3::new(1.5, 2.5, 1.5), VoxelType::Glass));
        let after = store.chunk(origin).unwrap().geometry().unwrap();
        assert!(after.quad_count() > before);
        assert!(after.quads.iter().any(|q| q.voxel_type == VoxelType::Glass));
    }

    #[test]
    fn test_boundary_edit_remeshes_neighbor() {
        let mut store = loaded_store();
        let neighbor = ChunkCoordinate::new(-1, 0, 0);
        let before = store
            .chunk(neighbor)
            .unwrap()
            .geometry()
            .unwrap()
            .count_quads_for_direction(FaceDirection::PosX);
        // Carve the stone cell at x = 0 in chunk (0, 0, 0): the neighbor's
        // stone at x = 3 now faces air.
        assert!(store.try_break(Vec3::new(0.5, 0.5, 0.5)));
        let after = store
            .chunk(neighbor)
            .unwrap()
            .geometry()
            .unwrap()
            .count_quads_for_direction(FaceDirection::PosX);
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_range_edit_across_chunks() {
        let mut store = loaded_store();
        let modified = store.try_two_point_replace(
            Vec3::new(-2.0, 2.0, 1.0),
            Vec3::new(1.0, 3.0, 1.0),
            VoxelType::Sand,
        );
        assert_eq!(modified, 2);
        assert_eq!(store.events().batch_len(), 2);
        for x in -2..=1 {
            for y in 2..=3 {
                let pos = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 1.5);
                assert_eq!(store.voxel_at(pos), Some(Voxel::new(VoxelType::Sand)));
            }
        }
        assert_eq!(store.voxel_at(Vec3::new(1.5, 2.5, 2.5)), Some(Voxel::AIR));
        for c in [ChunkCoordinate::new(-1, 0, 0), ChunkCoordinate::new(0, 0, 0)] {
            let chunk = store.chunk(c).unwrap();
            assert!(chunk.run().validate().is_ok());
            assert_eq!(chunk.version(), 1);
        }
        // Same fill again changes nothing.
        assert_eq!(
            store.try_two_point_replace(
                Vec3::new(-2.0, 2.0, 1.0),
                Vec3::new(1.0, 3.0, 1.0),
                VoxelType::Sand,
            ),
            0
        );
    }

    #[test]
    fn test_range_edit_accepts_swapped_corners() {
        let mut store = loaded_store();
        // Max corner first, with one axis swapped back.
        let modified = store.try_two_point_replace(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 3.0, 2.0),
            VoxelType::Dirt,
        );
        assert_eq!(modified, 1);
        for x in 0..=1 {
            for y in 2..=3 {
                for z in 2..=3 {
                    let pos = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
                    assert_eq!(store.voxel_at(pos), Some(Voxel::new(VoxelType::Dirt)));
                }
            }
        }
        assert_eq!(store.voxel_at(Vec3::new(2.5, 2.5, 2.5)), Some(Voxel::AIR));
    }

    #[test]
    fn test_height_at_column() {
        let mut store = loaded_store();
        assert_eq!(store.height_at_column(1.5, 1.5), 2.0);
        assert!(store.try_place(Vec3::new(1.5, 5.5, 1.5), VoxelType::Stone));
        assert_eq!(store.height_at_column(1.5, 1.5), 6.0);
        // Water does not count as solid.
        assert!(store.try_break(Vec3::new(1.5, 5.5, 1.5)));
        assert!(store.try_place(Vec3::new(1.5, 3.5, 1.5), VoxelType::WaterSource));
        assert_eq!(store.height_at_column(1.5, 1.5), 2.0);
        assert_eq!(store.height_at_column(500.0, 500.0), 0.0);
    }
}
