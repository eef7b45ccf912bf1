//! Greedy meshing: merges coplanar exposed faces of equal type into maximal
//! rectangles.
//!
//! For each axis `d` the chunk is swept boundary by boundary. A boundary `s`
//! separates layer `s - 1` (side `a`) from layer `s` (side `b`); boundaries
//! `0` and `n` lie on the chunk faces and read the far side from the
//! neighborhood. Each boundary produces a signed mask over the `(u, v)` plane:
//!
//! - `+t` where `a` holds type `t` and `b` is air (face points towards `+d`);
//! - `-t` where `a` is air and `b` holds type `t` (face points towards `-d`);
//! - `0` otherwise, or when the face would need data from a missing neighbor.
//!
//! The two outer boundaries follow the same rule with the neighbor's touching
//! layer standing in for the missing side, so a face between two loaded
//! chunks is emitted by whichever of them is not all air.

use strata_voxel::{Voxel, VoxelType};

use crate::face_direction::FaceDirection;
use crate::geometry::{ChunkGeometry, QuadInfo};
use crate::neighborhood::ChunkNeighborhood;

/// Meshes a chunk. Vertices are scaled by `1 / resolution` into world units.
///
/// An all-air center returns an empty buffer without sweeping.
pub fn greedy_mesh(neighborhood: &ChunkNeighborhood, resolution: f32) -> ChunkGeometry {
    let mut geometry = ChunkGeometry::new();
    if neighborhood.center().iter().all(Voxel::is_air) {
        return geometry;
    }

    let dims = neighborhood.dims();
    let scale = 1.0 / resolution;
    let mut mask: Vec<i16> = Vec::new();

    for d in 0..3 {
        let u_axis = (d + 1) % 3;
        let v_axis = (d + 2) % 3;
        let n = dims.extent(d);
        let u_len = dims.extent(u_axis);
        let v_len = dims.extent(v_axis);
        mask.clear();
        mask.resize(u_len * v_len, 0);

        let neg = FaceDirection::from_axis(d, false);
        let pos = FaceDirection::from_axis(d, true);

        for s in 0..=n {
            // Build the mask for boundary `s`.
            let mut pos3 = [0usize; 3];
            for v in 0..v_len {
                pos3[v_axis] = v;
                for u in 0..u_len {
                    pos3[u_axis] = u;
                    let cell = if s == 0 {
                        pos3[d] = 0;
                        let b = neighborhood.get_center(pos3[0], pos3[1], pos3[2]);
                        neighborhood
                            .beyond(neg, u, v)
                            .map_or(0, |a| mask_value(a, b))
                    } else if s == n {
                        pos3[d] = n - 1;
                        let a = neighborhood.get_center(pos3[0], pos3[1], pos3[2]);
                        neighborhood
                            .beyond(pos, u, v)
                            .map_or(0, |b| mask_value(a, b))
                    } else {
                        pos3[d] = s - 1;
                        let a = neighborhood.get_center(pos3[0], pos3[1], pos3[2]);
                        pos3[d] = s;
                        let b = neighborhood.get_center(pos3[0], pos3[1], pos3[2]);
                        mask_value(a, b)
                    };
                    mask[v * u_len + u] = cell;
                }
            }

            // Merge the mask into rectangles.
            for v in 0..v_len {
                let mut u = 0;
                while u < u_len {
                    let c = mask[v * u_len + u];
                    if c == 0 {
                        u += 1;
                        continue;
                    }

                    let mut w = 1;
                    while u + w < u_len && mask[v * u_len + u + w] == c {
                        w += 1;
                    }

                    let mut h = 1;
                    while v + h < v_len {
                        let row = (v + h) * u_len;
                        if mask[row + u..row + u + w].iter().any(|&m| m != c) {
                            break;
                        }
                        h += 1;
                    }

                    for dv in 0..h {
                        let row = (v + dv) * u_len;
                        mask[row + u..row + u + w].fill(0);
                    }

                    emit_quad(
                        &mut geometry,
                        Quad {
                            axis: d,
                            layer: s,
                            u,
                            v,
                            width: w,
                            height: h,
                            signed_type: c,
                        },
                        scale,
                    );
                    u += w;
                }
            }
        }
    }

    geometry
}

/// Signed mask entry for the boundary between `a` (lower side) and `b`.
fn mask_value(a: Voxel, b: Voxel) -> i16 {
    match (a.is_air(), b.is_air()) {
        (false, true) => type_id(a),
        (true, false) => -type_id(b),
        _ => 0,
    }
}

fn type_id(voxel: Voxel) -> i16 {
    voxel.voxel_type as i16
}

/// One merged rectangle on boundary `layer` of `axis`.
struct Quad {
    axis: usize,
    layer: usize,
    u: usize,
    v: usize,
    width: usize,
    height: usize,
    signed_type: i16,
}

fn emit_quad(geometry: &mut ChunkGeometry, quad: Quad, scale: f32) {
    let d = quad.axis;
    let u_axis = (d + 1) % 3;
    let v_axis = (d + 2) % 3;

    let mut p = [0.0f32; 3];
    p[d] = quad.layer as f32;
    p[u_axis] = quad.u as f32;
    p[v_axis] = quad.v as f32;

    let mut du = [0.0f32; 3];
    du[u_axis] = quad.width as f32;
    let mut dv = [0.0f32; 3];
    dv[v_axis] = quad.height as f32;

    let add = |a: [f32; 3], b: [f32; 3]| [a[0] + b[0], a[1] + b[1], a[2] + b[2]];
    let p0 = p;
    let p1 = add(p, du);
    let p2 = add(add(p, du), dv);
    let p3 = add(p, dv);

    let positive = quad.signed_type > 0;
    let mut corners = if positive {
        [p0, p1, p2, p3]
    } else {
        [p0, p3, p2, p1]
    };
    for corner in &mut corners {
        for c in corner.iter_mut() {
            *c *= scale;
        }
    }

    let voxel_type =
        VoxelType::from_id(quad.signed_type.unsigned_abs() as u8).unwrap_or_default();
    geometry.push_quad(
        corners,
        QuadInfo {
            direction: FaceDirection::from_axis(d, positive),
            voxel_type,
            width: quad.width as u32,
            height: quad.height as u32,
        },
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
