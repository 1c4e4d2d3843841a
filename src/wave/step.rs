//! CPU simulation step: damped spring-lattice wave equation.

use glam::Vec2;
use rayon::prelude::*;

use super::field::{texel_uv, Texel, WaveField};
use crate::params::{SimulationParameters, HEIGHT_LIMIT};
use crate::pointer::PointerState;

/// Hermite smoothstep, same definition as WGSL/GLSL
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Brush weight at `distance` from the pointer: 1 at the center, 0 at `radius`
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    1.0 - smoothstep(0.0, radius, distance)
}

/// Advance one texel from the previous grid.
#[inline]
pub fn step_texel(
    previous: &WaveField,
    col: u32,
    row: u32,
    pointer: &PointerState,
    params: &SimulationParameters,
) -> Texel {
    let Texel { height, velocity } = previous.get(col, row);
    let (c, r) = (col as i64, row as i64);

    let north = previous.height_clamped(c, r - 1);
    let south = previous.height_clamped(c, r + 1);
    let east = previous.height_clamped(c + 1, r);
    let west = previous.height_clamped(c - 1, r);

    let laplacian = north + south + east + west - 4.0 * height;
    let force = params.stiffness * laplacian - params.damping * velocity;
    let new_velocity = velocity + force;
    let mut new_height = height + new_velocity;

    if pointer.active {
        let (u, v) = texel_uv(col, row, previous.width(), previous.height());
        let distance = Vec2::new(u, v).distance(pointer.position);
        if distance < params.disturbance_radius {
            new_height -= falloff(distance, params.disturbance_radius) * params.disturbance_strength;
        }
    }

    Texel {
        height: new_height.clamp(-HEIGHT_LIMIT, HEIGHT_LIMIT),
        velocity: new_velocity,
    }
}

/// Write one full step of `previous` into `next`.
///
/// Every output texel depends only on `previous`, so rows are processed in
/// parallel.
pub fn simulate(
    previous: &WaveField,
    next: &mut WaveField,
    pointer: &PointerState,
    params: &SimulationParameters,
) {
    debug_assert_eq!(previous.width(), next.width());
    debug_assert_eq!(previous.height(), next.height());

    let width = previous.width() as usize;
    next.texels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            for (col, texel) in out.iter_mut().enumerate() {
                *texel = step_texel(previous, col as u32, row as u32, pointer, params);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave::WaveBuffers;
    use approx::assert_abs_diff_eq;

    fn small_params(size: u32) -> SimulationParameters {
        SimulationParameters {
            resolution: (size, size),
            ..Default::default()
        }
    }

    fn run(buffers: &mut WaveBuffers, pointer: &PointerState, params: &SimulationParameters) {
        let (read, write) = buffers.read_write();
        simulate(read, write, pointer, params);
        buffers.swap();
    }

    #[test]
    fn test_smoothstep_and_falloff() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(falloff(0.0, 0.025), 1.0);
        assert_eq!(falloff(0.025, 0.025), 0.0);
    }

    #[test]
    fn test_zero_field_is_fixed_point() {
        let params = small_params(32);
        let mut buffers = WaveBuffers::new(32, 32);
        let idle = PointerState::default();

        for _ in 0..10_000 {
            run(&mut buffers, &idle, &params);
        }
        assert!(buffers.current().texels().iter().all(|t| t.height == 0.0));
    }

    #[test]
    fn test_impulse_dissipates() {
        let params = small_params(64);
        let mut buffers = WaveBuffers::new(64, 64);
        buffers.current_mut().set(32, 32, Texel { height: 1.0, velocity: 0.0 });
        let idle = PointerState::default();

        for _ in 0..2_000 {
            run(&mut buffers, &idle, &params);
        }
        // Mass is conserved under clamp-to-edge, so the field settles near
        // 1 / texel_count rather than exactly zero.
        assert!(buffers.current().max_abs_height() < 1e-3);
    }

    #[test]
    fn test_clamp_holds_under_huge_disturbance() {
        let params = SimulationParameters {
            disturbance_strength: 1_000.0,
            disturbance_radius: 0.2,
            ..small_params(32)
        };
        let mut buffers = WaveBuffers::new(32, 32);
        let pointer = PointerState::at(Vec2::new(0.5, 0.5));

        for step in 0..200 {
            let active = if step % 20 < 10 { pointer } else { PointerState::default() };
            run(&mut buffers, &active, &params);
            for texel in buffers.current().texels() {
                assert!((-HEIGHT_LIMIT..=HEIGHT_LIMIT).contains(&texel.height));
            }
        }
    }

    #[test]
    fn test_disturbance_scenario() {
        let params = SimulationParameters {
            disturbance_radius: 0.025,
            disturbance_strength: 0.5,
            ..small_params(512)
        };
        let mut buffers = WaveBuffers::new(512, 512);
        run(&mut buffers, &PointerState::at(Vec2::new(0.5, 0.5)), &params);

        let field = buffers.current();
        let (col, row) = field.nearest_texel(0.5, 0.5);
        let center = field.get(col, row).height;
        // Nearest texel center is ~0.0014 away, so falloff is ~0.99
        assert!(center < -0.48 && center >= -0.5, "center = {}", center);

        let (col, row) = field.nearest_texel(0.6, 0.5);
        assert_eq!(field.get(col, row).height, 0.0);
    }

    #[test]
    fn test_disturbance_spreads_one_texel_per_step() {
        let size = 128u32;
        let params = SimulationParameters {
            disturbance_radius: 0.05,
            ..small_params(size)
        };
        let mut buffers = WaveBuffers::new(size, size);
        run(&mut buffers, &PointerState::at(Vec2::new(0.5, 0.5)), &params);

        let touched = |field: &WaveField| -> Vec<(i64, i64)> {
            let mut cells = Vec::new();
            for row in 0..field.height() {
                for col in 0..field.width() {
                    if field.get(col, row) != Texel::default() {
                        cells.push((col as i64, row as i64));
                    }
                }
            }
            cells
        };

        // Directly affected texels all lie inside the brush
        let seeded = touched(buffers.current());
        assert!(!seeded.is_empty());
        for &(col, row) in &seeded {
            let (u, v) = buffers.current().uv(col as u32, row as u32);
            assert!(Vec2::new(u, v).distance(Vec2::new(0.5, 0.5)) < params.disturbance_radius);
        }

        let idle = PointerState::default();
        for k in 1..=10i64 {
            run(&mut buffers, &idle, &params);
            for (col, row) in touched(buffers.current()) {
                let reach = seeded
                    .iter()
                    .map(|&(c, r)| (c - col).abs() + (r - row).abs())
                    .min()
                    .unwrap();
                assert!(reach <= k, "texel ({}, {}) moved {} after {} steps", col, row, reach, k);
            }
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let params = small_params(48);
        let pointer = PointerState::at(Vec2::new(0.3, 0.7));
        let mut a = WaveBuffers::new(48, 48);
        let mut b = WaveBuffers::new(48, 48);
        for _ in 0..25 {
            run(&mut a, &pointer, &params);
            run(&mut b, &pointer, &params);
        }
        assert_eq!(a.current(), b.current());
    }
}
