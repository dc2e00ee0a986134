use glam::Vec3;
use rand::Rng;

use crate::assets::PendingLoad;

/// Progress of the one-shot explosion sequence.
#[derive(Debug)]
pub enum ExplosionPhase {
    Armed,
    /// Fragment `index` is loading; later fragments have not been requested yet.
    Loading { index: usize, pending: PendingLoad },
    Complete,
    /// Fragment `index` failed to load. Nothing further happens.
    Aborted { index: usize },
}

/// Position of fragment `index`: the low three bits of the index pick the octant
/// (bit 0 for X, bit 1 for Y, bit 2 for Z; a clear bit means positive), and each
/// coordinate is pushed `size` plus up to `spread` away from the origin.
pub fn fragment_position<R: Rng>(index: usize, size: f32, spread: f32, rng: &mut R) -> Vec3 {
    let mut offset = |bit: usize| {
        let sign = if (index >> bit) % 2 == 0 { 1.0 } else { -1.0 };
        let distance = if spread > 0.0 {
            rng.gen_range(size..size + spread)
        } else {
            size
        };
        sign * distance
    };

    let x = offset(0);
    let y = offset(1);
    let z = offset(2);

    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const SIZE: f32 = 15.0 / 2.828_427;
    const SPREAD: f32 = 5.0;

    fn expected_signs(index: usize) -> [f32; 3] {
        let sign = |v: usize| if v % 2 == 0 { 1.0 } else { -1.0 };
        [sign(index), sign(index / 2), sign(index / 4)]
    }

    #[test]
    fn coordinates_stay_within_spread_and_follow_octant_bits() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            for index in 0..8 {
                let position = fragment_position(index, SIZE, SPREAD, &mut rng);
                let signs = expected_signs(index);

                for (axis, coordinate) in position.to_array().into_iter().enumerate() {
                    assert_eq!(coordinate.signum(), signs[axis], "fragment {index} axis {axis}");
                    assert!(coordinate.abs() >= SIZE, "fragment {index}: {coordinate}");
                    assert!(coordinate.abs() < SIZE + SPREAD, "fragment {index}: {coordinate}");
                }
            }
        }
    }

    #[test]
    fn every_octant_is_used_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut octants = (0..8)
            .map(|index| {
                let p = fragment_position(index, SIZE, SPREAD, &mut rng);
                (p.x > 0.0, p.y > 0.0, p.z > 0.0)
            })
            .collect::<Vec<_>>();

        octants.sort();
        octants.dedup();
        assert_eq!(octants.len(), 8);
    }

    #[test]
    fn maximal_random_draw_stays_below_outer_bound() {
        let mut rng = StepRng::new(u64::MAX, 0);

        for index in 0..8 {
            let position = fragment_position(index, SIZE, SPREAD, &mut rng);
            for coordinate in position.to_array() {
                assert!(coordinate.abs() >= SIZE, "fragment {index}: {coordinate}");
                assert!(coordinate.abs() < SIZE + SPREAD, "fragment {index}: {coordinate}");
            }
        }
    }

    #[test]
    fn zero_spread_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let position = fragment_position(5, SIZE, 0.0, &mut rng);
        assert_eq!(position, Vec3::new(-SIZE, SIZE, -SIZE));
    }
}
