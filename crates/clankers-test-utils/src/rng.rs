//! Deterministic RNG utilities for reproducible tests.

use clankers_preview::{FootSet, Phase, PreviewControl, PreviewParams};
use nalgebra::Vector2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generate a random phase plan of `phases` phases for `feet`.
///
/// Mostly stance phases with small CoP shifts. A short flight phase may
/// follow a stance phase, never another flight, so the CoM stays well above
/// the ground. Any foot may swing in any phase.
pub fn random_control(rng: &mut impl Rng, feet: &FootSet, phases: usize) -> PreviewControl {
    let mut params = Vec::with_capacity(phases);
    let mut previous_flight = false;
    for _ in 0..phases {
        let flight = !previous_flight && rng.gen_bool(0.2);
        let (duration, mut phase) = if flight {
            (rng.gen_range(0.02..0.1), Phase::flight())
        } else {
            let cop_shift = Vector2::new(rng.gen_range(-0.03..0.03), rng.gen_range(-0.03..0.03));
            (
                rng.gen_range(0.05..0.4),
                Phase::stance(cop_shift, rng.gen_range(-0.5..0.5)),
            )
        };
        for foot in feet.ids() {
            if rng.gen_bool(0.3) {
                let shift = Vector2::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.05..0.05));
                phase.set_swing_foot(foot, shift);
            }
        }
        params.push(PreviewParams::new(duration, phase));
        previous_flight = flight;
    }
    PreviewControl::new(params)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn feet() -> FootSet {
        FootSet::new(["FL", "FR", "HL", "HR"]).unwrap()
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let mut rng1 = seeded_rng(42);
        let mut rng2 = seeded_rng(42);
        let v1: f64 = rng1.r#gen();
        let v2: f64 = rng2.r#gen();
        assert!((v1 - v2).abs() < f64::EPSILON);
    }

    #[test]
    fn random_control_reproducible() {
        let feet = feet();
        let c1 = random_control(&mut seeded_rng(7), &feet, 12);
        let c2 = random_control(&mut seeded_rng(7), &feet, 12);
        assert_eq!(c1.params.len(), 12);
        assert_eq!(c1, c2);
    }

    #[test]
    fn random_control_never_chains_flights() {
        let feet = feet();
        let control = random_control(&mut seeded_rng(3), &feet, 200);
        for pair in control.params.windows(2) {
            assert!(pair[0].phase.is_stance() || pair[1].phase.is_stance());
        }
        assert!(control.params.iter().all(|p| p.duration > 0.0));
    }
}
