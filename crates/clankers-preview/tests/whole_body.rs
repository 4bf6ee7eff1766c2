//! Integration tests for reduced ↔ whole-body state conversion.

use approx::assert_relative_eq;
use clankers_core::config::PreviewConfig;
use clankers_preview::{
    Phase, PreviewControl, PreviewLocomotion, PreviewMode, PreviewParams, ReducedBodyState,
};
use clankers_test_utils::PointFootQuadruped;
use nalgebra::{Vector2, Vector3};

fn engine() -> PreviewLocomotion {
    PointFootQuadruped::default().engine()
}

fn walking(engine: &PreviewLocomotion) -> ReducedBodyState {
    let mut state = ReducedBodyState::at_rest(0.7, Vector3::new(0.1, -0.02, 0.5), 0.0);
    state.com_vel = Vector3::new(0.3, 0.05, 0.0);
    state.com_acc = Vector3::new(0.1, 0.0, 0.0);
    for (foot, stance) in engine.stance_posture().iter() {
        state.foot_pos.insert(foot, *stance);
        state.foot_vel.insert(foot, -state.com_vel);
        state.foot_acc.insert(foot, -state.com_acc);
        state.support_region.insert(foot, state.com_pos + stance);
    }
    state
}

#[test]
fn reduced_state_expands_onto_base_and_contacts() {
    let engine = engine();
    let state = walking(&engine);
    let full = engine.to_whole_body_state(&state).unwrap();

    assert_relative_eq!(full.time, 0.7);
    // Base sits below the CoM by the default CoM offset
    assert_relative_eq!(full.base_pos, Vector3::new(0.1, -0.02, 0.45), epsilon = 1e-12);
    assert_relative_eq!(full.base_vel, state.com_vel);

    let fl = engine.feet().id("FL").unwrap();
    assert_relative_eq!(
        *full.contact_pos.get(fl).unwrap(),
        Vector3::new(0.2, 0.15, -0.45),
        epsilon = 1e-12
    );

    // Weight shared by the four supporting feet
    for (_, force) in full.contact_eff.iter() {
        assert_relative_eq!(*force, Vector3::new(0.0, 0.0, 10.0 * 9.81 / 4.0), epsilon = 1e-12);
    }

    // Cartesian legs: joints mirror the contacts
    assert_eq!(full.joint_pos.len(), 12);
    assert_relative_eq!(full.joint_pos[0], 0.2, epsilon = 1e-12);
    assert_relative_eq!(full.joint_vel[0], -0.3, epsilon = 1e-12);
    assert!(full.joint_eff.iter().all(|e| *e == 0.0));
}

#[test]
fn swinging_foot_carries_no_force() {
    let engine = engine();
    let mut state = walking(&engine);
    let hr = engine.feet().id("HR").unwrap();
    state.support_region.remove(hr);

    let full = engine.to_whole_body_state(&state).unwrap();
    assert_relative_eq!(*full.contact_eff.get(hr).unwrap(), Vector3::zeros());
    let fl = engine.feet().id("FL").unwrap();
    assert_relative_eq!(full.contact_eff.get(fl).unwrap().z, 10.0 * 9.81 / 3.0, epsilon = 1e-12);
}

#[test]
fn reduced_round_trip_preserves_com_and_feet() {
    let engine = engine();
    let state = walking(&engine);
    let back = engine.from_whole_body_state(&engine.to_whole_body_state(&state).unwrap());

    assert_relative_eq!(back.time, state.time);
    assert_relative_eq!(back.com_pos, state.com_pos, epsilon = 1e-12);
    assert_relative_eq!(back.com_vel, state.com_vel, epsilon = 1e-12);
    assert_relative_eq!(back.com_acc, state.com_acc, epsilon = 1e-12);
    for (foot, pos) in state.foot_pos.iter() {
        assert_relative_eq!(*back.foot_pos.get(foot).unwrap(), *pos, epsilon = 1e-12);
        assert_relative_eq!(
            *back.foot_vel.get(foot).unwrap(),
            *state.foot_vel.get(foot).unwrap(),
            epsilon = 1e-12
        );
    }
    // Equal loads put the CoP at the center of the feet, on the ground
    assert_relative_eq!(back.cop, Vector3::new(0.1, -0.02, 0.0), epsilon = 1e-12);
    assert_eq!(back.support_region.len(), 4);
    for (foot, contact) in state.support_region.iter() {
        assert_relative_eq!(*back.support_region.get(foot).unwrap(), *contact, epsilon = 1e-12);
    }
}

#[test]
fn whole_body_round_trip_preserves_base_and_contacts() {
    let engine = engine();
    let full = engine.to_whole_body_state(&walking(&engine)).unwrap();
    let again = engine
        .to_whole_body_state(&engine.from_whole_body_state(&full))
        .unwrap();

    assert_relative_eq!(again.base_pos, full.base_pos, epsilon = 1e-12);
    assert_relative_eq!(again.base_vel, full.base_vel, epsilon = 1e-12);
    assert_relative_eq!(again.base_acc, full.base_acc, epsilon = 1e-12);
    for (foot, pos) in full.contact_pos.iter() {
        assert_relative_eq!(*again.contact_pos.get(foot).unwrap(), *pos, epsilon = 1e-12);
        assert_relative_eq!(
            *again.contact_vel.get(foot).unwrap(),
            *full.contact_vel.get(foot).unwrap(),
            epsilon = 1e-12
        );
    }
}

#[test]
fn force_threshold_selects_support() {
    let engine = PreviewLocomotion::builder()
        .with_robot(PointFootQuadruped::default().description())
        .with_config(PreviewConfig {
            force_threshold: 30.0,
            ..PreviewConfig::default()
        })
        .build()
        .unwrap();
    let mut full = engine.to_whole_body_state(&walking(&engine)).unwrap();
    let fr = engine.feet().id("FR").unwrap();
    let hl = engine.feet().id("HL").unwrap();
    full.contact_eff.insert(fr, Vector3::new(0.0, 0.0, 60.0));
    full.contact_eff.insert(hl, Vector3::new(0.0, 0.0, 40.0));

    let reduced = engine.from_whole_body_state(&full);
    let supported: Vec<_> = reduced.support_region.keys().collect();
    assert_eq!(supported, vec![fr, hl]);
}

#[test]
fn trajectory_expands_every_sample() {
    let engine = engine();
    let state = walking(&engine);
    let fl = engine.feet().id("FL").unwrap();
    let control = PreviewControl::new(vec![PreviewParams::new(
        0.05,
        Phase::stance(Vector2::new(0.01, 0.0), 0.0).with_swing(fl, Vector2::new(0.05, 0.0)),
    )]);
    let trajectory = engine
        .multi_phase_preview(&state, &control, PreviewMode::Full)
        .unwrap();

    let full = engine.to_whole_body_trajectory(&trajectory).unwrap();
    assert_eq!(full.len(), trajectory.len());
    for (reduced, expanded) in trajectory.iter().zip(&full) {
        assert_relative_eq!(expanded.time, reduced.time);
        assert_relative_eq!(
            expanded.base_pos + engine.default_com(),
            reduced.com_pos,
            epsilon = 1e-12
        );
    }
    // Lifted foot carries no load mid-swing
    assert_relative_eq!(full[10].contact_eff.get(fl).unwrap().z, 0.0);
}
