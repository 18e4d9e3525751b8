use glam::Vec3;
use spinshot::physics::{BallSimulation, BallState};
use spinshot::{GameConfig, ReconcileOutcome, RollbackReconciler, TableArena};

fn arena() -> TableArena {
    let config = GameConfig::default();
    TableArena::new(&config.simulation, &config.table)
}

fn launched() -> BallState {
    BallState {
        position: Vec3::new(0.2, 2.6, -1.5),
        velocity: Vec3::new(0.3, 2.0, 3.0),
        ..Default::default()
    }
}

/// The host's view of the ball at tick 10 differs from the guest's.
fn corrected() -> BallState {
    BallState {
        position: Vec3::new(0.1, 2.9, -1.0),
        velocity: Vec3::new(-0.2, 1.5, 3.5),
        ..Default::default()
    }
}

#[test]
fn resimulation_matches_uninterrupted_run() {
    let mut reference = arena();
    reference.set_ball_state(&launched());
    for _ in 1..=10 {
        reference.step();
    }
    reference.set_ball_state(&corrected());
    for _ in 11..=15 {
        reference.step();
    }

    let mut guest = arena();
    let mut reconciler = RollbackReconciler::new(GameConfig::default().rollback);
    guest.set_ball_state(&launched());
    for tick in 1..=15 {
        guest.step();
        reconciler.record_state(tick, &guest.ball_state());
    }

    let outcome = reconciler.reconcile(&corrected(), 10, 15, &mut guest);
    assert_eq!(outcome, ReconcileOutcome::Resimulated { ticks: 5 });

    let expected = reference.ball_state();
    let actual = guest.ball_state();
    assert!((expected.position - actual.position).length() < 1e-3);
    assert!((expected.velocity - actual.velocity).length() < 1e-3);

    let newest = reconciler.history().newest().expect("history");
    assert_eq!(newest.tick, 15);
    assert!((newest.position - actual.position).length() < 1e-6);
}

#[test]
fn display_offset_fades_after_correction() {
    let mut guest = arena();
    let mut reconciler = RollbackReconciler::new(GameConfig::default().rollback);
    guest.set_ball_state(&launched());
    for tick in 1..=20 {
        guest.step();
        reconciler.record_state(tick, &guest.ball_state());
    }

    reconciler.reconcile(&corrected(), 5, 20, &mut guest);
    let first = reconciler.visual_offset().length();
    assert!(first > 0.0);

    for tick in 21..=40 {
        guest.step();
        reconciler.decay_visual_offset();
        reconciler.record_state(tick, &guest.ball_state());
    }
    assert!(reconciler.visual_offset().length() < first * 0.01);
}
