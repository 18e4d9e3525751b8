use glam::Vec3;

use super::history::{BallHistory, BallHistoryEntry};
use crate::config::RollbackConfig;
use crate::physics::{BallSimulation, BallState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    ApplyImmediately,
    RollbackNeeded,
    SnapDirectly,
    /// The update claims a tick this peer has not reached yet.
    FutureTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    Resimulated { ticks: u32 },
    Snapped,
    Future,
    /// The rewind target had already left the history.
    MissingBase,
    Rejected,
}

/// Corrects the locally predicted ball with authoritative updates.
#[derive(Debug)]
pub struct RollbackReconciler {
    config: RollbackConfig,
    history: BallHistory,
    visual_offset: Vec3,
}

impl RollbackReconciler {
    pub fn new(config: RollbackConfig) -> Self {
        Self {
            history: BallHistory::new(config.history_len),
            config,
            visual_offset: Vec3::ZERO,
        }
    }

    pub fn history(&self) -> &BallHistory {
        &self.history
    }

    pub fn record_state(&mut self, tick: u32, state: &BallState) {
        self.history.push(BallHistoryEntry::new(tick, state));
    }

    pub fn classify(&self, received_tick: u32, current_tick: u32) -> Classification {
        let delta = i64::from(current_tick) - i64::from(received_tick);
        if delta < 0 {
            Classification::FutureTick
        } else if delta <= i64::from(self.config.apply_threshold) {
            Classification::ApplyImmediately
        } else if delta <= i64::from(self.config.rollback_threshold) {
            Classification::RollbackNeeded
        } else {
            Classification::SnapDirectly
        }
    }

    pub fn reconcile(
        &mut self,
        received: &BallState,
        received_tick: u32,
        current_tick: u32,
        sim: &mut dyn BallSimulation,
    ) -> ReconcileOutcome {
        if !received.is_finite() {
            log::warn!("ignoring non-finite ball update for tick {received_tick}");
            return ReconcileOutcome::Rejected;
        }

        let displayed_before = self.display_position(sim.ball_state().position);
        let class = self.classify(received_tick, current_tick);
        log::debug!("ball update for tick {received_tick} at {current_tick}: {class:?}");

        let outcome = match class {
            Classification::ApplyImmediately => {
                self.overwrite(received, current_tick, sim);
                ReconcileOutcome::Applied
            }
            Classification::FutureTick => {
                log::warn!("ball update from future tick {received_tick} (current {current_tick})");
                self.overwrite(received, current_tick, sim);
                ReconcileOutcome::Future
            }
            Classification::SnapDirectly => {
                self.history.clear();
                self.overwrite(received, current_tick, sim);
                ReconcileOutcome::Snapped
            }
            Classification::RollbackNeeded => {
                if self.history.get(received_tick).is_none() {
                    log::warn!("no history at tick {received_tick}, applying directly");
                    self.history.clear();
                    self.overwrite(received, current_tick, sim);
                    ReconcileOutcome::MissingBase
                } else {
                    let ticks = self.resimulate(received, received_tick, current_tick, sim);
                    ReconcileOutcome::Resimulated { ticks }
                }
            }
        };

        let corrected = sim.ball_state().position;
        let blend = self.config.visual_blend.clamp(0.0, 1.0);
        let displayed_after = displayed_before.lerp(corrected, blend);
        self.visual_offset = displayed_after - corrected;
        if !self.visual_offset.is_finite() {
            self.visual_offset = Vec3::ZERO;
        }

        outcome
    }

    fn overwrite(&mut self, received: &BallState, current_tick: u32, sim: &mut dyn BallSimulation) {
        sim.set_ball_state(received);
        self.record_state(current_tick, received);
    }

    /// Rewinds to `received_tick`, replaces it with the authoritative state
    /// and replays up to `current_tick`, re-recording every step.
    fn resimulate(
        &mut self,
        received: &BallState,
        received_tick: u32,
        current_tick: u32,
        sim: &mut dyn BallSimulation,
    ) -> u32 {
        sim.set_ball_state(received);
        self.history.truncate_after(received_tick);
        self.record_state(received_tick, received);

        let mut ticks = 0;
        for tick in received_tick + 1..=current_tick {
            sim.step_ball();
            self.record_state(tick, &sim.ball_state());
            ticks += 1;
        }
        ticks
    }

    /// Where the ball should be drawn given its simulated position.
    pub fn display_position(&self, simulated: Vec3) -> Vec3 {
        simulated + self.visual_offset
    }

    pub fn visual_offset(&self) -> Vec3 {
        self.visual_offset
    }

    /// Shrinks the residual offset; called once per tick.
    pub fn decay_visual_offset(&mut self) {
        let keep = 1.0 - self.config.visual_blend.clamp(0.0, 1.0);
        self.visual_offset *= keep;
        if self.visual_offset.length_squared() < 1e-8 {
            self.visual_offset = Vec3::ZERO;
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.visual_offset = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    /// Plain projectile motion, deterministic and cheap.
    struct Ballistic {
        state: BallState,
    }

    impl BallSimulation for Ballistic {
        fn ball_state(&self) -> BallState {
            self.state
        }

        fn set_ball_state(&mut self, state: &BallState) {
            self.state = *state;
        }

        fn step_ball(&mut self) {
            if self.state.frozen {
                return;
            }
            self.state.velocity.y -= 9.81 * DT;
            self.state.position += self.state.velocity * DT;
        }
    }

    fn moving(x: f32) -> BallState {
        BallState {
            position: Vec3::new(x, 2.5, -1.0),
            velocity: Vec3::new(0.5, 1.0, 4.0),
            ..Default::default()
        }
    }

    #[test]
    fn classification_boundaries() {
        let reconciler = RollbackReconciler::new(RollbackConfig::default());
        let at = |delta: u32| reconciler.classify(100 - delta, 100);

        assert_eq!(at(0), Classification::ApplyImmediately);
        assert_eq!(at(2), Classification::ApplyImmediately);
        assert_eq!(at(3), Classification::RollbackNeeded);
        assert_eq!(at(8), Classification::RollbackNeeded);
        assert_eq!(at(9), Classification::SnapDirectly);
        assert_eq!(reconciler.classify(101, 100), Classification::FutureTick);
    }

    #[test]
    fn rollback_matches_uninterrupted_simulation() {
        let mut reconciler = RollbackReconciler::new(RollbackConfig::default());
        let mut sim = Ballistic { state: moving(0.0) };

        for tick in 1..=20 {
            sim.step_ball();
            reconciler.record_state(tick, &sim.ball_state());
        }

        let corrected = moving(0.3);
        let outcome = reconciler.reconcile(&corrected, 15, 20, &mut sim);
        assert_eq!(outcome, ReconcileOutcome::Resimulated { ticks: 5 });

        let mut reference = Ballistic { state: corrected };
        for _ in 0..5 {
            reference.step_ball();
        }
        assert!((sim.state.position - reference.state.position).length() < 1e-5);
        assert!((sim.state.velocity - reference.state.velocity).length() < 1e-5);

        let newest = reconciler.history().newest().unwrap();
        assert_eq!(newest.tick, 20);
        assert_eq!(reconciler.history().get(15).unwrap().position, corrected.position);
    }

    #[test]
    fn missing_base_applies_directly_and_clears() {
        let mut reconciler = RollbackReconciler::new(RollbackConfig::default());
        let mut sim = Ballistic { state: moving(0.0) };
        reconciler.record_state(20, &sim.ball_state());

        let corrected = moving(1.0);
        let outcome = reconciler.reconcile(&corrected, 15, 20, &mut sim);

        assert_eq!(outcome, ReconcileOutcome::MissingBase);
        assert_eq!(sim.state, corrected);
        assert_eq!(reconciler.history().len(), 1);
    }

    #[test]
    fn small_and_large_deltas_overwrite() {
        let mut reconciler = RollbackReconciler::new(RollbackConfig::default());
        let mut sim = Ballistic { state: moving(0.0) };

        let corrected = moving(0.2);
        assert_eq!(reconciler.reconcile(&corrected, 49, 50, &mut sim), ReconcileOutcome::Applied);
        assert_eq!(sim.state, corrected);

        let far = moving(0.4);
        assert_eq!(reconciler.reconcile(&far, 10, 50, &mut sim), ReconcileOutcome::Snapped);
        assert_eq!(sim.state, far);

        let future = moving(0.6);
        assert_eq!(reconciler.reconcile(&future, 55, 50, &mut sim), ReconcileOutcome::Future);
        assert_eq!(sim.state, future);
    }

    #[test]
    fn non_finite_update_is_rejected() {
        let mut reconciler = RollbackReconciler::new(RollbackConfig::default());
        let mut sim = Ballistic { state: moving(0.0) };
        let mut bad = moving(0.0);
        bad.velocity.x = f32::NAN;

        assert_eq!(reconciler.reconcile(&bad, 10, 10, &mut sim), ReconcileOutcome::Rejected);
        assert_eq!(sim.state, moving(0.0));
    }

    #[test]
    fn display_closes_gap_gradually() {
        let mut reconciler = RollbackReconciler::new(RollbackConfig::default());
        let mut sim = Ballistic { state: moving(0.0) };

        reconciler.reconcile(&moving(1.0), 10, 10, &mut sim);
        let shown = reconciler.display_position(sim.state.position);
        assert!((shown.x - 0.5).abs() < 1e-5);

        reconciler.decay_visual_offset();
        let shown = reconciler.display_position(sim.state.position);
        assert!((shown.x - 0.75).abs() < 1e-5);

        for _ in 0..40 {
            reconciler.decay_visual_offset();
        }
        assert_eq!(reconciler.visual_offset(), Vec3::ZERO);
    }
}
