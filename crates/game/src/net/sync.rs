use glam::Vec3;

use super::interpolation::{PaddleSample, RemotePaddleInterpolator};
use super::protocol::{NetworkMessage, to_wire};
use crate::config::SyncConfig;
use crate::physics::BallState;
use crate::rules::EffectFlags;

/// Fires at a fixed rate as frame time is fed in. At most one firing per
/// advance, so a long frame never produces a burst.
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    interval: f64,
    elapsed: f64,
}

impl PeriodicTimer {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            interval: 1.0 / rate_hz.max(1) as f64,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, delta: f64) -> bool {
        if !(delta > 0.0) {
            return false;
        }
        self.elapsed += delta;
        if self.elapsed >= self.interval {
            self.elapsed = (self.elapsed - self.interval).min(self.interval);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// Which broadcasts are due this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncDue {
    pub paddle: bool,
    pub ball: bool,
}

/// Periodic outbound broadcasts and the remote paddle buffer.
#[derive(Debug)]
pub struct NetworkSync {
    is_host: bool,
    running: bool,
    clock: f64,
    paddle_timer: PeriodicTimer,
    ball_timer: PeriodicTimer,
    remote: RemotePaddleInterpolator,
}

impl NetworkSync {
    pub fn new(config: &SyncConfig, is_host: bool) -> Self {
        Self {
            is_host,
            running: false,
            clock: 0.0,
            paddle_timer: PeriodicTimer::new(config.paddle_send_rate),
            ball_timer: PeriodicTimer::new(config.ball_send_rate),
            remote: RemotePaddleInterpolator::new(config),
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            log::info!("network sync started (host: {})", self.is_host);
        }
        self.running = true;
    }

    /// Pauses the senders. Missed periods are not replayed on resume.
    pub fn stop(&mut self) {
        if self.running {
            log::info!("network sync stopped");
        }
        self.running = false;
        self.paddle_timer.reset();
        self.ball_timer.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds of frame time seen so far.
    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn advance(&mut self, frame_delta: f64) -> SyncDue {
        if frame_delta.is_finite() && frame_delta > 0.0 {
            self.clock += frame_delta;
        }
        if !self.running {
            return SyncDue::default();
        }
        SyncDue {
            paddle: self.paddle_timer.advance(frame_delta),
            ball: self.is_host && self.ball_timer.advance(frame_delta),
        }
    }

    pub fn receive_paddle(&mut self, sample: PaddleSample) {
        self.remote.push(sample, self.clock);
    }

    pub fn remote_paddle(&self) -> Option<PaddleSample> {
        self.remote.sample(self.clock)
    }

    pub fn clear_remote(&mut self) {
        self.remote.clear();
    }
}

pub fn paddle_message(position: Vec3, rotation: f32, velocity: Vec3) -> NetworkMessage {
    NetworkMessage::PaddleState {
        position: to_wire(position),
        rotation,
        velocity: to_wire(velocity),
    }
}

pub fn ball_message(state: &BallState, tick: u32, effects: EffectFlags) -> NetworkMessage {
    NetworkMessage::BallSync {
        position: to_wire(state.position),
        velocity: to_wire(state.velocity),
        ang_velocity: to_wire(state.angular_velocity),
        spin: to_wire(state.spin),
        tick,
        effects: effects.bits(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_at_rate() {
        let mut timer = PeriodicTimer::new(30);
        let fired = (0..60).filter(|_| timer.advance(1.0 / 60.0)).count();
        assert!((29..=30).contains(&fired));
    }

    #[test]
    fn long_frame_fires_once() {
        let mut timer = PeriodicTimer::new(30);
        assert!(timer.advance(1.0));
        assert!(timer.advance(1.0 / 30.0));
    }

    #[test]
    fn guest_never_sends_ball() {
        let mut sync = NetworkSync::new(&SyncConfig::default(), false);
        sync.start();
        let due = sync.advance(0.1);
        assert!(due.paddle);
        assert!(!due.ball);
    }

    #[test]
    fn stopped_sync_sends_nothing() {
        let mut sync = NetworkSync::new(&SyncConfig::default(), true);
        sync.start();
        assert_eq!(sync.advance(0.1), SyncDue { paddle: true, ball: true });

        sync.stop();
        for _ in 0..10 {
            assert_eq!(sync.advance(0.1), SyncDue::default());
        }
        assert!((sync.now() - 1.1).abs() < 1e-9);

        sync.start();
        assert_eq!(sync.advance(0.001), SyncDue::default());
    }

    #[test]
    fn ball_message_carries_effect_bits() {
        let state = BallState::at_rest(Vec3::new(0.0, 2.3, -2.0));
        let message = ball_message(&state, 42, EffectFlags::SERVE | EffectFlags::SPIN);
        match message {
            NetworkMessage::BallSync { tick, effects, .. } => {
                assert_eq!(tick, 42);
                assert_eq!(EffectFlags::from_bits_truncate(effects), EffectFlags::SERVE | EffectFlags::SPIN);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
