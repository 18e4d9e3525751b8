use std::collections::VecDeque;

use glam::Vec3;

use crate::config::SyncConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleSample {
    pub position: Vec3,
    pub rotation: f32,
    pub velocity: Vec3,
}

impl PaddleSample {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation + (other.rotation - self.rotation) * t,
            velocity: self.velocity.lerp(other.velocity, t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TimedSample {
    arrival: f64,
    sample: PaddleSample,
}

/// Renders the remote paddle a fixed delay behind real time by blending the
/// two samples that bracket the delayed instant.
#[derive(Debug)]
pub struct RemotePaddleInterpolator {
    samples: VecDeque<TimedSample>,
    capacity: usize,
    delay: f64,
}

impl RemotePaddleInterpolator {
    pub fn new(config: &SyncConfig) -> Self {
        let capacity = config.buffer_size.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            delay: config.interpolation_delay.max(0.0),
        }
    }

    /// Records a sample that arrived at `arrival` seconds.
    pub fn push(&mut self, sample: PaddleSample, arrival: f64) {
        let insert_at = self
            .samples
            .iter()
            .position(|s| s.arrival > arrival)
            .unwrap_or(self.samples.len());
        self.samples.insert(insert_at, TimedSample { arrival, sample });

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Pose at `now - delay`. Before the oldest sample the oldest is held;
    /// after the newest the newest is held. Never extrapolates.
    pub fn sample(&self, now: f64) -> Option<PaddleSample> {
        let newest = self.samples.back()?;
        if self.samples.len() < 2 {
            return Some(newest.sample);
        }

        let render_time = now - self.delay;
        if render_time >= newest.arrival {
            return Some(newest.sample);
        }

        let mut iter = self.samples.iter().zip(self.samples.iter().skip(1));
        let bracket = iter.find(|(_, to)| to.arrival >= render_time);
        match bracket {
            Some((from, to)) if render_time >= from.arrival => {
                let span = to.arrival - from.arrival;
                let t = if span > f64::EPSILON {
                    ((render_time - from.arrival) / span) as f32
                } else {
                    1.0
                };
                Some(from.sample.lerp(&to.sample, t.clamp(0.0, 1.0)))
            }
            _ => self.samples.front().map(|s| s.sample),
        }
    }

    pub fn latest(&self) -> Option<PaddleSample> {
        self.samples.back().map(|s| s.sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
