use crate::config::SimulationConfig;

/// Accumulates real frame time and hands it out in fixed steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    tick_rate: u32,
    dt: f64,
    max_frame_delta: f64,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32, max_frame_delta: f64) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: 1.0 / f64::from(tick_rate),
            max_frame_delta,
            accumulator: 0.0,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.tick_rate, config.max_frame_delta)
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Adds a frame's worth of time. Negative or non-finite deltas are
    /// dropped and long stalls are clamped.
    pub fn accumulate(&mut self, delta: f64) {
        if !delta.is_finite() || delta <= 0.0 {
            return;
        }
        self.accumulator += delta.min(self.max_frame_delta);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    /// How far the leftover time sits between the last two ticks.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0) as f32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// What the loop drives: one call per fixed tick, then one per frame with
/// the interpolation factor.
pub trait SimulationMode {
    fn fixed_update(&mut self, tick: u32);

    fn interpolate(&mut self, _alpha: f32) {}
}

/// Fixed-step driver. The tick counter is advanced before each step, so
/// the state after step `t` belongs to tick `t`.
pub struct SimulationLoop<M> {
    timestep: FixedTimestep,
    tick: u32,
    mode: M,
}

impl<M: SimulationMode> SimulationLoop<M> {
    pub fn new(timestep: FixedTimestep, mode: M) -> Self {
        Self {
            timestep,
            tick: 0,
            mode,
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }

    pub fn mode_mut(&mut self) -> &mut M {
        &mut self.mode
    }

    pub fn into_mode(self) -> M {
        self.mode
    }

    /// Runs every tick that `frame_delta` pays for and returns how many ran.
    pub fn update(&mut self, frame_delta: f64) -> u32 {
        self.timestep.accumulate(frame_delta);

        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.step();
            ticks_run += 1;
        }

        self.mode.interpolate(self.timestep.alpha());
        ticks_run
    }

    /// Runs exactly one tick regardless of accumulated time.
    pub fn step(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.mode.fixed_update(self.tick);
    }

    pub fn interpolation_alpha(&self) -> f32 {
        self.timestep.alpha()
    }
}
