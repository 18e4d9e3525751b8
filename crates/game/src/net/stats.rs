use rand::Rng;
use rand::rngs::StdRng;

/// Simulated link quality, in ticks so runs are reproducible.
#[derive(Debug, Clone, Default)]
pub struct LinkConditions {
    pub loss_percent: f32,
    pub latency_ticks: u32,
    pub jitter_ticks: u32,
}

impl LinkConditions {
    pub fn perfect() -> Self {
        Self::default()
    }

    pub fn should_drop(&self, rng: &mut StdRng) -> bool {
        if self.loss_percent <= 0.0 {
            return false;
        }
        rng.gen_range(0.0f32..100.0) < self.loss_percent
    }

    pub fn delay_ticks(&self, rng: &mut StdRng) -> u32 {
        let jitter = if self.jitter_ticks > 0 {
            rng.gen_range(0..=self.jitter_ticks)
        } else {
            0
        };
        self.latency_ticks + jitter
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub packets_rejected: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl NetworkStats {
    pub fn loss_percent(&self) -> f32 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.packets_dropped as f32 / self.packets_sent as f32 * 100.0
    }
}
