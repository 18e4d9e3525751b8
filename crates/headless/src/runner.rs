use std::time::{Duration, Instant};

use glam::Vec3;
use spinshot::simulation::{FixedTimestep, SimulationLoop, SimulationMode};
use spinshot::{LoopbackTransport, MatchEvent, MiniGame, NetworkStats, PlayerId, TableMatch};

use crate::config::{HeadlessConfig, Mode};
use crate::events::describe;

const HOST: PlayerId = 1;
const GUEST: PlayerId = 2;

/// Totals printed when a run finishes.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub ticks: u32,
    pub points: [u16; 2],
    pub hits: u32,
    pub winner: Option<PlayerId>,
    pub host_link: Option<NetworkStats>,
    pub guest_points: Option<[u16; 2]>,
    pub minigame_best: Option<u32>,
}

pub struct HeadlessRunner {
    config: HeadlessConfig,
}

impl HeadlessRunner {
    pub fn new(config: HeadlessConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> RunSummary {
        match self.config.mode {
            Mode::Loopback => self.run_loopback(),
            Mode::Solo => self.run_solo(),
            Mode::Minigame => self.run_minigame(),
        }
    }

    fn timestep(&self) -> FixedTimestep {
        FixedTimestep::from_config(&self.config.game.simulation)
    }

    /// Drives `sims` in lockstep, either as fast as possible or paced by
    /// the wall clock. Stops when `done` returns true.
    fn drive<M: SimulationMode>(
        &self,
        sims: &mut [&mut SimulationLoop<M>],
        mut done: impl FnMut(&mut [&mut SimulationLoop<M>]) -> bool,
    ) -> u32 {
        let mut ticks = 0;
        let mut last = Instant::now();
        while ticks < self.config.max_ticks {
            if self.config.realtime {
                let now = Instant::now();
                let delta = now.duration_since(last).as_secs_f64();
                last = now;
                let mut ran = 0;
                for sim in sims.iter_mut() {
                    ran = sim.update(delta);
                }
                ticks += ran;
                std::thread::sleep(Duration::from_millis(1));
            } else {
                for sim in sims.iter_mut() {
                    sim.step();
                }
                ticks += 1;
            }
            if done(sims) {
                break;
            }
        }
        ticks
    }

    fn run_loopback(&self) -> RunSummary {
        let game = self.config.game.clone();
        let ((host_transport, host_inbound), (guest_transport, guest_inbound)) =
            LoopbackTransport::pair(HOST, GUEST, self.config.link.clone(), self.config.seed);

        let host = TableMatch::networked(game.clone(), Box::new(host_transport), host_inbound)
            .with_autopilot();
        let guest = TableMatch::networked(game, Box::new(guest_transport), guest_inbound)
            .with_autopilot();
        let mut host = SimulationLoop::new(self.timestep(), host);
        let mut guest = SimulationLoop::new(self.timestep(), guest);

        let mut summary = RunSummary::default();
        let ticks = self.drive(&mut [&mut host, &mut guest], |sims| {
            let mut finished = false;
            for event in sims[0].mode_mut().drain_events() {
                finished |= record(&mut summary, &event, "host");
            }
            for event in sims[1].mode_mut().drain_events() {
                if let Some(text) = describe(&event) {
                    log::debug!("[guest] {text}");
                }
            }
            finished
        });

        summary.ticks = ticks;
        summary.points = host.mode().scoreboard().points();
        summary.guest_points = Some(guest.mode().scoreboard().points());
        summary.host_link = host.mode().link_stats().cloned();
        summary
    }

    fn run_solo(&self) -> RunSummary {
        let mut game = self.config.game.clone();
        game.ai.seed = self.config.seed;
        // The local side plays itself too.
        let table_match = TableMatch::solo(game).with_autopilot();
        let mut sim = SimulationLoop::new(self.timestep(), table_match);

        let mut summary = RunSummary::default();
        let ticks = self.drive(&mut [&mut sim], |sims| {
            let mut finished = false;
            for event in sims[0].mode_mut().drain_events() {
                finished |= record(&mut summary, &event, "solo");
            }
            finished
        });

        summary.ticks = ticks;
        summary.points = sim.mode().scoreboard().points();
        summary
    }

    fn run_minigame(&self) -> RunSummary {
        let mut sim = SimulationLoop::new(self.timestep(), MiniGame::new(&self.config.game));
        let mut summary = RunSummary::default();

        let ticks = self.drive(&mut [&mut sim], |sims| {
            let game = sims[0].mode_mut();
            // Keep the paddle under the ball.
            let ball = game.ball_position();
            game.set_pointer(Vec3::new(ball.x, 0.0, ball.z));
            let mut finished = false;
            for event in game.drain_events() {
                finished |= matches!(event, MatchEvent::MiniGameOver { .. });
                if let Some(text) = describe(&event) {
                    log::info!("[minigame] {text}");
                }
            }
            finished
        });

        summary.ticks = ticks;
        summary.minigame_best = Some(sim.mode().best());
        summary
    }
}

/// Logs `event` and folds it into `summary`. Returns true once the match
/// is decided.
fn record(summary: &mut RunSummary, event: &MatchEvent, peer: &str) -> bool {
    if let Some(text) = describe(event) {
        log::info!("[{peer}] {text}");
    }
    match event {
        MatchEvent::BallHit { .. } => summary.hits += 1,
        MatchEvent::MatchWon { winner } => {
            summary.winner = Some(*winner);
            return true;
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use spinshot::{GameConfig, LinkConditions};

    use super::*;

    fn config(mode: Mode, max_ticks: u32) -> HeadlessConfig {
        HeadlessConfig {
            mode,
            game: GameConfig::default(),
            link: LinkConditions {
                loss_percent: 0.0,
                latency_ticks: 2,
                jitter_ticks: 0,
            },
            seed: 9,
            max_ticks,
            realtime: false,
        }
    }

    #[test]
    fn loopback_run_stops_at_tick_limit() {
        let summary = HeadlessRunner::new(config(Mode::Loopback, 600)).run();
        assert_eq!(summary.ticks, 600);
        assert!(summary.host_link.is_some_and(|stats| stats.packets_sent > 0));
    }

    #[test]
    fn minigame_run_ends_when_ball_is_lost() {
        let summary = HeadlessRunner::new(config(Mode::Minigame, 20_000)).run();
        assert!(summary.ticks <= 20_000);
        assert!(summary.minigame_best.is_some());
    }
}
