mod config;
mod events;
mod runner;

use anyhow::{Result, ensure};
use clap::Parser;
use spinshot::{GameConfig, LinkConditions};

use config::{HeadlessConfig, Mode};
use runner::HeadlessRunner;

#[derive(Parser)]
#[command(name = "spinshot-headless")]
#[command(about = "Runs table-tennis matches without a renderer")]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Mode::Loopback)]
    mode: Mode,

    #[arg(short, long, default_value_t = spinshot::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = 11, help = "Points needed to win a game")]
    points: u16,

    #[arg(long, default_value_t = 0.5, help = "AI difficulty (0.0-1.0)")]
    difficulty: f32,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 2, help = "One-way latency in ticks")]
    latency: u32,

    #[arg(long, default_value_t = 0, help = "Extra random delay in ticks")]
    jitter: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, default_value_t = 60 * 60 * 10, help = "Stop after this many ticks")]
    max_ticks: u32,

    #[arg(long, help = "Pace the simulation by the wall clock")]
    realtime: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    ensure!(args.tick_rate > 0, "tick rate must be positive");
    ensure!(
        (0.0..=100.0).contains(&args.loss_percent),
        "loss percentage must be within 0-100"
    );

    let mut game = GameConfig::default();
    game.simulation.tick_rate = args.tick_rate;
    game.rules.points_to_win = args.points;
    game.ai.difficulty = args.difficulty.clamp(0.0, 1.0);

    let config = HeadlessConfig {
        mode: args.mode,
        game,
        link: LinkConditions {
            loss_percent: args.loss_percent,
            latency_ticks: args.latency,
            jitter_ticks: args.jitter,
        },
        seed: args.seed,
        max_ticks: args.max_ticks,
        realtime: args.realtime,
    };

    log::info!("running {:?} (seed {})", config.mode, config.seed);
    let summary = HeadlessRunner::new(config).run();

    log::info!(
        "finished after {} ticks: score {}-{}, {} hits",
        summary.ticks,
        summary.points[0],
        summary.points[1],
        summary.hits
    );
    if let Some(winner) = summary.winner {
        log::info!("winner: player {winner}");
    }
    if let Some(guest) = summary.guest_points {
        if guest != summary.points {
            log::warn!("guest scoreboard {guest:?} differs from host {:?}", summary.points);
        }
    }
    if let Some(stats) = summary.host_link {
        log::info!(
            "host link: {} sent, {} dropped ({:.1}% loss), {} bytes",
            stats.packets_sent,
            stats.packets_dropped,
            stats.loss_percent(),
            stats.bytes_sent
        );
    }
    if let Some(best) = summary.minigame_best {
        log::info!("mini-game best: {best}");
    }

    Ok(())
}
