use spinshot::{GameConfig, LinkConditions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Host and guest over an in-memory link, both driven by the AI.
    Loopback,
    /// AI against AI on one peer, no network.
    Solo,
    /// The juggling mini-game with a scripted paddle.
    Minigame,
}

#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub mode: Mode,
    pub game: GameConfig,
    pub link: LinkConditions,
    pub seed: u64,
    pub max_ticks: u32,
    pub realtime: bool,
}
