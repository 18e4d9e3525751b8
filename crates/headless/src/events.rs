use spinshot::{MatchEvent, PointEnd};

/// One-line description of a match event for the log.
pub fn describe(event: &MatchEvent) -> Option<String> {
    let text = match event {
        MatchEvent::TossStarted { player } => format!("player {player} tosses"),
        MatchEvent::BallHit {
            player,
            tick,
            serve: true,
            ..
        } => format!("player {player} serves at tick {tick}"),
        MatchEvent::PointEnded(end) => point(end),
        MatchEvent::ScoreChanged { points } => format!("score {}-{}", points[0], points[1]),
        MatchEvent::ServeChanged { server } => format!("player {server} to serve"),
        MatchEvent::MatchWon { winner } => format!("player {winner} wins the match"),
        MatchEvent::MiniGameOver { score, best } => format!("game over: {score} (best {best})"),
        _ => return None,
    };
    Some(text)
}

fn point(end: &PointEnd) -> String {
    format!("{:?} wins the point ({:?})", end.winner(), end.reason)
}
