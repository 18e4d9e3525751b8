use super::state::Side;

/// Points per side and service rotation for one game.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    points: [u16; 2],
    first_server: Side,
    points_to_win: u16,
    serves_per_turn: u16,
    winner: Option<Side>,
}

impl Scoreboard {
    pub fn new(first_server: Side, points_to_win: u16, serves_per_turn: u16) -> Self {
        Self {
            points: [0; 2],
            first_server,
            points_to_win: points_to_win.max(1),
            serves_per_turn: serves_per_turn.max(1),
            winner: None,
        }
    }

    pub fn points(&self) -> [u16; 2] {
        self.points
    }

    pub fn points_of(&self, side: Side) -> u16 {
        self.points[side.index()]
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    fn total(&self) -> u16 {
        self.points[0] + self.points[1]
    }

    pub fn is_deuce(&self) -> bool {
        let deuce_at = self.points_to_win - 1;
        self.points[0] >= deuce_at && self.points[1] >= deuce_at
    }

    /// Side due to serve the next point.
    pub fn server(&self) -> Side {
        let total = self.total();
        let deuce_at = self.points_to_win - 1;
        let turns = if self.is_deuce() {
            // Before deuce every turn lasts `serves_per_turn` points; from
            // then on service changes every point.
            let regular = 2 * deuce_at;
            regular / self.serves_per_turn + (total - regular)
        } else {
            total / self.serves_per_turn
        };
        if turns % 2 == 0 {
            self.first_server
        } else {
            self.first_server.opposite()
        }
    }

    /// Awards a point. Returns the winner if this point decided the game.
    /// Points after the game is decided are ignored.
    pub fn award(&mut self, side: Side) -> Option<Side> {
        if self.winner.is_some() {
            return None;
        }
        self.points[side.index()] += 1;

        let own = self.points_of(side);
        let other = self.points_of(side.opposite());
        if own >= self.points_to_win && own >= other + 2 {
            self.winner = Some(side);
        }
        self.winner
    }

    /// Overwrites the points with the host's view.
    pub fn apply(&mut self, points: [u16; 2]) {
        self.points = points;
        self.winner = [Side::Left, Side::Right].into_iter().find(|&side| {
            let own = self.points_of(side);
            own >= self.points_to_win && own >= self.points_of(side.opposite()) + 2
        });
    }

    pub fn reset(&mut self) {
        self.points = [0; 2];
        self.winner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_changes_every_two_points() {
        let mut board = Scoreboard::new(Side::Left, 11, 2);
        assert_eq!(board.server(), Side::Left);
        board.award(Side::Right);
        assert_eq!(board.server(), Side::Left);
        board.award(Side::Right);
        assert_eq!(board.server(), Side::Right);
        board.award(Side::Left);
        board.award(Side::Left);
        assert_eq!(board.server(), Side::Left);
    }

    #[test]
    fn first_to_eleven_wins() {
        let mut board = Scoreboard::new(Side::Left, 11, 2);
        for _ in 0..10 {
            assert_eq!(board.award(Side::Left), None);
        }
        assert_eq!(board.award(Side::Left), Some(Side::Left));
        assert!(board.is_over());
        assert_eq!(board.award(Side::Right), None);
        assert_eq!(board.points(), [11, 0]);
    }

    #[test]
    fn deuce_needs_two_clear_and_alternates_service() {
        let mut board = Scoreboard::new(Side::Left, 11, 2);
        for _ in 0..10 {
            board.award(Side::Left);
            board.award(Side::Right);
        }
        assert!(board.is_deuce());
        let at_deuce = board.server();

        assert_eq!(board.award(Side::Left), None);
        assert_ne!(board.server(), at_deuce);
        assert_eq!(board.award(Side::Right), None);
        assert_eq!(board.server(), at_deuce);

        board.award(Side::Right);
        assert_eq!(board.award(Side::Right), Some(Side::Right));
        assert_eq!(board.points(), [11, 13]);
    }

    #[test]
    fn apply_recomputes_winner() {
        let mut board = Scoreboard::new(Side::Right, 11, 2);
        board.apply([3, 11]);
        assert_eq!(board.winner(), Some(Side::Right));
        board.reset();
        assert_eq!(board.points(), [0, 0]);
        assert_eq!(board.winner(), None);
    }
}
