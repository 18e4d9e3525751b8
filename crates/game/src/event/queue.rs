use super::types::MatchEvent;

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<MatchEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_queue_in_order() {
        let mut queue = EventQueue::new();
        queue.push(MatchEvent::RallyReset);
        queue.push(MatchEvent::ScoreChanged { points: [1, 0] });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained[0], MatchEvent::RallyReset);
        assert_eq!(drained[1], MatchEvent::ScoreChanged { points: [1, 0] });
        assert!(queue.is_empty());
    }
}
