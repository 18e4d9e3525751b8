use std::collections::VecDeque;

use glam::Vec3;

use crate::physics::BallState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallHistoryEntry {
    pub tick: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub spin: Vec3,
    pub angular_velocity: Vec3,
}

impl BallHistoryEntry {
    pub fn new(tick: u32, state: &BallState) -> Self {
        Self {
            tick,
            position: state.position,
            velocity: state.velocity,
            spin: state.spin,
            angular_velocity: state.angular_velocity,
        }
    }

    pub fn to_state(&self) -> BallState {
        BallState {
            position: self.position,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            spin: self.spin,
            frozen: false,
        }
    }
}

/// Bounded ball history, oldest first. Ticks are appended in increasing
/// order so lookups can binary search.
#[derive(Debug)]
pub struct BallHistory {
    entries: VecDeque<BallHistoryEntry>,
    capacity: usize,
}

impl BallHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry. A tick at or before the newest replaces the tail
    /// from that tick on.
    pub fn push(&mut self, entry: BallHistoryEntry) {
        self.truncate_from(entry.tick);
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, tick: u32) -> Option<&BallHistoryEntry> {
        let index = self.entries.binary_search_by_key(&tick, |e| e.tick).ok()?;
        self.entries.get(index)
    }

    /// Drops every entry recorded after `tick`.
    pub fn truncate_after(&mut self, tick: u32) {
        while self.entries.back().is_some_and(|e| e.tick > tick) {
            self.entries.pop_back();
        }
    }

    fn truncate_from(&mut self, tick: u32) {
        while self.entries.back().is_some_and(|e| e.tick >= tick) {
            self.entries.pop_back();
        }
    }

    pub fn oldest(&self) -> Option<&BallHistoryEntry> {
        self.entries.front()
    }

    pub fn newest(&self) -> Option<&BallHistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BallHistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tick: u32) -> BallHistoryEntry {
        BallHistoryEntry::new(tick, &BallState::at_rest(Vec3::new(0.0, tick as f32, 0.0)))
    }

    #[test]
    fn bounded_to_newest_entries() {
        let mut history = BallHistory::new(60);
        for tick in 0..1000 {
            history.push(entry(tick));
        }

        assert_eq!(history.len(), 60);
        let ticks: Vec<u32> = history.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, (940..1000).collect::<Vec<_>>());
        assert!(history.get(939).is_none());
        assert_eq!(history.get(950).unwrap().position.y, 950.0);
    }

    #[test]
    fn truncate_after_keeps_base() {
        let mut history = BallHistory::new(60);
        for tick in 10..20 {
            history.push(entry(tick));
        }
        history.truncate_after(14);

        assert_eq!(history.newest().unwrap().tick, 14);
        assert_eq!(history.oldest().unwrap().tick, 10);
    }

    #[test]
    fn rewritten_tick_replaces_tail() {
        let mut history = BallHistory::new(60);
        for tick in 0..5 {
            history.push(entry(tick));
        }
        history.push(entry(2));

        assert_eq!(history.len(), 3);
        assert_eq!(history.newest().unwrap().tick, 2);
    }
}
