use std::collections::BinaryHeap;

use bitvec::vec::BitVec;

/// Periodic signal drivers, ordered by their next trigger time.
#[derive(Default)]
pub struct OscillatorGroup {
    priority_queue: BinaryHeap<Oscillator>,
}

#[derive(Eq, PartialEq)]
pub struct Oscillator {
    signal_name: String,
    half_period: u64,
    next_state: State,
    next_trigger_time: u64,
    low_state_value: BitVec<u32>,
    high_state_value: BitVec<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Low,
    High,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Edge {
    Rising,
    Falling,
}

pub struct Trip {
    pub signal_name: String,
    pub value: BitVec<u32>,
    pub edge: Edge,
}

impl OscillatorGroup {
    pub fn insert(&mut self, oscillator: Oscillator) {
        self.remove(&oscillator.signal_name);
        self.priority_queue.push(oscillator);
    }

    pub fn remove(&mut self, signal_name: &str) {
        self.priority_queue.retain(|e| e.signal_name != signal_name);
    }

    pub fn clear(&mut self) {
        self.priority_queue.clear();
    }

    pub fn contains(&self, signal_name: &str) -> bool {
        self.priority_queue
            .iter()
            .any(|e| e.signal_name == signal_name)
    }

    pub fn next_trigger_time(&self) -> Option<u64> {
        self.priority_queue.peek().map(|e| e.next_trigger_time)
    }

    pub fn try_pop(&mut self, current_time: u64) -> Option<Trip> {
        if self.next_trigger_time() != Some(current_time) {
            return None;
        }
        let mut oscillator = self.priority_queue.pop()?;
        let trip = oscillator.trip();
        // A driver whose next toggle would be past the end of time stops.
        if let Some(next) = oscillator.next_trigger_time.checked_add(oscillator.half_period) {
            oscillator.next_trigger_time = next;
            self.priority_queue.push(oscillator);
        }
        Some(trip)
    }
}

impl Oscillator {
    /// A driver that takes its initial level at `current_time` and toggles
    /// every `half_period` after that.
    pub fn new(
        signal_name: String,
        half_period: u64,
        current_time: u64,
        low_state_value: BitVec<u32>,
        high_state_value: BitVec<u32>,
        start_high: bool,
    ) -> Self {
        let next_state = if start_high { State::Low } else { State::High };
        Self {
            signal_name,
            half_period,
            next_state,
            next_trigger_time: current_time.saturating_add(half_period),
            low_state_value,
            high_state_value,
        }
    }

    pub fn initial_value(&self) -> &BitVec<u32> {
        match self.next_state {
            State::Low => &self.high_state_value,
            State::High => &self.low_state_value,
        }
    }

    fn trip(&mut self) -> Trip {
        let (value, edge) = match self.next_state {
            State::Low => (self.low_state_value.clone(), Edge::Falling),
            State::High => (self.high_state_value.clone(), Edge::Rising),
        };
        self.next_state = match self.next_state {
            State::Low => State::High,
            State::High => State::Low,
        };
        Trip {
            signal_name: self.signal_name.clone(),
            value,
            edge,
        }
    }
}

impl Ord for Oscillator {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .next_trigger_time
            .cmp(&self.next_trigger_time)
            .then_with(|| other.signal_name.cmp(&self.signal_name))
    }
}

impl PartialOrd for Oscillator {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod test {
    use bitvec::prelude::*;

    use super::{Edge, Oscillator, OscillatorGroup};

    fn clock(name: &str, half_period: u64, start_high: bool) -> Oscillator {
        Oscillator::new(
            name.to_string(),
            half_period,
            0,
            bitvec![u32, Lsb0; 0],
            bitvec![u32, Lsb0; 1],
            start_high,
        )
    }

    #[test]
    fn test_toggles_every_half_period() {
        let mut group = OscillatorGroup::default();
        let oscillator = clock("clk", 20, true);
        assert_eq!(oscillator.initial_value(), &bitvec![u32, Lsb0; 1]);
        group.insert(oscillator);

        assert!(group.try_pop(10).is_none());
        let mut edges = vec![];
        for _ in 0..4 {
            let time = group.next_trigger_time().unwrap();
            let trip = group.try_pop(time).unwrap();
            edges.push((time, trip.edge));
        }
        assert_eq!(
            edges,
            vec![
                (20, Edge::Falling),
                (40, Edge::Rising),
                (60, Edge::Falling),
                (80, Edge::Rising)
            ]
        );
    }

    #[test]
    fn test_earliest_first_then_by_name() {
        let mut group = OscillatorGroup::default();
        group.insert(clock("b_clk", 10, false));
        group.insert(clock("a_clk", 10, false));
        group.insert(clock("slow", 25, false));

        let order: Vec<(u64, String)> = (0..4)
            .map(|_| {
                let time = group.next_trigger_time().unwrap();
                (time, group.try_pop(time).unwrap().signal_name)
            })
            .collect();
        assert_eq!(
            order,
            vec![
                (10, "a_clk".to_string()),
                (10, "b_clk".to_string()),
                (20, "a_clk".to_string()),
                (20, "b_clk".to_string()),
            ]
        );
    }

    #[test]
    fn test_insert_replaces_same_signal() {
        let mut group = OscillatorGroup::default();
        group.insert(clock("clk", 10, false));
        group.insert(clock("clk", 30, false));
        assert_eq!(group.next_trigger_time(), Some(30));
        assert!(group.contains("clk"));
        group.remove("clk");
        assert!(!group.contains("clk"));
        assert_eq!(group.next_trigger_time(), None);
    }

    #[test]
    fn test_stops_at_end_of_time() {
        let mut group = OscillatorGroup::default();
        group.insert(Oscillator::new(
            "clk".to_string(),
            10,
            u64::MAX - 15,
            bitvec![u32, Lsb0; 0],
            bitvec![u32, Lsb0; 1],
            true,
        ));
        assert_eq!(group.next_trigger_time(), Some(u64::MAX - 5));
        assert_eq!(group.try_pop(u64::MAX - 5).unwrap().edge, Edge::Falling);
        assert_eq!(group.next_trigger_time(), None);
        assert!(!group.contains("clk"));
    }
}
