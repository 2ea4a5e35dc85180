use linewatch_hal::traits::Tick;

/// A validated transition, emitted once debounce commits a new stable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Which committed edges a line subscribes to. Non-matching edges are
/// discarded before they reach the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeSelect {
    Rising,
    Falling,
    #[default]
    Both,
}

impl EdgeSelect {
    pub fn accepts(self, edge: Edge) -> bool {
        matches!(
            (self, edge),
            (EdgeSelect::Both, _)
                | (EdgeSelect::Rising, Edge::Rising)
                | (EdgeSelect::Falling, Edge::Falling)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stable,
    Pending,
}

/// Per-line debounce state machine. A transition is accepted as a valid
/// edge only once the new level has been held for `debounce_ticks`;
/// anything observed inside that hold window is counted as bounce and
/// never updates the committed state.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    last_valid: bool,
    last_change_tick: Tick,
    bounce_count: u32,
    debounce_ticks: Tick,
    phase: Phase,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self {
            last_valid: false,
            last_change_tick: 0,
            bounce_count: 0,
            debounce_ticks: 0,
            phase: Phase::Stable,
        }
    }

    pub fn set_interval(&mut self, ticks: Tick) {
        self.debounce_ticks = ticks;
    }

    pub fn last_valid(&self) -> bool {
        self.last_valid
    }

    pub fn bounce_count(&self) -> u32 {
        self.bounce_count
    }

    /// Classify one raw sample. Returns the committed edge, if any.
    pub fn sample(&mut self, tick: Tick, sample: bool) -> Option<Edge> {
        if sample == self.last_valid {
            if self.phase == Phase::Pending {
                // candidate reverted inside the hold window: noise
                self.bounce_count = self.bounce_count.saturating_add(1);
                self.phase = Phase::Stable;
            }
            return None;
        }
        match self.phase {
            Phase::Stable => {
                if tick.wrapping_sub(self.last_change_tick) < self.debounce_ticks {
                    // new candidate hard on the heels of the previous change
                    self.bounce_count = self.bounce_count.saturating_add(1);
                }
                self.phase = Phase::Pending;
                self.last_change_tick = tick;
                if self.debounce_ticks == 0 {
                    return Some(self.commit(sample));
                }
                None
            }
            Phase::Pending => {
                if tick.wrapping_sub(self.last_change_tick) >= self.debounce_ticks {
                    Some(self.commit(sample))
                } else {
                    None
                }
            }
        }
    }

    fn commit(&mut self, sample: bool) -> Edge {
        self.last_valid = sample;
        self.phase = Phase::Stable;
        if sample { Edge::Rising } else { Edge::Falling }
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(interval: Tick) -> EdgeDetector {
        let mut d = EdgeDetector::new();
        d.set_interval(interval);
        d
    }

    #[test]
    fn held_transition_commits_exactly_one_rising_edge() {
        let mut d = detector(50);
        assert_eq!(d.sample(100, true), None);
        for t in 101..150 {
            assert_eq!(d.sample(t, true), None);
        }
        assert_eq!(d.sample(150, true), Some(Edge::Rising));
        // still high afterwards: no further edges
        assert_eq!(d.sample(151, true), None);
        assert_eq!(d.bounce_count(), 0);
    }

    #[test]
    fn short_pulse_reverts_without_an_edge() {
        let mut d = detector(50);
        assert_eq!(d.sample(100, true), None);
        assert_eq!(d.sample(120, false), None);
        assert_eq!(d.bounce_count(), 1);
        assert!(!d.last_valid());
    }

    #[test]
    fn alternating_chatter_counts_every_flip() {
        let mut d = detector(50);
        for t in 1..=10u32 {
            assert_eq!(d.sample(t, t % 2 == 1), None);
        }
        assert_eq!(d.bounce_count(), 10);
        assert!(!d.last_valid());
    }

    #[test]
    fn falling_edge_after_rising() {
        let mut d = detector(10);
        d.sample(100, true);
        assert_eq!(d.sample(110, true), Some(Edge::Rising));
        d.sample(200, false);
        assert_eq!(d.sample(210, false), Some(Edge::Falling));
        assert_eq!(d.bounce_count(), 0);
    }

    #[test]
    fn zero_interval_commits_immediately() {
        let mut d = detector(0);
        assert_eq!(d.sample(5, true), Some(Edge::Rising));
        assert_eq!(d.sample(6, false), Some(Edge::Falling));
    }

    #[test]
    fn elapsed_time_survives_tick_wraparound() {
        let mut d = detector(50);
        assert_eq!(d.sample(u32::MAX - 10, true), None);
        // 50 ticks later the counter has wrapped past zero
        assert_eq!(d.sample(39, true), Some(Edge::Rising));
    }

    #[test]
    fn edge_select_filters() {
        assert!(EdgeSelect::Both.accepts(Edge::Rising));
        assert!(EdgeSelect::Both.accepts(Edge::Falling));
        assert!(EdgeSelect::Rising.accepts(Edge::Rising));
        assert!(!EdgeSelect::Rising.accepts(Edge::Falling));
        assert!(!EdgeSelect::Falling.accepts(Edge::Rising));
    }
}
