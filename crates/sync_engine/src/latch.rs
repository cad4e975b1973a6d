//! Boolean latches: sticky and edge-detecting.

/// Flag that only ever turns true
#[derive(Debug, Clone, Copy, Default)]
pub struct StickyLatch {
    set: bool,
}

impl StickyLatch {
    /// OR `value` into the latch, returning the latched state
    pub fn update(&mut self, value: bool) -> bool {
        self.set |= value;
        self.set
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.set
    }
}

/// Transition observed by an [`EdgeLatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Steady,
}

impl Edge {
    pub fn changed(self) -> bool {
        self != Edge::Steady
    }
}

/// Previous-value tracker reporting transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeLatch {
    previous: bool,
}

impl EdgeLatch {
    /// Latch that treats `initial` as the value already seen
    pub fn new(initial: bool) -> Self {
        Self { previous: initial }
    }

    /// Record `value` and report the transition from the last one
    pub fn update(&mut self, value: bool) -> Edge {
        let edge = match (self.previous, value) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::Steady,
        };
        self.previous = value;
        edge
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.previous
    }

    /// Forget the last value
    pub fn reset(&mut self) {
        self.previous = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sticky_never_resets() {
        let mut latch = StickyLatch::default();
        assert!(!latch.update(false));
        assert!(latch.update(true));
        assert!(latch.update(false));
        assert!(latch.get());
    }

    #[test]
    fn test_edges() {
        let mut latch = EdgeLatch::default();
        assert_eq!(latch.update(false), Edge::Steady);
        assert_eq!(latch.update(true), Edge::Rising);
        assert_eq!(latch.update(true), Edge::Steady);
        assert_eq!(latch.update(false), Edge::Falling);
        assert!(!Edge::Steady.changed());
    }

    #[test]
    fn test_reset_rearms_rising_edge() {
        let mut latch = EdgeLatch::default();
        latch.update(true);
        latch.reset();
        assert_eq!(latch.update(true), Edge::Rising);
    }

    #[test]
    fn test_seeded_latch_needs_a_falling_edge_first() {
        let mut latch = EdgeLatch::new(true);
        assert_eq!(latch.update(true), Edge::Steady);
        assert_eq!(latch.update(false), Edge::Falling);
        assert_eq!(latch.update(true), Edge::Rising);
    }
}
