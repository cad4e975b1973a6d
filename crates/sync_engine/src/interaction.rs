//! Interaction override timer.

use contracts::ScreenPoint;

/// Tick countdown that suppresses camera auto-follow after a gesture
#[derive(Debug, Clone)]
pub struct InteractionTimer {
    remaining: u32,
    timeout: u32,
    last_pointer: Option<ScreenPoint>,
}

impl InteractionTimer {
    pub fn new(timeout: u32) -> Self {
        Self {
            remaining: 0,
            timeout,
            last_pointer: None,
        }
    }

    /// Count one tick down, floored at zero
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Restart the countdown
    pub fn reset(&mut self) {
        self.remaining = self.timeout;
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn last_pointer(&self) -> Option<ScreenPoint> {
        self.last_pointer
    }

    /// Record the pointer position, returning the previous one
    pub fn track_pointer(&mut self, position: ScreenPoint) -> Option<ScreenPoint> {
        self.last_pointer.replace(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_at_start() {
        let timer = InteractionTimer::new(100);
        assert!(!timer.active());
    }

    #[test]
    fn test_expires_after_exactly_timeout_ticks() {
        let mut timer = InteractionTimer::new(100);
        timer.reset();
        assert!(timer.active());

        for _ in 0..99 {
            timer.tick();
            assert!(timer.active());
        }
        timer.tick();
        assert!(!timer.active());

        timer.tick();
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_reset_restarts_countdown() {
        let mut timer = InteractionTimer::new(5);
        timer.reset();
        timer.tick();
        timer.tick();
        timer.reset();
        assert_eq!(timer.remaining(), 5);
    }

    #[test]
    fn test_pointer_tracking() {
        let mut timer = InteractionTimer::new(5);
        assert_eq!(timer.track_pointer(ScreenPoint::new(1.0, 2.0)), None);
        assert_eq!(
            timer.track_pointer(ScreenPoint::new(3.0, 4.0)),
            Some(ScreenPoint::new(1.0, 2.0))
        );
        assert_eq!(timer.last_pointer(), Some(ScreenPoint::new(3.0, 4.0)));
    }
}
