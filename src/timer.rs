//! Turn timer with cancellable tokens
//!
//! At most one deadline is armed at a time. Each arm hands out a fresh
//! [`TimerToken`]; a timeout is only honoured if it carries the token that
//! is currently armed, so a late callback for an earlier turn does nothing.

use std::time::{Duration, Instant};

/// Identifies one arming of the turn timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    token: TimerToken,
    deadline: Instant,
}

/// Single-slot countdown timer
#[derive(Debug, Default)]
pub struct TurnTimer {
    generation: u64,
    armed: Option<Armed>,
    /// Set by `shutdown`; no later arm takes effect
    shut_down: bool,
}

impl TurnTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer for `delay` from `now`, replacing any pending deadline
    ///
    /// Returns None once the timer has been shut down.
    pub fn arm(&mut self, now: Instant, delay: Duration) -> Option<TimerToken> {
        if self.shut_down {
            return None;
        }
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.armed = Some(Armed {
            token,
            deadline: now + delay,
        });
        Some(token)
    }

    /// Drop the pending deadline, if any
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Disarm for good
    pub fn shutdown(&mut self) {
        self.armed = None;
        self.shut_down = true;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.deadline)
    }

    pub fn token(&self) -> Option<TimerToken> {
        self.armed.map(|armed| armed.token)
    }

    /// Whether `token` belongs to the pending deadline
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.token() == Some(token)
    }

    /// Token of the pending deadline if it has passed at `now`
    pub fn due(&self, now: Instant) -> Option<TimerToken> {
        self.armed
            .filter(|armed| now >= armed.deadline)
            .map(|armed| armed.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_due() {
        let mut timer = TurnTimer::new();
        let now = Instant::now();
        let token = timer.arm(now, Duration::from_secs(5)).unwrap();
        assert_eq!(timer.due(now), None);
        assert_eq!(timer.due(now + Duration::from_secs(5)), Some(token));
    }

    #[test]
    fn test_rearm_invalidates_previous_token() {
        let mut timer = TurnTimer::new();
        let now = Instant::now();
        let first = timer.arm(now, Duration::from_secs(5)).unwrap();
        let second = timer.arm(now, Duration::from_secs(5)).unwrap();
        assert_ne!(first, second);
        assert!(!timer.is_current(first));
        assert!(timer.is_current(second));
    }

    #[test]
    fn test_shutdown_is_permanent() {
        let mut timer = TurnTimer::new();
        let now = Instant::now();
        let token = timer.arm(now, Duration::from_secs(1)).unwrap();
        timer.shutdown();
        assert!(!timer.is_current(token));
        assert_eq!(timer.due(now + Duration::from_secs(10)), None);
        assert_eq!(timer.arm(now, Duration::from_secs(1)), None);
        assert_eq!(timer.deadline(), None);
    }
}
