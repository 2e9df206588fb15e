//! Per user and command rate limiting
//!
//! Each `(user, command)` pair may run once per window. A rejected attempt
//! does not refresh the window.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Entries are swept once the map grows past this many pairs
const SWEEP_THRESHOLD: usize = 4096;

/// Rejection with the time left in the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds left, counting a started second as elapsed.
    pub fn retry_after_secs(&self, window: Duration) -> u64 {
        let elapsed = window.saturating_sub(self.retry_after);
        window.as_secs().saturating_sub(elapsed.as_secs())
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    last_seen: HashMap<(String, String), Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records an invocation at `now` or rejects it.
    pub fn check(&mut self, user: &str, command: &str, now: Instant) -> Result<(), RateLimited> {
        if self.last_seen.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let key = (user.to_string(), command.to_string());
        if let Some(last) = self.last_seen.get(&key) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.window {
                return Err(RateLimited {
                    retry_after: self.window - elapsed,
                });
            }
        }

        self.last_seen.insert(key, now);
        Ok(())
    }

    /// Drops pairs whose window has passed.
    pub fn sweep(&mut self, now: Instant) {
        let window = self.window;
        self.last_seen
            .retain(|_, last| now.saturating_duration_since(*last) < window);
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    #[test]
    fn test_first_call_allowed() {
        let mut limiter = RateLimiter::new(WINDOW);
        assert!(limiter.check("u1", "rota 100", Instant::now()).is_ok());
    }

    #[test]
    fn test_second_call_within_window_rejected() {
        let mut limiter = RateLimiter::new(WINDOW);
        let t0 = Instant::now();
        limiter.check("u1", "rota 100", t0).unwrap();

        let rejected = limiter
            .check("u1", "rota 100", t0 + Duration::from_millis(10_400))
            .unwrap_err();
        assert_eq!(rejected.retry_after, Duration::from_millis(19_600));
        assert_eq!(rejected.retry_after_secs(WINDOW), 20);
    }

    #[test]
    fn test_rejection_does_not_extend_window() {
        let mut limiter = RateLimiter::new(WINDOW);
        let t0 = Instant::now();
        limiter.check("u1", "rotas", t0).unwrap();
        limiter.check("u1", "rotas", t0 + Duration::from_secs(29)).unwrap_err();

        assert!(limiter.check("u1", "rotas", t0 + WINDOW).is_ok());
    }

    #[test]
    fn test_pairs_are_independent() {
        let mut limiter = RateLimiter::new(WINDOW);
        let t0 = Instant::now();
        limiter.check("u1", "rotas", t0).unwrap();

        assert!(limiter.check("u2", "rotas", t0).is_ok());
        assert!(limiter.check("u1", "ajuda", t0).is_ok());
    }

    #[test]
    fn test_sweep_drops_expired() {
        let mut limiter = RateLimiter::new(WINDOW);
        let t0 = Instant::now();
        limiter.check("u1", "a", t0).unwrap();
        limiter.check("u2", "a", t0 + Duration::from_secs(20)).unwrap();

        limiter.sweep(t0 + Duration::from_secs(35));
        assert_eq!(limiter.tracked(), 1);
    }
}
