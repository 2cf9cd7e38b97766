use std::time::{Duration, Instant};

/// Non-blocking frame-rate limiter.
///
/// `ready` answers "has a full frame interval passed since the last accepted
/// frame?" against a caller-supplied monotonic timestamp. It never sleeps.
#[derive(Debug, Clone)]
pub struct FrameGate {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Gate running at `frame_rate` frames per second (minimum 1)
    pub fn with_rate(frame_rate: u32) -> Self {
        Self::new(Self::interval_for(frame_rate))
    }

    pub fn interval_for(frame_rate: u32) -> Duration {
        Duration::from_secs(1) / frame_rate.max(1)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Forget the last accepted frame so the next call is accepted
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Accept a frame at `now` if at least one interval has elapsed
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_is_accepted() {
        let mut gate = FrameGate::with_rate(60);
        assert!(gate.ready(Instant::now()));
    }

    #[test]
    fn test_fast_polling_steps_once_per_interval() {
        let mut gate = FrameGate::new(Duration::from_millis(50));
        let t0 = Instant::now();

        let accepted = (0..100)
            .map(|ms| t0 + Duration::from_millis(ms))
            .filter(|&t| gate.ready(t))
            .count();
        // 0, 50 within the first 100ms
        assert_eq!(accepted, 2);
    }

    #[test]
    fn test_exact_boundaries_step_every_call() {
        let interval = Duration::from_millis(16);
        let mut gate = FrameGate::new(interval);
        let t0 = Instant::now();

        for i in 0..10 {
            assert!(gate.ready(t0 + interval * i));
        }
    }

    #[test]
    fn test_reset_accepts_immediately() {
        let mut gate = FrameGate::new(Duration::from_secs(1));
        let t0 = Instant::now();
        assert!(gate.ready(t0));
        assert!(!gate.ready(t0));
        gate.reset();
        assert!(gate.ready(t0));
    }

    #[test]
    fn test_interval_for_rate() {
        assert_eq!(FrameGate::interval_for(20), Duration::from_millis(50));
        assert_eq!(FrameGate::interval_for(0), Duration::from_secs(1));
    }
}
