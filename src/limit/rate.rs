use std::fmt;
use std::time::Duration;

/// Events per second.
///
/// [`Limit::INF`] disables limiting; `Limit::new(0.0)` never refills.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Limit(f64);

impl Limit {
    /// No limit at all.
    pub const INF: Limit = Limit(f64::INFINITY);

    /// Rate of `per_second` events per second.
    pub const fn new(per_second: f64) -> Self {
        Self(per_second)
    }

    /// One event every `interval`; a zero interval is [`Limit::INF`].
    pub fn every(interval: Duration) -> Self {
        if interval.is_zero() {
            return Self::INF;
        }
        Self(1.0 / interval.as_secs_f64())
    }

    /// Events per second as a float.
    pub fn per_second(self) -> f64 {
        self.0
    }

    pub fn is_inf(self) -> bool {
        self.0 == f64::INFINITY
    }

    /// Time needed to accumulate `tokens` at this rate.
    pub(crate) fn duration_for(self, tokens: f64) -> Duration {
        if tokens <= 0.0 || self.is_inf() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(tokens / self.0).unwrap_or(Duration::MAX)
    }

    /// Tokens accumulated over `elapsed` at this rate.
    pub(crate) fn tokens_for(self, elapsed: Duration) -> f64 {
        elapsed.as_secs_f64() * self.0
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inf() {
            f.write_str("inf")
        } else {
            write!(f, "{}/s", self.0)
        }
    }
}

/// Rate of `n` events per `interval`.
///
/// ```
/// use std::time::Duration;
/// use wardkit::{Limit, per};
///
/// assert_eq!(per(10, Duration::from_secs(1)), Limit::new(10.0));
/// assert_eq!(per(3, Duration::ZERO), Limit::INF);
/// ```
pub fn per(n: u32, interval: Duration) -> Limit {
    if interval.is_zero() {
        return Limit::INF;
    }
    Limit(f64::from(n) / interval.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_and_per_agree() {
        assert_eq!(Limit::every(Duration::from_millis(100)), per(10, Duration::from_secs(1)));
        assert_eq!(per(0, Duration::from_secs(1)), Limit::new(0.0));
        assert!(Limit::every(Duration::ZERO).is_inf());
    }

    #[test]
    fn durations_follow_the_rate() {
        let two_per_sec = Limit::new(2.0);
        assert_eq!(two_per_sec.duration_for(1.0), Duration::from_millis(500));
        assert_eq!(two_per_sec.duration_for(-1.0), Duration::ZERO);
        assert_eq!(Limit::INF.duration_for(5.0), Duration::ZERO);
        assert_eq!(Limit::new(0.0).duration_for(1.0), Duration::MAX);
        assert_eq!(two_per_sec.tokens_for(Duration::from_secs(3)), 6.0);
    }

    #[test]
    fn limits_order_by_rate() {
        assert!(Limit::new(1.0) < Limit::new(2.0));
        assert!(Limit::new(1e9) < Limit::INF);
        assert_eq!(Limit::new(2.5).to_string(), "2.5/s");
    }
}
