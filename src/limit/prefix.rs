use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::bucket::Limiter;
use super::multi::RateLimit;
use super::rate::per;
use super::tree::PrefixTree;
use crate::error::{ConfigError, LimitError};

/// One path rule: `quantum` permits every `fill_interval`, bursting to `capacity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Path prefix, e.g. `/api/v1/users`.
    pub key: String,
    /// Refill period.
    pub fill_interval: Duration,
    /// Bucket size.
    pub capacity: u32,
    /// Permits added per `fill_interval`.
    pub quantum: u32,
}

impl Rule {
    pub fn new(key: impl Into<String>, fill_interval: Duration, capacity: u32, quantum: u32) -> Self {
        Self {
            key: key.into(),
            fill_interval,
            capacity,
            quantum,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let reason = if self.key.trim().is_empty() {
            "empty key"
        } else if self.fill_interval.is_zero() {
            "zero fill interval"
        } else if self.quantum == 0 {
            "zero quantum"
        } else if self.capacity == 0 {
            "zero capacity"
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidRule {
            key: self.key.clone(),
            reason,
        })
    }
}

struct Entry {
    key: Arc<str>,
    limiter: Arc<Limiter>,
}

/// # Path-based limiter resolution.
///
/// Every rule gets its own [`Limiter`]. A request path resolves to the rule
/// with the longest registered prefix; the query string is ignored, as are
/// empty segments (`//api/` equals `/api`).
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use wardkit::{PrefixLimiter, Rule};
///
/// let mut limits = PrefixLimiter::new();
/// limits
///     .add_rule(Rule::new("/api", Duration::from_secs(1), 100, 100))
///     .unwrap()
///     .add_rule(Rule::new("/api/login", Duration::from_secs(60), 5, 5))
///     .unwrap();
///
/// assert_eq!(limits.resolve("/api/login?next=/home"), Some("/api/login"));
/// assert_eq!(limits.resolve("/api/orders/17"), Some("/api"));
/// assert_eq!(limits.resolve("/health"), None);
/// ```
#[derive(Default)]
pub struct PrefixLimiter {
    tree: PrefixTree<usize>,
    entries: Vec<Entry>,
}

impl PrefixLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a limiter from `rules`, stopping at the first bad one.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, ConfigError> {
        let mut limits = Self::new();
        for rule in rules {
            limits.add_rule(rule)?;
        }
        Ok(limits)
    }

    /// Registers `rule`; duplicate paths and invalid rules are rejected.
    pub fn add_rule(&mut self, rule: Rule) -> Result<&mut Self, ConfigError> {
        rule.check()?;
        if self.tree.contains(segments(&rule.key)) {
            return Err(ConfigError::DuplicateRule { key: rule.key });
        }
        let limiter = Limiter::new(per(rule.quantum, rule.fill_interval), rule.capacity)?;

        self.tree.insert(segments(&rule.key), self.entries.len());
        self.entries.push(Entry {
            key: rule.key.into(),
            limiter: Arc::new(limiter),
        });
        Ok(self)
    }

    /// Key of the rule governing `path`.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.entry(path).map(|e| e.key.as_ref())
    }

    /// Limiter governing `path`.
    pub fn limiter(&self, path: &str) -> Option<Arc<Limiter>> {
        self.entry(path).map(|e| Arc::clone(&e.limiter))
    }

    /// Waits on the limiter governing `path`; unmatched paths pass through.
    pub async fn wait(&self, ctx: &CancellationToken, path: &str) -> Result<(), LimitError> {
        match self.entry(path) {
            Some(e) => e.limiter.wait(ctx).await,
            None if ctx.is_cancelled() => Err(LimitError::Canceled),
            None => Ok(()),
        }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, path: &str) -> Option<&Entry> {
        let idx = *self.tree.get(segments(path))?;
        self.entries.get(idx)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn limits() -> PrefixLimiter {
        PrefixLimiter::from_rules([
            Rule::new("/api", Duration::from_secs(1), 10, 10),
            Rule::new("/api/v1/users", Duration::from_millis(500), 1, 1),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_by_longest_prefix() {
        let l = limits();
        assert_eq!(l.resolve("/api/v1/users/42?expand=all"), Some("/api/v1/users"));
        assert_eq!(l.resolve("//api///v1/users"), Some("/api/v1/users"));
        assert_eq!(l.resolve("/api/v1"), Some("/api"));
        assert_eq!(l.resolve("/apix"), None);
        assert_eq!(l.resolve("/"), None);
        assert_eq!(l.limiter("/api/v1/users").map(|l| l.burst()), Some(1));
    }

    #[test]
    fn rejects_duplicates_and_bad_rules() {
        let mut l = limits();
        assert_eq!(
            l.add_rule(Rule::new("api/", Duration::from_secs(1), 1, 1)).err(),
            Some(ConfigError::DuplicateRule { key: "api/".into() })
        );
        let bad = [
            (Rule::new(" ", Duration::from_secs(1), 1, 1), "empty key"),
            (Rule::new("/a", Duration::ZERO, 1, 1), "zero fill interval"),
            (Rule::new("/b", Duration::from_secs(1), 1, 0), "zero quantum"),
            (Rule::new("/c", Duration::from_secs(1), 0, 1), "zero capacity"),
        ];
        for (rule, why) in bad {
            let key = rule.key.clone();
            assert_eq!(
                l.add_rule(rule).err(),
                Some(ConfigError::InvalidRule { key, reason: why })
            );
        }
        assert_eq!(l.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_uses_the_resolved_limiter() {
        let l = limits();
        let ctx = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..3 {
            l.wait(&ctx, "/api/v1/users/1").await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_secs(1));

        let start = Instant::now();
        for _ in 0..10 {
            l.wait(&ctx, "/api/orders").await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn unmatched_paths_pass_unless_cancelled() {
        let l = limits();
        let ctx = CancellationToken::new();
        assert_eq!(l.wait(&ctx, "/health").await, Ok(()));
        ctx.cancel();
        assert_eq!(l.wait(&ctx, "/health").await, Err(LimitError::Canceled));
    }
}
