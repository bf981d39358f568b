use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
pub struct ThrottleSettings {
    /// Failed attempts allowed inside one window
    pub max_failures: u32,
    pub window: Duration,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::minutes(15),
        }
    }
}

/// Tracked accounts past which expired entries are swept on every failure
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Failures {
    count: u32,
    since: DateTime<Utc>,
}

/// Counts failed logins per account and refuses further attempts once
/// an account exceeds its allowance for the current window.
#[derive(Debug)]
pub struct LoginThrottle {
    settings: ThrottleSettings,
    failures: DashMap<String, Failures>,
}

impl LoginThrottle {
    pub fn new(settings: ThrottleSettings) -> Self {
        Self {
            settings,
            failures: DashMap::new(),
        }
    }

    fn key(account: &str) -> String {
        account.trim().to_lowercase()
    }

    /// Returns how long to wait if the account is locked out
    pub fn check(&self, account: &str) -> Result<(), Duration> {
        self.check_at(account, Utc::now())
    }

    fn check_at(&self, account: &str, now: DateTime<Utc>) -> Result<(), Duration> {
        let key = Self::key(account);

        let Some(failures) = self.failures.get(&key).map(|f| *f) else {
            return Ok(());
        };

        let window_end = failures.since + self.settings.window;

        if now >= window_end {
            self.failures.remove(&key);
            return Ok(());
        }

        if failures.count >= self.settings.max_failures {
            return Err(window_end - now);
        }

        Ok(())
    }

    pub fn record_failure(&self, account: &str) {
        self.record_failure_at(account, Utc::now())
    }

    fn record_failure_at(&self, account: &str, now: DateTime<Utc>) {
        let window = self.settings.window;

        if self.failures.len() >= SWEEP_THRESHOLD {
            self.failures.retain(|_, f| now < f.since + window);
        }

        self.failures
            .entry(Self::key(account))
            .and_modify(|f| {
                if now >= f.since + window {
                    *f = Failures {
                        count: 1,
                        since: now,
                    };
                } else {
                    f.count += 1;
                }
            })
            .or_insert(Failures {
                count: 1,
                since: now,
            });
    }

    pub fn clear(&self, account: &str) {
        self.failures.remove(&Self::key(account));
    }
}
