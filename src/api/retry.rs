use std::time::Duration;

/// What the fetch loop does after an upstream attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Succeed,
    Retry(Duration),
    Fail,
}

/// Outcome of a single attempt, as seen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Status { code: u16, retry_after: Option<Duration> },
    /// Connect/read failure before a status line was received.
    Transport,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed for 5xx gateway errors and transport failures.
    pub max_transient_retries: u32,
    pub transient_base_delay: Duration,
    /// Used when a 429 carries no `Retry-After` header.
    pub default_retry_after: Duration,
    pub min_retry_after: Duration,
    /// Give up after this many 429s in a row; `None` waits them out forever.
    pub max_rate_limited: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_transient_retries: 2,
            transient_base_delay: Duration::from_millis(500),
            default_retry_after: Duration::from_secs(2),
            min_retry_after: Duration::from_secs(1),
            max_rate_limited: None,
        }
    }
}

impl RetryPolicy {
    /// Zero delays everywhere; for tests that script upstream failures.
    pub fn immediate() -> Self {
        RetryPolicy {
            transient_base_delay: Duration::ZERO,
            default_retry_after: Duration::ZERO,
            min_retry_after: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    pub fn rate_limit_exhausted(&self, rate_limited: u32) -> bool {
        self.max_rate_limited.is_some_and(|max| rate_limited > max)
    }

    /// `transient_attempt` counts 5xx/transport attempts so far (1-based);
    /// 429 responses never advance it.
    pub fn decide(&self, attempt: Attempt, transient_attempt: u32) -> RetryDecision {
        match attempt {
            Attempt::Status { code, .. } if (200..300).contains(&code) => RetryDecision::Succeed,
            Attempt::Status { code: 429, retry_after } => {
                let wait = retry_after.unwrap_or(self.default_retry_after);
                RetryDecision::Retry(wait.max(self.min_retry_after))
            }
            Attempt::Status { code: 502 | 503 | 504, .. } | Attempt::Transport => {
                if transient_attempt <= self.max_transient_retries {
                    RetryDecision::Retry(self.transient_base_delay * transient_attempt)
                } else {
                    RetryDecision::Fail
                }
            }
            Attempt::Status { .. } => RetryDecision::Fail,
        }
    }
}
