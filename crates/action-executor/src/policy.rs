use serde::{Deserialize, Serialize};
use std::time::Duration;

use nav_arbiter::ArbiterConfig;

use crate::model::ActionOpt;

/// Executor defaults, overridable per action through [`ActionOpt`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionPolicy {
    pub default_timeout_ms: u64,
    pub arbiter: ArbiterConfig,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            arbiter: ArbiterConfig::default(),
        }
    }
}

impl ActionPolicy {
    /// The configured deadline for one action; this exact value also appears
    /// in the timeout error message.
    pub fn timeout_for(&self, opt: &ActionOpt) -> Duration {
        Duration::from_millis(opt.timeout_ms.unwrap_or(self.default_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_action_timeout_overrides_default() {
        let policy = ActionPolicy::default();
        assert_eq!(
            policy.timeout_for(&ActionOpt::default()),
            Duration::from_millis(30_000)
        );
        let opt = ActionOpt {
            timeout_ms: Some(5000),
            no_wait_after: false,
        };
        assert_eq!(policy.timeout_for(&opt), Duration::from_millis(5000));
    }
}
