use serde::{Deserialize, Serialize};

use crate::errors::{LoanError, Result};
use crate::types::ResharePolicy;

/// default ceiling on loan terms (100 years)
pub const DEFAULT_MAX_TERM_MONTHS: u32 = 1200;

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// what sharing an already-shared loan does
    pub reshare_policy: ResharePolicy,
    /// memoize schedules by loan id
    pub cache_schedules: bool,
    /// longest term accepted by create_loan
    pub max_term_months: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reshare_policy: ResharePolicy::Reject,
            cache_schedules: true,
            max_term_months: DEFAULT_MAX_TERM_MONTHS,
        }
    }
}

impl LedgerConfig {
    /// reject duplicate shares, mortgage-length ceiling on terms
    pub fn strict() -> Self {
        Self {
            reshare_policy: ResharePolicy::Reject,
            cache_schedules: true,
            max_term_months: 480,
        }
    }

    /// duplicate shares are no-ops
    pub fn lenient() -> Self {
        Self {
            reshare_policy: ResharePolicy::Ignore,
            ..Self::default()
        }
    }

    /// parse and validate a json document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_term_months == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "max_term_months must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_reshare_policy(mut self, policy: ResharePolicy) -> Self {
        self.reshare_policy = policy;
        self
    }

    pub fn with_schedule_cache(mut self, enabled: bool) -> Self {
        self.cache_schedules = enabled;
        self
    }

    pub fn with_max_term_months(mut self, months: u32) -> Self {
        self.max_term_months = months;
        self
    }
}
