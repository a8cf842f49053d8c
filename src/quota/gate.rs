//! Quota enforcement for AI prompts
//!
//! The decision function consulted before every AI request: combines ledger
//! counters with the caller's plan tier into an allow/deny decision shaped
//! for display, and owns the single mutating entry point that records a
//! consumed prompt.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::ledger::UsageLedger;
use super::plan::PlanResolver;
use super::types::{PlanTier, PromptLimits, PromptUsage, QuotaDecision};

/// Quota gate over the ledger and plan resolver
pub struct QuotaGate {
    ledger: Arc<UsageLedger>,
    plans: Arc<PlanResolver>,
    /// Allows `purge_user`; wired from an operator setting, never from user input
    admin_reset_enabled: bool,
}

impl QuotaGate {
    pub fn new(
        ledger: Arc<UsageLedger>,
        plans: Arc<PlanResolver>,
        admin_reset_enabled: bool,
    ) -> Self {
        Self {
            ledger,
            plans,
            admin_reset_enabled,
        }
    }

    /// Current quota decision for a user.
    ///
    /// Unlimited plans short-circuit without touching the ledger. For
    /// metered plans a ledger read failure degrades to the optimistic
    /// default rather than blocking the session; the next successful read
    /// restores real counters.
    pub fn evaluate(&self, user_id: &str) -> QuotaDecision {
        let tier = self.plans.resolve(user_id);
        if tier.is_unlimited() {
            let limits = PromptLimits::for_tier(tier);
            return QuotaDecision {
                daily_used: 0,
                monthly_used: 0,
                daily_limit: limits.daily,
                monthly_limit: limits.monthly,
                can_use_prompt: true,
            };
        }
        self.evaluate_metered(user_id)
    }

    /// Consume one prompt if the quota allows it.
    ///
    /// Denied prompts leave the ledger untouched and return `Ok(false)`.
    /// A failed usage write is surfaced as `Err` so the caller can report
    /// it instead of silently under-counting. Call exactly once per
    /// permitted prompt.
    pub fn try_consume(&self, user_id: &str) -> Result<bool, String> {
        let tier = self.plans.resolve(user_id);
        if tier.is_unlimited() {
            return Ok(true);
        }

        let decision = self.evaluate_metered(user_id);
        if !decision.can_use_prompt {
            if let Some(reason) = decision.denial_reason() {
                debug!(user = user_id, "Prompt denied: {}", reason);
            }
            return Ok(false);
        }

        self.ledger.record_increment(user_id)?;
        Ok(true)
    }

    /// Delete all usage records for a user.
    ///
    /// Operator affordance for debugging and support; refused unless the
    /// gate was constructed with admin resets enabled.
    pub fn purge_user(&self, user_id: &str) -> Result<usize, String> {
        if !self.admin_reset_enabled {
            return Err("Usage reset requires admin mode".to_string());
        }
        let removed = self.ledger.purge_user(user_id)?;
        info!(user = user_id, removed, "Reset prompt usage");
        Ok(removed)
    }

    fn evaluate_metered(&self, user_id: &str) -> QuotaDecision {
        let limits = PromptLimits::for_tier(PlanTier::Personal);
        let usage = match self.ledger.fetch_usage(user_id) {
            Ok(usage) => usage,
            Err(e) => {
                warn!(user = user_id, "Usage read failed, allowing: {}", e);
                PromptUsage::default()
            }
        };

        QuotaDecision {
            daily_used: usage.daily_used,
            monthly_used: usage.monthly_used,
            daily_limit: limits.daily,
            monthly_limit: limits.monthly,
            can_use_prompt: usage.daily_used < limits.daily && usage.monthly_used < limits.monthly,
        }
    }
}
