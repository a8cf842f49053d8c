//! Quota data types

use serde::{Deserialize, Serialize};

/// Daily prompt cap for metered users
pub const DAILY_PROMPT_LIMIT: u32 = 3;

/// Monthly prompt cap for metered users
pub const MONTHLY_PROMPT_LIMIT: u32 = 15;

/// Limit value reported for unlimited plans; never compared against usage
pub const UNLIMITED_SENTINEL: u32 = 999;

/// Subscription plan tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanTier {
    /// Metered plan subject to daily and monthly caps
    #[default]
    #[serde(rename = "personal")]
    Personal,
    /// Unlimited plan exempt from prompt caps
    #[serde(rename = "personal-plus")]
    PersonalPlus,
}

impl PlanTier {
    /// Map a stored preference value to a tier.
    ///
    /// Only the exact `personal-plus` string grants the unlimited tier;
    /// a missing or unrecognized value falls back to the metered default.
    pub fn from_plan_str(plan: Option<&str>) -> Self {
        match plan {
            Some("personal-plus") => Self::PersonalPlus,
            _ => Self::Personal,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::PersonalPlus)
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::PersonalPlus => write!(f, "personal-plus"),
        }
    }
}

/// Prompt caps for a tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptLimits {
    pub daily: u32,
    pub monthly: u32,
}

impl PromptLimits {
    /// Get limits for a given tier
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Personal => Self {
                daily: DAILY_PROMPT_LIMIT,
                monthly: MONTHLY_PROMPT_LIMIT,
            },
            PlanTier::PersonalPlus => Self {
                daily: UNLIMITED_SENTINEL,
                monthly: UNLIMITED_SENTINEL,
            },
        }
    }
}

/// Counters read from the ledger for the current reference day and month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptUsage {
    pub daily_used: u32,
    pub monthly_used: u32,
}

/// One persisted day-record, keyed by `(user_id, date)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Calendar day in the reference timezone, `YYYY-MM-DD`
    pub date: String,
    pub daily_prompts_used: u32,
    pub monthly_prompts_used: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Outcome of a quota evaluation, shaped for direct display
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDecision {
    pub daily_used: u32,
    pub monthly_used: u32,
    pub daily_limit: u32,
    pub monthly_limit: u32,
    pub can_use_prompt: bool,
}

impl QuotaDecision {
    /// Which limit blocked the prompt, if any.
    ///
    /// Daily takes precedence when both are exhausted so the upgrade prompt
    /// names the cap the user will hit again first.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        if self.can_use_prompt {
            return None;
        }
        if self.daily_used >= self.daily_limit {
            Some(DenialReason::DailyLimitReached {
                limit: self.daily_limit,
                used: self.daily_used,
            })
        } else {
            Some(DenialReason::MonthlyLimitReached {
                limit: self.monthly_limit,
                used: self.monthly_used,
            })
        }
    }
}

/// Which cap a denied prompt ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum DenialReason {
    #[serde(rename = "dailyLimitReached")]
    DailyLimitReached { limit: u32, used: u32 },
    #[serde(rename = "monthlyLimitReached")]
    MonthlyLimitReached { limit: u32, used: u32 },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyLimitReached { limit, used } => {
                write!(f, "Daily prompt limit reached: {}/{} used", used, limit)
            }
            Self::MonthlyLimitReached { limit, used } => {
                write!(f, "Monthly prompt limit reached: {}/{} used", used, limit)
            }
        }
    }
}
