//! Prompt metering module
//!
//! This module handles:
//! - Durable per-user-per-day prompt counters (usage ledger)
//! - Subscription plan resolution with local caching
//! - Allow/deny quota decisions ahead of every AI request

mod gate;
mod ledger;
mod plan;
mod prefs;
mod types;

pub use gate::QuotaGate;
pub use ledger::UsageLedger;
pub use plan::PlanResolver;
pub use prefs::PreferenceStore;
pub use types::{
    DenialReason, PlanTier, PromptLimits, PromptUsage, QuotaDecision, UsageRecord,
    DAILY_PROMPT_LIMIT, MONTHLY_PROMPT_LIMIT, UNLIMITED_SENTINEL,
};

use std::path::Path;
use std::sync::Arc;

use crate::clock::Clock;

/// Metering state owned by the application shell
pub struct QuotaState {
    pub ledger: Arc<UsageLedger>,
    pub prefs: Arc<PreferenceStore>,
    pub plans: Arc<PlanResolver>,
    pub gate: QuotaGate,
}

impl QuotaState {
    /// Create metering state using the default data location
    pub fn new(clock: Arc<dyn Clock>, admin_reset_enabled: bool) -> Result<Self, String> {
        let ledger = Arc::new(UsageLedger::open_default(clock)?);
        let prefs = Arc::new(PreferenceStore::open_default()?);
        Ok(Self::wire(ledger, prefs, admin_reset_enabled))
    }

    /// Create metering state with databases under an explicit directory
    pub fn open_in<P: AsRef<Path>>(
        data_dir: P,
        clock: Arc<dyn Clock>,
        admin_reset_enabled: bool,
    ) -> Result<Self, String> {
        let data_dir = data_dir.as_ref();
        let ledger = Arc::new(UsageLedger::open(data_dir.join("usage.db"), clock)?);
        let prefs = Arc::new(PreferenceStore::open(data_dir.join("preferences.db"))?);
        Ok(Self::wire(ledger, prefs, admin_reset_enabled))
    }

    fn wire(
        ledger: Arc<UsageLedger>,
        prefs: Arc<PreferenceStore>,
        admin_reset_enabled: bool,
    ) -> Self {
        let plans = Arc::new(PlanResolver::new(Arc::clone(&prefs)));
        let gate = QuotaGate::new(
            Arc::clone(&ledger),
            Arc::clone(&plans),
            admin_reset_enabled,
        );
        Self {
            ledger,
            prefs,
            plans,
            gate,
        }
    }
}
