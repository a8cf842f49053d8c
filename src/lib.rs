//! Backend core for the Ada AP study app: prompt metering (usage ledger +
//! quota gate) and the AI tutor relay. The UI shell owns authentication and
//! presentation; it hands resolved user ids to the gate, refreshes the
//! quota decision it displays by explicit calls, and forwards permitted
//! prompts through the tutor client.

pub mod clock;
pub mod http_client;
pub mod quota;
pub mod tutor;

pub use clock::{Clock, SystemClock};
pub use quota::{QuotaDecision, QuotaGate, QuotaState};
pub use tutor::{TutorClient, TutorRequest};

use tracing_subscriber::EnvFilter;

/// Load environment configuration and install the tracing subscriber.
///
/// Call once at process start. Respects `RUST_LOG`; defaults to warnings
/// plus this crate's own info-level events.
pub fn init_telemetry() {
    // Load .env - during development the CWD may be the workspace root or a
    // member directory, so check the parent as a fallback
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,ada_tutor=info")),
        )
        .init();
}
