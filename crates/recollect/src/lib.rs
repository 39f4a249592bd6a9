//! Recollect - Hierarchical long-term memory for conversational assistants
//!
//! This crate maintains a per-user knowledge store and decides, turn by
//! turn, what to remember and what to recall. Retrieval and ingestion are
//! guided by an external reasoning oracle; the conversation itself is
//! tracked in a byte-bounded window of compressed turn summaries.

pub mod config;
pub mod error;
pub mod memory;
pub mod oracle;
pub mod session;
pub mod store;
pub mod testing;

pub use error::RecollectError;
pub use session::Session;
pub use store::KnowledgeStore;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a process-wide tracing subscriber with env-filter support.
///
/// Convenience for embedding processes; call once at startup. Honors
/// `RUST_LOG`, defaulting to `info` with crate-level debug.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recollect=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
