//! Nostr to Mastodon bridge core.
//!
//! Everything between "a relay delivered a note" and "the note is on
//! Mastodon and recorded": eligibility, de-duplication and the per-note
//! processing flow.
//!
//! ## Module Structure
//!
//! - `channels`: Relay -> orchestrator notification channel and shutdown signal
//! - `dedup`: Persistent set of bridged event ids (`DedupStore`)
//! - `filter`: Eligibility rules and admission (`EventFilter`)
//! - `orchestrator`: Main bridge orchestrator (`Bridge` struct)
//! - `state`: In-flight claims (`InFlightSet`, `InFlightGuard`)

pub mod channels;
pub mod dedup;
pub mod filter;
pub mod orchestrator;
pub mod state;

// Re-export main types for convenience
pub use channels::{ChannelBundle, SourceNotification};
pub use dedup::DedupStore;
pub use filter::EventFilter;
pub use orchestrator::Bridge;
