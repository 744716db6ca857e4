//! Eligibility rules for bridging a note.
//!
//! Rules are applied in order and the first match rejects:
//! 1. already bridged or currently in flight
//! 2. created before the cutoff fixed at startup
//! 3. tagged as a reply or mention
//!
//! Anything else is bridged.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::common::SourceEvent;

use super::dedup::DedupStore;
use super::state::{InFlightGuard, InFlightSet};

/// Why an event was not bridged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Already published, or being published by another task.
    AlreadyHandled,
    /// Older than the startup cutoff.
    TooOld,
    /// References another event or a person.
    Reply,
}

/// Apply the rules to one event.
///
/// `cutoff` is inclusive: an event created exactly at the cutoff is accepted.
/// Returns `None` when the event should be bridged.
pub fn evaluate(event: &SourceEvent, cutoff: u64, already_handled: bool) -> Option<RejectReason> {
    if already_handled {
        Some(RejectReason::AlreadyHandled)
    } else if event.created_at < cutoff {
        Some(RejectReason::TooOld)
    } else if event.is_reply_or_mention() {
        Some(RejectReason::Reply)
    } else {
        None
    }
}

/// Stateless eligibility check against the shared sets.
///
/// Does not claim the id; use [`EventFilter::admit`] to check and claim.
#[cfg(test)]
pub fn should_bridge(
    event: &SourceEvent,
    now: u64,
    age_threshold_secs: u64,
    dedup: &DedupStore,
    in_flight: &InFlightSet,
) -> bool {
    let already_handled = dedup.is_processed(&event.id) || in_flight.contains(&event.id);
    evaluate(event, now.saturating_sub(age_threshold_secs), already_handled).is_none()
}

/// Event filter with a fixed age cutoff and log de-duplication.
#[derive(Debug)]
pub struct EventFilter {
    cutoff: u64,
    max_age_secs: u64,
    /// (reason, event id) pairs already logged.
    logged: Mutex<HashSet<(RejectReason, String)>>,
}

impl EventFilter {
    /// Create a filter whose cutoff is `started_at - max_age_secs`.
    ///
    /// The cutoff does not slide: backlog and live events are judged against
    /// the same instant for the lifetime of the process.
    pub fn new(started_at: u64, max_age_secs: u64) -> Self {
        Self {
            cutoff: started_at.saturating_sub(max_age_secs),
            max_age_secs,
            logged: Mutex::new(HashSet::new()),
        }
    }

    pub fn cutoff(&self) -> u64 {
        self.cutoff
    }

    /// Check `event` and claim it in `in_flight` if it should be bridged.
    ///
    /// The dedup lookup, the rules and the claim happen under the in-flight
    /// lock, so two deliveries of the same id cannot both be admitted.
    pub fn admit(
        &self,
        relay: &str,
        event: &SourceEvent,
        dedup: &DedupStore,
        in_flight: &Arc<InFlightSet>,
    ) -> Option<InFlightGuard> {
        let claim = in_flight.try_claim_with(&event.id, |is_in_flight| {
            let already_handled = is_in_flight || dedup.is_processed(&event.id);
            match evaluate(event, self.cutoff, already_handled) {
                Some(reason) => Err(reason),
                None => Ok(()),
            }
        });

        match claim {
            Ok(guard) => Some(guard),
            Err(reason) => {
                self.log_rejection(relay, event, reason);
                None
            }
        }
    }

    /// Log a rejection; repeats for the same id and reason are dropped.
    fn log_rejection(&self, relay: &str, event: &SourceEvent, reason: RejectReason) {
        if reason == RejectReason::Reply {
            debug!(relay, event_id = %event.id, "Skipping kind 1 reply or mention");
            return;
        }

        let first_time = self
            .logged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((reason, event.id.clone()));
        if !first_time {
            return;
        }

        match reason {
            RejectReason::AlreadyHandled => info!(
                relay,
                event_id = %event.id,
                "Skipping already bridged event: \"{}\"",
                event.preview()
            ),
            RejectReason::TooOld => info!(
                relay,
                event_id = %event.id,
                "Skipping event {}: \"{}\"",
                self.age_limit(),
                event.preview()
            ),
            RejectReason::Reply => {}
        }
    }

    /// Human-readable age limit for log lines.
    fn age_limit(&self) -> String {
        format!(
            "older than {}s (created before unix time {})",
            self.max_age_secs, self.cutoff
        )
    }

    #[cfg(test)]
    fn logged_count(&self) -> usize {
        self.logged.lock().unwrap().len()
    }
}
