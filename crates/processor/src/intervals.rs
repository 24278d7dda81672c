//! Review interval reconstruction
//!
//! Walks the ordered events of one PR and pairs every review with the open
//! request for the same reviewer. Each pair becomes a latency sample in
//! working minutes, unless it falls outside the accepted bounds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::models::{EventKind, LatencySample, TimelineEvent, WorkItemId};
use common::LatencyPolicy;
use tracing::info;

use crate::calendar::Calendar;

/// Open review requests, at most one per reviewer
#[derive(Debug, Default)]
pub struct ReviewRequests {
    open: HashMap<String, DateTime<Utc>>,
}

impl ReviewRequests {
    /// Open a request, replacing any request already open for the reviewer
    pub fn request(&mut self, reviewer: &str, at: DateTime<Utc>) {
        self.open.insert(reviewer.to_string(), at);
    }

    /// Drop the open request, if any
    pub fn remove(&mut self, reviewer: &str) {
        self.open.remove(reviewer);
    }

    /// Close the open request and return when it was made
    pub fn answer(&mut self, reviewer: &str) -> Option<DateTime<Utc>> {
        self.open.remove(reviewer)
    }

    pub fn is_open(&self, reviewer: &str) -> bool {
        self.open.contains_key(reviewer)
    }
}

/// What happens to a measured review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Request and review both fell outside working hours
    OutsideWorkingHours,
    Outlier,
}

pub fn judge(minutes: i64, policy: &LatencyPolicy) -> Verdict {
    if minutes == 0 {
        Verdict::OutsideWorkingHours
    } else if minutes < policy.min_review_minutes || minutes > policy.max_review_minutes {
        Verdict::Outlier
    } else {
        Verdict::Accept
    }
}

/// Latency samples of one PR from its ordered review events
pub fn reconstruct(
    calendar: &Calendar,
    policy: &LatencyPolicy,
    work_item: &WorkItemId,
    events: &[TimelineEvent],
) -> Vec<LatencySample> {
    let mut requests = ReviewRequests::default();
    let mut samples = Vec::new();

    for event in events {
        if event.is_terminal() {
            break;
        }
        let Some(reviewer) = event.reviewer.as_deref() else {
            continue;
        };

        match event.kind {
            EventKind::Requested => requests.request(reviewer, event.at),
            EventKind::Removed => requests.remove(reviewer),
            EventKind::Reviewed => {
                let Some(requested_at) = requests.answer(reviewer) else {
                    info!("non-requested review from {} on {}", reviewer, work_item);
                    continue;
                };

                let minutes = calendar.working_minutes_between(requested_at, event.at);
                match judge(minutes, policy) {
                    Verdict::Accept => samples.push(LatencySample {
                        reviewer: reviewer.to_string(),
                        work_item: work_item.clone(),
                        minutes,
                        review_at: event.at,
                    }),
                    Verdict::OutsideWorkingHours => info!(
                        "non-working-time review from {} on {}, excluded",
                        reviewer, work_item
                    ),
                    Verdict::Outlier => info!(
                        "outlier from {} on {}: {} minutes",
                        reviewer, work_item, minutes
                    ),
                }
            }
            EventKind::Merged | EventKind::Closed => {}
        }
    }

    samples
}
