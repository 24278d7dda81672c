//! Timeline event classification
//!
//! Turns raw GitHub timeline records into typed [`TimelineEvent`]s. Records
//! that cannot take part in latency measurement are rejected here and never
//! reach interval reconstruction.

use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use common::models::{EventKind, TimelineEvent};
use common::RequestAttribution;
use github::RawTimelineEvent;
use thiserror::Error;
use tracing::debug;

/// Why a raw record was dropped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("unsupported event type {0}")]
    UnknownKind(String),
    #[error("event without a reviewer")]
    MissingReviewer,
    #[error("event without a usable timestamp")]
    MissingTimestamp,
}

fn kind_of(typename: &str) -> Option<EventKind> {
    match typename {
        "ReviewRequestedEvent" => Some(EventKind::Requested),
        "PullRequestReview" => Some(EventKind::Reviewed),
        "ReviewRequestRemovedEvent" => Some(EventKind::Removed),
        "MergedEvent" => Some(EventKind::Merged),
        "ClosedEvent" => Some(EventKind::Closed),
        _ => None,
    }
}

fn parse_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>, Rejection> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .ok_or(Rejection::MissingTimestamp)
}

/// Classify one raw record of a PR authored by `author`
pub fn classify(
    raw: &RawTimelineEvent,
    author: &str,
    attribution: RequestAttribution,
) -> Result<TimelineEvent, Rejection> {
    let kind = kind_of(&raw.typename).ok_or_else(|| Rejection::UnknownKind(raw.typename.clone()))?;

    let target = || {
        raw.requested_reviewer_login()
            .map(str::to_string)
            .ok_or(Rejection::MissingReviewer)
    };

    let reviewer = match kind {
        EventKind::Reviewed => Some(
            raw.author_login()
                .map(str::to_string)
                .ok_or(Rejection::MissingReviewer)?,
        ),
        EventKind::Removed => Some(target()?),
        EventKind::Requested => match attribution {
            RequestAttribution::AnyActor => Some(target()?),
            RequestAttribution::AuthorOnly if raw.actor_login() == Some(author) => Some(target()?),
            RequestAttribution::AuthorOnly => None,
        },
        EventKind::Merged | EventKind::Closed => None,
    };

    let at = match kind {
        EventKind::Reviewed => parse_timestamp(raw.submitted_at.as_deref())?,
        _ => parse_timestamp(raw.created_at.as_deref())?,
    };

    Ok(TimelineEvent { kind, reviewer, at })
}

/// Classify a whole timeline.
///
/// Rejected records are dropped, the rest are ordered by time (ties keep the
/// API order) and the sequence ends with the first merge or close.
pub fn review_events(
    raw: &[RawTimelineEvent],
    author: &str,
    attribution: RequestAttribution,
) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = raw
        .iter()
        .filter_map(|r| match classify(r, author, attribution) {
            Ok(event) => Some(event),
            Err(rejection) => {
                debug!("Dropping {} record: {}", r.typename, rejection);
                None
            }
        })
        .collect();
    events.sort_by_key(|e| e.at);

    let scan = events.into_iter().try_fold(Vec::new(), |mut acc, event| {
        let terminal = event.is_terminal();
        acc.push(event);
        if terminal {
            ControlFlow::Break(acc)
        } else {
            ControlFlow::Continue(acc)
        }
    });

    match scan {
        ControlFlow::Continue(events) | ControlFlow::Break(events) => events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use github::GitHubActor;

    fn actor(login: &str) -> Option<GitHubActor> {
        Some(GitHubActor {
            login: Some(login.to_string()),
        })
    }

    fn requested(actor_login: &str, reviewer: Option<&str>, at: &str) -> RawTimelineEvent {
        RawTimelineEvent {
            typename: "ReviewRequestedEvent".to_string(),
            actor: actor(actor_login),
            requested_reviewer: reviewer.map(|r| GitHubActor {
                login: Some(r.to_string()),
            }),
            created_at: Some(at.to_string()),
            ..Default::default()
        }
    }

    fn review(reviewer: &str, at: Option<&str>) -> RawTimelineEvent {
        RawTimelineEvent {
            typename: "PullRequestReview".to_string(),
            author: actor(reviewer),
            submitted_at: at.map(str::to_string),
            ..Default::default()
        }
    }

    fn simple(typename: &str, at: &str) -> RawTimelineEvent {
        RawTimelineEvent {
            typename: typename.to_string(),
            actor: actor("alice"),
            created_at: Some(at.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_review_uses_author_and_submission_time() {
        let event = classify(
            &review("bob", Some("2021-03-01T10:15:00Z")),
            "alice",
            RequestAttribution::AuthorOnly,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::Reviewed);
        assert_eq!(event.reviewer.as_deref(), Some("bob"));
        assert_eq!(event.at, Utc.with_ymd_and_hms(2021, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_pending_review_rejected() {
        let result = classify(&review("bob", None), "alice", RequestAttribution::AuthorOnly);
        assert_eq!(result, Err(Rejection::MissingTimestamp));
    }

    #[test]
    fn test_request_by_author_is_attributed() {
        let event = classify(
            &requested("alice", Some("bob"), "2021-03-01T09:00:00Z"),
            "alice",
            RequestAttribution::AuthorOnly,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::Requested);
        assert_eq!(event.reviewer.as_deref(), Some("bob"));
    }

    #[test]
    fn test_request_by_other_actor_is_anonymous() {
        let raw = requested("carol", Some("bob"), "2021-03-01T09:00:00Z");
        let event = classify(&raw, "alice", RequestAttribution::AuthorOnly).unwrap();
        assert_eq!(event.reviewer, None);

        let event = classify(&raw, "alice", RequestAttribution::AnyActor).unwrap();
        assert_eq!(event.reviewer.as_deref(), Some("bob"));
    }

    #[test]
    fn test_team_request_by_author_rejected() {
        let result = classify(
            &requested("alice", None, "2021-03-01T09:00:00Z"),
            "alice",
            RequestAttribution::AuthorOnly,
        );
        assert_eq!(result, Err(Rejection::MissingReviewer));
    }

    #[test]
    fn test_removal_needs_target() {
        let mut raw = requested("carol", None, "2021-03-01T09:00:00Z");
        raw.typename = "ReviewRequestRemovedEvent".to_string();
        assert_eq!(
            classify(&raw, "alice", RequestAttribution::AuthorOnly),
            Err(Rejection::MissingReviewer)
        );
    }

    #[test]
    fn test_unknown_and_untimed_rejected() {
        let ready = simple("ReadyForReviewEvent", "2021-03-01T09:00:00Z");
        assert_eq!(
            classify(&ready, "alice", RequestAttribution::AuthorOnly),
            Err(Rejection::UnknownKind("ReadyForReviewEvent".to_string()))
        );

        let merged = simple("MergedEvent", "yesterday");
        assert_eq!(
            classify(&merged, "alice", RequestAttribution::AuthorOnly),
            Err(Rejection::MissingTimestamp)
        );
    }

    #[test]
    fn test_terminal_events_have_no_reviewer() {
        let event = classify(
            &simple("ClosedEvent", "2021-03-01T09:00:00+03:00"),
            "alice",
            RequestAttribution::AuthorOnly,
        )
        .unwrap();
        assert!(event.is_terminal());
        assert_eq!(event.reviewer, None);
        assert_eq!(event.at, Utc.with_ymd_and_hms(2021, 3, 1, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_review_events_sorted_and_cut_at_terminal() {
        let raw = vec![
            review("bob", Some("2021-03-01T12:00:00Z")),
            requested("alice", Some("bob"), "2021-03-01T09:00:00Z"),
            simple("ReadyForReviewEvent", "2021-03-01T08:00:00Z"),
            simple("MergedEvent", "2021-03-01T13:00:00Z"),
            review("carol", Some("2021-03-01T14:00:00Z")),
            simple("ClosedEvent", "2021-03-01T15:00:00Z"),
        ];
        let events = review_events(&raw, "alice", RequestAttribution::AuthorOnly);

        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Requested, EventKind::Reviewed, EventKind::Merged]
        );
    }

    #[test]
    fn test_review_events_without_terminal_keeps_everything() {
        let raw = vec![
            requested("alice", Some("bob"), "2021-03-01T09:00:00Z"),
            review("bob", Some("2021-03-01T12:00:00Z")),
        ];
        assert_eq!(
            review_events(&raw, "alice", RequestAttribution::AuthorOnly).len(),
            2
        );
    }
}
