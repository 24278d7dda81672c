#[cfg(test)]
mod tests {
    use crate::calendar::Calendar;
    use crate::intervals::*;
    use chrono::{DateTime, TimeZone, Utc};
    use common::models::{EventKind, RepoRef, TimelineEvent, WorkItemId};
    use common::{CalendarConfig, LatencyPolicy};

    fn at(m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, m, d, h, min, 0).unwrap()
    }

    fn event(kind: EventKind, reviewer: Option<&str>, at: DateTime<Utc>) -> TimelineEvent {
        TimelineEvent {
            kind,
            reviewer: reviewer.map(str::to_string),
            at,
        }
    }

    fn requested(reviewer: &str, at: DateTime<Utc>) -> TimelineEvent {
        event(EventKind::Requested, Some(reviewer), at)
    }

    fn reviewed(reviewer: &str, at: DateTime<Utc>) -> TimelineEvent {
        event(EventKind::Reviewed, Some(reviewer), at)
    }

    fn removed(reviewer: &str, at: DateTime<Utc>) -> TimelineEvent {
        event(EventKind::Removed, Some(reviewer), at)
    }

    fn run(events: &[TimelineEvent]) -> Vec<common::models::LatencySample> {
        let calendar = Calendar::new(CalendarConfig::default());
        let item = WorkItemId::new(&RepoRef::new("acme", "widgets"), 42);
        reconstruct(&calendar, &LatencyPolicy::default(), &item, events)
    }

    // 2021-03-01 is a Monday

    #[test]
    fn test_request_then_review_emits_one_sample() {
        let samples = run(&[requested("bob", at(3, 1, 9, 0)), reviewed("bob", at(3, 1, 10, 0))]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].reviewer, "bob");
        assert_eq!(samples[0].minutes, 60);
        assert_eq!(samples[0].review_at, at(3, 1, 10, 0));
        assert_eq!(samples[0].work_item.number, 42);
    }

    #[test]
    fn test_unsolicited_review_emits_nothing() {
        assert!(run(&[reviewed("bob", at(3, 1, 10, 0))]).is_empty());
    }

    #[test]
    fn test_removed_request_emits_nothing() {
        let samples = run(&[
            requested("bob", at(3, 1, 9, 0)),
            removed("bob", at(3, 1, 9, 30)),
            reviewed("bob", at(3, 1, 11, 0)),
        ]);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_removal_without_request_is_harmless() {
        let samples = run(&[
            removed("bob", at(3, 1, 8, 30)),
            requested("bob", at(3, 1, 9, 0)),
            reviewed("bob", at(3, 1, 10, 0)),
        ]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_re_request_replaces_open_request() {
        let samples = run(&[
            requested("bob", at(3, 1, 9, 0)),
            requested("bob", at(3, 1, 10, 0)),
            reviewed("bob", at(3, 1, 11, 0)),
        ]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].minutes, 60);
    }

    #[test]
    fn test_review_closes_request() {
        let samples = run(&[
            requested("bob", at(3, 1, 9, 0)),
            reviewed("bob", at(3, 1, 10, 0)),
            reviewed("bob", at(3, 1, 12, 0)),
            requested("bob", at(3, 1, 13, 0)),
            reviewed("bob", at(3, 1, 14, 0)),
        ]);
        let minutes: Vec<i64> = samples.iter().map(|s| s.minutes).collect();
        assert_eq!(minutes, vec![60, 60]);
    }

    #[test]
    fn test_reviewers_tracked_independently() {
        let samples = run(&[
            requested("bob", at(3, 1, 9, 0)),
            requested("carol", at(3, 1, 9, 0)),
            reviewed("carol", at(3, 1, 9, 45)),
            reviewed("bob", at(3, 2, 9, 0)),
        ]);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].reviewer, "carol");
        assert_eq!(samples[0].minutes, 45);
        assert_eq!(samples[1].reviewer, "bob");
        assert_eq!(samples[1].minutes, 9 * 60);
    }

    #[test]
    fn test_anonymous_request_does_not_open() {
        let samples = run(&[
            event(EventKind::Requested, None, at(3, 1, 9, 0)),
            reviewed("bob", at(3, 1, 10, 0)),
        ]);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_review_outside_working_hours_discarded() {
        // Both ends snap to Tuesday 08:00
        let samples = run(&[requested("bob", at(3, 1, 18, 0)), reviewed("bob", at(3, 1, 21, 0))]);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_quick_review_is_outlier() {
        let samples = run(&[requested("bob", at(3, 1, 9, 0)), reviewed("bob", at(3, 1, 9, 10))]);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_stale_review_is_outlier() {
        let samples = run(&[requested("bob", at(3, 1, 9, 0)), reviewed("bob", at(4, 26, 9, 0))]);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_events_after_terminal_ignored() {
        let samples = run(&[
            requested("bob", at(3, 1, 9, 0)),
            event(EventKind::Merged, None, at(3, 1, 9, 30)),
            reviewed("bob", at(3, 1, 10, 0)),
        ]);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_judge_bounds() {
        let policy = LatencyPolicy::default();
        assert_eq!(judge(0, &policy), Verdict::OutsideWorkingHours);
        assert_eq!(judge(14, &policy), Verdict::Outlier);
        assert_eq!(judge(15, &policy), Verdict::Accept);
        assert_eq!(judge(2700, &policy), Verdict::Accept);
        assert_eq!(judge(2701, &policy), Verdict::Outlier);
    }

    #[test]
    fn test_judge_uses_policy() {
        let policy = LatencyPolicy {
            min_review_minutes: 1,
            max_review_minutes: 30,
            ..LatencyPolicy::default()
        };
        assert_eq!(judge(5, &policy), Verdict::Accept);
        assert_eq!(judge(31, &policy), Verdict::Outlier);
    }

    #[test]
    fn test_review_requests_state() {
        let mut requests = ReviewRequests::default();
        assert!(!requests.is_open("bob"));
        requests.request("bob", at(3, 1, 9, 0));
        assert!(requests.is_open("bob"));
        assert_eq!(requests.answer("bob"), Some(at(3, 1, 9, 0)));
        assert_eq!(requests.answer("bob"), None);
        requests.request("bob", at(3, 1, 9, 0));
        requests.remove("bob");
        assert!(!requests.is_open("bob"));
    }
}
