//! GraphQL query documents

/// Merged PRs of a repository, oldest first.
///
/// With `$after` set the page continues forward from that cursor (`$first`),
/// otherwise `$last` picks the most recent ones.
pub const MERGED_PULL_REQUESTS: &str = r#"
query MergedPullRequests($owner: String!, $name: String!, $first: Int, $last: Int, $after: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(
      states: [MERGED]
      orderBy: { field: UPDATED_AT, direction: ASC }
      first: $first
      last: $last
      after: $after
    ) {
      edges {
        cursor
        node {
          number
          title
          mergedAt
          additions
          deletions
          isDraft
          author { login }
          labels(first: 10) { nodes { name } }
        }
      }
    }
  }
}
"#;

/// Review-related timeline of one PR, 100 items per page
pub const PULL_REQUEST_TIMELINE: &str = r#"
query PullRequestTimeline($owner: String!, $name: String!, $number: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      author { login }
      timelineItems(
        first: 100
        after: $after
        itemTypes: [
          READY_FOR_REVIEW_EVENT
          REVIEW_REQUESTED_EVENT
          REVIEW_REQUEST_REMOVED_EVENT
          PULL_REQUEST_REVIEW
          MERGED_EVENT
          CLOSED_EVENT
        ]
      ) {
        pageInfo { hasNextPage endCursor }
        nodes {
          __typename
          ... on ReadyForReviewEvent { actor { login } createdAt }
          ... on PullRequestReview { author { login } submittedAt state }
          ... on ReviewRequestedEvent {
            actor { login }
            createdAt
            requestedReviewer { ... on User { login } }
          }
          ... on ReviewRequestRemovedEvent {
            actor { login }
            createdAt
            requestedReviewer { ... on User { login } }
          }
          ... on MergedEvent { actor { login } createdAt }
          ... on ClosedEvent { actor { login } createdAt }
        }
      }
    }
  }
}
"#;
