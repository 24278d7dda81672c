//! GitHub GraphQL client for fetching merged PRs and their timelines

use chrono::{DateTime, Utc};
use common::models::{RepoRef, WorkItem, WorkItemId};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::queries;
use crate::timeline::{GitHubActor, RawTimelineEvent, Timeline};

const GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// GitHub caps `first`/`last` at 100
const MAX_PAGE: u32 = 100;

/// Safety limit on timeline pages per PR
const MAX_TIMELINE_PAGES: u32 = 50;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("Timeline of {0} has more than {1} pages")]
    TimelineTooLong(String, u32),
}

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
}

/// A merged PR together with the pagination cursor pointing at it
#[derive(Debug, Clone)]
pub struct MergedPr {
    pub cursor: String,
    pub item: WorkItem,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MergedData {
    repository: Option<MergedRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergedRepository {
    pull_requests: PrConnection,
}

#[derive(Debug, Deserialize)]
struct PrConnection {
    edges: Vec<PrEdge>,
}

#[derive(Debug, Deserialize)]
struct PrEdge {
    cursor: String,
    node: PrNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrNode {
    number: i32,
    title: String,
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    additions: i32,
    #[serde(default)]
    deletions: i32,
    #[serde(default)]
    is_draft: bool,
    author: Option<GitHubActor>,
    labels: Option<LabelConnection>,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    nodes: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TimelineData {
    repository: Option<TimelineRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineRepository {
    pull_request: Option<TimelinePullRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelinePullRequest {
    author: Option<GitHubActor>,
    timeline_items: TimelineConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineConnection {
    page_info: PageInfo,
    nodes: Vec<RawTimelineEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        let client = reqwest::Client::new();
        Self { client, token }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("review-latency/0.1"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        debug!("POST {} {}", GRAPHQL_URL, variables);
        let resp = self
            .client
            .post(GRAPHQL_URL)
            .headers(self.headers())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(GRAPHQL_URL.to_string()));
        }
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ClientError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GraphQlResponse<T> = resp.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(ClientError::GraphQl(messages.join("; ")));
        }
        body.data
            .ok_or_else(|| ClientError::GraphQl("response without data".to_string()))
    }

    /// Fetch merged PRs in ascending order.
    ///
    /// With a cursor, returns up to `count` PRs after it. Without one, returns
    /// the `count` most recent merged PRs (at most 100).
    pub async fn merged_pull_requests(
        &self,
        repo: &RepoRef,
        after: Option<&str>,
        count: u32,
    ) -> Result<Vec<MergedPr>, ClientError> {
        let count = count.clamp(1, MAX_PAGE);
        let variables = match after {
            Some(cursor) => json!({
                "owner": repo.owner,
                "name": repo.name,
                "first": count,
                "after": cursor,
            }),
            None => json!({
                "owner": repo.owner,
                "name": repo.name,
                "last": count,
            }),
        };

        let data: MergedData = self
            .graphql(queries::MERGED_PULL_REQUESTS, variables)
            .await?;
        let prs = into_merged_prs(repo, data)?;
        debug!("Fetched {} merged PRs for {}", prs.len(), repo);
        Ok(prs)
    }

    /// Fetch the review-related timeline of a PR, following pagination
    pub async fn timeline(&self, id: &WorkItemId) -> Result<Timeline, ClientError> {
        let mut timeline = Timeline::default();
        let mut after: Option<String> = None;
        let mut page = 0u32;

        loop {
            let data: TimelineData = self
                .graphql(
                    queries::PULL_REQUEST_TIMELINE,
                    json!({
                        "owner": id.owner,
                        "name": id.repo,
                        "number": id.number,
                        "after": after,
                    }),
                )
                .await?;

            let pr = data
                .repository
                .and_then(|r| r.pull_request)
                .ok_or_else(|| ClientError::NotFound(id.to_string()))?;

            if timeline.author.is_none() {
                timeline.author = pr.author.and_then(|a| a.login);
            }
            timeline.events.extend(pr.timeline_items.nodes);

            page += 1;
            match next_timeline_page(pr.timeline_items.page_info, page, id)? {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        info!("Fetched {} timeline items for {}", timeline.events.len(), id);
        Ok(timeline)
    }
}

/// Cursor of the next timeline page, or `None` on the last one.
///
/// A timeline longer than the page limit is an error rather than a truncated
/// result, so the PR is not marked processed with samples missing.
fn next_timeline_page(
    info: PageInfo,
    fetched: u32,
    id: &WorkItemId,
) -> Result<Option<String>, ClientError> {
    let cursor = match info.end_cursor {
        Some(cursor) if info.has_next_page => cursor,
        _ => return Ok(None),
    };
    if fetched >= MAX_TIMELINE_PAGES {
        warn!("Hit timeline pagination limit of {} pages for {}", MAX_TIMELINE_PAGES, id);
        return Err(ClientError::TimelineTooLong(id.to_string(), MAX_TIMELINE_PAGES));
    }
    Ok(Some(cursor))
}

fn into_merged_prs(repo: &RepoRef, data: MergedData) -> Result<Vec<MergedPr>, ClientError> {
    let repository = data
        .repository
        .ok_or_else(|| ClientError::NotFound(repo.to_string()))?;

    Ok(repository
        .pull_requests
        .edges
        .into_iter()
        .map(|edge| {
            let node = edge.node;
            let labels: Vec<String> = node
                .labels
                .map(|l| l.nodes.into_iter().map(|n| n.name.to_lowercase()).collect())
                .unwrap_or_default();
            MergedPr {
                cursor: edge.cursor,
                item: WorkItem {
                    id: WorkItemId::new(repo, node.number),
                    title: node.title,
                    author: node
                        .author
                        .and_then(|a| a.login)
                        .unwrap_or_else(|| "ghost".to_string()),
                    merged_at: node.merged_at,
                    additions: node.additions,
                    deletions: node.deletions,
                    is_draft: node.is_draft,
                    is_wip: labels.iter().any(|l| l == "wip"),
                    labels,
                },
            }
        })
        .collect())
}
