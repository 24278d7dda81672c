//! Domain models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

const GITHUB_PREFIX: &str = "https://github.com";

/// A tracked GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::Config(format!(
                "expected owner/repo, got {:?}",
                s
            ))),
        }
    }
}

/// Identity of a pull request: (owner, repo, number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItemId {
    pub owner: String,
    pub repo: String,
    pub number: i32,
}

impl WorkItemId {
    pub fn new(repo: &RepoRef, number: i32) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            number,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}/pull/{}",
            GITHUB_PREFIX, self.owner, self.repo, self.number
        )
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// A merged pull request as fetched from GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub title: String,
    pub author: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub additions: i32,
    pub deletions: i32,
    pub is_draft: bool,
    /// Carries the "wip" label
    pub is_wip: bool,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Requested,
    Reviewed,
    Removed,
    Merged,
    Closed,
}

/// One valid step of a pull request's review history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub kind: EventKind,
    pub reviewer: Option<String>,
    pub at: DateTime<Utc>,
}

impl TimelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::Merged | EventKind::Closed)
    }
}

/// Working minutes between a review request and the review itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySample {
    pub reviewer: String,
    pub work_item: WorkItemId,
    pub minutes: i64,
    pub review_at: DateTime<Utc>,
}

/// Ingestion progress through the merged PRs of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionCursor {
    pub owner: String,
    pub repo: String,
    pub cursor: String,
    /// PR the cursor points at
    pub number: i32,
    pub merged_at: Option<DateTime<Utc>>,
}

/// A period a person is away, in naive UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Absence {
    /// Inclusive on both ends
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.begin <= at && at <= self.end
    }
}

/// Summary statistics over latency samples, in minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub count: usize,
}
