//! GitHub GraphQL client for fetching merged PRs and review timelines

pub mod client;
pub mod queries;
pub mod timeline;

pub use client::{ClientError, GitHubClient, MergedPr};
pub use timeline::{GitHubActor, RawTimelineEvent, Timeline};
