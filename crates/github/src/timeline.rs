//! Timeline record types

use serde::{Deserialize, Serialize};

/// Actor, author or requested reviewer.
///
/// `login` is absent when the requested reviewer is a team or the account
/// was deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubActor {
    pub login: Option<String>,
}

/// One timeline record, discriminated by `__typename`.
///
/// Timestamps stay raw so that one unparseable record cannot fail the whole
/// page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimelineEvent {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub actor: Option<GitHubActor>,
    pub author: Option<GitHubActor>,
    pub requested_reviewer: Option<GitHubActor>,
    pub created_at: Option<String>,
    pub submitted_at: Option<String>,
}

impl RawTimelineEvent {
    pub fn actor_login(&self) -> Option<&str> {
        self.actor.as_ref().and_then(|a| a.login.as_deref())
    }

    pub fn author_login(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.login.as_deref())
    }

    pub fn requested_reviewer_login(&self) -> Option<&str> {
        self.requested_reviewer
            .as_ref()
            .and_then(|a| a.login.as_deref())
    }
}

/// Full timeline of a PR in the order GitHub returned it
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub author: Option<String>,
    pub events: Vec<RawTimelineEvent>,
}
