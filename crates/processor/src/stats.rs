//! Summary statistics over latency samples

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::models::Summary;
use thiserror::Error;

use crate::store::LatencyStore;

/// Fewer than two samples. An expected "no stats yet" state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("insufficient data: {count} samples, need at least 2")]
pub struct InsufficientData {
    pub count: usize,
}

/// Mean, median and sample standard deviation of latency minutes
pub fn summarize(minutes: &[i64]) -> Result<Summary, InsufficientData> {
    let count = minutes.len();
    if count < 2 {
        return Err(InsufficientData { count });
    }

    let mean = minutes.iter().sum::<i64>() as f64 / count as f64;

    let mut sorted = minutes.to_vec();
    sorted.sort_unstable();
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    };

    let variance = minutes
        .iter()
        .map(|&m| (m as f64 - mean).powi(2))
        .sum::<f64>()
        / (count - 1) as f64;

    Ok(Summary {
        mean,
        median,
        std_dev: variance.sqrt(),
        count,
    })
}

/// Summary for one reviewer over `[from, to]`, `None` when there is not
/// enough data
pub async fn individual_summary<S>(
    store: &S,
    login: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> common::Result<Option<Summary>>
where
    S: LatencyStore + ?Sized,
{
    let minutes = store.sample_minutes(login, from, to).await?;
    Ok(summarize(&minutes).ok())
}

/// Summaries keyed by login. Logins without enough data are left out.
pub async fn group_summary<S>(
    store: &S,
    logins: &[String],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> common::Result<BTreeMap<String, Summary>>
where
    S: LatencyStore + ?Sized,
{
    let mut sorted: Vec<&String> = logins.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut result = BTreeMap::new();
    for login in sorted {
        if let Some(summary) = individual_summary(store, login, from, to).await? {
            result.insert(login.clone(), summary);
        }
    }
    Ok(result)
}
