//! In-memory store for tests and local runs.
//!
//! Mirrors the conflict handling of the PostgreSQL schema: cursors are
//! upserted per repository, history rows are unique per cursor, processed
//! markers form a set and samples are unique per
//! (PR, reviewer, review time).

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::{Absence, IngestionCursor, LatencySample, RepoRef, WorkItemId};
use common::{Error, Result};

use crate::store::{AbsenceStore, LatencyStore};

#[derive(Default)]
struct MemoryData {
    cursors: HashMap<(String, String), IngestionCursor>,
    cursor_history: Vec<IngestionCursor>,
    processed: BTreeSet<WorkItemId>,
    samples: Vec<LatencySample>,
    gaps: HashMap<String, Vec<Absence>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryData>> {
        self.data
            .read()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryData>> {
        self.data
            .write()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    /// All stored samples in insertion order
    pub fn samples(&self) -> Result<Vec<LatencySample>> {
        Ok(self.read()?.samples.clone())
    }

    pub fn cursor_history(&self) -> Result<Vec<IngestionCursor>> {
        Ok(self.read()?.cursor_history.clone())
    }

    pub fn processed(&self) -> Result<Vec<WorkItemId>> {
        Ok(self.read()?.processed.iter().cloned().collect())
    }
}

#[async_trait]
impl LatencyStore for MemoryStore {
    async fn cursor(&self, repo: &RepoRef) -> Result<Option<IngestionCursor>> {
        let key = (repo.owner.clone(), repo.name.clone());
        Ok(self.read()?.cursors.get(&key).cloned())
    }

    async fn save_cursor(&self, cursor: &IngestionCursor) -> Result<()> {
        let mut data = self.write()?;
        let key = (cursor.owner.clone(), cursor.repo.clone());
        data.cursors.insert(key, cursor.clone());

        let seen = data.cursor_history.iter().any(|c| {
            c.owner == cursor.owner && c.repo == cursor.repo && c.cursor == cursor.cursor
        });
        if !seen {
            data.cursor_history.push(cursor.clone());
        }
        Ok(())
    }

    async fn is_processed(&self, id: &WorkItemId) -> Result<bool> {
        Ok(self.read()?.processed.contains(id))
    }

    async fn mark_processed(&self, id: &WorkItemId) -> Result<()> {
        self.write()?.processed.insert(id.clone());
        Ok(())
    }

    async fn save_samples(&self, id: &WorkItemId, samples: &[LatencySample]) -> Result<u64> {
        let mut data = self.write()?;
        let mut inserted = 0;
        for sample in samples {
            let duplicate = data.samples.iter().any(|s| {
                &s.work_item == id && s.reviewer == sample.reviewer && s.review_at == sample.review_at
            });
            if !duplicate {
                data.samples.push(LatencySample {
                    work_item: id.clone(),
                    ..sample.clone()
                });
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn sample_minutes(
        &self,
        reviewer: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        Ok(self
            .read()?
            .samples
            .iter()
            .filter(|s| s.reviewer == reviewer && s.review_at >= from && s.review_at <= to)
            .map(|s| s.minutes)
            .collect())
    }

    async fn reviewers_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        let reviewers: BTreeSet<String> = self
            .read()?
            .samples
            .iter()
            .filter(|s| s.review_at >= since)
            .map(|s| s.reviewer.clone())
            .collect();
        Ok(reviewers.into_iter().collect())
    }
}

#[async_trait]
impl AbsenceStore for MemoryStore {
    async fn absences(&self, login: &str) -> Result<Vec<Absence>> {
        Ok(self.read()?.gaps.get(login).cloned().unwrap_or_default())
    }

    async fn replace_absences(&self, login: &str, gaps: &[Absence]) -> Result<()> {
        self.write()?.gaps.insert(login.to_string(), gaps.to_vec());
        Ok(())
    }
}
