//! Score ↔ rank equivalence built from empirical score distributions.
//!
//! A [`ScoreRankTable`] is immutable once built. [`ScoreRankIndex`] builds
//! tables lazily per (province, category, year) and keeps them in a bounded,
//! TTL-expiring cache; concurrent misses for one key share a single build.

use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use crate::core::catalog::Catalog;
use crate::error::RecommendError;
use crate::models::SubjectCategory;
use crate::services::distribution::{DistributionError, DistributionKey, DistributionRecord, DistributionSource};

/// One row of an empirical score distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRankEntry {
    pub score: i32,
    pub count: i32,
    pub cumulative_rank: i32,
}

/// Bidirectional score/rank lookup for one distribution
#[derive(Debug, Clone, Default)]
pub struct ScoreRankTable {
    score_to_rank: HashMap<i32, i32>,
    rank_to_score: HashMap<i32, i32>,
    min_score: i32,
    max_score: i32,
    min_rank: i32,
    max_rank: i32,
    /// Descending
    scores: Vec<i32>,
    /// Ascending
    ranks: Vec<i32>,
}

impl ScoreRankTable {
    pub fn from_entries(entries: impl IntoIterator<Item = ScoreRankEntry>) -> Self {
        let mut score_to_rank = HashMap::new();
        let mut rank_to_score = HashMap::new();

        for entry in entries {
            score_to_rank.insert(entry.score, entry.cumulative_rank);
            rank_to_score.insert(entry.cumulative_rank, entry.score);
        }

        let mut scores: Vec<i32> = score_to_rank.keys().copied().collect();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        let mut ranks: Vec<i32> = rank_to_score.keys().copied().collect();
        ranks.sort_unstable();

        Self {
            min_score: scores.last().copied().unwrap_or_default(),
            max_score: scores.first().copied().unwrap_or_default(),
            min_rank: ranks.first().copied().unwrap_or_default(),
            max_rank: ranks.last().copied().unwrap_or_default(),
            score_to_rank,
            rank_to_score,
            scores,
            ranks,
        }
    }

    /// Build from raw distribution rows, skipping rows whose score label is
    /// not a single integer.
    pub fn from_records(records: &[DistributionRecord]) -> Self {
        Self::from_entries(records.iter().filter_map(|r| {
            Some(ScoreRankEntry {
                score: r.score.as_score()?,
                count: i32::try_from(r.num).ok()?,
                cumulative_rank: i32::try_from(r.accumulate).ok()?,
            })
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn min_score(&self) -> i32 {
        self.min_score
    }

    pub fn max_score(&self) -> i32 {
        self.max_score
    }

    pub fn min_rank(&self) -> i32 {
        self.min_rank
    }

    pub fn max_rank(&self) -> i32 {
        self.max_rank
    }

    /// Rank for a score. Without an exact entry the greatest recorded score
    /// below the target decides; outside the recorded range the result clamps
    /// to the best or worst rank.
    pub fn score_to_rank(&self, score: i32) -> i32 {
        if let Some(rank) = self.score_to_rank.get(&score) {
            return *rank;
        }
        if self.is_empty() {
            return 0;
        }
        if score > self.max_score {
            return self.min_rank;
        }
        if score < self.min_score {
            return self.max_rank;
        }

        let idx = self.scores.partition_point(|s| *s > score);
        self.scores
            .get(idx)
            .and_then(|s| self.score_to_rank.get(s))
            .copied()
            .unwrap_or(self.max_rank)
    }

    /// Score for a rank. Without an exact entry the smallest recorded rank
    /// above the target decides, so the score is never overestimated; outside
    /// the recorded range the result clamps to the best or worst score.
    pub fn rank_to_score(&self, rank: i32) -> i32 {
        if let Some(score) = self.rank_to_score.get(&rank) {
            return *score;
        }
        if self.is_empty() {
            return 0;
        }
        if rank < self.min_rank {
            return self.max_score;
        }
        if rank > self.max_rank {
            return self.min_score;
        }

        let idx = self.ranks.partition_point(|r| *r < rank);
        self.ranks
            .get(idx)
            .and_then(|r| self.rank_to_score.get(r))
            .copied()
            .unwrap_or(self.min_score)
    }
}

/// Lazily built, cached score/rank tables
pub struct ScoreRankIndex {
    source: Arc<dyn DistributionSource>,
    catalog: Arc<Catalog>,
    tables: Cache<DistributionKey, Arc<ScoreRankTable>>,
}

impl ScoreRankIndex {
    pub fn new(
        source: Arc<dyn DistributionSource>,
        catalog: Arc<Catalog>,
        max_tables: u64,
        ttl: Duration,
    ) -> Self {
        let tables = moka::future::CacheBuilder::new(max_tables)
            .time_to_live(ttl)
            .build();

        Self { source, catalog, tables }
    }

    pub fn key(&self, province: &str, category: SubjectCategory, year: i32) -> DistributionKey {
        DistributionKey {
            province: self.catalog.distribution_province(province),
            category,
            year,
        }
    }

    /// Table for a province/category/year, built on first use
    pub async fn load(
        &self,
        province: &str,
        category: SubjectCategory,
        year: i32,
    ) -> Result<Arc<ScoreRankTable>, RecommendError> {
        let key = self.key(province, category, year);

        self.tables
            .try_get_with(key.clone(), async {
                let records = self.source.fetch(&key).await?;
                let table = ScoreRankTable::from_records(&records);
                if table.is_empty() {
                    return Err(DistributionError::Empty(key.to_string()));
                }
                tracing::info!(
                    "Built score-rank table {} ({} scores, ranks {}..={})",
                    key,
                    table.len(),
                    table.min_rank(),
                    table.max_rank()
                );
                Ok(Arc::new(table))
            })
            .await
            .map_err(|e: Arc<DistributionError>| {
                tracing::warn!("Score-rank table {} unavailable: {}", key, e);
                RecommendError::DataUnavailable(e.to_string())
            })
    }

    /// Score equivalent to a rank
    pub async fn score_for_rank(
        &self,
        province: &str,
        category: SubjectCategory,
        year: i32,
        rank: i32,
    ) -> Result<i32, RecommendError> {
        if rank <= 0 {
            return Err(RecommendError::InvalidArgument(format!("rank must be positive, got {}", rank)));
        }
        let table = self.load(province, category, year).await?;
        Ok(table.rank_to_score(rank))
    }

    /// Rank equivalent to a score
    pub async fn rank_for_score(
        &self,
        province: &str,
        category: SubjectCategory,
        year: i32,
        score: i32,
    ) -> Result<i32, RecommendError> {
        if score <= 0 {
            return Err(RecommendError::InvalidArgument(format!("score must be positive, got {}", score)));
        }
        let table = self.load(province, category, year).await?;
        Ok(table.score_to_rank(score))
    }

    pub fn cached_tables(&self) -> u64 {
        self.tables.entry_count()
    }
}
