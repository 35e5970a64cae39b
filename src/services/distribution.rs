use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::models::SubjectCategory;

/// Errors that can occur while reading a score distribution
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("cannot read distribution {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse distribution {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("distribution {0} has no usable rows")]
    Empty(String),
}

/// Identifies one empirical score distribution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistributionKey {
    /// Lower-case pinyin province name, e.g. "hubei"
    pub province: String,
    pub category: SubjectCategory,
    pub year: i32,
}

impl fmt::Display for DistributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.province, self.year, self.category)
    }
}

/// Score label of a distribution row: usually a number, sometimes a band
/// such as "695-750" or a number encoded as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreLabel {
    Number(i64),
    Text(String),
}

impl ScoreLabel {
    /// Numeric score, or `None` for labels that are not a single integer
    pub fn as_score(&self) -> Option<i32> {
        match self {
            ScoreLabel::Number(n) => i32::try_from(*n).ok(),
            ScoreLabel::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One raw row of a distribution file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub score: ScoreLabel,
    /// Candidates in this band
    #[serde(default)]
    pub num: i64,
    /// Cumulative candidates down to this band, i.e. the rank
    pub accumulate: i64,
}

#[derive(Debug, Deserialize)]
struct DistributionFile {
    data: Vec<DistributionRecord>,
}

/// Source of empirical score distributions
#[async_trait]
pub trait DistributionSource: Send + Sync {
    async fn fetch(&self, key: &DistributionKey) -> Result<Vec<DistributionRecord>, DistributionError>;
}

/// Reads `score_rank_<province>_<year>_<category>.json` files from a directory
#[derive(Debug, Clone)]
pub struct FileDistributionSource {
    root: PathBuf,
}

impl FileDistributionSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &DistributionKey) -> PathBuf {
        self.root.join(format!(
            "score_rank_{}_{}_{}.json",
            key.province.to_lowercase(),
            key.year,
            key.category
        ))
    }
}

#[async_trait]
impl DistributionSource for FileDistributionSource {
    async fn fetch(&self, key: &DistributionKey) -> Result<Vec<DistributionRecord>, DistributionError> {
        let path = self.path_for(key);
        let path_text = path.display().to_string();

        let bytes = tokio::fs::read(&path).await.map_err(|source| DistributionError::Io {
            path: path_text.clone(),
            source,
        })?;

        let file: DistributionFile = serde_json::from_slice(&bytes)
            .map_err(|source| DistributionError::Parse { path: path_text.clone(), source })?;

        tracing::debug!("Read {} distribution rows from {}", file.data.len(), path_text);

        Ok(file.data)
    }
}
