use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use crate::models::ProvinceCities;

/// Province → cities map read from a JSON file on first use
///
/// An unreadable or malformed file is logged and served as an empty map.
#[derive(Debug)]
pub struct ProvinceCityDirectory {
    path: PathBuf,
    entries: OnceCell<BTreeMap<String, Vec<String>>>,
}

impl ProvinceCityDirectory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: OnceCell::new(),
        }
    }

    /// Build from an in-memory map, skipping the file
    pub fn from_entries(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            path: PathBuf::new(),
            entries: OnceCell::new_with(Some(entries)),
        }
    }

    async fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        self.entries.get_or_init(|| load(&self.path)).await
    }

    /// Every province, or only the named ones in request order when a comma
    /// separated filter is given. Unknown names are skipped.
    pub async fn provinces(&self, filter: Option<&str>) -> Vec<ProvinceCities> {
        let entries = self.entries().await;

        let names: Vec<&str> = filter
            .map(|f| f.split(',').map(str::trim).filter(|t| !t.is_empty()).collect())
            .unwrap_or_default();

        if names.is_empty() {
            return entries
                .iter()
                .map(|(province, cities)| ProvinceCities::new(province, cities))
                .collect();
        }

        names
            .into_iter()
            .filter_map(|name| entries.get(name).map(|cities| ProvinceCities::new(name, cities)))
            .collect()
    }
}

async fn load(path: &Path) -> BTreeMap<String, Vec<String>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Cannot read province cities from {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice::<BTreeMap<String, Vec<String>>>(&bytes) {
        Ok(entries) => {
            tracing::info!("Loaded {} provinces from {}", entries.len(), path.display());
            entries
        }
        Err(e) => {
            tracing::warn!("Cannot parse province cities in {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}
