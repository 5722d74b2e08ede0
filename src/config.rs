//! Runtime configuration for the demo binary: frame path, recipe path and
//! orchestrator knobs, loaded from a JSON file.

use crate::inspect::InspectParams;
use crate::recipe::RegionStore;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Where to write the full report as JSON; stdout summary only when unset.
    pub json_out: Option<PathBuf>,
}

#[derive(Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Frame image to inspect (any format the `image` crate decodes).
    pub input_path: PathBuf,
    /// Serialized taught region collection.
    pub recipe_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub inspect: InspectParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

/// Load and reindex a serialized region collection.
pub fn load_recipe(path: &Path) -> Result<RegionStore, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read recipe {}: {e}", path.display()))?;
    let mut store: RegionStore = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse recipe {}: {e}", path.display()))?;
    store.reindex();
    Ok(store)
}
