use std::collections::HashSet;
use std::path::{Path, PathBuf};

use engine::AppPaths;
use thiserror::Error;

/// Mods layered on top of `base`, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContentRequest {
    pub enabled_mods: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DiscoveryError {
    #[error("enabled mod list contains an empty entry")]
    EmptyEnabledMod,
    #[error("mod '{mod_id}' is enabled more than once")]
    DuplicateEnabledMod { mod_id: String },
    #[error("enabled mod '{mod_id}' not found at {}", expected_dir.display())]
    EnabledModMissing {
        mod_id: String,
        expected_dir: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct ModSource {
    pub mod_id: String,
    pub source_dir: PathBuf,
}

pub(crate) fn discover_mod_sources(
    app_paths: &AppPaths,
    request: &ContentRequest,
) -> Result<Vec<ModSource>, DiscoveryError> {
    let mut seen = HashSet::<String>::new();
    let mut sources = vec![ModSource {
        mod_id: "base".to_string(),
        source_dir: app_paths.base_content_dir.clone(),
    }];

    for mod_id in &request.enabled_mods {
        let trimmed = mod_id.trim();
        if trimmed.is_empty() {
            return Err(DiscoveryError::EmptyEnabledMod);
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(DiscoveryError::DuplicateEnabledMod {
                mod_id: trimmed.to_string(),
            });
        }
        let mod_dir = app_paths.mods_dir.join(trimmed);
        ensure_dir_exists(trimmed, &mod_dir)?;
        sources.push(ModSource {
            mod_id: trimmed.to_string(),
            source_dir: mod_dir,
        });
    }

    Ok(sources)
}

fn ensure_dir_exists(mod_id: &str, path: &Path) -> Result<(), DiscoveryError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(DiscoveryError::EnabledModMissing {
            mod_id: mod_id.to_string(),
            expected_dir: path.to_path_buf(),
        })
    }
}
