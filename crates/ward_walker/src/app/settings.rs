use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::LoopConfig;
use serde::Deserialize;
use thiserror::Error;

pub(crate) const SETTINGS_FILE_NAME: &str = "settings.json";
pub(crate) const DISTRICT_ENV_VAR: &str = "WARD_WALKER_DISTRICT";
pub(crate) const SEED_ENV_VAR: &str = "WARD_WALKER_SEED";
pub(crate) const ENABLED_MODS_ENV_VAR: &str = "WARD_WALKER_ENABLED_MODS";

/// Optional overrides read from `settings.json` at the project root.
/// Anything left unset falls back to `LoopConfig::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Settings {
    #[serde(default)]
    pub window_title: Option<String>,
    #[serde(default)]
    pub window_width: Option<u32>,
    #[serde(default)]
    pub window_height: Option<u32>,
    #[serde(default)]
    pub target_tps: Option<u32>,
    #[serde(default)]
    pub max_render_fps: Option<u32>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub perf_overlay: Option<bool>,
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings file {path} at `{field}`: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings file {path}: `{field}` must be at least 1")]
    Zero { path: PathBuf, field: &'static str },
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Settings {
    pub(crate) fn to_loop_config(&self) -> LoopConfig {
        let defaults = LoopConfig::default();
        LoopConfig {
            window_title: self
                .window_title
                .clone()
                .unwrap_or(defaults.window_title.clone()),
            window_width: self.window_width.unwrap_or(defaults.window_width),
            window_height: self.window_height.unwrap_or(defaults.window_height),
            target_tps: self.target_tps.unwrap_or(defaults.target_tps),
            max_render_fps: self.max_render_fps.or(defaults.max_render_fps),
            perf_overlay: self.perf_overlay.unwrap_or(defaults.perf_overlay),
            ..defaults
        }
    }

    fn validate(&self, path: &Path) -> Result<(), SettingsError> {
        let counts = [
            ("window_width", self.window_width),
            ("window_height", self.window_height),
            ("target_tps", self.target_tps),
            ("max_render_fps", self.max_render_fps),
        ];
        match counts.into_iter().find(|(_, value)| *value == Some(0)) {
            Some((field, _)) => Err(SettingsError::Zero {
                path: path.to_path_buf(),
                field,
            }),
            None => Ok(()),
        }
    }
}

/// Loads `<root>/settings.json`. A missing file yields the defaults.
pub(crate) fn load_settings(root: &Path) -> Result<Settings, SettingsError> {
    let path = root.join(SETTINGS_FILE_NAME);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(source) => return Err(SettingsError::Read { path, source }),
    };
    parse_settings(&raw, &path)
}

fn parse_settings(raw: &str, path: &Path) -> Result<Settings, SettingsError> {
    let parse_error = |field: String, source: serde_json::Error| SettingsError::Parse {
        path: path.to_path_buf(),
        field,
        source,
    };

    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let settings: Settings = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| parse_error(err.path().to_string(), err.into_inner()))?;
    deserializer
        .end()
        .map_err(|source| parse_error(".".to_string(), source))?;

    settings.validate(path)?;
    Ok(settings)
}

/// Applies `WARD_WALKER_DISTRICT` and `WARD_WALKER_SEED` on top of the file
/// settings. Blank values are ignored.
pub(crate) fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(district) = non_blank(lookup(DISTRICT_ENV_VAR)) {
        settings.district = Some(district);
    }
    if let Some(raw) = non_blank(lookup(SEED_ENV_VAR)) {
        let seed = raw.parse::<u64>().map_err(|_| SettingsError::InvalidEnv {
            var: SEED_ENV_VAR,
            value: raw.clone(),
            expected: "an unsigned 64-bit integer",
        })?;
        settings.seed = Some(seed);
    }
    Ok(())
}

pub(crate) fn parse_enabled_mods(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
