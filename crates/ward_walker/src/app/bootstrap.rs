use std::process::ExitCode;

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::gameplay::{CityScene, SceneBuildError};
use super::settings::{
    apply_env_overrides, load_settings, parse_enabled_mods, SettingsError, ENABLED_MODS_ENV_VAR,
};
use crate::content::{
    compile_district_database, ContentLoadError, ContentRequest, DistrictDatabase, DistrictDef,
};

pub(crate) const DEFAULT_DISTRICT: &str = "district.riverside";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Content(#[from] ContentLoadError),
    #[error("unknown district {requested:?} (available: {available})")]
    UnknownDistrict { requested: String, available: String },
    #[error(transparent)]
    Scene(#[from] SceneBuildError),
}

pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("startup");

    wire_app().map_err(|err| {
        error!(error = %err, "startup_failed");
        ExitCode::FAILURE
    })
}

fn wire_app() -> Result<AppWiring, BootstrapError> {
    let paths = resolve_app_paths()?;
    let mut settings = load_settings(&paths.root)?;
    apply_env_overrides(&mut settings, |var| std::env::var(var).ok())?;

    let request = ContentRequest {
        enabled_mods: parse_enabled_mods_from_env(),
    };
    let database = compile_district_database(&paths, &request)?;
    let def = select_district(&database, settings.district.as_deref())?;
    let seed = settings.seed.unwrap_or_else(rand::random);
    info!(
        district = %def.def_name,
        label = %def.label,
        seed,
        available = database.len(),
        mods = ?request.enabled_mods,
        "district_loaded"
    );

    let scene = CityScene::build(def.clone(), seed, Some(paths.texture_dir.clone()))?;
    Ok(AppWiring {
        config: settings.to_loop_config(),
        scene: Box::new(scene),
    })
}

fn select_district<'a>(
    database: &'a DistrictDatabase,
    requested: Option<&str>,
) -> Result<&'a DistrictDef, BootstrapError> {
    let requested = requested.unwrap_or(DEFAULT_DISTRICT);
    database
        .district_by_name(requested)
        .ok_or_else(|| BootstrapError::UnknownDistrict {
            requested: requested.to_string(),
            available: database
                .districts()
                .iter()
                .map(|def| def.def_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_enabled_mods_from_env() -> Vec<String> {
    std::env::var(ENABLED_MODS_ENV_VAR)
        .ok()
        .map(|raw| parse_enabled_mods(&raw))
        .unwrap_or_default()
}
