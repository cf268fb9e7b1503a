mod city;
mod interaction;
mod motion;
mod placement;
mod scene_impl;
mod stats;
mod textures;
mod ui;

pub(crate) use scene_impl::{CityScene, SceneBuildError};

#[cfg(test)]
mod tests;
