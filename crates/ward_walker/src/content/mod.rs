mod compiler;
mod database;
mod discovery;

pub(crate) use compiler::{compile_district_database, ContentLoadError};
pub(crate) use database::{
    ActionText, DistrictDatabase, DistrictDef, DistrictDefId, StatDelta, TalkDef,
};
pub(crate) use discovery::ContentRequest;
