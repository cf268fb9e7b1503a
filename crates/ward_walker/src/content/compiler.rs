use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use engine::AppPaths;
use roxmltree::{Document, Node};

use super::database::{
    ActionText, DistrictDatabase, DistrictDef, DistrictDefId, StatDelta, TalkDef,
};
use super::discovery::{discover_mod_sources, ContentRequest, DiscoveryError};

const MAX_DISTRICT_SIDE: u32 = 512;
const DEFAULT_BUILDING_ROLL_MAX: u32 = 10;
const DEFAULT_BUILDING_THRESHOLD: u32 = 2;
const DEFAULT_NPC_LABEL: &str = "Resident";
const DEFAULT_PLAYER_NAME: &str = "Kato";
const DEFAULT_PLAYER_SPEED: f32 = 6.25;
const DEFAULT_COOLDOWN_SECONDS: f32 = 1.0;
const DEFAULT_KARMA_THRESHOLD: i32 = 15;
const DEFAULT_CAMERA_ZOOM: f32 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDefInMod,
}

#[derive(Debug, Clone)]
pub(crate) struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}

/// Compiles every `<DistrictDef>` under `base` and the enabled mods.
/// A later mod replaces an earlier definition with the same `defName`;
/// ids are assigned in `defName` order.
pub(crate) fn compile_district_database(
    app_paths: &AppPaths,
    request: &ContentRequest,
) -> Result<DistrictDatabase, ContentLoadError> {
    let sources = discover_mod_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;

    let mut merged = BTreeMap::<String, DistrictDef>::new();

    for source in sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.mod_id, error.path, error.source))?;
        let mut seen_in_mod = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.mod_id, xml_file.clone(), source_err))?;
            let defs = parse_defs_document(&source.mod_id, &xml_file, &raw)?;
            for def in defs {
                if !seen_in_mod.insert(def.def_name.clone()) {
                    return Err(ContentLoadError {
                        code: ContentErrorCode::DuplicateDefInMod,
                        message: format!(
                            "duplicate DistrictDef '{}' in mod '{}'; each mod may define a defName only once",
                            def.def_name, source.mod_id
                        ),
                        mod_id: source.mod_id.clone(),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                merged.insert(def.def_name.clone(), def);
            }
        }
    }

    Ok(DistrictDatabase::from_district_defs(
        merged.into_values().collect(),
    ))
}

struct ParseContext<'a, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentLoadError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_text(&self, node: Node<'_, '_>, field_name: &str) -> Result<String, ContentLoadError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn number<T: FromStr>(&self, node: Node<'_, '_>, field_name: &str) -> Result<T, ContentLoadError> {
        let value = self.required_text(node, field_name)?;
        value.parse::<T>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} '{}' is not a valid number", field_name, value),
                node,
            )
        })
    }

    fn ranged_u32(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
        min: u32,
        max: u32,
    ) -> Result<u32, ContentLoadError> {
        let value = self.number::<u32>(node, field_name)?;
        if value < min || value > max {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be between {} and {}", field_name, min, max),
                node,
            ));
        }
        Ok(value)
    }

    fn positive_f32(&self, node: Node<'_, '_>, field_name: &str) -> Result<f32, ContentLoadError> {
        let value = self.number::<f32>(node, field_name)?;
        if !value.is_finite() || value <= 0.0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be finite and > 0", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn check_unique(
        &self,
        seen: &mut HashSet<String>,
        field: Node<'_, '_>,
        parent: &str,
    ) -> Result<String, ContentLoadError> {
        let field_name = field.tag_name().name().to_string();
        if !seen.insert(field_name.clone()) {
            return Err(self.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <{}>", field_name, parent),
                field,
            ));
        }
        Ok(field_name)
    }

    fn unknown_field(&self, field: Node<'_, '_>, parent: &str) -> ContentLoadError {
        self.error_at(
            ContentErrorCode::UnknownField,
            format!("unknown field <{}> in <{}>", field.tag_name().name(), parent),
            field,
        )
    }

    fn missing_field(&self, node: Node<'_, '_>, field_name: &str, parent: &str) -> ContentLoadError {
        self.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{}> in <{}>", field_name, parent),
            node,
        )
    }
}

fn parse_defs_document(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<DistrictDef>, ContentLoadError> {
    let doc = Document::parse(raw).map_err(|error| ContentLoadError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = ParseContext {
        mod_id,
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::<DistrictDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "DistrictDef" {
            return Err(ctx.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <DistrictDef> is recognised",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        defs.push(parse_district_def(&ctx, child)?);
    }

    Ok(defs)
}

fn parse_district_def(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<DistrictDef, ContentLoadError> {
    const PARENT: &str = "DistrictDef";
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut road_period: Option<u32> = None;
    let mut building_roll_max = DEFAULT_BUILDING_ROLL_MAX;
    let mut building_threshold = DEFAULT_BUILDING_THRESHOLD;
    let mut npc_count: Option<u32> = None;
    let mut npc_label = DEFAULT_NPC_LABEL.to_string();
    let mut player_name = DEFAULT_PLAYER_NAME.to_string();
    let mut player_speed = DEFAULT_PLAYER_SPEED;
    let mut cooldown_seconds = DEFAULT_COOLDOWN_SECONDS;
    let mut karma_threshold = DEFAULT_KARMA_THRESHOLD;
    let mut camera_zoom = DEFAULT_CAMERA_ZOOM;
    let mut talk: Option<TalkDef> = None;
    let mut bribe: Option<ActionText> = None;
    let mut punch: Option<ActionText> = None;
    let mut welcome = String::new();

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = ctx.check_unique(&mut seen_fields, field, PARENT)?;
        match field_name.as_str() {
            "defName" => def_name = Some(ctx.required_text(field, "defName")?),
            "label" => label = Some(ctx.required_text(field, "label")?),
            "width" => width = Some(ctx.ranged_u32(field, "width", 1, MAX_DISTRICT_SIDE)?),
            "height" => height = Some(ctx.ranged_u32(field, "height", 1, MAX_DISTRICT_SIDE)?),
            "roadPeriod" => {
                road_period = Some(ctx.ranged_u32(field, "roadPeriod", 1, MAX_DISTRICT_SIDE)?)
            }
            "buildingRollMax" => {
                building_roll_max = ctx.ranged_u32(field, "buildingRollMax", 0, u32::MAX - 1)?
            }
            "buildingThreshold" => {
                building_threshold = ctx.number::<u32>(field, "buildingThreshold")?
            }
            "npcCount" => {
                npc_count = Some(ctx.ranged_u32(
                    field,
                    "npcCount",
                    0,
                    MAX_DISTRICT_SIDE * MAX_DISTRICT_SIDE,
                )?)
            }
            "npcLabel" => npc_label = ctx.required_text(field, "npcLabel")?,
            "playerName" => player_name = ctx.required_text(field, "playerName")?,
            "playerSpeed" => player_speed = ctx.positive_f32(field, "playerSpeed")?,
            "cooldownSeconds" => {
                let value = ctx.number::<f32>(field, "cooldownSeconds")?;
                if !value.is_finite() || value < 0.0 {
                    return Err(ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        "cooldownSeconds must be finite and >= 0".to_string(),
                        field,
                    ));
                }
                cooldown_seconds = value;
            }
            "karmaThreshold" => {
                let value = ctx.number::<i32>(field, "karmaThreshold")?;
                if value < 0 {
                    return Err(ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        "karmaThreshold must be >= 0".to_string(),
                        field,
                    ));
                }
                karma_threshold = value;
            }
            "cameraZoom" => camera_zoom = ctx.positive_f32(field, "cameraZoom")?,
            "talk" => talk = Some(parse_talk(ctx, field)?),
            "bribe" => bribe = Some(parse_action_text(ctx, field, "bribe")?),
            "punch" => punch = Some(parse_action_text(ctx, field, "punch")?),
            "welcome" => welcome = node_text(field),
            _ => return Err(ctx.unknown_field(field, PARENT)),
        }
    }

    let def_name = def_name.ok_or_else(|| ctx.missing_field(node, "defName", PARENT))?;
    let label = label.ok_or_else(|| ctx.missing_field(node, "label", PARENT))?;
    let width = width.ok_or_else(|| ctx.missing_field(node, "width", PARENT))?;
    let height = height.ok_or_else(|| ctx.missing_field(node, "height", PARENT))?;
    let road_period = road_period.ok_or_else(|| ctx.missing_field(node, "roadPeriod", PARENT))?;
    let npc_count = npc_count.ok_or_else(|| ctx.missing_field(node, "npcCount", PARENT))?;
    let talk = talk.ok_or_else(|| ctx.missing_field(node, "talk", PARENT))?;
    let bribe = bribe.ok_or_else(|| ctx.missing_field(node, "bribe", PARENT))?;
    let punch = punch.ok_or_else(|| ctx.missing_field(node, "punch", PARENT))?;

    Ok(DistrictDef {
        id: DistrictDefId(0),
        def_name,
        label,
        width,
        height,
        road_period,
        building_roll_max,
        building_threshold,
        npc_count,
        npc_label,
        player_name,
        player_speed,
        cooldown_seconds,
        karma_threshold,
        camera_zoom,
        talk,
        bribe,
        punch,
        welcome,
    })
}

fn parse_talk(ctx: &ParseContext<'_, '_>, node: Node<'_, '_>) -> Result<TalkDef, ContentLoadError> {
    const PARENT: &str = "talk";
    let mut seen_fields = HashSet::<String>::new();
    let mut delta = StatDelta::default();
    let mut lines: Option<Vec<String>> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = ctx.check_unique(&mut seen_fields, field, PARENT)?;
        match field_name.as_str() {
            "influence" => delta.influence = ctx.number::<i32>(field, "influence")?,
            "karma" => delta.karma = ctx.number::<i32>(field, "karma")?,
            "lines" => {
                let mut parsed = Vec::new();
                for item in field.children().filter(|child| child.is_element()) {
                    if item.tag_name().name() != "li" {
                        return Err(ctx.unknown_field(item, "lines"));
                    }
                    parsed.push(expand_escapes(&ctx.required_text(item, "li")?));
                }
                if parsed.is_empty() {
                    return Err(ctx.error_at(
                        ContentErrorCode::MissingField,
                        "<lines> in <talk> needs at least one <li>".to_string(),
                        field,
                    ));
                }
                lines = Some(parsed);
            }
            _ => return Err(ctx.unknown_field(field, PARENT)),
        }
    }

    let lines = lines.ok_or_else(|| ctx.missing_field(node, "lines", PARENT))?;
    Ok(TalkDef { delta, lines })
}

fn parse_action_text(
    ctx: &ParseContext<'_, '_>,
    node: Node<'_, '_>,
    parent: &str,
) -> Result<ActionText, ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut delta = StatDelta::default();
    let mut line: Option<String> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = ctx.check_unique(&mut seen_fields, field, parent)?;
        match field_name.as_str() {
            "influence" => delta.influence = ctx.number::<i32>(field, "influence")?,
            "karma" => delta.karma = ctx.number::<i32>(field, "karma")?,
            "line" => line = Some(expand_escapes(&ctx.required_text(field, "line")?)),
            _ => return Err(ctx.unknown_field(field, parent)),
        }
    }

    let line = line.ok_or_else(|| ctx.missing_field(node, "line", parent))?;
    Ok(ActionText { delta, line })
}

fn node_text(node: Node<'_, '_>) -> String {
    expand_escapes(node.text().map(str::trim).unwrap_or_default())
}

/// Message text is authored on one line; `\n` marks a line break.
fn expand_escapes(text: &str) -> String {
    text.replace("\\n", "\n")
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentLoadError {
    ContentLoadError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read content: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: DiscoveryError, root: &Path) -> ContentLoadError {
    match error {
        DiscoveryError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentLoadError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check the enabled mod list",
                mod_id,
                expected_dir.display()
            ),
            mod_id,
            file_path: expected_dir,
            location: None,
        },
        other => ContentLoadError {
            code: ContentErrorCode::Discovery,
            message: other.to_string(),
            mod_id: "<discovery>".to_string(),
            file_path: root.to_path_buf(),
            location: None,
        },
    }
}
