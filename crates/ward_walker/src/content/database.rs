use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DistrictDefId(pub u32);

/// Signed change applied to the player's stats by one interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StatDelta {
    pub influence: i32,
    pub karma: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TalkDef {
    pub delta: StatDelta,
    /// One line is picked at random per talk. Never empty once compiled.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActionText {
    pub delta: StatDelta,
    pub line: String,
}

/// One authored ward layout and its interaction rules. Message templates
/// substitute `{npc}` and `{player}`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DistrictDef {
    pub id: DistrictDefId,
    pub def_name: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub road_period: u32,
    pub building_roll_max: u32,
    pub building_threshold: u32,
    pub npc_count: u32,
    pub npc_label: String,
    pub player_name: String,
    /// Tiles per second.
    pub player_speed: f32,
    pub cooldown_seconds: f32,
    pub karma_threshold: i32,
    pub camera_zoom: f32,
    pub talk: TalkDef,
    pub bribe: ActionText,
    pub punch: ActionText,
    pub welcome: String,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct DistrictDatabase {
    districts: Vec<DistrictDef>,
    ids_by_name: HashMap<String, DistrictDefId>,
}

impl DistrictDatabase {
    pub(crate) fn from_district_defs(mut districts: Vec<DistrictDef>) -> Self {
        let mut ids_by_name = HashMap::with_capacity(districts.len());
        for (idx, def) in districts.iter_mut().enumerate() {
            let id = DistrictDefId(idx as u32);
            def.id = id;
            ids_by_name.insert(def.def_name.clone(), id);
        }
        Self {
            districts,
            ids_by_name,
        }
    }

    pub(crate) fn district_id_by_name(&self, name: &str) -> Option<DistrictDefId> {
        self.ids_by_name.get(name).copied()
    }

    pub(crate) fn district(&self, id: DistrictDefId) -> Option<&DistrictDef> {
        self.districts.get(id.0 as usize)
    }

    pub(crate) fn district_by_name(&self, name: &str) -> Option<&DistrictDef> {
        self.district_id_by_name(name)
            .and_then(|id| self.district(id))
    }

    pub(crate) fn districts(&self) -> &[DistrictDef] {
        &self.districts
    }

    pub(crate) fn len(&self) -> usize {
        self.districts.len()
    }
}
