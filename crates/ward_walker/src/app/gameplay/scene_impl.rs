use std::path::PathBuf;

use engine::{
    Body, EntityId, InputAction, InputSnapshot, RenderableDesc, Scene, SceneCommand, SceneWorld,
    Tilemap, TilemapError, Transform, Vec2,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::city::{generate, CityGrid, GridParams};
use super::interaction::{
    InteractionMachine, InteractionRules, InteractionTarget, Transition, UiEvent,
};
use super::motion::{compute_velocity, DirectionInput};
use super::placement::{place_npcs, NpcPlacement, PlacementError, MAX_ATTEMPTS_PER_NPC};
use super::textures::{register_textures, NPC_TEXTURE_KEY, PLAYER_TEXTURE_KEY};
use super::ui::{build_panels, dpad_held, event_at, keyboard_event, layout, HudView};
use crate::content::DistrictDef;

/// 20 of 32 texture pixels.
const PLAYER_HALF_EXTENT: f32 = 0.3125;
const NPC_HALF_EXTENT: f32 = 0.5;
const PLAYER_DEPTH: i32 = 10;
const NPC_DEPTH: i32 = 0;
const CAMERA_FOLLOW_LERP: f32 = 0.08;
const STRUCK_TINT: [u8; 3] = [0, 0, 0];

#[derive(Debug, Error)]
pub(crate) enum SceneBuildError {
    #[error("failed to build district tilemap: {0}")]
    Tilemap(#[from] TilemapError),
    #[error("failed to place npcs: {0}")]
    Placement(#[from] PlacementError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActorKind {
    Player,
    Npc { name: String, struck: bool },
}

/// Gameplay record for a spawned entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Actor {
    pub entity: EntityId,
    pub kind: ActorKind,
}

/// Generated once per run so a bad district fails before the window opens.
#[derive(Debug, Clone)]
struct DistrictLayout {
    grid: CityGrid,
    tilemap: Tilemap,
    player_tile: (u32, u32),
    npcs: Vec<NpcPlacement>,
}

pub(crate) struct CityScene {
    district: DistrictDef,
    seed: u64,
    texture_dir: Option<PathBuf>,
    layout: DistrictLayout,
    rng: Xoshiro256PlusPlus,
    clock_seconds: f64,
    actors: Vec<Actor>,
    player: Option<EntityId>,
    interaction: InteractionMachine,
}

impl CityScene {
    pub(crate) fn build(
        district: DistrictDef,
        seed: u64,
        texture_dir: Option<PathBuf>,
    ) -> Result<Self, SceneBuildError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let grid = generate(&GridParams::from_district(&district), &mut rng);
        let tilemap = grid.to_tilemap()?;
        let player_tile = grid.player_spawn_tile();
        let npcs = place_npcs(
            &grid,
            district.npc_count,
            &district.npc_label,
            player_tile,
            MAX_ATTEMPTS_PER_NPC,
            &mut rng,
        )?;
        let interaction = InteractionMachine::new(InteractionRules::from_district(&district));

        Ok(Self {
            layout: DistrictLayout {
                grid,
                tilemap,
                player_tile,
                npcs,
            },
            district,
            seed,
            texture_dir,
            rng,
            clock_seconds: 0.0,
            actors: Vec::new(),
            player: None,
            interaction,
        })
    }

    #[cfg(test)]
    pub(crate) fn stats(&self) -> super::stats::Stats {
        self.interaction.state().stats
    }

    #[cfg(test)]
    pub(crate) fn interaction(&self) -> &InteractionMachine {
        &self.interaction
    }

    #[cfg(test)]
    pub(crate) fn actors(&self) -> &[Actor] {
        &self.actors
    }

    #[cfg(test)]
    pub(crate) fn player_entity(&self) -> Option<EntityId> {
        self.player
    }

    #[cfg(test)]
    pub(crate) fn grid(&self) -> &CityGrid {
        &self.layout.grid
    }

    #[cfg(test)]
    pub(crate) fn clock_seconds(&self) -> f64 {
        self.clock_seconds
    }

    fn hud_view(&self) -> HudView<'_> {
        HudView {
            district_label: &self.district.label,
            influence: self.interaction.state().stats.influence,
            karma_band: self
                .interaction
                .state()
                .stats
                .karma_band(self.district.karma_threshold),
            menu_target: self.interaction.target().map(|target| target.name.as_str()),
            message: self.interaction.message(),
        }
    }

    fn refresh_hud(&self, world: &mut SceneWorld, window_size: (u32, u32)) {
        let view = self.hud_view();
        let panels = build_panels(&view, &layout(&view, window_size));
        let ui = world.ui_mut();
        ui.clear();
        for panel in panels {
            ui.push(panel);
        }
    }

    fn npc_target(&self, entity: EntityId) -> Option<InteractionTarget> {
        self.actors
            .iter()
            .find(|actor| actor.entity == entity)
            .and_then(|actor| match &actor.kind {
                ActorKind::Npc { name, .. } => Some(InteractionTarget {
                    entity,
                    name: name.clone(),
                }),
                ActorKind::Player => None,
            })
    }

    fn mark_struck(&mut self, world: &mut SceneWorld, entity: EntityId) {
        if let Some(ActorKind::Npc { struck, .. }) = self
            .actors
            .iter_mut()
            .find(|actor| actor.entity == entity)
            .map(|actor| &mut actor.kind)
        {
            *struck = true;
        }
        if let Some(npc) = world.find_entity_mut(entity) {
            npc.renderable.tint = Some(STRUCK_TINT);
        }
    }

    fn apply_ui_event(&mut self, event: UiEvent, world: &mut SceneWorld) {
        match self
            .interaction
            .handle(event, self.clock_seconds, &mut self.rng)
        {
            Ok(Transition::Resolved(resolution)) => {
                if resolution.strikes_target() {
                    self.mark_struck(world, resolution.target.entity);
                }
                let stats = self.interaction.state().stats;
                info!(
                    npc = %resolution.target.name,
                    action = resolution.action.label(),
                    influence_delta = resolution.delta.influence,
                    karma_delta = resolution.delta.karma,
                    influence = stats.influence,
                    karma = stats.karma,
                    "interaction_resolved"
                );
            }
            Ok(Transition::MenuClosed(target)) => {
                info!(npc = %target.name, "interaction_cancelled");
            }
            Ok(Transition::MessageClosed) => debug!("message_closed"),
            Ok(Transition::Ignored) => {}
            Err(error) => warn!(error = %error, "interaction_rejected"),
        }
    }

    fn open_menu_on_contact(&mut self, world: &SceneWorld) {
        let Some(player) = self.player else {
            return;
        };
        let target = world
            .contacts()
            .iter()
            .filter(|contact| contact.mover == player)
            .find_map(|contact| self.npc_target(contact.sensor));
        let Some(target) = target else {
            return;
        };
        let name = target.name.clone();
        if self.interaction.try_open(target, self.clock_seconds) {
            info!(npc = %name, "interaction_menu_opened");
        }
    }
}

impl Scene for CityScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.actors.clear();
        self.player = None;
        self.clock_seconds = 0.0;
        self.interaction.reset();

        let bounds = self.layout.grid.bounds();
        world.set_tilemap(self.layout.tilemap.clone());
        world.set_world_bounds(bounds);
        world.camera_mut().set_bounds(bounds);
        world.camera_mut().set_zoom_clamped(self.district.camera_zoom);

        match register_textures(world.textures_mut(), self.texture_dir.as_deref()) {
            Ok(overrides) if overrides > 0 => info!(overrides, "texture_overrides_loaded"),
            Ok(_) => {}
            Err(error) => warn!(error = %error, "texture_setup_failed"),
        }

        let (col, row) = self.layout.player_tile;
        let player_position = tile_center(&self.layout.tilemap, col, row);
        let player = world.spawn_with_body(
            Transform::at(player_position),
            RenderableDesc::texture(PLAYER_TEXTURE_KEY).with_depth(PLAYER_DEPTH),
            Body::dynamic(Vec2::new(PLAYER_HALF_EXTENT, PLAYER_HALF_EXTENT)),
        );
        self.player = Some(player);
        self.actors.push(Actor {
            entity: player,
            kind: ActorKind::Player,
        });
        world.camera_mut().position = player_position;
        world.camera_mut().start_follow(player, CAMERA_FOLLOW_LERP);

        for npc in &self.layout.npcs {
            let (col, row) = npc.tile;
            let entity = world.spawn_with_body(
                Transform::at(tile_center(&self.layout.tilemap, col, row)),
                RenderableDesc::texture(NPC_TEXTURE_KEY).with_depth(NPC_DEPTH),
                Body::sensor(Vec2::new(NPC_HALF_EXTENT, NPC_HALF_EXTENT)),
            );
            debug!(npc = %npc.name, col, row, "npc_placed");
            self.actors.push(Actor {
                entity,
                kind: ActorKind::Npc {
                    name: npc.name.clone(),
                    struck: false,
                },
            });
        }
        world.apply_pending();

        if !self.district.welcome.is_empty() {
            let welcome = self.interaction.rules().format(&self.district.welcome, "");
            self.interaction.show_message(welcome);
        }
        let viewport = world.viewport_px();
        self.refresh_hud(world, viewport);

        info!(
            district = %self.district.def_name,
            seed = self.seed,
            npc_count = self.layout.npcs.len(),
            entity_count = world.entity_count(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        self.clock_seconds += f64::from(fixed_dt_seconds);
        let window_size = input.window_size();
        let hud = layout(&self.hud_view(), window_size);
        let menu_open = self.interaction.is_menu_open();
        let message_shown = self.interaction.message().is_some();

        if input.was_pressed(InputAction::Cancel) && !menu_open && !message_shown {
            info!("quit_requested");
            return SceneCommand::Quit;
        }

        let pointer_event = input
            .pointer_position_px()
            .filter(|_| input.pointer_pressed())
            .and_then(|point| event_at(&hud, point));
        if let Some(event) = pointer_event.or_else(|| keyboard_event(input, menu_open, message_shown)) {
            self.apply_ui_event(event, world);
        }

        self.open_menu_on_contact(world);

        let directions = DirectionInput::from_keys(input).union(dpad_held(&hud, input));
        let velocity = compute_velocity(
            directions,
            self.district.player_speed,
            self.interaction.is_menu_open(),
        );
        if let Some(player) = self.player {
            if let Some(body) = world
                .find_entity_mut(player)
                .and_then(|entity| entity.body.as_mut())
            {
                body.velocity = velocity;
            }
        }

        self.refresh_hud(world, window_size);
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        self.actors.clear();
        self.player = None;
        world.ui_mut().clear();
        info!(district = %self.district.def_name, "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(format!("Ward Walker | {}", self.district.label))
    }

    fn debug_lines(&self, world: &SceneWorld) -> Vec<String> {
        let player_position = self
            .player
            .and_then(|player| world.find_entity(player))
            .map(|entity| entity.transform.position);
        let stats = self.interaction.state().stats;
        let mut lines = vec![
            format!("District: {}", self.district.def_name),
            format!("Seed: {}", self.seed),
        ];
        if let Some(position) = player_position {
            lines.push(format!("Player: {:.1},{:.1}", position.x, position.y));
        }
        lines.push(format!(
            "Menu: {}",
            if self.interaction.is_menu_open() {
                "open"
            } else {
                "closed"
            }
        ));
        lines.push(format!(
            "Cooldown: {:.2}s",
            self.interaction.cooldown_remaining(self.clock_seconds)
        ));
        lines.push(format!("Influence: {} Karma: {}", stats.influence, stats.karma));
        lines
    }
}

fn tile_center(tilemap: &Tilemap, col: u32, row: u32) -> Vec2 {
    tilemap
        .tile_center_world(col, row)
        .unwrap_or_else(|| Vec2::new(col as f32 + 0.5, row as f32 + 0.5))
}
