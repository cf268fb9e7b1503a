use std::io;
use std::sync::{Arc, Mutex};

use engine::{EntityId, InputAction, InputSnapshot, Scene, SceneCommand, SceneWorld, Vec2};
use tracing_subscriber::fmt::MakeWriter;

use super::city::{is_road, TileKind};
use super::interaction::{Action, UiEvent};
use super::scene_impl::{ActorKind, CityScene, SceneBuildError};
use super::stats::{KarmaBand, Stats};
use super::ui::{layout, HudView};
use crate::content::{ActionText, DistrictDef, DistrictDefId, StatDelta, TalkDef};

const DT: f32 = 1.0 / 60.0;
const WINDOW: (u32, u32) = (1280, 720);

fn district() -> DistrictDef {
    DistrictDef {
        id: DistrictDefId(0),
        def_name: "district.test".to_string(),
        label: "Test Ward".to_string(),
        width: 17,
        height: 13,
        road_period: 4,
        building_roll_max: 10,
        building_threshold: 2,
        npc_count: 6,
        npc_label: "Resident".to_string(),
        player_name: "Kato".to_string(),
        player_speed: 6.25,
        cooldown_seconds: 1.0,
        karma_threshold: 15,
        camera_zoom: 1.3,
        talk: TalkDef {
            delta: StatDelta {
                influence: 2,
                karma: 0,
            },
            lines: vec!["{npc}: nice weather".to_string()],
        },
        bribe: ActionText {
            delta: StatDelta {
                influence: 5,
                karma: -2,
            },
            line: "{npc}: thanks".to_string(),
        },
        punch: ActionText {
            delta: StatDelta {
                influence: 10,
                karma: -10,
            },
            line: "{player} punched {npc}!\n{npc}: Ouch!!".to_string(),
        },
        welcome: "{player}: ready".to_string(),
    }
}

fn loaded_scene(def: DistrictDef, seed: u64) -> (CityScene, SceneWorld) {
    let mut scene = CityScene::build(def, seed, None).expect("build scene");
    let mut world = SceneWorld::default();
    world.set_viewport_px(WINDOW);
    scene.load(&mut world);
    (scene, world)
}

/// One runtime tick: scene update, deferred spawns, then physics.
fn tick(scene: &mut CityScene, world: &mut SceneWorld, input: InputSnapshot) -> SceneCommand {
    let command = scene.update(DT, &input.with_window_size(WINDOW), world);
    world.apply_pending();
    world.step_physics(DT);
    command
}

fn first_npc(scene: &CityScene) -> (EntityId, String) {
    scene
        .actors()
        .iter()
        .find_map(|actor| match &actor.kind {
            ActorKind::Npc { name, .. } => Some((actor.entity, name.clone())),
            ActorKind::Player => None,
        })
        .expect("npc")
}

fn player_id(scene: &CityScene) -> EntityId {
    scene.player_entity().expect("player")
}

fn position_of(world: &SceneWorld, id: EntityId) -> Vec2 {
    world.find_entity(id).expect("entity").transform.position
}

fn player_velocity(scene: &CityScene, world: &SceneWorld) -> Vec2 {
    world
        .find_entity(player_id(scene))
        .and_then(|entity| entity.body)
        .map(|body| body.velocity)
        .expect("player body")
}

/// Parks the player on top of `npc` and runs physics so the overlap is
/// published as a contact.
fn stand_on(scene: &CityScene, world: &mut SceneWorld, npc: EntityId) {
    let target = position_of(world, npc);
    let player = world.find_entity_mut(player_id(scene)).expect("player");
    player.transform.position = target;
    if let Some(body) = player.body.as_mut() {
        body.velocity = Vec2::ZERO;
    }
    world.step_physics(DT);
}

fn ui_texts(world: &SceneWorld) -> Vec<String> {
    world
        .ui()
        .panels()
        .iter()
        .flat_map(|panel| panel.lines.iter().map(|line| line.text.clone()))
        .collect()
}

fn rect_center(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(x + width * 0.5, y + height * 0.5)
}

#[test]
fn load_spawns_player_and_npcs_on_roads() {
    let def = district();
    let (scene, world) = loaded_scene(def.clone(), 7);
    assert_eq!(world.entity_count(), 1 + def.npc_count as usize);

    let tilemap = world.tilemap().expect("tilemap");
    for actor in scene.actors() {
        let position = position_of(&world, actor.entity);
        let (col, row) = tilemap.tile_coords_at_world(position).expect("on map");
        assert!(is_road(col, row, def.road_period), "{actor:?} at ({col},{row})");
        assert_eq!(scene.grid().kind_at(col, row), Some(TileKind::Road));
    }
    assert_eq!(scene.stats(), Stats::default());
    assert_eq!(scene.interaction().message(), Some("Kato: ready"));
    assert!(!scene.interaction().is_menu_open());
}

#[test]
fn npc_placement_stays_on_roads_across_seeds_and_periods() {
    for road_period in [4, 5] {
        for seed in 0..12 {
            let def = DistrictDef {
                road_period,
                npc_count: 20,
                width: 40,
                height: 30,
                ..district()
            };
            let (scene, world) = loaded_scene(def, seed);
            let tilemap = world.tilemap().expect("tilemap");
            for actor in scene.actors() {
                let (col, row) = tilemap
                    .tile_coords_at_world(position_of(&world, actor.entity))
                    .expect("on map");
                assert!(is_road(col, row, road_period));
            }
        }
    }
}

#[test]
fn same_seed_builds_same_district() {
    let (a_scene, a_world) = loaded_scene(district(), 1234);
    let (b_scene, b_world) = loaded_scene(district(), 1234);
    let positions = |scene: &CityScene, world: &SceneWorld| {
        scene
            .actors()
            .iter()
            .map(|actor| position_of(world, actor.entity))
            .collect::<Vec<_>>()
    };
    assert_eq!(positions(&a_scene, &a_world), positions(&b_scene, &b_world));
    assert_eq!(a_scene.grid(), b_scene.grid());
}

#[test]
fn held_keys_drive_player_velocity() {
    let (mut scene, mut world) = loaded_scene(district(), 3);
    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty()
            .with_action_down(InputAction::MoveRight, true)
            .with_action_down(InputAction::MoveUp, true),
    );
    let velocity = player_velocity(&scene, &world);
    assert!(velocity.x > 0.0 && velocity.y > 0.0);
    assert!((velocity.length() - 6.25).abs() < 0.01);
}

#[test]
fn punch_flow_end_to_end() {
    let (mut scene, mut world) = loaded_scene(district(), 11);
    let (npc, npc_name) = first_npc(&scene);

    stand_on(&scene, &mut world, npc);
    tick(&mut scene, &mut world, InputSnapshot::empty());
    assert!(scene.interaction().is_menu_open());
    assert_eq!(
        scene.interaction().target().map(|target| target.name.clone()),
        Some(npc_name.clone())
    );
    assert!(ui_texts(&world).contains(&npc_name));
    assert_eq!(scene.interaction().message(), None);

    // Menu open: held movement is ignored.
    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_action_down(InputAction::MoveRight, true),
    );
    assert_eq!(player_velocity(&scene, &world), Vec2::ZERO);

    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_action_tapped(InputAction::ChoiceThree),
    );
    let stats = scene.stats();
    assert_eq!(stats.influence, 10);
    assert!((-20..=-10).contains(&stats.karma));
    assert!(!scene.interaction().is_menu_open());
    let message = scene.interaction().message().expect("message").to_string();
    assert!(message.contains("Kato punched"), "{message}");
    assert!(message.contains(&npc_name));
    assert!(scene
        .interaction()
        .is_cooling_down(scene.clock_seconds()));
    assert!(scene.actors().iter().any(|actor| actor.entity == npc
        && actor.kind
            == ActorKind::Npc {
                name: npc_name.clone(),
                struck: true
            }));
    assert_eq!(
        world.find_entity(npc).and_then(|entity| entity.renderable.tint),
        Some([0, 0, 0])
    );

    // Movement is back immediately even though the message is still up.
    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_action_down(InputAction::MoveRight, true),
    );
    assert!(player_velocity(&scene, &world).x > 0.0);

    // Overlaps are ignored until the cooldown deadline passes.
    let now = scene.clock_seconds();
    let deadline = now + scene.interaction().cooldown_remaining(now);
    let mut reopened_at = None;
    for _ in 0..120 {
        stand_on(&scene, &mut world, npc);
        tick(&mut scene, &mut world, InputSnapshot::empty());
        if scene.interaction().is_menu_open() {
            reopened_at = Some(scene.clock_seconds());
            break;
        }
        assert!(scene.clock_seconds() < deadline + f64::from(DT));
    }
    let reopened_at = reopened_at.expect("menu reopens after cooldown");
    assert!(reopened_at + 1e-9 >= deadline);
    assert_eq!(scene.stats(), stats);
}

#[test]
fn cancel_closes_menu_and_starts_cooldown_without_stat_change() {
    let (mut scene, mut world) = loaded_scene(district(), 5);
    let (npc, _) = first_npc(&scene);
    stand_on(&scene, &mut world, npc);
    tick(&mut scene, &mut world, InputSnapshot::empty());
    assert!(scene.interaction().is_menu_open());

    let command = tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_action_tapped(InputAction::Cancel),
    );
    assert_eq!(command, SceneCommand::None);
    assert!(!scene.interaction().is_menu_open());
    assert!(scene.interaction().is_cooling_down(scene.clock_seconds()));
    assert_eq!(scene.stats(), Stats::default());
}

#[test]
fn clicking_bribe_button_resolves_through_pointer() {
    let def = district();
    let (mut scene, mut world) = loaded_scene(def.clone(), 9);
    let (npc, npc_name) = first_npc(&scene);
    stand_on(&scene, &mut world, npc);
    tick(&mut scene, &mut world, InputSnapshot::empty());

    let view = HudView {
        district_label: &def.label,
        influence: 0,
        karma_band: KarmaBand::Neutral,
        menu_target: Some(&npc_name),
        message: None,
    };
    let hud = layout(&view, WINDOW);
    let (_, bribe_rect) = hud
        .menu
        .as_ref()
        .expect("menu")
        .buttons
        .iter()
        .find(|(event, _)| *event == UiEvent::Action(Action::Bribe))
        .copied()
        .expect("bribe button");
    let click = rect_center(bribe_rect.x, bribe_rect.y, bribe_rect.width, bribe_rect.height);
    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_pointer(Some(click), true, true),
    );

    assert_eq!(
        scene.stats(),
        Stats {
            influence: 5,
            karma: -2
        }
    );
    assert_eq!(
        scene.interaction().message().map(str::to_string),
        Some(format!("{npc_name}: thanks"))
    );
}

#[test]
fn escape_dismisses_message_before_quitting() {
    let (mut scene, mut world) = loaded_scene(district(), 2);
    assert!(scene.interaction().message().is_some());

    let escape = InputSnapshot::empty().with_action_tapped(InputAction::Cancel);
    assert_eq!(tick(&mut scene, &mut world, escape), SceneCommand::None);
    assert_eq!(scene.interaction().message(), None);
    assert!(!scene.interaction().is_cooling_down(scene.clock_seconds()));

    assert_eq!(tick(&mut scene, &mut world, escape), SceneCommand::Quit);
}

#[test]
fn held_dpad_button_moves_player() {
    let def = district();
    let (mut scene, mut world) = loaded_scene(def.clone(), 4);
    let view = HudView {
        district_label: &def.label,
        influence: 0,
        karma_band: KarmaBand::Neutral,
        menu_target: None,
        message: Some("Kato: ready"),
    };
    let hud = layout(&view, WINDOW);
    let (_, up) = hud.dpad[0];
    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_pointer(
            Some(rect_center(up.x, up.y, up.width, up.height)),
            true,
            true,
        ),
    );
    let velocity = player_velocity(&scene, &world);
    assert_eq!(velocity.x, 0.0);
    assert!((velocity.y - 6.25).abs() < 1e-4);
}

#[test]
fn hud_reports_influence_and_karma_band() {
    let (mut scene, mut world) = loaded_scene(district(), 8);
    let (npc, _) = first_npc(&scene);
    stand_on(&scene, &mut world, npc);
    tick(&mut scene, &mut world, InputSnapshot::empty());
    tick(
        &mut scene,
        &mut world,
        InputSnapshot::empty().with_action_tapped(InputAction::ChoiceTwo),
    );
    let texts = ui_texts(&world);
    assert!(texts.contains(&"Influence: 5%".to_string()), "{texts:?}");
    assert!(texts.contains(&"Karma: neutral".to_string()), "{texts:?}");
}

#[test]
fn impossible_placement_fails_to_build() {
    let def = DistrictDef {
        width: 1,
        height: 1,
        road_period: 1,
        npc_count: 1,
        ..district()
    };
    let result = CityScene::build(def, 0, None);
    assert!(matches!(result, Err(SceneBuildError::Placement(_))));
}

#[test]
fn debug_lines_describe_district_and_menu() {
    let (scene, world) = loaded_scene(district(), 6);
    let lines = scene.debug_lines(&world);
    assert_eq!(lines[0], "District: district.test");
    assert_eq!(lines[1], "Seed: 6");
    assert!(lines.iter().any(|line| line == "Menu: closed"));
    assert_eq!(
        scene.debug_title(&world).as_deref(),
        Some("Ward Walker | Test Ward")
    );
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("log buffer").clone()).expect("utf8 logs")
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn one_load_logs_scene_loaded_once() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        loaded_scene(district(), 5);
    });

    let text = logs.text();
    assert_eq!(text.matches("scene_loaded").count(), 1, "{text}");
}
