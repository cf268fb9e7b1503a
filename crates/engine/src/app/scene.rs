use super::input::{ActionStates, InputAction};
use super::world::{SceneWorld, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    pointer_position_px: Option<Vec2>,
    pointer_down: bool,
    pointer_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        actions: ActionStates,
        pointer_position_px: Option<Vec2>,
        pointer_down: bool,
        pointer_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            actions,
            pointer_position_px,
            pointer_down,
            pointer_pressed,
            window_width,
            window_height,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    /// Press without hold, as a tap that was released inside the same tick.
    pub fn with_action_tapped(mut self, action: InputAction) -> Self {
        self.actions.set(action, true);
        self.actions.set(action, false);
        self
    }

    pub fn with_pointer(mut self, position_px: Option<Vec2>, down: bool, pressed: bool) -> Self {
        self.pointer_position_px = position_px;
        self.pointer_down = down;
        self.pointer_pressed = pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn pointer_position_px(&self) -> Option<Vec2> {
        self.pointer_position_px
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn pointer_pressed(&self) -> bool {
        self.pointer_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
    /// Extra lines for the perf overlay.
    fn debug_lines(&self, _world: &SceneWorld) -> Vec<String> {
        Vec::new()
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    /// One fixed step: scene logic, deferred spawns, then physics and camera.
    pub(crate) fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.world.set_viewport_px(input.window_size());
        let command = self.scene.update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
        self.world.step_physics(fixed_dt_seconds);
        command
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn debug_lines(&self) -> Vec<String> {
        self.scene.debug_lines(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::physics::{Body, BodyKind};
    use crate::app::world::{RenderableDesc, Transform};

    struct DriftScene {
        velocity: Vec2,
    }

    impl Scene for DriftScene {
        fn load(&mut self, world: &mut SceneWorld) {
            world.spawn_with_body(
                Transform::at(Vec2 { x: 2.0, y: 2.0 }),
                RenderableDesc::texture("drifter"),
                Body::dynamic(Vec2 { x: 0.25, y: 0.25 }),
            );
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            if input.was_pressed(InputAction::Cancel) {
                return SceneCommand::Quit;
            }
            for entity in world.entities_mut() {
                if let Some(body) = entity.body.as_mut() {
                    if body.kind == BodyKind::Dynamic {
                        body.velocity = self.velocity;
                    }
                }
            }
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    #[test]
    fn load_applies_pending_spawns() {
        let mut runtime = SceneRuntime::new(Box::new(DriftScene {
            velocity: Vec2::default(),
        }));
        runtime.load();
        assert_eq!(runtime.world().entity_count(), 1);
    }

    #[test]
    fn tick_integrates_velocity_set_by_scene() {
        let mut runtime = SceneRuntime::new(Box::new(DriftScene {
            velocity: Vec2 { x: 1.0, y: 0.0 },
        }));
        runtime.load();
        let command = runtime.tick(0.5, &InputSnapshot::empty());

        assert_eq!(command, SceneCommand::None);
        let x = runtime.world().entities()[0].transform.position.x;
        assert!((x - 2.5).abs() < 0.0001);
    }

    #[test]
    fn tapped_cancel_reaches_scene_as_press() {
        let mut runtime = SceneRuntime::new(Box::new(DriftScene {
            velocity: Vec2::default(),
        }));
        runtime.load();
        let input = InputSnapshot::empty().with_action_tapped(InputAction::Cancel);
        assert!(!input.is_down(InputAction::Cancel));
        assert_eq!(runtime.tick(1.0 / 60.0, &input), SceneCommand::Quit);
    }

    #[test]
    fn shutdown_clears_world() {
        let mut runtime = SceneRuntime::new(Box::new(DriftScene {
            velocity: Vec2::default(),
        }));
        runtime.load();
        runtime.shutdown();
        assert_eq!(runtime.world().entity_count(), 0);
    }
}
