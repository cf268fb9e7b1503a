use std::ops::{Add, Mul, Sub};

use super::camera::Camera2D;
use super::physics::{step_bodies, Aabb, Body, Contact};
use super::rendering::TextureStore;
use super::tilemap::Tilemap;
use super::ui::UiLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self { position }
    }
}

/// Sprites are drawn centered on the entity position at one texture pixel per
/// `1 / PIXELS_PER_WORLD` world units, scaled by camera zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableDesc {
    pub texture_key: String,
    /// Multiplied into every texel, `[0, 0, 0]` renders a silhouette.
    pub tint: Option<[u8; 3]>,
    pub depth: i32,
}

impl RenderableDesc {
    pub fn texture(texture_key: impl Into<String>) -> Self {
        Self {
            texture_key: texture_key.into(),
            tint: None,
            depth: 0,
        }
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub body: Option<Body>,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }

    pub fn aabb(&self) -> Option<Aabb> {
        self.body
            .as_ref()
            .map(|body| Aabb::from_center(self.transform.position, body.half_extents))
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    tilemap: Option<Tilemap>,
    world_bounds: Option<Aabb>,
    contacts: Vec<Contact>,
    textures: TextureStore,
    ui: UiLayer,
    viewport_px: (u32, u32),
}

impl SceneWorld {
    #[cfg(test)]
    pub(crate) fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_internal(transform, renderable, None)
    }

    pub fn spawn_with_body(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        body: Body,
    ) -> EntityId {
        self.spawn_internal(transform, renderable, Some(body))
    }

    fn spawn_internal(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        body: Option<Body>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            body,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn apply_pending(&mut self) {
        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    /// Drops entities, contacts and UI. Tilemap, textures and bounds belong to
    /// the loaded level and are replaced explicitly.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
        self.contacts.clear();
        self.ui.clear();
    }

    /// Integrates bodies against the tilemap and bounds, refreshes contacts,
    /// then moves the camera toward its follow target.
    pub fn step_physics(&mut self, fixed_dt_seconds: f32) {
        step_bodies(
            &mut self.entities,
            self.tilemap.as_ref(),
            self.world_bounds,
            fixed_dt_seconds,
            &mut self.contacts,
        );
        let follow_position = self
            .camera
            .follow()
            .and_then(|follow| self.find_entity(follow.target))
            .map(|entity| entity.transform.position);
        self.camera.update(follow_position, self.viewport_px);
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn set_world_bounds(&mut self, bounds: Aabb) {
        self.world_bounds = Some(bounds);
    }

    pub fn world_bounds(&self) -> Option<Aabb> {
        self.world_bounds
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureStore {
        &mut self.textures
    }

    pub fn ui(&self) -> &UiLayer {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiLayer {
        &mut self.ui
    }

    pub fn viewport_px(&self) -> (u32, u32) {
        self.viewport_px
    }

    pub fn set_viewport_px(&mut self, viewport_px: (u32, u32)) {
        self.viewport_px = viewport_px;
    }
}
