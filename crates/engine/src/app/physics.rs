use super::tilemap::Tilemap;
use super::world::{Entity, EntityId, Vec2};

const SEPARATION_EPSILON: f32 = 0.0001;
/// Longest single move checked against the tilemap, in tiles.
const MAX_SUBSTEP: f32 = 0.5;
const MAX_SUBSTEPS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Touching edges do not count as overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moves by velocity and is blocked by solid tiles and world bounds.
    Dynamic,
    /// Never moves; reports overlaps with dynamic bodies as contacts.
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub half_extents: Vec2,
    pub velocity: Vec2,
    pub collide_world_bounds: bool,
}

impl Body {
    pub fn dynamic(half_extents: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            half_extents,
            velocity: Vec2::ZERO,
            collide_world_bounds: true,
        }
    }

    pub fn sensor(half_extents: Vec2) -> Self {
        Self {
            kind: BodyKind::Sensor,
            half_extents,
            velocity: Vec2::ZERO,
            collide_world_bounds: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub mover: EntityId,
    pub sensor: EntityId,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Moves dynamic bodies one axis at a time so a blocked axis does not cancel
/// sliding along the other, then rebuilds the contact list in entity order.
pub(crate) fn step_bodies(
    entities: &mut [Entity],
    tilemap: Option<&Tilemap>,
    bounds: Option<Aabb>,
    dt: f32,
    contacts: &mut Vec<Contact>,
) {
    contacts.clear();
    if !dt.is_finite() || dt < 0.0 {
        return;
    }

    for entity in entities.iter_mut() {
        let Some(body) = entity.body.as_mut() else {
            continue;
        };
        if body.kind != BodyKind::Dynamic {
            continue;
        }
        let mut position = entity.transform.position;
        for axis in [Axis::X, Axis::Y] {
            let delta = match axis {
                Axis::X => body.velocity.x * dt,
                Axis::Y => body.velocity.y * dt,
            };
            if delta == 0.0 || !delta.is_finite() {
                continue;
            }
            let Some(tilemap) = tilemap else {
                shift(&mut position, axis, delta);
                continue;
            };
            if sweep_axis(&mut position, body.half_extents, tilemap, axis, delta) {
                match axis {
                    Axis::X => body.velocity.x = 0.0,
                    Axis::Y => body.velocity.y = 0.0,
                }
            }
        }
        if body.collide_world_bounds {
            if let Some(bounds) = bounds {
                clamp_to_bounds(&mut position, body, bounds);
            }
        }
        entity.transform.position = position;
    }

    for mover in entities.iter() {
        let Some(mover_body) = mover.body.as_ref() else {
            continue;
        };
        if mover_body.kind != BodyKind::Dynamic {
            continue;
        }
        let mover_box = Aabb::from_center(mover.transform.position, mover_body.half_extents);
        for sensor in entities.iter() {
            let Some(sensor_body) = sensor.body.as_ref() else {
                continue;
            };
            if sensor_body.kind != BodyKind::Sensor {
                continue;
            }
            let sensor_box =
                Aabb::from_center(sensor.transform.position, sensor_body.half_extents);
            if mover_box.overlaps(&sensor_box) {
                contacts.push(Contact {
                    mover: mover.id,
                    sensor: sensor.id,
                });
            }
        }
    }
}

fn shift(position: &mut Vec2, axis: Axis, delta: f32) {
    match axis {
        Axis::X => position.x += delta,
        Axis::Y => position.y += delta,
    }
}

/// Walks `delta` in sub-steps shorter than a tile so a fast body or a long
/// tick cannot hop over a solid tile. Stops at the first blocking tile.
fn sweep_axis(
    position: &mut Vec2,
    half_extents: Vec2,
    tilemap: &Tilemap,
    axis: Axis,
    delta: f32,
) -> bool {
    let steps = (delta.abs() / MAX_SUBSTEP).ceil().clamp(1.0, MAX_SUBSTEPS as f32) as u32;
    let step = delta / steps as f32;
    for _ in 0..steps {
        shift(position, axis, step);
        if resolve_tiles(position, half_extents, tilemap, axis, step) {
            return true;
        }
    }
    false
}

/// Pushes the box back out of every solid tile it entered along `axis`.
/// Returns true when a tile blocked the move.
fn resolve_tiles(
    position: &mut Vec2,
    half_extents: Vec2,
    tilemap: &Tilemap,
    axis: Axis,
    delta: f32,
) -> bool {
    let origin = tilemap.origin();
    let bounds = Aabb::from_center(*position, half_extents);
    let min_x = (bounds.min.x - origin.x).floor() as i64;
    let max_x = (bounds.max.x - origin.x).ceil() as i64 - 1;
    let min_y = (bounds.min.y - origin.y).floor() as i64;
    let max_y = (bounds.max.y - origin.y).ceil() as i64 - 1;

    let mut blocked = false;
    for tile_y in min_y..=max_y {
        for tile_x in min_x..=max_x {
            if !tilemap.is_solid(tile_x, tile_y) {
                continue;
            }
            let tile_min = Vec2::new(origin.x + tile_x as f32, origin.y + tile_y as f32);
            let tile = Aabb::new(tile_min, tile_min + Vec2::new(1.0, 1.0));
            let current = Aabb::from_center(*position, half_extents);
            if !current.overlaps(&tile) {
                continue;
            }
            blocked = true;
            match axis {
                Axis::X if delta > 0.0 => position.x = tile.min.x - half_extents.x - SEPARATION_EPSILON,
                Axis::X => position.x = tile.max.x + half_extents.x + SEPARATION_EPSILON,
                Axis::Y if delta > 0.0 => position.y = tile.min.y - half_extents.y - SEPARATION_EPSILON,
                Axis::Y => position.y = tile.max.y + half_extents.y + SEPARATION_EPSILON,
            }
        }
    }
    blocked
}

fn clamp_to_bounds(position: &mut Vec2, body: &mut Body, bounds: Aabb) {
    let min_x = bounds.min.x + body.half_extents.x;
    let max_x = bounds.max.x - body.half_extents.x;
    let min_y = bounds.min.y + body.half_extents.y;
    let max_y = bounds.max.y - body.half_extents.y;
    if position.x < min_x || position.x > max_x {
        position.x = position.x.clamp(min_x, max_x.max(min_x));
        body.velocity.x = 0.0;
    }
    if position.y < min_y || position.y > max_y {
        position.y = position.y.clamp(min_y, max_y.max(min_y));
        body.velocity.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tilemap::TileDef;
    use crate::app::world::{RenderableDesc, SceneWorld, Transform};

    fn walled_map() -> Tilemap {
        // Middle column is solid.
        let palette = vec![
            TileDef {
                texture_key: "tile/open".to_string(),
                solid: false,
            },
            TileDef {
                texture_key: "tile/wall".to_string(),
                solid: true,
            },
        ];
        Tilemap::new(3, 3, Vec2::ZERO, palette, vec![0, 1, 0, 0, 1, 0, 0, 1, 0]).expect("map")
    }

    fn mover_at(world: &mut SceneWorld, position: Vec2, velocity: Vec2) -> EntityId {
        let mut body = Body::dynamic(Vec2::new(0.25, 0.25));
        body.velocity = velocity;
        world.spawn_with_body(Transform::at(position), RenderableDesc::texture("m"), body)
    }

    #[test]
    fn overlap_excludes_touching_edges() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(1.0, 1.0));
        let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let c = Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn solid_tile_blocks_and_zeroes_that_axis() {
        let mut world = SceneWorld::default();
        world.set_tilemap(walled_map());
        let id = mover_at(&mut world, Vec2::new(0.5, 1.5), Vec2::new(4.0, 1.0));
        world.apply_pending();

        world.step_physics(0.25);

        let entity = world.find_entity(id).expect("mover");
        let body = entity.body.expect("body");
        assert!(entity.transform.position.x <= 0.75);
        assert_eq!(body.velocity.x, 0.0);
        assert!((entity.transform.position.y - 1.75).abs() < 0.0001);
        assert_eq!(body.velocity.y, 1.0);
    }

    fn corridor_with_wall_at(wall_col: usize, width: usize) -> Tilemap {
        let palette = vec![
            TileDef {
                texture_key: "tile/open".to_string(),
                solid: false,
            },
            TileDef {
                texture_key: "tile/wall".to_string(),
                solid: true,
            },
        ];
        let mut tiles = vec![0; width];
        tiles[wall_col] = 1;
        Tilemap::new(width as u32, 1, Vec2::ZERO, palette, tiles).expect("corridor")
    }

    #[test]
    fn long_tick_cannot_tunnel_through_a_wall() {
        let mut world = SceneWorld::default();
        world.set_tilemap(corridor_with_wall_at(2, 6));
        let mut body = Body::dynamic(Vec2::new(0.3125, 0.3125));
        body.velocity = Vec2::new(6.25, 0.0);
        let id = world.spawn_with_body(
            Transform::at(Vec2::new(1.5, 0.5)),
            RenderableDesc::texture("m"),
            body,
        );
        world.apply_pending();

        // Two ticks per second moves 3.125 tiles in one step.
        world.step_physics(0.5);

        let entity = world.find_entity(id).expect("mover");
        assert!(entity.transform.position.x < 2.0 - 0.3125 + 0.001);
        assert_eq!(entity.body.expect("body").velocity.x, 0.0);
    }

    #[test]
    fn long_tick_in_open_corridor_covers_full_distance() {
        let mut world = SceneWorld::default();
        world.set_tilemap(corridor_with_wall_at(7, 8));
        let mut body = Body::dynamic(Vec2::new(0.3125, 0.3125));
        body.velocity = Vec2::new(6.25, 0.0);
        let id = world.spawn_with_body(
            Transform::at(Vec2::new(0.5, 0.5)),
            RenderableDesc::texture("m"),
            body,
        );
        world.apply_pending();

        world.step_physics(0.5);

        let entity = world.find_entity(id).expect("mover");
        assert!((entity.transform.position.x - 3.625).abs() < 0.001);
        assert_eq!(entity.body.expect("body").velocity.x, 6.25);
    }

    #[test]
    fn world_bounds_clamp_dynamic_bodies() {
        let mut world = SceneWorld::default();
        world.set_world_bounds(Aabb::new(Vec2::ZERO, Vec2::new(2.0, 2.0)));
        let id = mover_at(&mut world, Vec2::new(1.0, 1.0), Vec2::new(-10.0, 0.0));
        world.apply_pending();

        world.step_physics(1.0);

        let entity = world.find_entity(id).expect("mover");
        assert!((entity.transform.position.x - 0.25).abs() < 0.0001);
    }

    #[test]
    fn sensor_overlap_is_reported_once_per_step() {
        let mut world = SceneWorld::default();
        let mover = mover_at(&mut world, Vec2::new(1.0, 1.0), Vec2::ZERO);
        let sensor = world.spawn_with_body(
            Transform::at(Vec2::new(1.5, 1.0)),
            RenderableDesc::texture("s"),
            Body::sensor(Vec2::new(0.5, 0.5)),
        );
        world.spawn_with_body(
            Transform::at(Vec2::new(9.0, 9.0)),
            RenderableDesc::texture("s"),
            Body::sensor(Vec2::new(0.5, 0.5)),
        );
        world.apply_pending();

        world.step_physics(1.0 / 60.0);
        assert_eq!(world.contacts(), &[Contact { mover, sensor }]);

        world.step_physics(1.0 / 60.0);
        assert_eq!(world.contacts().len(), 1);
    }

    #[test]
    fn sensors_do_not_move() {
        let mut world = SceneWorld::default();
        let mut body = Body::sensor(Vec2::new(0.5, 0.5));
        body.velocity = Vec2::new(3.0, 3.0);
        let id = world.spawn_with_body(Transform::default(), RenderableDesc::texture("s"), body);
        world.apply_pending();

        world.step_physics(1.0);
        assert_eq!(world.find_entity(id).expect("sensor").transform.position, Vec2::ZERO);
    }
}
