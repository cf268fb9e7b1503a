use engine::{Aabb, TileDef, Tilemap, TilemapError, Vec2};
use rand::Rng;

use crate::content::DistrictDef;

pub(crate) const ROAD_TEXTURE_KEY: &str = "tile/road";
pub(crate) const BUILDING_TEXTURE_KEY: &str = "tile/building";
pub(crate) const GRASS_TEXTURE_KEY: &str = "tile/grass";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TileKind {
    Road,
    Building,
    Grass,
}

impl TileKind {
    const PALETTE_ORDER: [TileKind; 3] = [TileKind::Road, TileKind::Building, TileKind::Grass];

    fn palette_id(self) -> u16 {
        match self {
            TileKind::Road => 0,
            TileKind::Building => 1,
            TileKind::Grass => 2,
        }
    }

    pub(crate) fn texture_key(self) -> &'static str {
        match self {
            TileKind::Road => ROAD_TEXTURE_KEY,
            TileKind::Building => BUILDING_TEXTURE_KEY,
            TileKind::Grass => GRASS_TEXTURE_KEY,
        }
    }

    pub(crate) fn is_solid(self) -> bool {
        matches!(self, TileKind::Building)
    }
}

/// Road lattice: every `period`-th column and row. A zero period is treated
/// as one.
pub(crate) fn is_road(col: u32, row: u32, period: u32) -> bool {
    let period = period.max(1);
    col % period == 0 || row % period == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GridParams {
    pub width: u32,
    pub height: u32,
    pub road_period: u32,
    pub building_roll_max: u32,
    pub building_threshold: u32,
}

impl GridParams {
    pub(crate) fn from_district(def: &DistrictDef) -> Self {
        Self {
            width: def.width,
            height: def.height,
            road_period: def.road_period,
            building_roll_max: def.building_roll_max,
            building_threshold: def.building_threshold,
        }
    }
}

/// Row-major tile classification with `(0, 0)` at the bottom-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CityGrid {
    width: u32,
    height: u32,
    road_period: u32,
    tiles: Vec<TileKind>,
}

/// Roads come from the lattice rule; every other cell rolls
/// `0..=building_roll_max` and becomes a building when the roll exceeds
/// `building_threshold`.
pub(crate) fn generate(params: &GridParams, rng: &mut impl Rng) -> CityGrid {
    let mut tiles = Vec::with_capacity(params.width as usize * params.height as usize);
    for row in 0..params.height {
        for col in 0..params.width {
            let kind = if is_road(col, row, params.road_period) {
                TileKind::Road
            } else if rng.gen_range(0..=params.building_roll_max) > params.building_threshold {
                TileKind::Building
            } else {
                TileKind::Grass
            };
            tiles.push(kind);
        }
    }
    CityGrid {
        width: params.width,
        height: params.height,
        road_period: params.road_period,
        tiles,
    }
}

impl CityGrid {
    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn kind_at(&self, col: u32, row: u32) -> Option<TileKind> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }

    #[cfg(test)]
    pub(crate) fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|tile| **tile == kind).count()
    }

    /// The lattice crossing nearest the corner, always a road tile.
    pub(crate) fn player_spawn_tile(&self) -> (u32, u32) {
        let period = self.road_period.max(1);
        let col = if period < self.width { period } else { 0 };
        let row = if period < self.height { period } else { 0 };
        (col, row)
    }

    /// World-space rectangle covered by the grid, one unit per tile.
    pub(crate) fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec2::ZERO,
            Vec2::new(self.width as f32, self.height as f32),
        )
    }

    pub(crate) fn to_tilemap(&self) -> Result<Tilemap, TilemapError> {
        let palette = TileKind::PALETTE_ORDER
            .iter()
            .map(|kind| TileDef {
                texture_key: kind.texture_key().to_string(),
                solid: kind.is_solid(),
            })
            .collect::<Vec<_>>();
        let tiles = self.tiles.iter().map(|kind| kind.palette_id()).collect();
        Tilemap::new(self.width, self.height, Vec2::ZERO, palette, tiles)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;

    fn params(width: u32, height: u32, road_period: u32) -> GridParams {
        GridParams {
            width,
            height,
            road_period,
            building_roll_max: 10,
            building_threshold: 2,
        }
    }

    #[test]
    fn road_predicate_matches_lattice() {
        assert!(is_road(0, 3, 4));
        assert!(is_road(8, 1, 4));
        assert!(is_road(1, 12, 4));
        assert!(!is_road(1, 1, 4));
        assert!(!is_road(5, 7, 4));
        assert!(is_road(3, 3, 0));
    }

    #[test]
    fn road_cells_follow_predicate_across_seeds() {
        for seed in 0..32 {
            for road_period in [4, 5] {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                let grid = generate(&params(23, 17, road_period), &mut rng);
                for row in 0..grid.height() {
                    for col in 0..grid.width() {
                        let kind = grid.kind_at(col, row).expect("in range");
                        assert_eq!(
                            kind == TileKind::Road,
                            is_road(col, row, road_period),
                            "seed {seed} cell ({col},{row})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn threshold_at_roll_max_produces_no_buildings() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let grid = generate(
            &GridParams {
                building_threshold: 10,
                ..params(20, 20, 4)
            },
            &mut rng,
        );
        assert_eq!(grid.count(TileKind::Building), 0);
        assert_eq!(
            grid.count(TileKind::Grass) + grid.count(TileKind::Road),
            400
        );
    }

    #[test]
    fn default_roll_mixes_buildings_and_grass() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let grid = generate(&params(75, 75, 4), &mut rng);
        let buildings = grid.count(TileKind::Building);
        let grass = grid.count(TileKind::Grass);
        assert!(buildings > grass, "buildings {buildings} grass {grass}");
        assert!(grass > 0);
    }

    #[test]
    fn same_seed_same_grid() {
        let a = generate(&params(30, 30, 5), &mut Xoshiro256PlusPlus::seed_from_u64(99));
        let b = generate(&params(30, 30, 5), &mut Xoshiro256PlusPlus::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn player_spawn_is_road_even_on_tiny_maps() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for (width, height, period) in [(75, 75, 4), (3, 3, 5), (1, 1, 1), (6, 2, 5)] {
            let grid = generate(&params(width, height, period), &mut rng);
            let (col, row) = grid.player_spawn_tile();
            assert_eq!(grid.kind_at(col, row), Some(TileKind::Road));
        }
    }

    #[test]
    fn tilemap_marks_only_buildings_solid() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let grid = generate(&params(12, 9, 4), &mut rng);
        let tilemap = grid.to_tilemap().expect("tilemap");
        assert_eq!((tilemap.width(), tilemap.height()), (12, 9));
        for row in 0..9 {
            for col in 0..12 {
                let kind = grid.kind_at(col, row).expect("kind");
                assert_eq!(
                    tilemap.is_solid(i64::from(col), i64::from(row)),
                    kind == TileKind::Building
                );
                assert_eq!(
                    tilemap.tile_def_at(col, row).map(|def| def.texture_key.as_str()),
                    Some(kind.texture_key())
                );
            }
        }
        assert_eq!(grid.bounds().max, Vec2::new(12.0, 9.0));
    }
}
