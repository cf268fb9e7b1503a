use rand::Rng;
use thiserror::Error;

use super::city::{CityGrid, TileKind};

pub(crate) const MAX_ATTEMPTS_PER_NPC: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PlacementError {
    #[error("no road tile found for npc {npc_number} after {attempts} attempts")]
    Exhausted { npc_number: u32, attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NpcPlacement {
    pub name: String,
    pub tile: (u32, u32),
}

/// Rejection-samples `count` road tiles. `reserved` (the player's spawn) is
/// never handed out; two NPCs may share a tile. Names are `"<label> N"`
/// starting at one.
pub(crate) fn place_npcs(
    grid: &CityGrid,
    count: u32,
    label: &str,
    reserved: (u32, u32),
    max_attempts_per_npc: u32,
    rng: &mut impl Rng,
) -> Result<Vec<NpcPlacement>, PlacementError> {
    let mut placements = Vec::with_capacity(count as usize);
    if grid.width() == 0 || grid.height() == 0 {
        return match count {
            0 => Ok(placements),
            _ => Err(PlacementError::Exhausted {
                npc_number: 1,
                attempts: 0,
            }),
        };
    }

    for npc_index in 0..count {
        let npc_number = npc_index + 1;
        let tile = sample_road_tile(grid, reserved, max_attempts_per_npc, rng).ok_or(
            PlacementError::Exhausted {
                npc_number,
                attempts: max_attempts_per_npc,
            },
        )?;
        placements.push(NpcPlacement {
            name: format!("{label} {npc_number}"),
            tile,
        });
    }
    Ok(placements)
}

fn sample_road_tile(
    grid: &CityGrid,
    reserved: (u32, u32),
    max_attempts: u32,
    rng: &mut impl Rng,
) -> Option<(u32, u32)> {
    (0..max_attempts).find_map(|_| {
        let tile = (rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
        let accepted = tile != reserved && grid.kind_at(tile.0, tile.1) == Some(TileKind::Road);
        accepted.then_some(tile)
    })
}
