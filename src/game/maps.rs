//! Level Catalog
//!
//! Static level definitions. Solid geometry is written as horizontal runs
//! of tiles; `MapData::from_definition` expands and validates them.

/// A horizontal run of solid tiles `from..=to` on row `y`.
#[derive(Clone, Copy, Debug)]
pub struct SolidRun {
    /// First column (inclusive)
    pub from: i32,
    /// Last column (inclusive)
    pub to: i32,
    /// Row
    pub y: i32,
}

const fn run(from: i32, to: i32, y: i32) -> SolidRun {
    SolidRun { from, to, y }
}

/// Unvalidated static level description.
#[derive(Clone, Copy, Debug)]
pub struct MapDefinition {
    /// Stable id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// World width (pixels)
    pub world_width: u32,
    /// World height (pixels)
    pub world_height: u32,
    /// Tile edge (pixels)
    pub tile_size: u32,
    /// Grid width (tiles)
    pub grid_width: u32,
    /// Grid height (tiles)
    pub grid_height: u32,
    /// Solid geometry
    pub solid_runs: &'static [SolidRun],
    /// Spawn tiles `(x, y)`, one per slot in order
    pub spawn_tiles: &'static [(i32, i32)],
    /// Jump-link hints `((from_x, from_y), (to_x, to_y))`
    pub jump_links: &'static [((i32, i32), (i32, i32))],
}

/// Stacked rooftops with a high central span.
pub const NEON_ROOFTOPS: MapDefinition = MapDefinition {
    id: "neon-rooftops",
    name: "Neon Rooftops",
    world_width: 640,
    world_height: 360,
    tile_size: 16,
    grid_width: 40,
    grid_height: 23,
    solid_runs: &[
        run(0, 39, 22),
        run(2, 11, 17),
        run(15, 24, 14),
        run(28, 37, 17),
        run(6, 13, 10),
        run(26, 33, 9),
    ],
    spawn_tiles: &[(3, 16), (10, 16), (30, 16), (36, 16)],
    jump_links: &[
        ((11, 17), (15, 14)),
        ((24, 14), (28, 17)),
        ((13, 10), (26, 9)),
    ],
};

/// Staircase ledges rising to the middle.
pub const SEWER_SCRAMBLE: MapDefinition = MapDefinition {
    id: "sewer-scramble",
    name: "Sewer Scramble",
    world_width: 640,
    world_height: 360,
    tile_size: 16,
    grid_width: 40,
    grid_height: 23,
    solid_runs: &[
        run(0, 39, 22),
        run(0, 6, 18),
        run(9, 17, 15),
        run(20, 30, 12),
        run(33, 39, 18),
        run(13, 26, 8),
    ],
    spawn_tiles: &[(2, 17), (14, 14), (25, 11), (36, 17)],
    jump_links: &[
        ((6, 18), (9, 15)),
        ((17, 15), (20, 12)),
        ((30, 12), (33, 18)),
        ((22, 12), (20, 8)),
    ],
};

/// Diagonal climb with side ledges.
pub const ARCADE_FOUNDRY: MapDefinition = MapDefinition {
    id: "arcade-foundry",
    name: "Arcade Foundry",
    world_width: 640,
    world_height: 360,
    tile_size: 16,
    grid_width: 40,
    grid_height: 23,
    solid_runs: &[
        run(0, 39, 22),
        run(3, 9, 19),
        run(11, 18, 16),
        run(21, 28, 13),
        run(30, 36, 10),
        run(18, 25, 6),
        run(0, 4, 12),
        run(35, 39, 15),
    ],
    spawn_tiles: &[(4, 18), (14, 15), (24, 12), (34, 9)],
    jump_links: &[
        ((9, 19), (11, 16)),
        ((18, 16), (21, 13)),
        ((28, 13), (30, 10)),
        ((25, 6), (35, 15)),
    ],
};

/// Built-in levels in catalog order.
pub const CATALOG: [MapDefinition; 3] = [NEON_ROOFTOPS, SEWER_SCRAMBLE, ARCADE_FOUNDRY];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::MapData;

    #[test]
    fn test_catalog_is_valid() {
        for def in CATALOG.iter() {
            let map = MapData::from_definition(def).unwrap();
            assert_eq!(map.id(), def.id);
            // Every map has a full-width floor
            for x in 0..40 {
                assert!(map.is_solid_tile(x, 22), "{} floor gap at {}", def.id, x);
            }
        }
    }

    #[test]
    fn test_spawns_stand_on_open_tiles() {
        for def in CATALOG.iter() {
            let map = MapData::from_definition(def).unwrap();
            for tile in map.spawn_tiles() {
                assert!(!map.is_solid_tile(tile.x as i64, tile.y as i64));
                assert!(map.is_solid_tile(tile.x as i64, tile.y as i64 + 1), "{} spawn {:?} floats", def.id, tile);
            }
        }
    }

    #[test]
    fn test_reversed_run_rejected() {
        let def = MapDefinition {
            solid_runs: &[SolidRun { from: 5, to: 2, y: 4 }],
            ..NEON_ROOFTOPS
        };
        assert!(MapData::from_definition(&def).is_err());
    }
}
