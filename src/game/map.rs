//! Tile Maps
//!
//! Validated level geometry, tile-solidity queries and the non-repeating
//! map rotation. Map data is static: it is checked once when the catalog
//! is loaded and any violation is a construction error.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::rng::{DeterministicRng, RandomSource};
use crate::core::vec2::Vec2;
use crate::game::maps::{self, MapDefinition};
use crate::game::state::{PlayerId, PlayerSlots, MAX_PLAYERS};

/// Required world width (pixels).
pub const WORLD_WIDTH: u32 = 640;
/// Required world height (pixels).
pub const WORLD_HEIGHT: u32 = 360;
/// Required tile edge (pixels).
pub const TILE_SIZE: u32 = 16;
/// Required grid width (tiles).
pub const GRID_WIDTH: u32 = 40;
/// Required grid height (tiles).
pub const GRID_HEIGHT: u32 = 23;

// =============================================================================
// ERRORS
// =============================================================================

/// Invalid static map data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Map id is empty.
    #[error("map id must not be empty")]
    EmptyId,

    /// Map name is empty.
    #[error("map {0}: name must not be empty")]
    EmptyName(String),

    /// A dimension differs from the fixed world layout.
    #[error("map {map}: {field} is {actual}, expected {expected}")]
    Dimension {
        /// Map id
        map: String,
        /// Offending field
        field: &'static str,
        /// Required value
        expected: u32,
        /// Value found
        actual: u32,
    },

    /// A tile lies outside the grid.
    #[error("map {map}: tile ({x}, {y}) is outside the grid")]
    TileOutOfGrid {
        /// Map id
        map: String,
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },

    /// A solid run has `from > to`.
    #[error("map {map}: solid run {from}..={to} on row {y} is reversed")]
    ReversedRun {
        /// Map id
        map: String,
        /// First column
        from: i32,
        /// Last column
        to: i32,
        /// Row
        y: i32,
    },

    /// Fewer spawn tiles than player slots.
    #[error("map {map}: {count} spawn tiles, at least 4 required")]
    NotEnoughSpawns {
        /// Map id
        map: String,
        /// Spawn tiles found
        count: usize,
    },

    /// Two maps share an id.
    #[error("duplicate map id {0}")]
    DuplicateId(String),

    /// Catalog has no maps.
    #[error("map catalog is empty")]
    EmptyCatalog,
}

// =============================================================================
// MAP DATA
// =============================================================================

/// Tile coordinate (column, row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// AI hint: jumping from `from` tends to land on `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpLink {
    /// Take-off tile
    pub from: TileCoord,
    /// Landing tile
    pub to: TileCoord,
}

/// Immutable, validated level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapData {
    id: String,
    name: String,
    world_width: u32,
    world_height: u32,
    tile_size: u32,
    grid_width: u32,
    grid_height: u32,
    solid_tiles: Vec<TileCoord>,
    spawn_tiles: Vec<TileCoord>,
    jump_links: Vec<JumpLink>,
    /// Row-major solidity, built once at load.
    #[serde(skip)]
    solid_grid: Vec<bool>,
}

impl MapData {
    /// Expand and validate a static definition.
    pub fn from_definition(def: &MapDefinition) -> Result<Self, MapError> {
        let mut solid_tiles = Vec::new();
        for run in def.solid_runs {
            if run.from > run.to {
                return Err(MapError::ReversedRun {
                    map: def.id.to_string(),
                    from: run.from,
                    to: run.to,
                    y: run.y,
                });
            }
            solid_tiles.extend((run.from..=run.to).map(|x| TileCoord::new(x, run.y)));
        }

        Self::new(
            def.id,
            def.name,
            (def.world_width, def.world_height),
            def.tile_size,
            (def.grid_width, def.grid_height),
            solid_tiles,
            def.spawn_tiles.iter().map(|&(x, y)| TileCoord::new(x, y)).collect(),
            def.jump_links
                .iter()
                .map(|&(from, to)| JumpLink {
                    from: TileCoord::new(from.0, from.1),
                    to: TileCoord::new(to.0, to.1),
                })
                .collect(),
        )
    }

    /// Build and validate a map.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        name: &str,
        world: (u32, u32),
        tile_size: u32,
        grid: (u32, u32),
        solid_tiles: Vec<TileCoord>,
        spawn_tiles: Vec<TileCoord>,
        jump_links: Vec<JumpLink>,
    ) -> Result<Self, MapError> {
        if id.is_empty() {
            return Err(MapError::EmptyId);
        }
        if name.is_empty() {
            return Err(MapError::EmptyName(id.to_string()));
        }

        let checks = [
            ("worldWidth", WORLD_WIDTH, world.0),
            ("worldHeight", WORLD_HEIGHT, world.1),
            ("tileSize", TILE_SIZE, tile_size),
            ("gridWidth", GRID_WIDTH, grid.0),
            ("gridHeight", GRID_HEIGHT, grid.1),
        ];
        for (field, expected, actual) in checks {
            if expected != actual {
                return Err(MapError::Dimension {
                    map: id.to_string(),
                    field,
                    expected,
                    actual,
                });
            }
        }

        if spawn_tiles.len() < MAX_PLAYERS {
            return Err(MapError::NotEnoughSpawns {
                map: id.to_string(),
                count: spawn_tiles.len(),
            });
        }

        let in_grid = |t: &TileCoord| {
            t.x >= 0 && t.y >= 0 && (t.x as u32) < grid.0 && (t.y as u32) < grid.1
        };
        let link_tiles = jump_links.iter().flat_map(|l| [l.from, l.to]);
        if let Some(bad) = solid_tiles
            .iter()
            .copied()
            .chain(spawn_tiles.iter().copied())
            .chain(link_tiles)
            .find(|t| !in_grid(t))
        {
            return Err(MapError::TileOutOfGrid {
                map: id.to_string(),
                x: bad.x,
                y: bad.y,
            });
        }

        let mut map = Self {
            id: id.to_string(),
            name: name.to_string(),
            world_width: world.0,
            world_height: world.1,
            tile_size,
            grid_width: grid.0,
            grid_height: grid.1,
            solid_tiles,
            spawn_tiles,
            jump_links,
            solid_grid: Vec::new(),
        };
        map.rebuild_solid_grid();
        Ok(map)
    }

    fn rebuild_solid_grid(&mut self) {
        let mut grid = vec![false; (self.grid_width * self.grid_height) as usize];
        for tile in &self.solid_tiles {
            grid[tile.y as usize * self.grid_width as usize + tile.x as usize] = true;
        }
        self.solid_grid = grid;
    }

    /// Map id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World width in pixels.
    pub fn world_width(&self) -> f64 {
        self.world_width as f64
    }

    /// World height in pixels.
    pub fn world_height(&self) -> f64 {
        self.world_height as f64
    }

    /// Tile edge in pixels.
    pub fn tile_size(&self) -> f64 {
        self.tile_size as f64
    }

    /// Solid tiles.
    pub fn solid_tiles(&self) -> &[TileCoord] {
        &self.solid_tiles
    }

    /// Spawn tiles (at least 4).
    pub fn spawn_tiles(&self) -> &[TileCoord] {
        &self.spawn_tiles
    }

    /// Jump-link hints.
    pub fn jump_links(&self) -> &[JumpLink] {
        &self.jump_links
    }

    /// Tile solidity. Anything outside the grid is open space.
    #[inline]
    pub fn is_solid_tile(&self, tx: i64, ty: i64) -> bool {
        if tx < 0 || ty < 0 || tx >= self.grid_width as i64 || ty >= self.grid_height as i64 {
            return false;
        }
        self.solid_grid
            .get(ty as usize * self.grid_width as usize + tx as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Solidity of the tile containing a pixel.
    #[inline]
    pub fn is_solid_at_pixel(&self, x: f64, y: f64) -> bool {
        let ts = self.tile_size();
        self.is_solid_tile((x / ts).floor() as i64, (y / ts).floor() as i64)
    }

    /// Feet-center spawn point of a tile: horizontally centered, feet on
    /// the tile's top edge.
    #[inline]
    pub fn spawn_point(&self, tile: TileCoord) -> Vec2 {
        let ts = self.tile_size();
        Vec2::new(tile.x as f64 * ts + ts / 2.0, tile.y as f64 * ts)
    }

    /// Spawn positions for all four slots, from the first four spawn tiles.
    pub fn spawn_positions(&self) -> PlayerSlots<Vec2> {
        PlayerSlots::from_fn(|id| self.spawn_point(self.spawn_tiles[id.index()]))
    }
}

// =============================================================================
// MAP MANAGER
// =============================================================================

/// Owns the validated catalog and picks maps without immediate repeats.
#[derive(Clone, Debug)]
pub struct MapManager {
    maps: Vec<Arc<MapData>>,
    last_map_id: Option<String>,
    rng: DeterministicRng,
}

impl MapManager {
    /// Load and validate the built-in catalog.
    pub fn new(seed: u64) -> Result<Self, MapError> {
        let maps = maps::CATALOG
            .iter()
            .map(MapData::from_definition)
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_maps(maps, seed)
    }

    /// Use a custom, already-built set of maps.
    pub fn with_maps(maps: Vec<MapData>, seed: u64) -> Result<Self, MapError> {
        if maps.is_empty() {
            return Err(MapError::EmptyCatalog);
        }
        for (i, map) in maps.iter().enumerate() {
            if maps[..i].iter().any(|m| m.id == map.id) {
                return Err(MapError::DuplicateId(map.id.clone()));
            }
        }

        Ok(Self {
            maps: maps.into_iter().map(Arc::new).collect(),
            last_map_id: None,
            rng: DeterministicRng::new(seed),
        })
    }

    /// Every map in catalog order.
    pub fn maps(&self) -> &[Arc<MapData>] {
        &self.maps
    }

    /// Look up a map by id.
    pub fn get(&self, id: &str) -> Option<Arc<MapData>> {
        self.maps.iter().find(|m| m.id == id).cloned()
    }

    /// Pick the next map uniformly among all maps except the previous pick.
    pub fn next_map(&mut self) -> Arc<MapData> {
        let candidates: Vec<&Arc<MapData>> = if self.maps.len() == 1 {
            self.maps.iter().collect()
        } else {
            self.maps
                .iter()
                .filter(|m| Some(m.id.as_str()) != self.last_map_id.as_deref())
                .collect()
        };

        let index = self.rng.next_index(candidates.len());
        let selected = Arc::clone(candidates[index]);
        debug!(map = %selected.id, "next map selected");
        self.last_map_id = Some(selected.id.clone());
        selected
    }

    /// Solidity of the tile containing a pixel on `map`.
    pub fn is_solid_at_pixel(&self, map: &MapData, x: f64, y: f64) -> bool {
        map.is_solid_at_pixel(x, y)
    }

    /// Spawn positions for all four slots.
    pub fn spawn_positions(&self, map: &MapData) -> PlayerSlots<Vec2> {
        map.spawn_positions()
    }

    /// Spawn positions for the given players only, in ascending id order.
    pub fn joined_spawn_positions(&self, map: &MapData, joined: &[PlayerId]) -> Vec<(PlayerId, Vec2)> {
        let spawns = map.spawn_positions();
        PlayerId::ALL
            .into_iter()
            .filter(|id| joined.contains(id))
            .map(|id| (id, spawns[id]))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_map(id: &str, spawns: usize) -> Result<MapData, MapError> {
        MapData::new(
            id,
            "Test Map",
            (WORLD_WIDTH, WORLD_HEIGHT),
            TILE_SIZE,
            (GRID_WIDTH, GRID_HEIGHT),
            vec![TileCoord::new(0, 22), TileCoord::new(1, 22)],
            (0..spawns as i32).map(|x| TileCoord::new(x, 21)).collect(),
            Vec::new(),
        )
    }

    #[test]
    fn test_catalog_loads() {
        let manager = MapManager::new(1337).unwrap();
        let ids: Vec<_> = manager.maps().iter().map(|m| m.id().to_string()).collect();
        assert_eq!(ids, vec!["neon-rooftops", "sewer-scramble", "arcade-foundry"]);
        for map in manager.maps() {
            assert!(map.spawn_tiles().len() >= 4);
        }
    }

    #[test]
    fn test_next_map_never_repeats() {
        let mut manager = MapManager::new(1337).unwrap();
        let mut previous = manager.next_map().id().to_string();
        for _ in 0..20 {
            let next = manager.next_map().id().to_string();
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_next_map_seeded() {
        let mut a = MapManager::new(7).unwrap();
        let mut b = MapManager::new(7).unwrap();
        for _ in 0..10 {
            assert_eq!(a.next_map().id(), b.next_map().id());
        }
    }

    #[test]
    fn test_single_map_repeats() {
        let mut manager = MapManager::with_maps(vec![tiny_map("solo", 4).unwrap()], 1).unwrap();
        assert_eq!(manager.next_map().id(), "solo");
        assert_eq!(manager.next_map().id(), "solo");
    }

    #[test]
    fn test_invalid_schema_rejected() {
        assert!(matches!(tiny_map("few", 3), Err(MapError::NotEnoughSpawns { count: 3, .. })));
        assert_eq!(tiny_map("", 4), Err(MapError::EmptyId));

        let wide = MapData::new(
            "wide",
            "Wide",
            (800, WORLD_HEIGHT),
            TILE_SIZE,
            (GRID_WIDTH, GRID_HEIGHT),
            Vec::new(),
            (0..4).map(|x| TileCoord::new(x, 1)).collect(),
            Vec::new(),
        );
        assert!(matches!(wide, Err(MapError::Dimension { field: "worldWidth", .. })));

        let outside = MapData::new(
            "outside",
            "Outside",
            (WORLD_WIDTH, WORLD_HEIGHT),
            TILE_SIZE,
            (GRID_WIDTH, GRID_HEIGHT),
            vec![TileCoord::new(40, 0)],
            (0..4).map(|x| TileCoord::new(x, 1)).collect(),
            Vec::new(),
        );
        assert!(matches!(outside, Err(MapError::TileOutOfGrid { x: 40, y: 0, .. })));
    }

    #[test]
    fn test_duplicate_and_empty_catalog() {
        let maps = vec![tiny_map("dup", 4).unwrap(), tiny_map("dup", 4).unwrap()];
        assert_eq!(MapManager::with_maps(maps, 1).unwrap_err(), MapError::DuplicateId("dup".into()));
        assert_eq!(MapManager::with_maps(Vec::new(), 1).unwrap_err(), MapError::EmptyCatalog);
    }

    #[test]
    fn test_solidity_queries() {
        let map = tiny_map("solid", 4).unwrap();
        assert!(map.is_solid_tile(0, 22));
        assert!(!map.is_solid_tile(2, 22));
        assert!(!map.is_solid_tile(-1, 22));
        assert!(!map.is_solid_tile(0, 23));

        assert!(map.is_solid_at_pixel(15.9, 352.0));
        assert!(map.is_solid_at_pixel(16.0, 359.0));
        assert!(!map.is_solid_at_pixel(32.0, 352.0));
        assert!(!map.is_solid_at_pixel(8.0, 351.9));
    }

    #[test]
    fn test_spawn_positions() {
        let manager = MapManager::new(1).unwrap();
        let neon = manager.get("neon-rooftops").unwrap();
        let spawns = manager.spawn_positions(&neon);
        assert_eq!(spawns[PlayerId::ALL[0]], Vec2::new(56.0, 256.0));
        assert_eq!(spawns[PlayerId::ALL[3]], Vec2::new(584.0, 256.0));

        let joined = manager.joined_spawn_positions(&neon, &[PlayerId::ALL[2], PlayerId::ALL[0]]);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].0, PlayerId::ALL[0]);
        assert_eq!(joined[1], (PlayerId::ALL[2], Vec2::new(488.0, 256.0)));
    }
}
