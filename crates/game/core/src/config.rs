//! Battle and projection configuration.
use crate::coords::Position3D;

/// Tunable parameters of the isometric projection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsoConfig {
    /// Full width of a tile diamond in screen units.
    pub tile_width: f32,
    /// Full height of a tile diamond in screen units.
    pub tile_height: f32,
    /// Screen units one elevation step lifts a cell.
    pub tile_depth: f32,
    /// Screen position of grid cell (0, 0, 0).
    pub offset_x: f32,
    pub offset_y: f32,
}

impl IsoConfig {
    pub const DEFAULT_TILE_WIDTH: f32 = 64.0;
    pub const DEFAULT_TILE_HEIGHT: f32 = 32.0;
    pub const DEFAULT_TILE_DEPTH: f32 = 16.0;
    pub const DEFAULT_OFFSET_X: f32 = 640.0;
    pub const DEFAULT_OFFSET_Y: f32 = 100.0;

    pub const fn new() -> Self {
        Self {
            tile_width: Self::DEFAULT_TILE_WIDTH,
            tile_height: Self::DEFAULT_TILE_HEIGHT,
            tile_depth: Self::DEFAULT_TILE_DEPTH,
            offset_x: Self::DEFAULT_OFFSET_X,
            offset_y: Self::DEFAULT_OFFSET_Y,
        }
    }

    pub const fn half_width(&self) -> f32 {
        self.tile_width / 2.0
    }

    pub const fn half_height(&self) -> f32 {
        self.tile_height / 2.0
    }
}

impl Default for IsoConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Terrain type of a single grid cell.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TerrainKind {
    #[default]
    Grass,
    Stone,
    Water,
    Lava,
    Ice,
    Forest,
    Mountain,
    Void,
}

impl TerrainKind {
    /// Whether units may stand on this terrain by default.
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Water | Self::Lava | Self::Void | Self::Mountain)
    }
}

/// Static description of one grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TerrainTile {
    pub kind: TerrainKind,
    /// Elevation (`z`) a unit standing here occupies.
    pub height: i32,
    pub passable: bool,
    pub sprite_id: String,
}

impl TerrainTile {
    pub fn new(kind: TerrainKind, height: i32) -> Self {
        Self {
            kind,
            height,
            passable: kind.is_passable(),
            sprite_id: format!("{}_tile", kind),
        }
    }
}

impl Default for TerrainTile {
    fn default() -> Self {
        Self::new(TerrainKind::Grass, 0)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum VictoryCondition {
    DefeatAllEnemies,
    SurviveTurns,
    ReachPosition,
    ProtectUnit,
    CollectItems,
}

/// Battle configuration: grid, limits, terrain.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BattleConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    /// Battle ends once `current_turn` exceeds this value.
    pub turn_limit: Option<u32>,
    /// Wall-clock limit in seconds, measured from `BattleState::start_time`.
    pub time_limit: Option<u64>,
    pub victory_conditions: Vec<VictoryCondition>,
    /// Column-major terrain: `terrain[x][y]`. Empty means uniform grass.
    pub terrain: Vec<Vec<TerrainTile>>,
}

impl BattleConfig {
    pub const DEFAULT_GRID_SIZE: i32 = 20;
    pub const DEFAULT_TURN_LIMIT: u32 = 50;
    pub const DEFAULT_TIME_LIMIT_SECS: u64 = 300;

    /// Uniform grass grid of the given size with default limits.
    pub fn new(grid_width: i32, grid_height: i32) -> Self {
        let terrain = (0..grid_width)
            .map(|_| (0..grid_height).map(|_| TerrainTile::default()).collect())
            .collect();

        Self {
            grid_width,
            grid_height,
            turn_limit: Some(Self::DEFAULT_TURN_LIMIT),
            time_limit: Some(Self::DEFAULT_TIME_LIMIT_SECS),
            victory_conditions: vec![VictoryCondition::DefeatAllEnemies],
            terrain,
        }
    }

    pub fn with_turn_limit(mut self, turn_limit: Option<u32>) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Option<u64>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn contains(&self, pos: Position3D) -> bool {
        pos.x >= 0 && pos.x < self.grid_width && pos.y >= 0 && pos.y < self.grid_height
    }

    /// Terrain at a cell. Cells missing from a sparse terrain table read as grass.
    pub fn tile(&self, x: i32, y: i32) -> Option<&TerrainTile> {
        if x < 0 || y < 0 {
            return None;
        }
        self.terrain.get(x as usize)?.get(y as usize)
    }

    pub fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut TerrainTile> {
        if x < 0 || y < 0 {
            return None;
        }
        self.terrain.get_mut(x as usize)?.get_mut(y as usize)
    }

    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        if !self.contains(Position3D::new(x, y, 0)) {
            return false;
        }
        self.tile(x, y).map(|tile| tile.passable).unwrap_or(true)
    }

    /// Elevation of the cell, 0 when no terrain is configured.
    pub fn height_at(&self, x: i32, y: i32) -> i32 {
        self.tile(x, y).map(|tile| tile.height).unwrap_or(0)
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GRID_SIZE, Self::DEFAULT_GRID_SIZE)
    }
}
