//! Tile collision for actors walking around a room
//!
//! Actors are 16x16 sprites whose feet sit 0x0B pixels below their origin.
//! Collision checks work on an 8-pixel fine grid; each 16x16 tile covers 2x2 fine
//! cells. Anything outside the room's playfield counts as wall.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::tile::{TileBehavior, TileBehaviorTable, hazard_is_solid};
use super::room::WorldKind;
use crate::Direction;
use crate::consts::*;

/// Tile codes of one room, row-major
pub type RoomLayout = [[u8; COLUMNS]; ROWS];

/// The tile map of the room on screen, with its walkable playfield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    tiles: RoomLayout,
    start_row: i32,
    start_col: i32,
    row_count: i32,
    col_count: i32,
}

impl TileMap {
    /// Underworld rooms keep actors inside the walls: 7 rows by 12 columns
    pub fn new(tiles: RoomLayout, kind: WorldKind) -> Self {
        match kind {
            WorldKind::Overworld => Self {
                tiles,
                start_row: 0,
                start_col: 0,
                row_count: ROWS as i32,
                col_count: COLUMNS as i32,
            },
            WorldKind::Underworld => Self {
                tiles,
                start_row: 2,
                start_col: 2,
                row_count: 7,
                col_count: 12,
            },
        }
    }

    pub fn tile(&self, row: usize, col: usize) -> u8 {
        self.tiles[row][col]
    }

    pub fn set_tile(&mut self, row: usize, col: usize, code: u8) {
        self.tiles[row][col] = code;
    }

    pub fn tiles(&self) -> &RoomLayout {
        &self.tiles
    }

    /// Tile rows actors may stand on
    pub fn playfield_rows(&self) -> std::ops::Range<usize> {
        self.start_row as usize..(self.start_row + self.row_count) as usize
    }

    pub fn playfield_cols(&self) -> std::ops::Range<usize> {
        self.start_col as usize..(self.start_col + self.col_count) as usize
    }

    pub fn in_playfield_tile(&self, row: usize, col: usize) -> bool {
        self.playfield_rows().contains(&row) && self.playfield_cols().contains(&col)
    }

    fn in_playfield(&self, fine_row: i32, fine_col1: i32, fine_col2: i32) -> bool {
        fine_row >= self.start_row * 2
            && fine_row < (self.start_row + self.row_count) * 2
            && fine_col1 >= self.start_col * 2
            && fine_col2 < (self.start_col + self.col_count) * 2
    }

    /// Resolve what an actor at `pos` touches
    pub fn collide(
        &self,
        table: &TileBehaviorTable,
        env: &CollisionEnv,
        pos: IVec2,
        mode: CollisionMode,
    ) -> TileCollision {
        let mut x = pos.x;
        let mut y = pos.y + 0x0B;
        let dir = mode.direction();

        if let CollisionMode::Moving { dir, actor } = mode {
            let offset = match dir {
                Direction::Right => 0x10,
                Direction::Down => 8,
                _ if actor == ActorKind::Player => -8,
                _ => -0x10,
            };
            if dir.is_vertical() {
                if dir == Direction::Up || y < 0xDD {
                    y += offset;
                }
            } else if (dir == Direction::Left && x >= 0x10) || (dir == Direction::Right && x < 0xF0) {
                x += offset;
            }
        }

        let fine_row = (y - TILE_MAP_BASE_Y).div_euclid(8);
        let fine_col1 = x.div_euclid(8);
        let fine_col2 = if dir.is_vertical() { (x + 8).div_euclid(8) } else { fine_col1 };

        if !self.in_playfield(fine_row, fine_col1, fine_col2) {
            return TileCollision {
                collides: true,
                behavior: TileBehavior::Wall,
                tile: 0,
                fine_row,
                fine_col: fine_col1,
                border: true,
            };
        }

        let row = (fine_row / 2) as usize;
        let mut result = TileCollision {
            collides: false,
            behavior: TileBehavior::GenericWalkable,
            tile: 0,
            fine_row,
            fine_col: fine_col1,
            border: false,
        };
        let mut first = true;
        for c in fine_col1..=fine_col2 {
            let col = (c / 2) as usize;
            let tile = self.tiles[row][col];
            let behavior = table.classify(tile);
            let collides = blocks(behavior, env, mode, (row, col));
            if first || behavior.code() > result.behavior.code() {
                result.behavior = behavior;
                result.tile = tile;
                result.fine_col = c;
            }
            result.collides |= collides;
            first = false;
        }
        result
    }
}

/// Who is moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionMode {
    /// Test the tile under the actor's feet
    Still,
    /// Test the tile the actor is about to step onto
    Moving { dir: Direction, actor: ActorKind },
}

impl CollisionMode {
    pub fn player(dir: Direction) -> Self {
        CollisionMode::Moving {
            dir,
            actor: ActorKind::Player,
        }
    }

    pub fn other(dir: Direction) -> Self {
        CollisionMode::Moving {
            dir,
            actor: ActorKind::Other,
        }
    }

    fn direction(self) -> Direction {
        match self {
            CollisionMode::Still => Direction::None,
            CollisionMode::Moving { dir, .. } => dir,
        }
    }
}

/// Room state that changes what blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionEnv {
    pub hazard_phase: u8,
    /// Water is walkable everywhere in the room
    pub walk_on_water: bool,
    pub ladder: Option<LadderSpan>,
}

/// A deployed ladder bridges the one water tile it lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LadderSpan {
    pub dir: Direction,
    pub row: usize,
    pub col: usize,
}

/// Result of a tile check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCollision {
    pub collides: bool,
    /// Highest-priority behavior among the tested cells
    pub behavior: TileBehavior,
    pub tile: u8,
    pub fine_row: i32,
    pub fine_col: i32,
    /// The check left the playfield
    pub border: bool,
}

impl TileCollision {
    /// Coarse tile coordinates of the hit
    pub fn row_col(&self) -> (usize, usize) {
        ((self.fine_row / 2) as usize, (self.fine_col / 2) as usize)
    }
}

fn blocks(
    behavior: TileBehavior,
    env: &CollisionEnv,
    mode: CollisionMode,
    cell: (usize, usize),
) -> bool {
    match behavior {
        TileBehavior::Ghost(i) | TileBehavior::Armos(i) => hazard_is_solid(i, env.hazard_phase),
        TileBehavior::Water => {
            if env.walk_on_water {
                return false;
            }
            match (mode, env.ladder) {
                (
                    CollisionMode::Moving {
                        dir,
                        actor: ActorKind::Player,
                    },
                    Some(ladder),
                ) => {
                    (ladder.row, ladder.col) != cell
                        || ladder.dir.is_vertical() != dir.is_vertical()
                }
                _ => true,
            }
        }
        TileBehavior::Stairs | TileBehavior::SlowStairs => matches!(
            mode,
            CollisionMode::Moving {
                actor: ActorKind::Other,
                ..
            }
        ),
        other => other.is_solid(),
    }
}

/// Tile holding a point, clamped to the map's top-left
pub fn tile_at(pos: IVec2) -> (usize, usize) {
    (
        ((pos.y - TILE_MAP_BASE_Y).max(0) / TILE_HEIGHT) as usize,
        (pos.x.max(0) / TILE_WIDTH) as usize,
    )
}

/// Top-left corner of a tile
pub fn tile_origin(row: usize, col: usize) -> IVec2 {
    IVec2::new(col as i32 * TILE_WIDTH, TILE_MAP_BASE_Y + row as i32 * TILE_HEIGHT)
}

/// Sprite origin of an actor standing on tile (`row`, `col`)
pub fn standing_pos(row: usize, col: usize) -> IVec2 {
    IVec2::new(
        col as i32 * TILE_WIDTH + 4,
        TILE_MAP_BASE_Y + row as i32 * TILE_HEIGHT - 0x0B + 4,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TileBehaviorTable {
        let mut table = TileBehaviorTable::uniform(TileBehavior::GenericWalkable);
        table.set(1, TileBehavior::GenericSolid);
        table.set(2, TileBehavior::Water);
        table.set(3, TileBehavior::Ghost(0));
        table.set(4, TileBehavior::Stairs);
        table
    }

    fn open_map(kind: WorldKind) -> TileMap {
        TileMap::new([[0u8; COLUMNS]; ROWS], kind)
    }

    #[test]
    fn test_still_solid_vs_walkable() {
        let mut map = open_map(WorldKind::Overworld);
        map.set_tile(5, 7, 1);
        let env = CollisionEnv::default();

        let hit = map.collide(&table(), &env, standing_pos(5, 7), CollisionMode::Still);
        assert!(hit.collides);
        assert_eq!(hit.behavior, TileBehavior::GenericSolid);
        assert_eq!(hit.row_col(), (5, 7));

        let miss = map.collide(&table(), &env, standing_pos(5, 8), CollisionMode::Still);
        assert!(!miss.collides);
        assert_eq!(miss.behavior, TileBehavior::GenericWalkable);
    }

    #[test]
    fn test_moving_checks_leading_edge() {
        let mut map = open_map(WorldKind::Overworld);
        map.set_tile(5, 8, 1);
        let env = CollisionEnv::default();
        let pos = IVec2::new(7 * 16, standing_pos(5, 7).y);
        let hit = map.collide(&table(), &env, pos, CollisionMode::player(Direction::Right));
        assert!(hit.collides);
        let back = map.collide(&table(), &env, pos, CollisionMode::player(Direction::Left));
        assert!(!back.collides);
    }

    #[test]
    fn test_underworld_border_is_wall() {
        let map = open_map(WorldKind::Underworld);
        let env = CollisionEnv::default();
        let hit = map.collide(&table(), &env, standing_pos(1, 7), CollisionMode::Still);
        assert!(hit.collides);
        assert_eq!(hit.behavior, TileBehavior::Wall);
        assert!(hit.border);
        assert!(!map.in_playfield_tile(1, 7));
        assert!(map.in_playfield_tile(8, 13));
        let inside = map.collide(&table(), &env, standing_pos(4, 7), CollisionMode::Still);
        assert!(!inside.collides);
    }

    #[test]
    fn test_out_of_map_is_wall() {
        let map = open_map(WorldKind::Overworld);
        let env = CollisionEnv::default();
        let hit = map.collide(&table(), &env, IVec2::new(-20, 0x80), CollisionMode::Still);
        assert!(hit.collides);
        assert_eq!(hit.behavior, TileBehavior::Wall);
    }

    #[test]
    fn test_water_and_ladder() {
        let mut map = open_map(WorldKind::Overworld);
        for (row, col) in [(4, 7), (5, 6), (5, 7), (5, 8), (6, 7)] {
            map.set_tile(row, col, 2);
        }
        let pos = standing_pos(5, 7);
        let mut env = CollisionEnv::default();
        assert!(map.collide(&table(), &env, pos, CollisionMode::Still).collides);

        env.ladder = Some(LadderSpan {
            dir: Direction::Left,
            row: 5,
            col: 6,
        });
        assert!(!map.collide(&table(), &env, pos, CollisionMode::player(Direction::Left)).collides);
        assert!(map.collide(&table(), &env, pos, CollisionMode::player(Direction::Up)).collides);
        // Only the ladder's own tile is bridged
        assert!(map.collide(&table(), &env, pos, CollisionMode::player(Direction::Right)).collides);
        env.ladder = Some(LadderSpan {
            dir: Direction::Left,
            row: 4,
            col: 7,
        });
        assert!(map.collide(&table(), &env, pos, CollisionMode::player(Direction::Left)).collides);

        env.ladder = None;
        env.walk_on_water = true;
        assert!(!map.collide(&table(), &env, pos, CollisionMode::Still).collides);
    }

    #[test]
    fn test_hazard_follows_phase() {
        let mut map = open_map(WorldKind::Overworld);
        map.set_tile(5, 7, 3);
        let pos = standing_pos(5, 7);
        let solid = CollisionEnv {
            hazard_phase: 0,
            ..Default::default()
        };
        let open = CollisionEnv {
            hazard_phase: 8,
            ..Default::default()
        };
        assert!(map.collide(&table(), &solid, pos, CollisionMode::Still).collides);
        assert!(!map.collide(&table(), &open, pos, CollisionMode::Still).collides);
    }

    #[test]
    fn test_stairs_block_monsters_only() {
        let mut map = open_map(WorldKind::Overworld);
        map.set_tile(5, 8, 4);
        let env = CollisionEnv::default();
        let pos = IVec2::new(7 * 16, standing_pos(5, 7).y);
        assert!(map.collide(&table(), &env, pos, CollisionMode::other(Direction::Right)).collides);
        let hit = map.collide(&table(), &env, pos, CollisionMode::player(Direction::Right));
        assert!(!hit.collides);
        assert_eq!(hit.behavior, TileBehavior::Stairs);
    }
}
