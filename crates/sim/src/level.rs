use thiserror::Error;

use crate::content::{ConveyorDefId, HazardDefId, LevelDefs, LevelDescriptor, TilePalette};
use crate::geom::Rect;
use crate::tile::{SurfaceKind, Tile};

/// Every level shares one fixed grid size.
pub const GRID_ROWS: usize = 20;
pub const GRID_COLS: usize = 32;
pub const TILE_SIZE_PX: u32 = 20;

/// Tile codes used by level descriptors. Codes 100..199 select a hazard def
/// by index, 200..299 a conveyor def.
pub const TILE_CODE_NONE: u16 = 0;
pub const TILE_CODE_SOLID: u16 = 1;
pub const TILE_CODE_THRU: u16 = 2;
pub const TILE_CODE_SCENE: u16 = 3;
pub const TILE_CODE_COLLAPSIBLE: u16 = 4;
pub const TILE_CODE_HAZARD_BASE: u16 = 100;
pub const TILE_CODE_CONVEYOR_BASE: u16 = 200;
const TILE_CODE_DEF_SPAN: u16 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("unknown tile code {code} at cell index {index}")]
    UnknownTileCode { code: u16, index: usize },
    #[error(
        "tile code {code} at cell index {index} references hazard def {def_index} \
         but only {available} are declared"
    )]
    HazardDefOutOfRange {
        code: u16,
        index: usize,
        def_index: u32,
        available: usize,
    },
    #[error(
        "tile code {code} at cell index {index} references conveyor def {def_index} \
         but only {available} are declared"
    )]
    ConveyorDefOutOfRange {
        code: u16,
        index: usize,
        def_index: u32,
        available: usize,
    },
}

/// The level grid: `GRID_ROWS x GRID_COLS` tiles in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    name: String,
    tiles: Vec<Tile>,
}

impl Level {
    pub fn from_descriptor(
        descriptor: &LevelDescriptor,
        defs: &LevelDefs,
    ) -> Result<Self, LevelError> {
        let expected = GRID_ROWS * GRID_COLS;
        if descriptor.tiles.len() != expected {
            return Err(LevelError::TileCountMismatch {
                expected,
                actual: descriptor.tiles.len(),
            });
        }

        let mut tiles = Vec::with_capacity(expected);
        for (index, code) in descriptor.tiles.iter().copied().enumerate() {
            tiles.push(tile_from_code(code, index, descriptor.palette, defs)?);
        }

        let mut level = Self {
            name: descriptor.name.clone(),
            tiles,
        };
        level.reset_all();
        Ok(level)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Tile> {
        index_of(row, col).and_then(|index| self.tiles.get(index))
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Tile> {
        index_of(row, col).and_then(|index| self.tiles.get_mut(index))
    }

    /// Unchecked accessor for orchestrator-internal loops; indexing outside
    /// the fixed grid is a bug in the caller, not a runtime condition.
    pub fn tile(&self, row: usize, col: usize) -> &Tile {
        assert!(
            row < GRID_ROWS && col < GRID_COLS,
            "tile index ({row},{col}) outside {GRID_ROWS}x{GRID_COLS} grid"
        );
        &self.tiles[row * GRID_COLS + col]
    }

    pub fn tile_mut(&mut self, row: usize, col: usize) -> &mut Tile {
        assert!(
            row < GRID_ROWS && col < GRID_COLS,
            "tile index ({row},{col}) outside {GRID_ROWS}x{GRID_COLS} grid"
        );
        &mut self.tiles[row * GRID_COLS + col]
    }

    /// World-space rectangle of one grid cell.
    pub fn cell_rect(row: usize, col: usize) -> Rect {
        Rect::new(
            col as i32 * TILE_SIZE_PX as i32,
            row as i32 * TILE_SIZE_PX as i32,
            TILE_SIZE_PX,
            TILE_SIZE_PX,
        )
    }

    /// Grid cells whose pixel spans overlap `rect`, clamped to the grid.
    pub fn cells_overlapping(&self, rect: &Rect) -> Vec<(usize, usize)> {
        if rect.is_empty() {
            return Vec::new();
        }
        let tile = TILE_SIZE_PX as i32;
        let col_min = rect.x.div_euclid(tile).max(0);
        let col_max = (rect.right() - 1).div_euclid(tile).min(GRID_COLS as i32 - 1);
        let row_min = rect.y.div_euclid(tile).max(0);
        let row_max = (rect.bottom() - 1)
            .div_euclid(tile)
            .min(GRID_ROWS as i32 - 1);

        let mut cells = Vec::new();
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                cells.push((row as usize, col as usize));
            }
        }
        cells
    }

    pub fn update_all(&mut self) {
        for tile in &mut self.tiles {
            tile.update();
        }
    }

    /// Screen (re)entry: every tile back to its level-reload default, with
    /// checkerboard parity so adjacent hazards blink out of phase.
    pub fn reset_all(&mut self) {
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let parity = (row + col) % 2 == 1;
                self.tiles[row * GRID_COLS + col].reset(parity);
            }
        }
    }
}

fn index_of(row: usize, col: usize) -> Option<usize> {
    if row >= GRID_ROWS || col >= GRID_COLS {
        return None;
    }
    Some(row * GRID_COLS + col)
}

fn tile_from_code(
    code: u16,
    index: usize,
    palette: TilePalette,
    defs: &LevelDefs,
) -> Result<Tile, LevelError> {
    match code {
        TILE_CODE_NONE => Ok(Tile::surface(SurfaceKind::None, 0)),
        TILE_CODE_SOLID => Ok(Tile::surface(SurfaceKind::Solid, palette.solid)),
        TILE_CODE_THRU => Ok(Tile::surface(SurfaceKind::Thru, palette.thru)),
        TILE_CODE_SCENE => Ok(Tile::surface(SurfaceKind::Scene, palette.scene)),
        TILE_CODE_COLLAPSIBLE => Ok(Tile::collapsible(palette.collapsible)),
        code if (TILE_CODE_HAZARD_BASE..TILE_CODE_HAZARD_BASE + TILE_CODE_DEF_SPAN)
            .contains(&code) =>
        {
            let def_index = (code - TILE_CODE_HAZARD_BASE) as u32;
            let id = HazardDefId(def_index);
            let def = defs
                .hazard(id)
                .ok_or(LevelError::HazardDefOutOfRange {
                    code,
                    index,
                    def_index,
                    available: defs.hazards().len(),
                })?;
            Ok(Tile::hazard(id, def))
        }
        code if (TILE_CODE_CONVEYOR_BASE..TILE_CODE_CONVEYOR_BASE + TILE_CODE_DEF_SPAN)
            .contains(&code) =>
        {
            let def_index = (code - TILE_CODE_CONVEYOR_BASE) as u32;
            let id = ConveyorDefId(def_index);
            let def = defs
                .conveyor(id)
                .ok_or(LevelError::ConveyorDefOutOfRange {
                    code,
                    index,
                    def_index,
                    available: defs.conveyors().len(),
                })?;
            Ok(Tile::conveyor(id, def))
        }
        _ => Err(LevelError::UnknownTileCode { code, index }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BeltRotation, ConveyorDef, HazardDef, PixelPoint, PlayerDef};

    fn empty_descriptor() -> LevelDescriptor {
        LevelDescriptor {
            name: "cavern".to_string(),
            palette: TilePalette::default(),
            speed_multiplier: 1,
            hazards: vec![HazardDef {
                def_name: "pit.mine".to_string(),
                sprite: 4,
                explodes: true,
                harmless: false,
            }],
            conveyors: vec![ConveyorDef {
                def_name: "pit.belt".to_string(),
                sprite: 6,
                rotation: BeltRotation::Clockwise,
            }],
            entities: Vec::new(),
            player: PlayerDef {
                sheet: 0,
                frame_width: 40,
                frame_height: 40,
                start: PixelPoint { x: 0, y: 0 },
                health: 100,
            },
            tiles: vec![TILE_CODE_NONE; GRID_ROWS * GRID_COLS],
        }
    }

    fn build(descriptor: &LevelDescriptor) -> Level {
        let defs = LevelDefs::from_descriptor(descriptor);
        Level::from_descriptor(descriptor, &defs).expect("level")
    }

    #[test]
    fn rejects_wrong_tile_count() {
        let mut descriptor = empty_descriptor();
        descriptor.tiles.pop();
        let defs = LevelDefs::from_descriptor(&descriptor);
        let err = Level::from_descriptor(&descriptor, &defs).expect_err("count");
        assert_eq!(
            err,
            LevelError::TileCountMismatch {
                expected: 640,
                actual: 639
            }
        );
    }

    #[test]
    fn rejects_unknown_tile_code() {
        let mut descriptor = empty_descriptor();
        descriptor.tiles[17] = 42;
        let defs = LevelDefs::from_descriptor(&descriptor);
        let err = Level::from_descriptor(&descriptor, &defs).expect_err("code");
        assert_eq!(err, LevelError::UnknownTileCode { code: 42, index: 17 });
    }

    #[test]
    fn rejects_hazard_code_beyond_declared_defs() {
        let mut descriptor = empty_descriptor();
        descriptor.tiles[3] = TILE_CODE_HAZARD_BASE + 5;
        let defs = LevelDefs::from_descriptor(&descriptor);
        let err = Level::from_descriptor(&descriptor, &defs).expect_err("hazard ref");
        assert_eq!(
            err,
            LevelError::HazardDefOutOfRange {
                code: 105,
                index: 3,
                def_index: 5,
                available: 1
            }
        );
    }

    #[test]
    fn decodes_every_plain_code() {
        let mut descriptor = empty_descriptor();
        descriptor.tiles[0] = TILE_CODE_SOLID;
        descriptor.tiles[1] = TILE_CODE_THRU;
        descriptor.tiles[2] = TILE_CODE_SCENE;
        descriptor.tiles[3] = TILE_CODE_COLLAPSIBLE;
        descriptor.tiles[4] = TILE_CODE_HAZARD_BASE;
        descriptor.tiles[5] = TILE_CODE_CONVEYOR_BASE;
        let level = build(&descriptor);

        assert!(level.tile(0, 0).is_solid());
        assert!(level.tile(0, 1).is_thru());
        assert!(!level.tile(0, 2).is_landable());
        assert!(level.tile(0, 3).as_collapsible().is_some());
        assert!(level.tile(0, 4).as_hazard().is_some());
        assert!(level.tile(0, 5).as_conveyor().is_some());
    }

    #[test]
    fn checked_access_is_none_outside_the_grid() {
        let level = build(&empty_descriptor());
        assert!(level.get(0, 0).is_some());
        assert!(level.get(GRID_ROWS - 1, GRID_COLS - 1).is_some());
        assert!(level.get(GRID_ROWS, 0).is_none());
        assert!(level.get(0, GRID_COLS).is_none());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn unchecked_access_outside_the_grid_panics() {
        let level = build(&empty_descriptor());
        let _ = level.tile(GRID_ROWS, 0);
    }

    #[test]
    fn cell_rect_is_tile_aligned() {
        assert_eq!(Level::cell_rect(0, 0), Rect::new(0, 0, 20, 20));
        assert_eq!(Level::cell_rect(5, 5), Rect::new(100, 100, 20, 20));
        assert_eq!(Level::cell_rect(19, 31), Rect::new(620, 380, 20, 20));
    }

    #[test]
    fn cells_overlapping_clamps_to_the_grid() {
        let level = build(&empty_descriptor());

        let inside = level.cells_overlapping(&Rect::new(30, 30, 20, 20));
        assert_eq!(inside, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);

        let single = level.cells_overlapping(&Rect::new(0, 0, 20, 20));
        assert_eq!(single, vec![(0, 0)]);

        let off_grid = level.cells_overlapping(&Rect::new(-500, -500, 20, 20));
        assert!(off_grid.is_empty());

        let partially_off = level.cells_overlapping(&Rect::new(-10, -10, 20, 20));
        assert_eq!(partially_off, vec![(0, 0)]);

        let empty = level.cells_overlapping(&Rect::new(10, 10, 0, 0));
        assert!(empty.is_empty());
    }

    #[test]
    fn adjacent_hazards_reset_with_alternating_parity() {
        let mut descriptor = empty_descriptor();
        descriptor.tiles[10] = TILE_CODE_HAZARD_BASE;
        descriptor.tiles[11] = TILE_CODE_HAZARD_BASE;
        let level = build(&descriptor);

        let left = level.tile(0, 10).as_hazard().expect("hazard").animation_point();
        let right = level
            .tile(0, 11)
            .as_hazard()
            .expect("hazard")
            .animation_point();
        assert_ne!(left, right);
        assert!(left == 0 || left == 1);
        assert!(right == 0 || right == 1);
    }
}
