mod database;
mod defs;

pub use database::{ConveyorDefId, HazardDefId, LevelDefs};
pub use defs::{
    AnimationStyle, BeltRotation, ConveyorDef, EntityDef, EntityKind, FacingMode, ForcedFacing,
    HazardDef, LevelDescriptor, PixelPoint, PixelRect, PlayerDef, TilePalette,
};
