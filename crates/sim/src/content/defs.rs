use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect};

fn default_frame_size() -> u32 {
    40
}

fn default_animation_speed() -> u32 {
    1
}

fn default_speed_multiplier() -> i32 {
    1
}

fn default_player_health() -> i32 {
    100
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeltRotation {
    Clockwise,
    Anticlockwise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardDef {
    pub def_name: String,
    pub sprite: u16,
    pub explodes: bool,
    #[serde(default)]
    pub harmless: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConveyorDef {
    pub def_name: String,
    pub sprite: u16,
    pub rotation: BeltRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStyle {
    /// Frames advance to the end of the sheet, then play back in reverse
    /// (ping-pong).
    PingPong,
    /// Frames wrap from the last back to the first.
    Loop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    #[default]
    Single,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedFacing {
    #[default]
    None,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Normal,
    HealthDrain,
    BonusDoor,
    ExitDoor,
    Scenery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub def_name: String,
    pub kind: EntityKind,
    pub sheet: u32,
    pub frame_count: u32,
    #[serde(default = "default_frame_size")]
    pub frame_width: u32,
    #[serde(default = "default_frame_size")]
    pub frame_height: u32,
    pub start: PixelPoint,
    /// Region the entity's position is confined to by velocity reversal.
    pub bounds: PixelRect,
    pub velocity: PixelPoint,
    pub animation_style: AnimationStyle,
    #[serde(default = "default_animation_speed")]
    pub animation_speed: u32,
    #[serde(default)]
    pub facing: FacingMode,
    #[serde(default)]
    pub forced_facing: ForcedFacing,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDef {
    pub sheet: u32,
    #[serde(default = "default_frame_size")]
    pub frame_width: u32,
    #[serde(default = "default_frame_size")]
    pub frame_height: u32,
    pub start: PixelPoint,
    #[serde(default = "default_player_health")]
    pub health: i32,
}

/// Sprite indices used when decoding plain surface tile codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePalette {
    pub solid: u16,
    pub thru: u16,
    pub scene: u16,
    pub collapsible: u16,
}

impl Default for TilePalette {
    fn default() -> Self {
        Self {
            solid: 0,
            thru: 1,
            scene: 2,
            collapsible: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    #[serde(default)]
    pub palette: TilePalette,
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: i32,
    #[serde(default)]
    pub hazards: Vec<HazardDef>,
    #[serde(default)]
    pub conveyors: Vec<ConveyorDef>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
    pub player: PlayerDef,
    /// Row-major tile codes, `GRID_ROWS * GRID_COLS` entries.
    pub tiles: Vec<u16>,
}

impl LevelDescriptor {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_def_optional_fields_have_defaults() {
        let raw = r#"{
            "def_name": "pit.walker",
            "kind": "normal",
            "sheet": 2,
            "frame_count": 4,
            "start": { "x": 100, "y": 80 },
            "bounds": { "x": 60, "y": 80, "width": 120, "height": 0 },
            "velocity": { "x": 2, "y": 0 },
            "animation_style": "ping_pong"
        }"#;
        let def: EntityDef = serde_json::from_str(raw).expect("entity def");
        assert_eq!(def.frame_width, 40);
        assert_eq!(def.frame_height, 40);
        assert_eq!(def.animation_speed, 1);
        assert_eq!(def.facing, FacingMode::Single);
        assert_eq!(def.forced_facing, ForcedFacing::None);
        assert!(def.visible);
    }

    #[test]
    fn hazard_def_harmless_defaults_to_false() {
        let raw = r#"{ "def_name": "pit.spikes", "sprite": 9, "explodes": false }"#;
        let def: HazardDef = serde_json::from_str(raw).expect("hazard def");
        assert!(!def.harmless);
    }

    #[test]
    fn descriptor_loads_from_a_file_on_disk() {
        let descriptor = LevelDescriptor {
            name: "disk".to_string(),
            palette: TilePalette::default(),
            speed_multiplier: 1,
            hazards: Vec::new(),
            conveyors: Vec::new(),
            entities: Vec::new(),
            player: PlayerDef {
                sheet: 0,
                frame_width: 40,
                frame_height: 40,
                start: PixelPoint { x: 10, y: 10 },
                health: 100,
            },
            tiles: vec![0; 640],
        };

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("level.json");
        let raw = serde_json::to_string(&descriptor).expect("serialize");
        std::fs::write(&path, raw).expect("write");

        let reread = std::fs::read_to_string(&path).expect("read");
        let parsed = LevelDescriptor::from_json_str(&reread).expect("parse");
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn level_descriptor_round_trips_through_json() {
        let descriptor = LevelDescriptor {
            name: "test".to_string(),
            palette: TilePalette::default(),
            speed_multiplier: 2,
            hazards: vec![HazardDef {
                def_name: "pit.mine".to_string(),
                sprite: 4,
                explodes: true,
                harmless: false,
            }],
            conveyors: vec![ConveyorDef {
                def_name: "pit.belt".to_string(),
                sprite: 5,
                rotation: BeltRotation::Anticlockwise,
            }],
            entities: Vec::new(),
            player: PlayerDef {
                sheet: 0,
                frame_width: 40,
                frame_height: 40,
                start: PixelPoint { x: 20, y: 20 },
                health: 100,
            },
            tiles: vec![0; 640],
        };

        let raw = serde_json::to_string(&descriptor).expect("serialize");
        let parsed = LevelDescriptor::from_json_str(&raw).expect("parse");
        assert_eq!(parsed, descriptor);
    }
}
