use tracing::debug;

use crate::content::{BeltRotation, ConveyorDef, ConveyorDefId, HazardDef, HazardDefId};

/// Frame index that marks a hazard as permanently dead.
pub const DEAD_ANIMATION_POINT: i32 = -1;
/// Last explosion frame; one tick past it the hazard dies.
pub const MAX_EXPLODING_FRAMES: i32 = 8;
/// Idle hazards toggle their blink frame every this many ticks.
pub const HAZARD_BLINK_PERIOD_TICKS: u32 = 10;
/// Conveyor belts advance one animation step every this many ticks.
pub const CONVEYOR_FRAME_PERIOD_TICKS: u32 = 4;
pub const CONVEYOR_FRAME_COUNT: u8 = 4;
/// Collapse calls a platform absorbs before it stops being standable.
pub const COLLAPSE_DAMAGE_LIMIT: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Solid,
    Thru,
    Scene,
    None,
}

/// Sprite-sheet cell the rendering collaborator should draw for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintData {
    pub sprite: u16,
    pub frame: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceTile {
    kind: SurfaceKind,
    sprite: u16,
}

impl SurfaceTile {
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn paint_data(&self) -> Option<PaintData> {
        match self.kind {
            SurfaceKind::None => None,
            _ => Some(PaintData {
                sprite: self.sprite,
                frame: 0,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HazardTile {
    def: HazardDefId,
    explodes: bool,
    harmless: bool,
    sprite: u16,
    exploding: bool,
    animation_point: i32,
    ticks_to_next_frame: u32,
}

impl HazardTile {
    fn new(def: HazardDefId, descriptor: &HazardDef) -> Self {
        Self {
            def,
            explodes: descriptor.explodes,
            harmless: descriptor.harmless,
            sprite: descriptor.sprite,
            exploding: false,
            animation_point: 0,
            ticks_to_next_frame: HAZARD_BLINK_PERIOD_TICKS,
        }
    }

    pub fn def(&self) -> HazardDefId {
        self.def
    }

    pub fn is_dead(&self) -> bool {
        self.animation_point == DEAD_ANIMATION_POINT
    }

    /// Touching this hazard costs health. Dead hazards are intangible and
    /// harmless ones never were lethal.
    pub fn is_deadly(&self) -> bool {
        !self.is_dead() && !self.harmless
    }

    pub fn is_exploding(&self) -> bool {
        self.exploding
    }

    pub fn animation_point(&self) -> i32 {
        self.animation_point
    }

    fn update(&mut self) {
        if self.is_dead() {
            return;
        }
        if self.exploding {
            // Explosion frames advance every tick, ungated by the countdown.
            self.animation_point += 1;
            if self.animation_point > MAX_EXPLODING_FRAMES {
                self.animation_point = DEAD_ANIMATION_POINT;
                self.exploding = false;
            }
            return;
        }
        self.ticks_to_next_frame = self.ticks_to_next_frame.saturating_sub(1);
        if self.ticks_to_next_frame == 0 {
            self.animation_point = 1 - self.animation_point;
            self.ticks_to_next_frame = HAZARD_BLINK_PERIOD_TICKS;
        }
    }

    /// Returns true when the hit transitioned an alive, explosive hazard
    /// into its explosion; the caller owns the resulting event/sound signal.
    pub fn hit(&mut self) -> bool {
        if self.explodes && !self.exploding && !self.is_dead() {
            self.exploding = true;
            self.animation_point = 0;
            debug!(def = self.def.0, "hazard_exploding");
            return true;
        }
        false
    }

    fn reset(&mut self, parity: bool) {
        self.exploding = false;
        self.animation_point = i32::from(parity);
        self.ticks_to_next_frame = HAZARD_BLINK_PERIOD_TICKS;
    }

    fn paint_data(&self) -> Option<PaintData> {
        if self.is_dead() {
            return None;
        }
        Some(PaintData {
            sprite: self.sprite,
            frame: self.animation_point as u32,
        })
    }
}

impl PartialEq for HazardTile {
    // Descriptor identity only; runtime animation state never participates.
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

impl Eq for HazardTile {}

#[derive(Debug, Clone)]
pub struct ConveyorTile {
    def: ConveyorDefId,
    rotation: BeltRotation,
    sprite: u16,
    animation_step: u8,
    ticks_to_next_frame: u32,
}

impl ConveyorTile {
    fn new(def: ConveyorDefId, descriptor: &ConveyorDef) -> Self {
        Self {
            def,
            rotation: descriptor.rotation,
            sprite: descriptor.sprite,
            animation_step: 0,
            ticks_to_next_frame: CONVEYOR_FRAME_PERIOD_TICKS,
        }
    }

    pub fn def(&self) -> ConveyorDefId {
        self.def
    }

    pub fn rotation(&self) -> BeltRotation {
        self.rotation
    }

    pub fn animation_step(&self) -> u8 {
        self.animation_step
    }

    fn update(&mut self) {
        self.ticks_to_next_frame = self.ticks_to_next_frame.saturating_sub(1);
        if self.ticks_to_next_frame == 0 {
            self.animation_step = (self.animation_step + 1) % CONVEYOR_FRAME_COUNT;
            self.ticks_to_next_frame = CONVEYOR_FRAME_PERIOD_TICKS;
        }
    }

    fn reset(&mut self) {
        self.animation_step = 0;
        self.ticks_to_next_frame = CONVEYOR_FRAME_PERIOD_TICKS;
    }

    fn paint_data(&self) -> Option<PaintData> {
        Some(PaintData {
            sprite: self.sprite,
            frame: self.animation_step as u32,
        })
    }
}

impl PartialEq for ConveyorTile {
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

impl Eq for ConveyorTile {}

#[derive(Debug, Clone)]
pub struct CollapsibleTile {
    sprite: u16,
    damage: u8,
}

impl CollapsibleTile {
    fn new(sprite: u16) -> Self {
        Self { sprite, damage: 0 }
    }

    pub fn damage(&self) -> u8 {
        self.damage
    }

    pub fn is_collapsed(&self) -> bool {
        self.damage >= COLLAPSE_DAMAGE_LIMIT
    }

    /// One tick of being stood upon. Returns the new damage level.
    pub fn collapse(&mut self) -> u8 {
        if self.damage < COLLAPSE_DAMAGE_LIMIT {
            self.damage += 1;
        }
        self.damage
    }

    fn reset(&mut self) {
        self.damage = 0;
    }

    fn paint_data(&self) -> Option<PaintData> {
        Some(PaintData {
            sprite: self.sprite,
            frame: (self.damage / 2) as u32,
        })
    }
}

impl PartialEq for CollapsibleTile {
    fn eq(&self, other: &Self) -> bool {
        self.sprite == other.sprite
    }
}

impl Eq for CollapsibleTile {}

/// One cell of the level grid. Closed set of tile kinds; traversal and
/// update semantics dispatch by match so a new kind cannot be added without
/// the compiler pointing at every site that must handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tile {
    Surface(SurfaceTile),
    Hazard(HazardTile),
    Conveyor(ConveyorTile),
    Collapsible(CollapsibleTile),
}

impl Tile {
    pub fn surface(kind: SurfaceKind, sprite: u16) -> Tile {
        Tile::Surface(SurfaceTile { kind, sprite })
    }

    pub fn hazard(def: HazardDefId, descriptor: &HazardDef) -> Tile {
        Tile::Hazard(HazardTile::new(def, descriptor))
    }

    pub fn conveyor(def: ConveyorDefId, descriptor: &ConveyorDef) -> Tile {
        Tile::Conveyor(ConveyorTile::new(def, descriptor))
    }

    pub fn collapsible(sprite: u16) -> Tile {
        Tile::Collapsible(CollapsibleTile::new(sprite))
    }

    /// Advance one tick of internal animation/decay state.
    pub fn update(&mut self) {
        match self {
            Tile::Surface(_) => {}
            Tile::Hazard(hazard) => hazard.update(),
            Tile::Conveyor(conveyor) => conveyor.update(),
            Tile::Collapsible(_) => {}
        }
    }

    /// Restore level-reload defaults. `parity` desynchronizes the idle blink
    /// of adjacent hazards; the other kinds ignore it.
    pub fn reset(&mut self, parity: bool) {
        match self {
            Tile::Surface(_) => {}
            Tile::Hazard(hazard) => hazard.reset(parity),
            Tile::Conveyor(conveyor) => conveyor.reset(),
            Tile::Collapsible(collapsible) => collapsible.reset(),
        }
    }

    pub fn is_solid(&self) -> bool {
        matches!(
            self,
            Tile::Surface(SurfaceTile {
                kind: SurfaceKind::Solid,
                ..
            })
        )
    }

    pub fn is_thru(&self) -> bool {
        match self {
            Tile::Surface(surface) => surface.kind == SurfaceKind::Thru,
            Tile::Hazard(_) => false,
            Tile::Conveyor(_) => true,
            Tile::Collapsible(collapsible) => !collapsible.is_collapsed(),
        }
    }

    pub fn is_landable(&self) -> bool {
        self.is_solid() || self.is_thru()
    }

    pub fn paint_data(&self) -> Option<PaintData> {
        match self {
            Tile::Surface(surface) => surface.paint_data(),
            Tile::Hazard(hazard) => hazard.paint_data(),
            Tile::Conveyor(conveyor) => conveyor.paint_data(),
            Tile::Collapsible(collapsible) => collapsible.paint_data(),
        }
    }

    pub fn as_hazard(&self) -> Option<&HazardTile> {
        match self {
            Tile::Hazard(hazard) => Some(hazard),
            _ => None,
        }
    }

    pub fn as_hazard_mut(&mut self) -> Option<&mut HazardTile> {
        match self {
            Tile::Hazard(hazard) => Some(hazard),
            _ => None,
        }
    }

    pub fn as_conveyor(&self) -> Option<&ConveyorTile> {
        match self {
            Tile::Conveyor(conveyor) => Some(conveyor),
            _ => None,
        }
    }

    pub fn as_collapsible(&self) -> Option<&CollapsibleTile> {
        match self {
            Tile::Collapsible(collapsible) => Some(collapsible),
            _ => None,
        }
    }

    pub fn as_collapsible_mut(&mut self) -> Option<&mut CollapsibleTile> {
        match self {
            Tile::Collapsible(collapsible) => Some(collapsible),
            _ => None,
        }
    }
}
