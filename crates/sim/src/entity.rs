use thiserror::Error;
use tracing::warn;

use crate::collision::SpriteFrame;
use crate::content::{AnimationStyle, EntityDef, EntityKind, FacingMode, ForcedFacing};
use crate::geom::{Point, Rect};
use crate::gfx::{SpriteBank, SpriteSheetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("entity {def_name} declares zero animation frames")]
    ZeroFrameCount { def_name: String },
    #[error("entity {def_name} declares a zero-sized frame ({width}x{height})")]
    ZeroFrameSize {
        def_name: String,
        width: u32,
        height: u32,
    },
    #[error("entity {def_name} frame span {span}px exceeds sheet width {sheet_width}px")]
    FrameSpanExceedsSheet {
        def_name: String,
        span: u32,
        sheet_width: u32,
    },
}

/// A movable sprite: the player-facing monsters, doors and scenery pieces.
/// Motion is confined to `bounds` by predictive velocity reversal; the
/// animation clip tracks a frame column plus a facing row within one sheet.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    sheet: SpriteSheetId,
    frame_count: u32,
    frame_width: u32,
    frame_height: u32,
    start: Point,
    bounds: Rect,
    initial_velocity: Point,
    speed_multiplier: i32,
    animation_style: AnimationStyle,
    animation_speed: u32,
    facing: FacingMode,
    forced_facing: ForcedFacing,
    initial_visible: bool,
    position: Point,
    velocity: Point,
    frame: u32,
    second_row: bool,
    cycle_forward: bool,
    tick_counter: u32,
    visible: bool,
}

impl Entity {
    pub fn from_def(
        id: EntityId,
        def: &EntityDef,
        bank: &SpriteBank,
        speed_multiplier: i32,
    ) -> Result<Self, EntityError> {
        if def.frame_count == 0 {
            return Err(EntityError::ZeroFrameCount {
                def_name: def.def_name.clone(),
            });
        }
        if def.frame_width == 0 || def.frame_height == 0 {
            return Err(EntityError::ZeroFrameSize {
                def_name: def.def_name.clone(),
                width: def.frame_width,
                height: def.frame_height,
            });
        }

        let sheet = SpriteSheetId(def.sheet);
        let mut facing = def.facing;
        if let Some(buffer) = bank.sheet(sheet) {
            let span = def.frame_count * def.frame_width;
            if span > buffer.width() {
                return Err(EntityError::FrameSpanExceedsSheet {
                    def_name: def.def_name.clone(),
                    span,
                    sheet_width: buffer.width(),
                });
            }
            if facing != FacingMode::Single && buffer.height() < def.frame_height * 2 {
                warn!(
                    def_name = def.def_name.as_str(),
                    sheet_height = buffer.height(),
                    frame_height = def.frame_height,
                    "two_way_facing_downgraded_single_row_sheet"
                );
                facing = FacingMode::Single;
            }
        }

        let mut entity = Self {
            id,
            kind: def.kind,
            sheet,
            frame_count: def.frame_count,
            frame_width: def.frame_width,
            frame_height: def.frame_height,
            start: def.start.to_point(),
            bounds: def.bounds.to_rect(),
            initial_velocity: def.velocity.to_point(),
            speed_multiplier,
            animation_style: def.animation_style,
            animation_speed: def.animation_speed.max(1),
            facing,
            forced_facing: def.forced_facing,
            initial_visible: def.visible,
            position: Point::default(),
            velocity: Point::default(),
            frame: 0,
            second_row: false,
            cycle_forward: true,
            tick_counter: 0,
            visible: def.visible,
        };
        entity.reset();
        Ok(entity)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn sheet(&self) -> SpriteSheetId {
        self.sheet
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Invisible entities are intangible; doors use this as their key-gate.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Frame rectangle in world space.
    pub fn frame_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.frame_width,
            self.frame_height,
        )
    }

    /// Clip rectangle into the sprite sheet for the current frame and facing
    /// row.
    pub fn clip_rect(&self) -> Rect {
        let row_y = if self.second_row {
            self.frame_height as i32
        } else {
            0
        };
        Rect::new(
            (self.frame * self.frame_width) as i32,
            row_y,
            self.frame_width,
            self.frame_height,
        )
    }

    pub fn sprite_frame(&self) -> SpriteFrame {
        SpriteFrame {
            world: self.frame_rect(),
            clip: self.clip_rect(),
            sheet: self.sheet,
        }
    }

    pub fn reset(&mut self) {
        self.position = self.start;
        self.velocity = Point::new(
            self.initial_velocity.x * self.speed_multiplier,
            self.initial_velocity.y * self.speed_multiplier,
        );
        self.frame = 0;
        self.second_row =
            self.facing != FacingMode::Single && self.forced_facing == ForcedFacing::Secondary;
        self.cycle_forward = true;
        self.tick_counter = 0;
        self.visible = self.initial_visible;
    }

    pub fn update(&mut self) {
        if !self.visible {
            return;
        }

        // A zero-size bounding region pins the sprite in place; only the
        // animation advances.
        let confined = self.bounds.width > 0 || self.bounds.height > 0;
        if confined {
            self.position.x += self.velocity.x;
            self.position.y += self.velocity.y;
        }

        self.advance_animation();

        if !confined {
            return;
        }
        let (x, velocity_x, reversed_x) = bounce_axis(
            self.position.x,
            self.velocity.x,
            self.bounds.x,
            self.bounds.right(),
        );
        self.position.x = x;
        self.velocity.x = velocity_x;

        let (y, velocity_y, reversed_y) = bounce_axis(
            self.position.y,
            self.velocity.y,
            self.bounds.y,
            self.bounds.bottom(),
        );
        self.position.y = y;
        self.velocity.y = velocity_y;

        if self.forced_facing == ForcedFacing::None {
            if reversed_x && self.facing == FacingMode::Horizontal {
                self.second_row = !self.second_row;
            }
            if reversed_y && self.facing == FacingMode::Vertical {
                self.second_row = !self.second_row;
            }
        }
    }

    fn advance_animation(&mut self) {
        self.tick_counter += 1;
        if self.tick_counter < self.animation_speed {
            return;
        }
        self.tick_counter = 0;
        match self.animation_style {
            AnimationStyle::Loop => {
                self.frame = (self.frame + 1) % self.frame_count;
            }
            AnimationStyle::PingPong => {
                if self.cycle_forward {
                    if self.frame + 1 >= self.frame_count {
                        self.cycle_forward = false;
                        self.frame = self.frame_count.saturating_sub(2);
                    } else {
                        self.frame += 1;
                    }
                } else if self.frame == 0 {
                    self.cycle_forward = true;
                    self.frame = 1.min(self.frame_count - 1);
                } else {
                    self.frame -= 1;
                }
            }
        }
    }
}

/// One axis of the boundary-reversal step. The coordinate has already been
/// translated by `velocity`. Outside the `[min, max]` band, one more
/// tentative step decides the outcome: a diverging step (farther out than
/// the coordinate already is) reverses the axis and rolls this tick's
/// translation back; a converging step is an entity legitimately walking
/// home from outside its region and passes through untouched. A naive
/// "outside means reverse" would make such an entity oscillate in place
/// forever.
fn bounce_axis(value: i32, velocity: i32, min: i32, max: i32) -> (i32, i32, bool) {
    if velocity == 0 || (value >= min && value <= max) {
        return (value, velocity, false);
    }
    let tentative = value + velocity;
    let diverging = if value < min {
        tentative < value
    } else {
        tentative > value
    };
    if diverging {
        (value - velocity, -velocity, true)
    } else {
        (value, velocity, false)
    }
}
