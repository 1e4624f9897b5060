use thiserror::Error;
use tracing::info;

use crate::collision::{frames_touch, SpriteFrame};
use crate::content::{BeltRotation, EntityKind, LevelDefs, LevelDescriptor, PlayerDef};
use crate::entity::{Entity, EntityError, EntityId};
use crate::geom::{Point, Rect};
use crate::gfx::{SpriteBank, SpriteSheetId};
use crate::level::{Level, LevelError};

/// Health cost of one tick of contact with a lethal hazard or a normal
/// monster.
pub const CONTACT_DAMAGE: i32 = 1;
/// Horizontal pixels a belt carries a standing player per tick.
pub const BELT_SHIFT_PX: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    Bonus,
    Exit,
}

/// Notifications the rendering/audio collaborator drains after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    HazardExploded { row: usize, col: usize },
    CollapsibleDamaged { row: usize, col: usize, damage: u8 },
    EntityCollision { entity: EntityId, kind: EntityKind },
    PlayerDamaged { amount: i32, remaining: i32 },
    PlayerDied,
    DoorReached { kind: DoorKind },
}

#[derive(Debug, Default)]
pub struct EventBus {
    current_tick_events: Vec<SimEvent>,
}

impl EventBus {
    pub fn emit(&mut self, event: SimEvent) {
        self.current_tick_events.push(event);
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.current_tick_events
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.current_tick_events)
    }

    pub fn clear(&mut self) {
        self.current_tick_events.clear();
    }
}

/// The player avatar. Input, gravity and jump arcs belong to the host; the
/// simulation reads the resulting position each tick and reports back what
/// the level did about it.
#[derive(Debug, Clone)]
pub struct Player {
    start: Point,
    sheet: SpriteSheetId,
    frame_width: u32,
    frame_height: u32,
    max_health: i32,
    position: Point,
    clip: Rect,
    falling: bool,
    health: i32,
}

impl Player {
    fn from_def(def: &PlayerDef) -> Self {
        let mut player = Self {
            start: def.start.to_point(),
            sheet: SpriteSheetId(def.sheet),
            frame_width: def.frame_width,
            frame_height: def.frame_height,
            max_health: def.health,
            position: Point::default(),
            clip: Rect::default(),
            falling: false,
            health: def.health,
        };
        player.reset();
        player
    }

    fn reset(&mut self) {
        self.position = self.start;
        self.clip = Rect::new(0, 0, self.frame_width, self.frame_height);
        self.falling = false;
        self.health = self.max_health;
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.position.x += dx;
        self.position.y += dy;
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip
    }

    /// Host-side animation picks the displayed frame.
    pub fn set_clip(&mut self, clip: Rect) {
        self.clip = clip;
    }

    pub fn falling(&self) -> bool {
        self.falling
    }

    pub fn set_falling(&mut self, falling: bool) {
        self.falling = falling;
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn frame_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.frame_width,
            self.frame_height,
        )
    }

    pub fn sprite_frame(&self) -> SpriteFrame {
        SpriteFrame {
            world: self.frame_rect(),
            clip: self.clip,
            sheet: self.sheet,
        }
    }

    fn apply_damage(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount).max(0);
        self.health
    }
}

/// What one tick did to the player, for the host's movement/gravity code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A landable tile sits directly under the player's feet; fall state is
    /// canceled.
    pub grounded: bool,
    /// The player's frame overlaps a solid tile; horizontal movement halts.
    pub blocked_horizontally: bool,
    /// Net belt displacement applied to the player this tick.
    pub belt_shift_x: i32,
    /// The player touched something lethal this tick.
    pub lethal_contact: bool,
    pub door: Option<DoorKind>,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to build level grid: {0}")]
    Level(#[from] LevelError),
    #[error("failed to build entity roster: {0}")]
    Entity(#[from] EntityError),
}

/// Owns the whole per-tick state machine: the tile grid, the monster roster,
/// the player, and the event bus. One `tick()` is one complete, synchronous
/// simulation step; callers that render on another thread must snapshot
/// between ticks.
pub struct Simulation {
    level: Level,
    defs: LevelDefs,
    entities: Vec<Entity>,
    player: Player,
    bank: SpriteBank,
    events: EventBus,
    tick_counter: u64,
    death_reported: bool,
}

impl Simulation {
    pub fn new(descriptor: &LevelDescriptor, mut bank: SpriteBank) -> Result<Self, SimError> {
        let defs = LevelDefs::from_descriptor(descriptor);
        let level = Level::from_descriptor(descriptor, &defs)?;

        // Sheets may legitimately be absent from a smaller resource pack;
        // flag each missing one once and carry on with transparent reads.
        bank.sheet_logged(SpriteSheetId(descriptor.player.sheet));
        for def in &descriptor.entities {
            bank.sheet_logged(SpriteSheetId(def.sheet));
        }

        let mut entities = Vec::with_capacity(descriptor.entities.len());
        for (index, def) in descriptor.entities.iter().enumerate() {
            entities.push(Entity::from_def(
                EntityId(index as u32),
                def,
                &bank,
                descriptor.speed_multiplier,
            )?);
        }
        let player = Player::from_def(&descriptor.player);
        info!(
            level = descriptor.name.as_str(),
            entities = entities.len(),
            sheets = bank.len(),
            "simulation_ready"
        );
        Ok(Self {
            level,
            defs,
            entities,
            player,
            bank,
            events: EventBus::default(),
            tick_counter: 0,
            death_reported: false,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn defs(&self) -> &LevelDefs {
        &self.defs
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn bank(&self) -> &SpriteBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut SpriteBank {
        &mut self.bank
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn events(&self) -> &[SimEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Screen (re)entry: tiles, monsters and player back to level defaults.
    pub fn reset(&mut self) {
        self.level.reset_all();
        for entity in &mut self.entities {
            entity.reset();
        }
        self.player.reset();
        self.events.clear();
        self.tick_counter = 0;
        self.death_reported = false;
    }

    /// One complete simulation step.
    pub fn tick(&mut self) -> TickReport {
        self.tick_counter += 1;

        self.level.update_all();
        for entity in &mut self.entities {
            entity.update();
        }

        let mut report = TickReport::default();
        if self.player.is_alive() {
            self.resolve_player_against_tiles(&mut report);
            self.resolve_player_against_entities(&mut report);
        }
        report
    }

    fn resolve_player_against_tiles(&mut self, report: &mut TickReport) {
        let frame = self.player.frame_rect();

        // Stand detection probes the pixel strip directly under the feet;
        // thru tiles only ever matter from above.
        let foot_probe = Rect::new(frame.x, frame.bottom(), frame.width, 1);
        let mut standing_cells = Vec::new();
        for (row, col) in self.level.cells_overlapping(&foot_probe) {
            if self.level.tile(row, col).is_landable() {
                report.grounded = true;
                standing_cells.push((row, col));
            }
        }

        for (row, col) in standing_cells {
            let tile = self.level.tile_mut(row, col);
            if let Some(collapsible) = tile.as_collapsible_mut() {
                let damage = collapsible.collapse();
                self.events
                    .emit(SimEvent::CollapsibleDamaged { row, col, damage });
            } else if let Some(conveyor) = tile.as_conveyor() {
                if report.belt_shift_x == 0 {
                    report.belt_shift_x = match conveyor.rotation() {
                        BeltRotation::Clockwise => BELT_SHIFT_PX,
                        BeltRotation::Anticlockwise => -BELT_SHIFT_PX,
                    };
                }
            }
        }
        if report.belt_shift_x != 0 {
            self.player.move_by(report.belt_shift_x, 0);
        }

        // Body overlap: solid blocks from every side, live hazards burn.
        for (row, col) in self.level.cells_overlapping(&frame) {
            let tile = self.level.tile_mut(row, col);
            if tile.is_solid() {
                report.blocked_horizontally = true;
                continue;
            }
            if let Some(hazard) = tile.as_hazard_mut() {
                if hazard.is_dead() {
                    continue;
                }
                let deadly = hazard.is_deadly();
                if hazard.hit() {
                    self.events.emit(SimEvent::HazardExploded { row, col });
                }
                if deadly {
                    report.lethal_contact = true;
                    self.damage_player(CONTACT_DAMAGE);
                }
            }
        }

        self.player.set_falling(!report.grounded);
    }

    fn resolve_player_against_entities(&mut self, report: &mut TickReport) {
        let player_frame = self.player.sprite_frame();
        let mut contacts = Vec::new();
        for entity in &self.entities {
            if !entity.visible() {
                continue;
            }
            let frame = entity.sprite_frame();
            if !player_frame.world.intersects(&frame.world) {
                continue;
            }
            if frames_touch(&player_frame, &frame, &self.bank) {
                contacts.push((entity.id(), entity.kind()));
            }
        }

        for (entity, kind) in contacts {
            self.events.emit(SimEvent::EntityCollision { entity, kind });
            match kind {
                EntityKind::Normal => {
                    report.lethal_contact = true;
                    self.damage_player(CONTACT_DAMAGE);
                }
                EntityKind::HealthDrain => {
                    report.lethal_contact = true;
                    let drain = self.player.health();
                    self.damage_player(drain);
                }
                EntityKind::BonusDoor => {
                    report.door = Some(DoorKind::Bonus);
                    self.events.emit(SimEvent::DoorReached {
                        kind: DoorKind::Bonus,
                    });
                }
                EntityKind::ExitDoor => {
                    report.door = Some(DoorKind::Exit);
                    self.events.emit(SimEvent::DoorReached {
                        kind: DoorKind::Exit,
                    });
                }
                EntityKind::Scenery => {}
            }
        }
    }

    fn damage_player(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        let remaining = self.player.apply_damage(amount);
        self.events
            .emit(SimEvent::PlayerDamaged { amount, remaining });
        if remaining == 0 && !self.death_reported {
            self.death_reported = true;
            info!(tick = self.tick_counter, "player_died");
            self.events.emit(SimEvent::PlayerDied);
        }
    }
}
