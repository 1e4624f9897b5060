use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sim::{
    LevelDescriptor, PixelBuffer, Point, SimError, SimEvent, Simulation, SpriteBank, TickReport,
    GRID_COLS, GRID_ROWS, TILE_CODE_COLLAPSIBLE, TILE_CODE_CONVEYOR_BASE, TILE_CODE_HAZARD_BASE,
    TILE_CODE_NONE, TILE_CODE_SOLID, TILE_CODE_THRU, TILE_SIZE_PX,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const LEVEL_ENV_VAR: &str = "PITRUN_LEVEL";
const TICKS_ENV_VAR: &str = "PITRUN_TICKS";
const REPORT_ENV_VAR: &str = "PITRUN_REPORT";
const SHEETS_DIR_ENV_VAR: &str = "PITRUN_SHEETS";
const DEFAULT_TICKS: u64 = 600;
const FALL_SPEED_PX: i32 = 4;

#[derive(Debug, Error)]
enum RunnerError {
    #[error("failed to read level descriptor {path}: {source}")]
    ReadLevel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level descriptor {path}: {source}")]
    ParseLevel {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("failed to build simulation: {0}")]
    BuildSimulation(#[from] SimError),
    #[error("failed to write run report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
struct RunReport {
    level: String,
    ticks: u64,
    hazards_exploded: u32,
    collapsibles_damaged: u32,
    entity_collisions: u32,
    damage_taken: i32,
    player_health: i32,
    player_died: bool,
    door: Option<String>,
}

fn main() {
    init_tracing();
    info!("=== Pit Runner Headless Sim ===");

    if let Err(err) = run() {
        error!(error = %err, "run_failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), RunnerError> {
    let descriptor = load_descriptor()?;
    let bank = build_bank(&descriptor);
    let mut simulation = Simulation::new(&descriptor, bank)?;
    let ticks = parse_ticks_from_env();

    let mut report = RunReport {
        level: descriptor.name.clone(),
        ..RunReport::default()
    };

    for _ in 0..ticks {
        let tick = simulation.tick();
        report.ticks = simulation.tick_counter();
        for event in simulation.drain_events() {
            record_event(&mut report, event);
        }
        if report.player_died || report.door.is_some() {
            break;
        }
        apply_gravity(&mut simulation, &tick);
    }
    report.player_health = simulation.player().health();

    info!(
        level = report.level.as_str(),
        ticks = report.ticks,
        hazards_exploded = report.hazards_exploded,
        entity_collisions = report.entity_collisions,
        player_health = report.player_health,
        "run_complete"
    );
    write_report_if_requested(&report)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_descriptor() -> Result<LevelDescriptor, RunnerError> {
    match env::var(LEVEL_ENV_VAR) {
        Ok(raw_path) => {
            let path = PathBuf::from(raw_path);
            let raw = fs::read_to_string(&path).map_err(|source| RunnerError::ReadLevel {
                path: path.clone(),
                source,
            })?;
            parse_descriptor(&raw).map_err(|source| RunnerError::ParseLevel { path, source })
        }
        Err(_) => {
            info!(env_var = LEVEL_ENV_VAR, "no_level_configured_using_demo");
            Ok(demo_level())
        }
    }
}

fn parse_descriptor(
    raw: &str,
) -> Result<LevelDescriptor, serde_path_to_error::Error<serde_json::Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer)
}

fn parse_ticks_from_env() -> u64 {
    match env::var(TICKS_ENV_VAR) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(ticks) if ticks > 0 => ticks,
            _ => {
                warn!(
                    env_var = TICKS_ENV_VAR,
                    raw = raw.as_str(),
                    default = DEFAULT_TICKS,
                    "invalid_tick_count_using_default"
                );
                DEFAULT_TICKS
            }
        },
        Err(_) => DEFAULT_TICKS,
    }
}

/// Load each sheet the level references from `PITRUN_SHEETS/sheet_<id>.png`,
/// falling back to a fully opaque placeholder sized for the declared frames.
/// With placeholders the pixel test degenerates to the box test, which is
/// the right headless behavior.
fn build_bank(descriptor: &LevelDescriptor) -> SpriteBank {
    let sheets_dir = env::var(SHEETS_DIR_ENV_VAR).ok().map(PathBuf::from);
    let mut bank = SpriteBank::default();
    for id in 0..=max_sheet_id(descriptor) {
        let loaded = sheets_dir
            .as_deref()
            .and_then(|dir| load_sheet_png(dir, id));
        match loaded {
            Some(buffer) => {
                bank.push(buffer);
            }
            None => {
                let (width, height) = placeholder_sheet_size(descriptor, id);
                bank.push(opaque_placeholder(width, height));
            }
        }
    }
    bank
}

fn load_sheet_png(dir: &Path, id: u32) -> Option<PixelBuffer> {
    let path = dir.join(format!("sheet_{id}.png"));
    let bytes = fs::read(&path).ok()?;
    match PixelBuffer::decode_png(&bytes) {
        Ok(buffer) => {
            info!(sheet_id = id, path = %path.display(), "sheet_loaded");
            Some(buffer)
        }
        Err(err) => {
            warn!(
                sheet_id = id,
                path = %path.display(),
                error = %err,
                "sheet_decode_failed_using_placeholder"
            );
            None
        }
    }
}

fn max_sheet_id(descriptor: &LevelDescriptor) -> u32 {
    descriptor
        .entities
        .iter()
        .map(|def| def.sheet)
        .chain(std::iter::once(descriptor.player.sheet))
        .max()
        .unwrap_or(0)
}

/// Smallest sheet that satisfies every def drawing from this id, with room
/// for a second facing row.
fn placeholder_sheet_size(descriptor: &LevelDescriptor, id: u32) -> (u32, u32) {
    let mut width = 1;
    let mut height = 1;
    if descriptor.player.sheet == id {
        width = width.max(descriptor.player.frame_width);
        height = height.max(descriptor.player.frame_height);
    }
    for def in descriptor.entities.iter().filter(|def| def.sheet == id) {
        width = width.max(def.frame_count * def.frame_width);
        height = height.max(def.frame_height * 2);
    }
    (width, height)
}

fn opaque_placeholder(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_rgba(
        width,
        height,
        vec![255; width as usize * height as usize * 4],
    )
    .expect("placeholder buffer dimensions are self-consistent")
}

fn apply_gravity(simulation: &mut Simulation, tick: &TickReport) {
    if tick.grounded {
        return;
    }
    let floor_y =
        GRID_ROWS as i32 * TILE_SIZE_PX as i32 - simulation.player().frame_rect().height as i32;
    let position = simulation.player().position();
    let next_y = (position.y + FALL_SPEED_PX).min(floor_y);
    simulation
        .player_mut()
        .set_position(Point::new(position.x, next_y));
}

fn record_event(report: &mut RunReport, event: SimEvent) {
    match event {
        SimEvent::HazardExploded { row, col } => {
            report.hazards_exploded += 1;
            info!(row, col, "hazard_exploded");
        }
        SimEvent::CollapsibleDamaged { row, col, damage } => {
            report.collapsibles_damaged += 1;
            debug!(row, col, damage, "collapsible_damaged");
        }
        SimEvent::EntityCollision { entity, kind } => {
            report.entity_collisions += 1;
            info!(entity = entity.0, kind = ?kind, "entity_collision");
        }
        SimEvent::PlayerDamaged { amount, remaining } => {
            report.damage_taken += amount;
            debug!(amount, remaining, "player_damaged");
        }
        SimEvent::PlayerDied => {
            report.player_died = true;
            info!("player_died");
        }
        SimEvent::DoorReached { kind } => {
            report.door = Some(format!("{kind:?}"));
            info!(kind = ?kind, "door_reached");
        }
    }
}

fn write_report_if_requested(report: &RunReport) -> Result<(), RunnerError> {
    let Ok(raw_path) = env::var(REPORT_ENV_VAR) else {
        return Ok(());
    };
    let path = PathBuf::from(raw_path);
    let payload = serde_json::to_string_pretty(report)
        .expect("run report serialization has no fallible fields");
    fs::write(&path, payload).map_err(|source| RunnerError::WriteReport {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "report_written");
    Ok(())
}

/// Built-in level used when no descriptor path is configured: a floor, a
/// thru platform, a belt, a crumbling bridge, one mine and a patrolling
/// monster.
fn demo_level() -> LevelDescriptor {
    let mut tiles = vec![TILE_CODE_NONE; GRID_ROWS * GRID_COLS];
    let mut set = |row: usize, col: usize, code: u16| {
        tiles[row * GRID_COLS + col] = code;
    };

    for col in 0..GRID_COLS {
        set(19, col, TILE_CODE_SOLID);
    }
    for col in 4..12 {
        set(14, col, TILE_CODE_THRU);
    }
    for col in 14..18 {
        set(14, col, TILE_CODE_CONVEYOR_BASE);
    }
    for col in 20..24 {
        set(14, col, TILE_CODE_COLLAPSIBLE);
    }
    set(18, 10, TILE_CODE_HAZARD_BASE);

    LevelDescriptor {
        name: "demo.shaft".to_string(),
        palette: sim::TilePalette::default(),
        speed_multiplier: 1,
        hazards: vec![sim::HazardDef {
            def_name: "demo.mine".to_string(),
            sprite: 4,
            explodes: true,
            harmless: false,
        }],
        conveyors: vec![sim::ConveyorDef {
            def_name: "demo.belt".to_string(),
            sprite: 6,
            rotation: sim::BeltRotation::Clockwise,
        }],
        entities: vec![sim::EntityDef {
            def_name: "demo.walker".to_string(),
            kind: sim::EntityKind::Normal,
            sheet: 1,
            frame_count: 4,
            frame_width: 40,
            frame_height: 40,
            start: sim::PixelPoint { x: 200, y: 340 },
            bounds: sim::PixelRect {
                x: 120,
                y: 340,
                width: 320,
                height: 0,
            },
            velocity: sim::PixelPoint { x: 2, y: 0 },
            animation_style: sim::AnimationStyle::PingPong,
            animation_speed: 2,
            facing: sim::FacingMode::Horizontal,
            forced_facing: sim::ForcedFacing::None,
            visible: true,
        }],
        player: sim::PlayerDef {
            sheet: 0,
            frame_width: 40,
            frame_height: 40,
            start: sim::PixelPoint { x: 120, y: 100 },
            health: 100,
        },
        tiles,
    }
}
