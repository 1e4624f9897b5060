use std::collections::HashMap;

use super::defs::{ConveyorDef, HazardDef, LevelDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HazardDefId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConveyorDefId(pub u32);

/// Immutable descriptor tables for one loaded level. Built once before the
/// first tick; tiles hold ids into these tables rather than owning
/// descriptor data.
#[derive(Debug, Default, Clone)]
pub struct LevelDefs {
    hazards: Vec<HazardDef>,
    hazard_ids_by_name: HashMap<String, HazardDefId>,
    conveyors: Vec<ConveyorDef>,
    conveyor_ids_by_name: HashMap<String, ConveyorDefId>,
}

impl LevelDefs {
    pub fn from_descriptor(descriptor: &LevelDescriptor) -> Self {
        let hazards = descriptor.hazards.clone();
        let mut hazard_ids_by_name = HashMap::with_capacity(hazards.len());
        for (idx, def) in hazards.iter().enumerate() {
            hazard_ids_by_name.insert(def.def_name.clone(), HazardDefId(idx as u32));
        }

        let conveyors = descriptor.conveyors.clone();
        let mut conveyor_ids_by_name = HashMap::with_capacity(conveyors.len());
        for (idx, def) in conveyors.iter().enumerate() {
            conveyor_ids_by_name.insert(def.def_name.clone(), ConveyorDefId(idx as u32));
        }

        Self {
            hazards,
            hazard_ids_by_name,
            conveyors,
            conveyor_ids_by_name,
        }
    }

    pub fn hazard(&self, id: HazardDefId) -> Option<&HazardDef> {
        self.hazards.get(id.0 as usize)
    }

    pub fn hazard_id_by_name(&self, name: &str) -> Option<HazardDefId> {
        self.hazard_ids_by_name.get(name).copied()
    }

    pub fn hazards(&self) -> &[HazardDef] {
        &self.hazards
    }

    pub fn conveyor(&self, id: ConveyorDefId) -> Option<&ConveyorDef> {
        self.conveyors.get(id.0 as usize)
    }

    pub fn conveyor_id_by_name(&self, name: &str) -> Option<ConveyorDefId> {
        self.conveyor_ids_by_name.get(name).copied()
    }

    pub fn conveyors(&self) -> &[ConveyorDef] {
        &self.conveyors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::defs::{BeltRotation, PixelPoint, PlayerDef, TilePalette};

    fn descriptor_with_defs() -> LevelDescriptor {
        LevelDescriptor {
            name: "defs".to_string(),
            palette: TilePalette::default(),
            speed_multiplier: 1,
            hazards: vec![
                HazardDef {
                    def_name: "pit.mine".to_string(),
                    sprite: 4,
                    explodes: true,
                    harmless: false,
                },
                HazardDef {
                    def_name: "pit.spikes".to_string(),
                    sprite: 5,
                    explodes: false,
                    harmless: false,
                },
            ],
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
            tiles: vec![0; 640],
        }
    }

    #[test]
    fn ids_are_assigned_in_declaration_order() {
        let defs = LevelDefs::from_descriptor(&descriptor_with_defs());
        assert_eq!(defs.hazard_id_by_name("pit.mine"), Some(HazardDefId(0)));
        assert_eq!(defs.hazard_id_by_name("pit.spikes"), Some(HazardDefId(1)));
        assert_eq!(defs.conveyor_id_by_name("pit.belt"), Some(ConveyorDefId(0)));
    }

    #[test]
    fn lookup_by_id_returns_the_named_def() {
        let defs = LevelDefs::from_descriptor(&descriptor_with_defs());
        let id = defs.hazard_id_by_name("pit.spikes").expect("id");
        assert_eq!(defs.hazard(id).expect("def").def_name, "pit.spikes");
        assert!(!defs.hazard(id).expect("def").explodes);
    }

    #[test]
    fn unknown_names_and_ids_return_none() {
        let defs = LevelDefs::from_descriptor(&descriptor_with_defs());
        assert_eq!(defs.hazard_id_by_name("pit.unknown"), None);
        assert!(defs.hazard(HazardDefId(99)).is_none());
        assert!(defs.conveyor(ConveyorDefId(99)).is_none());
    }
}
