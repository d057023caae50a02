use crate::db::fabric::{FabricDB, Location};
use crate::db::indices::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NetlistError {
    #[error("duplicate instance '{0}'")]
    DuplicateInstance(String),
    #[error("duplicate net '{0}'")]
    DuplicateNet(String),
    #[error("unknown instance '{0}'")]
    UnknownInstance(String),
    #[error("instance '{inst}' has no port '{port}' on its tile")]
    UnknownPort { inst: String, port: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinDirection {
    Source,
    Sink,
}

#[derive(Clone, Debug)]
pub struct InstanceData {
    pub name: String,
    pub tile: TileId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetPin {
    pub direction: PinDirection,
    pub instance: InstId,
    pub port: PortId,
}

/// A committed interconnect point: one wire of the net's routed tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pip {
    pub wire: WireId,
    pub from: Location,
    pub to: Location,
}

#[derive(Clone, Debug)]
pub struct NetData {
    pub name: String,
    pub pins: Vec<NetPin>,
    pub pips: Vec<Pip>,
}

impl NetData {
    pub fn sources(&self) -> impl Iterator<Item = &NetPin> {
        self.pins
            .iter()
            .filter(|p| p.direction == PinDirection::Source)
    }

    pub fn sinks(&self) -> impl Iterator<Item = &NetPin> {
        self.pins
            .iter()
            .filter(|p| p.direction == PinDirection::Sink)
    }

    pub fn is_routed(&self) -> bool {
        !self.pips.is_empty()
    }
}

pub struct Netlist {
    pub instances: Vec<InstanceData>,
    pub nets: Vec<NetData>,

    pub inst_name_map: HashMap<String, InstId>,
    pub net_name_map: HashMap<String, NetId>,
}

impl Netlist {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            nets: Vec::new(),
            inst_name_map: HashMap::new(),
            net_name_map: HashMap::new(),
        }
    }

    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn add_instance(&mut self, name: &str, tile: TileId) -> Result<InstId, NetlistError> {
        if self.inst_name_map.contains_key(name) {
            return Err(NetlistError::DuplicateInstance(name.to_string()));
        }
        let id = InstId::new(self.instances.len());
        self.instances.push(InstanceData {
            name: name.to_string(),
            tile,
        });
        self.inst_name_map.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_net(&mut self, name: &str) -> Result<NetId, NetlistError> {
        if self.net_name_map.contains_key(name) {
            return Err(NetlistError::DuplicateNet(name.to_string()));
        }
        let id = NetId::new(self.nets.len());
        self.nets.push(NetData {
            name: name.to_string(),
            pins: Vec::new(),
            pips: Vec::new(),
        });
        self.net_name_map.insert(name.to_string(), id);
        Ok(id)
    }

    /// Attaches a pin, resolving the port on the instance's tile once here
    /// so routing never has to look names up again.
    pub fn add_pin(
        &mut self,
        fabric: &FabricDB,
        net: NetId,
        direction: PinDirection,
        inst_name: &str,
        port_name: &str,
    ) -> Result<(), NetlistError> {
        let instance = self
            .inst_name_map
            .get(inst_name)
            .copied()
            .ok_or_else(|| NetlistError::UnknownInstance(inst_name.to_string()))?;
        let tile = self.instances[instance.index()].tile;
        let port = fabric
            .port_by_name(tile, port_name)
            .ok_or_else(|| NetlistError::UnknownPort {
                inst: inst_name.to_string(),
                port: port_name.to_string(),
            })?;
        self.nets[net.index()].pins.push(NetPin {
            direction,
            instance,
            port,
        });
        Ok(())
    }

    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_name_map.get(name).copied()
    }

    pub fn net(&self, id: NetId) -> &NetData {
        &self.nets[id.index()]
    }

    pub fn net_mut(&mut self, id: NetId) -> &mut NetData {
        &mut self.nets[id.index()]
    }

    pub fn instance(&self, id: InstId) -> &InstanceData {
        &self.instances[id.index()]
    }

    pub fn pin_location(&self, pin: &NetPin) -> Location {
        Location::new(self.instances[pin.instance.index()].tile, pin.port)
    }

    /// Wires already consumed by any net's routed tree.
    pub fn committed_wires(&self) -> Vec<WireId> {
        self.nets
            .iter()
            .flat_map(|n| n.pips.iter().map(|p| p.wire))
            .collect()
    }
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}
