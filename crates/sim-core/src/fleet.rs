//! Truck physical state and per-tick movement.

use crate::graph::{GraphMap, Node};
use crate::{ConfigError, NodeId, OrderId, Position, RoadFactors, RoadPolicy, TruckId, TruckSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from fleet operations.
#[derive(Debug, Error, PartialEq)]
pub enum FleetError {
    #[error("unknown truck: {0}")]
    UnknownTruck(TruckId),
    /// Truck is carrying an order, driving, or stranded.
    #[error("{0} is not idle")]
    TruckBusy(TruckId),
    /// Path must start at the truck's node and follow existing edges.
    #[error("invalid path for {0}")]
    InvalidPath(TruckId),
    #[error("invalid truck spec: {0}")]
    InvalidSpec(#[from] ConfigError),
}

/// The order a truck is carrying, with what movement needs to detect delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub order: OrderId,
    pub destination: NodeId,
    pub quantity: u32,
}

/// Movement state derived from path, cursor and fuel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruckStatus {
    Idle,
    EnRoute,
    /// Ran dry between nodes; no further movement.
    Stranded,
}

/// Outcome of one truck's tick, reported only when something terminal happens.
#[derive(Clone, Debug, PartialEq)]
pub enum TruckEvent {
    /// Reached the end of its path at a node that is not its cargo's destination.
    Arrived { truck: TruckId, node: NodeId },
    /// Reached the cargo's destination; the cargo has been unloaded.
    Delivered {
        truck: TruckId,
        node: NodeId,
        cargo: Cargo,
    },
    /// Fuel ran out mid-leg.
    Stranded { truck: TruckId, position: Position },
}

#[derive(Clone, Debug, Serialize)]
pub struct Truck {
    id: TruckId,
    name: String,
    spec: TruckSpec,
    fuel: f64,
    current_node: NodeId,
    position: Position,
    path: Vec<NodeId>,
    cursor: usize,
    cargo: Option<Cargo>,
    stranded: bool,
    odometer: f64,
}

impl Truck {
    fn new(id: TruckId, name: String, spec: TruckSpec, at: &Node) -> Self {
        Self {
            id,
            name,
            fuel: spec.fuel_capacity,
            spec,
            current_node: at.id.clone(),
            position: at.position,
            path: Vec::new(),
            cursor: 0,
            cargo: None,
            stranded: false,
            odometer: 0.0,
        }
    }

    pub fn id(&self) -> TruckId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &TruckSpec {
        &self.spec
    }

    pub fn capacity(&self) -> u32 {
        self.spec.capacity
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn current_node(&self) -> &NodeId {
        &self.current_node
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cargo(&self) -> Option<&Cargo> {
        self.cargo.as_ref()
    }

    /// Total distance driven.
    pub fn odometer(&self) -> f64 {
        self.odometer
    }

    pub fn is_en_route(&self) -> bool {
        !self.path.is_empty() && self.cursor + 1 < self.path.len()
    }

    pub fn status(&self) -> TruckStatus {
        if self.stranded {
            TruckStatus::Stranded
        } else if self.is_en_route() {
            TruckStatus::EnRoute
        } else {
            TruckStatus::Idle
        }
    }

    /// Can accept a new order.
    pub fn is_available(&self) -> bool {
        self.cargo.is_none() && self.status() == TruckStatus::Idle
    }

    /// Drive along the path for `elapsed` time units.
    ///
    /// The distance budget is `speed * elapsed`, scaled per leg by the road
    /// speed factor. Leftover budget after reaching a node carries into the
    /// next leg. Fuel is charged for distance actually driven and never goes
    /// below zero; running dry before the next node strands the truck.
    pub fn advance(
        &mut self,
        graph: &GraphMap,
        policy: &RoadPolicy,
        elapsed: f64,
    ) -> Option<TruckEvent> {
        if self.stranded || !self.is_en_route() {
            return None;
        }
        let mut budget = self.spec.speed * elapsed.max(0.0);
        while self.is_en_route() && budget > 0.0 {
            let next_id = self.path[self.cursor + 1].clone();
            let Some(next) = graph.node(&next_id) else {
                warn!(truck = %self.id, node = %next_id, "path references missing node; dropping path");
                return Some(self.finish());
            };
            let factors = graph
                .edge(&self.current_node, &next_id)
                .map(|(_, road)| policy.factors(road))
                .unwrap_or_else(RoadFactors::default);
            let remaining = self.position.distance(&next.position);
            let reach = budget * factors.speed;
            let burn = self.spec.fuel_rate * factors.fuel;
            let fuel_reach = if burn > 0.0 {
                self.fuel / burn
            } else {
                f64::INFINITY
            };

            if remaining <= reach && remaining <= fuel_reach {
                self.position = next.position;
                self.odometer += remaining;
                self.burn(remaining, burn);
                self.current_node = next_id;
                self.cursor += 1;
                budget -= remaining / factors.speed;
                debug!(truck = %self.id, node = %self.current_node, "reached node");
                if !self.is_en_route() {
                    return Some(self.finish());
                }
            } else if fuel_reach < reach {
                self.drive_toward(next.position, remaining, fuel_reach);
                self.fuel = 0.0;
                self.stranded = true;
                warn!(truck = %self.id, x = self.position.x, y = self.position.y, "out of fuel");
                return Some(TruckEvent::Stranded {
                    truck: self.id,
                    position: self.position,
                });
            } else {
                self.drive_toward(next.position, remaining, reach);
                self.burn(reach, burn);
                return None;
            }
        }
        None
    }

    fn drive_toward(&mut self, target: Position, remaining: f64, step: f64) {
        if remaining <= 0.0 || step <= 0.0 {
            return;
        }
        let t = step / remaining;
        self.position.x += (target.x - self.position.x) * t;
        self.position.y += (target.y - self.position.y) * t;
        self.odometer += step;
    }

    fn burn(&mut self, distance: f64, per_unit: f64) {
        self.fuel = (self.fuel - distance * per_unit).clamp(0.0, self.spec.fuel_capacity);
    }

    fn finish(&mut self) -> TruckEvent {
        self.path.clear();
        self.cursor = 0;
        match self.cargo.take() {
            Some(cargo) if cargo.destination == self.current_node => TruckEvent::Delivered {
                truck: self.id,
                node: self.current_node.clone(),
                cargo,
            },
            other => {
                if let Some(c) = &other {
                    warn!(truck = %self.id, node = %self.current_node, order = %c.order, "stopped short of destination");
                }
                self.cargo = other;
                TruckEvent::Arrived {
                    truck: self.id,
                    node: self.current_node.clone(),
                }
            }
        }
    }
}

/// All trucks, in purchase order.
#[derive(Clone, Debug, Default)]
pub struct Fleet {
    trucks: Vec<Truck>,
    next_id: u32,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an idle, fully fuelled truck parked at `at`.
    pub fn add(&mut self, name: String, spec: TruckSpec, at: &Node) -> Result<TruckId, FleetError> {
        spec.validate()?;
        self.next_id += 1;
        let id = TruckId(self.next_id);
        self.trucks.push(Truck::new(id, name, spec, at));
        Ok(id)
    }

    pub fn get(&self, id: TruckId) -> Option<&Truck> {
        self.trucks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TruckId) -> Result<&mut Truck, FleetError> {
        self.trucks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(FleetError::UnknownTruck(id))
    }

    pub fn trucks(&self) -> &[Truck] {
        &self.trucks
    }

    pub fn len(&self) -> usize {
        self.trucks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trucks.is_empty()
    }

    /// Trucks able to take an order, in fleet order.
    pub fn available(&self) -> impl Iterator<Item = &Truck> {
        self.trucks.iter().filter(|t| t.is_available())
    }

    /// Bind cargo to an available truck and install its path with the cursor at 0.
    pub fn load(
        &mut self,
        graph: &GraphMap,
        id: TruckId,
        cargo: Cargo,
        path: Vec<NodeId>,
    ) -> Result<(), FleetError> {
        let truck = self.get_mut(id)?;
        if !truck.is_available() {
            return Err(FleetError::TruckBusy(id));
        }
        if path.len() < 2
            || path.first() != Some(&truck.current_node)
            || graph.path_cost(&path).is_none()
        {
            return Err(FleetError::InvalidPath(id));
        }
        truck.cargo = Some(cargo);
        truck.path = path;
        truck.cursor = 0;
        Ok(())
    }

    /// Undo a `load` that has not moved yet.
    pub fn unload(&mut self, id: TruckId) -> Option<Cargo> {
        let truck = self.get_mut(id).ok()?;
        if truck.cursor != 0 || truck.stranded {
            return None;
        }
        truck.path.clear();
        truck.cargo.take()
    }

    /// Advance every truck. Trucks do not interact, so order only affects event order.
    pub fn tick(&mut self, graph: &GraphMap, policy: &RoadPolicy, elapsed: f64) -> Vec<TruckEvent> {
        self.trucks
            .iter_mut()
            .filter_map(|t| t.advance(graph, policy, elapsed))
            .collect()
    }
}
