#![deny(warnings)]

//! Core domain models and invariants for Freight Tycoon.
//!
//! This crate owns the road network ([`GraphMap`]) and the physical state of
//! the truck fleet ([`Fleet`]), plus the serializable configuration shared by
//! every other simulation crate.

mod fleet;
mod graph;

pub use fleet::{Cargo, Fleet, FleetError, Truck, TruckEvent, TruckStatus};
pub use graph::{Edge, GraphError, GraphMap, Node, Route};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a map node, e.g. "Farm A" or "Junction 1".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(name: impl Into<String>) -> Self {
        NodeId(name.into())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

/// Fleet-unique truck identifier, assigned in purchase order starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TruckId(pub u32);

impl fmt::Display for TruckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truck#{}", self.0)
    }
}

/// Order identifier. Orders live in `sim-econ`, trucks only carry the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

/// Role of a node in the freight economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Supply point; every order starts at a farm.
    Farm,
    /// Distribution center; valid order destination.
    Distribution,
    /// Market; valid order destination.
    Market,
    /// Pass-through road junction.
    Junction,
}

impl NodeKind {
    /// Whether orders may originate here.
    pub fn is_supply(self) -> bool {
        matches!(self, NodeKind::Farm)
    }

    /// Whether orders may be delivered here.
    pub fn is_demand(self) -> bool {
        match self {
            NodeKind::Distribution | NodeKind::Market => true,
            NodeKind::Farm | NodeKind::Junction => false,
        }
    }
}

/// Road surface of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Asphalt,
    Dirt,
}

/// Point on the map plane. Used for movement geometry only, never for routing cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Speed and fuel multipliers applied while driving on one road type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadFactors {
    /// Multiplier on distance covered per tick (> 0).
    pub speed: f64,
    /// Multiplier on fuel burned per unit of distance (> 0).
    pub fuel: f64,
}

impl Default for RoadFactors {
    fn default() -> Self {
        Self {
            speed: 1.0,
            fuel: 1.0,
        }
    }
}

/// Per-surface driving policy. Neutral by default so both surfaces behave alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadPolicy {
    pub asphalt: RoadFactors,
    pub dirt: RoadFactors,
}

impl RoadPolicy {
    pub fn factors(&self, road: RoadType) -> RoadFactors {
        match road {
            RoadType::Asphalt => self.asphalt,
            RoadType::Dirt => self.dirt,
        }
    }
}

/// Physical characteristics of a truck model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckSpec {
    /// Cargo capacity in tonnes (> 0).
    pub capacity: u32,
    /// Tank size (> 0). Trucks start full.
    pub fuel_capacity: f64,
    /// Fuel burned per unit of distance driven (>= 0).
    pub fuel_rate: f64,
    /// Distance covered per elapsed time unit (> 0).
    pub speed: f64,
}

impl TruckSpec {
    pub fn new(capacity: u32, fuel_rate: f64) -> Self {
        Self {
            capacity,
            fuel_capacity: 100.0,
            fuel_rate,
            speed: 2.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::NonPositive("truck capacity"));
        }
        if !(self.fuel_capacity.is_finite() && self.fuel_capacity > 0.0) {
            return Err(ConfigError::NonPositive("truck fuel capacity"));
        }
        if !(self.fuel_rate.is_finite() && self.fuel_rate >= 0.0) {
            return Err(ConfigError::NonPositive("truck fuel rate"));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::NonPositive("truck speed"));
        }
        Ok(())
    }
}

/// Ranges used when generating transport orders. Bounds are inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Minimum cargo quantity in tonnes.
    pub quantity_min: u32,
    /// Maximum cargo quantity in tonnes.
    pub quantity_max: u32,
    /// Minimum payout per tonne.
    pub unit_rate_min: u32,
    /// Maximum payout per tonne.
    pub unit_rate_max: u32,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            quantity_min: 10,
            quantity_max: 49,
            unit_rate_min: 50,
            unit_rate_max: 99,
        }
    }
}

impl OrderConfig {
    /// Both ranges must be non-empty and start above zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantity_min == 0 || self.quantity_min > self.quantity_max {
            return Err(ConfigError::InvalidRange("order quantity"));
        }
        if self.unit_rate_min == 0 || self.unit_rate_min > self.unit_rate_max {
            return Err(ConfigError::InvalidRange("order unit rate"));
        }
        Ok(())
    }
}

/// Strategy used by automatic dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicyKind {
    /// Earliest pending order goes to the first idle truck that can take it.
    #[default]
    FirstAvailable,
    /// Earliest pending order goes to the idle truck closest to its origin.
    NearestTruck,
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for deterministic RNG.
    pub rng_seed: u64,
    /// Cash at day 1.
    pub starting_money: Decimal,
    /// Game horizon; the game ends once the day counter passes it.
    pub total_days: u32,
    /// Price of one additional truck.
    pub truck_cost: Decimal,
    /// Movement ticks run per simulated day by the batch driver.
    pub ticks_per_day: u32,
    /// Order generation ranges.
    pub order: OrderConfig,
    /// Model bought through `purchase_truck`.
    pub purchased_truck: TruckSpec,
    /// Road surface effects on movement.
    pub road_policy: RoadPolicy,
    /// Automatic dispatch strategy.
    pub dispatch: DispatchPolicyKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            starting_money: Decimal::new(5000, 0),
            total_days: 60,
            truck_cost: Decimal::new(2000, 0),
            ticks_per_day: 120,
            order: OrderConfig::default(),
            purchased_truck: TruckSpec::new(90, 0.045),
            road_policy: RoadPolicy::default(),
            dispatch: DispatchPolicyKind::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A numeric parameter that must be strictly positive was not.
    #[error("{0} must be > 0")]
    NonPositive(&'static str),
    /// A min/max pair is inverted or starts at zero.
    #[error("invalid range for {0}")]
    InvalidRange(&'static str),
    /// Money amounts cannot be negative.
    #[error("{0} must not be negative")]
    NegativeMoney(&'static str),
}

impl SimConfig {
    /// Validate every parameter before a simulation is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_days == 0 {
            return Err(ConfigError::NonPositive("total days"));
        }
        if self.ticks_per_day == 0 {
            return Err(ConfigError::NonPositive("ticks per day"));
        }
        if self.starting_money < Decimal::ZERO {
            return Err(ConfigError::NegativeMoney("starting money"));
        }
        if self.truck_cost < Decimal::ZERO {
            return Err(ConfigError::NegativeMoney("truck cost"));
        }
        self.order.validate()?;
        self.purchased_truck.validate()?;
        for f in [self.road_policy.asphalt, self.road_policy.dirt] {
            if !(f.speed.is_finite() && f.speed > 0.0) {
                return Err(ConfigError::NonPositive("road speed factor"));
            }
            if !(f.fuel.is_finite() && f.fuel > 0.0) {
                return Err(ConfigError::NonPositive("road fuel factor"));
            }
        }
        Ok(())
    }
}
