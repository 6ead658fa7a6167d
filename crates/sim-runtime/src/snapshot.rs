//! Read-only views for display collaborators.

use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{Edge, Node, NodeId, OrderId, Position, Truck, TruckId, TruckStatus};
use sim_econ::Order;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TruckView {
    pub id: TruckId,
    pub name: String,
    pub node: NodeId,
    pub position: Position,
    pub status: TruckStatus,
    pub capacity: u32,
    pub fuel: f64,
    pub fuel_capacity: f64,
    pub carrying: Option<OrderId>,
    pub odometer: f64,
}

impl From<&Truck> for TruckView {
    fn from(t: &Truck) -> Self {
        Self {
            id: t.id(),
            name: t.name().to_string(),
            node: t.current_node().clone(),
            position: t.position(),
            status: t.status(),
            capacity: t.capacity(),
            fuel: t.fuel(),
            fuel_capacity: t.spec().fuel_capacity,
            carrying: t.cargo().map(|c| c.order),
            odometer: t.odometer(),
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, Serialize)]
pub struct SimSnapshot {
    pub day: u32,
    pub total_days: u32,
    pub money: Decimal,
    pub profit: Decimal,
    pub game_over: bool,
    pub deliveries: u64,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub trucks: Vec<TruckView>,
    pub orders: Vec<Order>,
}
