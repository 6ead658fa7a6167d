use crate::EconError;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{ConfigError, GraphMap, NodeId, NodeKind, OrderConfig, OrderId, TruckId};
use std::fmt;
use tracing::{info, warn};

/// Goods shipped from farms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    Soybean,
    Corn,
    Cotton,
    Cattle,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::Soybean,
        Product::Corn,
        Product::Cotton,
        Product::Cattle,
    ];
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Product::Soybean => "soybean",
            Product::Corn => "corn",
            Product::Cotton => "cotton",
            Product::Cattle => "cattle",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Assigned,
    Completed,
}

/// A transport request from a farm to a market or distribution center.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product: Product,
    /// Tonnes, > 0.
    pub quantity: u32,
    pub origin: NodeId,
    pub destination: NodeId,
    pub payout: Decimal,
    pub status: OrderStatus,
    /// Carrier once assigned.
    pub truck: Option<TruckId>,
}

/// Active orders in creation order. Completed orders leave the book.
#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    config: OrderConfig,
    orders: Vec<Order>,
    next_id: u64,
    completed: u64,
}

impl OrderBook {
    /// Rejects empty quantity or rate ranges.
    pub fn new(config: OrderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Draw a new pending order: uniform farm origin, uniform market or
    /// distribution destination, uniform product, quantity and per-tonne rate
    /// from the configured inclusive ranges; payout = quantity * rate.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        graph: &GraphMap,
        rng: &mut R,
    ) -> Result<&Order, EconError> {
        let farms = graph.nodes_of_kind(NodeKind::is_supply);
        let sinks = graph.nodes_of_kind(NodeKind::is_demand);
        let (Some(origin), Some(destination)) = (farms.choose(rng), sinks.choose(rng)) else {
            return Err(EconError::InsufficientNodes);
        };
        let product = *Product::ALL.choose(rng).unwrap_or(&Product::Soybean);
        let quantity = rng.gen_range(self.config.quantity_min..=self.config.quantity_max);
        let rate = rng.gen_range(self.config.unit_rate_min..=self.config.unit_rate_max);

        self.next_id += 1;
        let order = Order {
            id: OrderId(self.next_id),
            product,
            quantity,
            origin: origin.id.clone(),
            destination: destination.id.clone(),
            payout: Decimal::from(quantity) * Decimal::from(rate),
            status: OrderStatus::Pending,
            truck: None,
        };
        info!(
            order = %order.id,
            %product,
            quantity,
            from = %order.origin,
            to = %order.destination,
            payout = %order.payout,
            "new order"
        );
        self.orders.push(order);
        Ok(&self.orders[self.orders.len() - 1])
    }

    /// Generate unless the map cannot support orders; that case is only logged.
    pub fn try_generate<R: Rng + ?Sized>(&mut self, graph: &GraphMap, rng: &mut R) -> Option<OrderId> {
        match self.generate(graph, rng) {
            Ok(order) => Some(order.id),
            Err(e) => {
                warn!(error = %e, "skipping order generation");
                None
            }
        }
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Pending -> Assigned.
    pub fn mark_assigned(&mut self, id: OrderId, truck: TruckId) -> Result<(), EconError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(EconError::OrderNotFound(id))?;
        if order.status != OrderStatus::Pending {
            return Err(EconError::OrderAlreadyAssigned(id));
        }
        order.status = OrderStatus::Assigned;
        order.truck = Some(truck);
        Ok(())
    }

    /// Assigned -> Completed. The order is removed from the book and returned.
    pub fn complete(&mut self, id: OrderId) -> Result<Order, EconError> {
        let pos = self
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(EconError::OrderNotFound(id))?;
        if self.orders[pos].status != OrderStatus::Assigned {
            return Err(EconError::OrderNotAssigned(id));
        }
        let mut order = self.orders.remove(pos);
        order.status = OrderStatus::Completed;
        self.completed += 1;
        Ok(order)
    }

    /// Pending orders, earliest first.
    pub fn pending(&self) -> impl Iterator<Item = &Order> {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
    }

    /// Every active (pending or assigned) order, earliest first.
    pub fn all(&self) -> &[Order] {
        &self.orders
    }

    /// Number of orders completed so far.
    pub fn completed_count(&self) -> u64 {
        self.completed
    }
}
