#![deny(warnings)]

//! Dispatch: binding idle trucks to pending orders.
//!
//! A truck's route is planned as two shortest-path legs, truck -> origin and
//! origin -> destination, joined at the origin. Automatic dispatch walks
//! pending orders earliest first and asks an [`AssignmentPolicy`] which idle
//! trucks to try.

use sim_core::{
    Cargo, DispatchPolicyKind, Fleet, FleetError, GraphError, GraphMap, NodeId, OrderId, Route,
    TruckId,
};
use sim_econ::{EconError, Order, OrderBook, OrderStatus};
use thiserror::Error;
use tracing::{debug, info};

/// Errors produced by dispatch commands. A failed command leaves trucks and
/// orders untouched.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("unknown truck: {0}")]
    UnknownTruck(TruckId),
    /// Truck already carries an order, is driving, or is stranded.
    #[error("{0} is not available")]
    TruckUnavailable(TruckId),
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("{0} is already assigned")]
    OrderAlreadyAssigned(OrderId),
    #[error("order of {quantity}t exceeds {truck} capacity of {capacity}t")]
    CapacityExceeded {
        truck: TruckId,
        quantity: u32,
        capacity: u32,
    },
    #[error("no path from {from} to {to}")]
    NoPathFound { from: NodeId, to: NodeId },
    #[error(transparent)]
    Graph(GraphError),
    #[error(transparent)]
    Econ(EconError),
    #[error(transparent)]
    Fleet(#[from] FleetError),
}

impl From<GraphError> for DispatchError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::NoPathFound { from, to } => DispatchError::NoPathFound { from, to },
            other => DispatchError::Graph(other),
        }
    }
}

impl From<EconError> for DispatchError {
    fn from(e: EconError) -> Self {
        match e {
            EconError::OrderNotFound(id) => DispatchError::OrderNotFound(id),
            EconError::OrderAlreadyAssigned(id) => DispatchError::OrderAlreadyAssigned(id),
            other => DispatchError::Econ(other),
        }
    }
}

/// A successful binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub truck: TruckId,
    pub order: OrderId,
    /// Full path from the truck's node through the origin to the destination.
    pub path: Vec<NodeId>,
    /// Total edge distance of `path`.
    pub distance: f64,
}

/// Chooses which idle trucks to try for an order, best first.
pub trait AssignmentPolicy {
    fn name(&self) -> &'static str;
    fn rank(&self, graph: &GraphMap, fleet: &Fleet, order: &Order) -> Vec<TruckId>;
}

/// Fleet order: the first idle truck with enough capacity wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstAvailable;

impl AssignmentPolicy for FirstAvailable {
    fn name(&self) -> &'static str {
        "first_available"
    }

    fn rank(&self, _graph: &GraphMap, fleet: &Fleet, order: &Order) -> Vec<TruckId> {
        fleet
            .available()
            .filter(|t| t.capacity() >= order.quantity)
            .map(|t| t.id())
            .collect()
    }
}

/// Shortest road distance to the order's origin wins; ties keep fleet order.
/// Trucks that cannot reach the origin are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestTruck;

impl AssignmentPolicy for NearestTruck {
    fn name(&self) -> &'static str {
        "nearest_truck"
    }

    fn rank(&self, graph: &GraphMap, fleet: &Fleet, order: &Order) -> Vec<TruckId> {
        let mut scored: Vec<(f64, TruckId)> = fleet
            .available()
            .filter(|t| t.capacity() >= order.quantity)
            .filter_map(|t| {
                graph
                    .shortest_path(t.current_node(), &order.origin)
                    .ok()
                    .map(|r| (r.cost, t.id()))
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().map(|(_, id)| id).collect()
    }
}

/// Truck -> origin -> destination, with the origin appearing once.
pub fn plan_route(graph: &GraphMap, from: &NodeId, order: &Order) -> Result<Route, DispatchError> {
    let to_origin = graph.shortest_path(from, &order.origin)?;
    let to_destination = graph.shortest_path(&order.origin, &order.destination)?;
    let mut nodes = to_origin.nodes;
    nodes.extend(to_destination.nodes.into_iter().skip(1));
    Ok(Route {
        nodes,
        cost: to_origin.cost + to_destination.cost,
    })
}

/// Matches trucks to orders using a configurable policy.
pub struct Dispatcher {
    policy: Box<dyn AssignmentPolicy>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchPolicyKind::default())
    }
}

impl Dispatcher {
    pub fn new(kind: DispatchPolicyKind) -> Self {
        let policy: Box<dyn AssignmentPolicy> = match kind {
            DispatchPolicyKind::FirstAvailable => Box::new(FirstAvailable),
            DispatchPolicyKind::NearestTruck => Box::new(NearestTruck),
        };
        Self { policy }
    }

    pub fn with_policy(policy: Box<dyn AssignmentPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Bind `order_id` to `truck_id` and install the planned path.
    ///
    /// Checks, in order: truck exists and is idle, order exists and is
    /// pending, quantity fits, both legs are reachable. Nothing is mutated
    /// unless every check passes.
    pub fn assign(
        &self,
        graph: &GraphMap,
        fleet: &mut Fleet,
        orders: &mut OrderBook,
        truck_id: TruckId,
        order_id: OrderId,
    ) -> Result<Assignment, DispatchError> {
        let truck = fleet
            .get(truck_id)
            .ok_or(DispatchError::UnknownTruck(truck_id))?;
        if !truck.is_available() {
            return Err(DispatchError::TruckUnavailable(truck_id));
        }
        let order = orders
            .get(order_id)
            .ok_or(DispatchError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(DispatchError::OrderAlreadyAssigned(order_id));
        }
        if order.quantity > truck.capacity() {
            return Err(DispatchError::CapacityExceeded {
                truck: truck_id,
                quantity: order.quantity,
                capacity: truck.capacity(),
            });
        }
        let route = plan_route(graph, truck.current_node(), order)?;
        let cargo = Cargo {
            order: order_id,
            destination: order.destination.clone(),
            quantity: order.quantity,
        };

        fleet.load(graph, truck_id, cargo, route.nodes.clone())?;
        if let Err(e) = orders.mark_assigned(order_id, truck_id) {
            fleet.unload(truck_id);
            return Err(e.into());
        }
        debug!(truck = %truck_id, order = %order_id, path = ?route.nodes, distance = route.cost, "assigned");
        Ok(Assignment {
            truck: truck_id,
            order: order_id,
            path: route.nodes,
            distance: route.cost,
        })
    }

    /// Pair pending orders (earliest first) with idle trucks until no pair is possible.
    ///
    /// An order no idle truck can serve is skipped and stays pending. Since
    /// the idle set only shrinks, one pass over the pending orders suffices.
    pub fn auto_assign(
        &self,
        graph: &GraphMap,
        fleet: &mut Fleet,
        orders: &mut OrderBook,
    ) -> Vec<Assignment> {
        let pending: Vec<OrderId> = orders.pending().map(|o| o.id).collect();
        let mut made = Vec::new();
        for order_id in pending {
            if fleet.available().next().is_none() {
                break;
            }
            let candidates = match orders.get(order_id) {
                Some(order) => self.policy.rank(graph, fleet, order),
                None => continue,
            };
            for truck_id in candidates {
                match self.assign(graph, fleet, orders, truck_id, order_id) {
                    Ok(a) => {
                        made.push(a);
                        break;
                    }
                    Err(e) => debug!(truck = %truck_id, order = %order_id, error = %e, "candidate rejected"),
                }
            }
        }
        if !made.is_empty() {
            info!(policy = self.policy.name(), count = made.len(), "auto-assigned orders");
        }
        made
    }
}
