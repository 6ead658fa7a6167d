#![deny(warnings)]

//! Simulation runtime: one [`Engine`] owning the whole freight economy.
//!
//! The engine holds a single [`SimulationState`] (road network, fleet, order
//! book, economy) plus the seeded RNG, and exposes the commands a front end
//! needs: world construction, movement ticks, dispatch, day advance and
//! truck purchase, together with read-only views for rendering.

mod command;
mod scenario;
mod snapshot;

pub use command::{Command, Outcome};
pub use scenario::{EdgeDef, NodeDef, Scenario, TruckDef};
pub use snapshot::{SimSnapshot, TruckView};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use sim_core::{
    ConfigError, Edge, Fleet, FleetError, GraphError, GraphMap, Node, NodeId, NodeKind, OrderId,
    Position, RoadType, SimConfig, Truck, TruckEvent, TruckId, TruckSpec,
};
use sim_dispatch::{Assignment, DispatchError, Dispatcher};
use sim_econ::{pick_farm, EconError, Economy, EconomyState, Order, OrderBook};
use thiserror::Error;
use tracing::{info, warn};

/// Any failure surfaced by an engine command.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Fleet(#[from] FleetError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("invalid scenario: {0}")]
    Scenario(String),
}

impl SimError {
    /// Construction and configuration errors abort world setup; everything
    /// else only fails the issuing command.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::Graph(GraphError::NoPathFound { .. }) => true,
            SimError::Graph(_) | SimError::InvalidConfig(_) | SimError::Scenario(_) => false,
            SimError::Fleet(FleetError::InvalidSpec(_)) => false,
            SimError::Fleet(_) | SimError::Econ(_) | SimError::Dispatch(_) => true,
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, SimError::Econ(EconError::GameOver))
    }
}

/// A completed delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub truck: TruckId,
    pub order: OrderId,
    pub node: NodeId,
    pub payout: Decimal,
}

/// Events produced by one movement tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub deliveries: Vec<Delivery>,
    /// Trucks that finished a path somewhere other than their cargo's destination.
    pub arrivals: Vec<(TruckId, NodeId)>,
    pub stranded: Vec<TruckId>,
    /// Orders generated in response to deliveries.
    pub new_orders: Vec<OrderId>,
}

/// All mutable simulation data. Each part is only changed through its own API.
#[derive(Clone, Debug)]
pub struct SimulationState {
    pub graph: GraphMap,
    pub fleet: Fleet,
    pub orders: OrderBook,
    pub economy: Economy,
}

pub struct Engine {
    state: SimulationState,
    config: SimConfig,
    dispatcher: Dispatcher,
    rng: ChaCha8Rng,
}

impl Engine {
    /// Empty world with the given configuration.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            state: SimulationState {
                graph: GraphMap::new(),
                fleet: Fleet::new(),
                orders: OrderBook::new(config.order.clone())?,
                economy: Economy::new(config.starting_money, config.total_days),
            },
            dispatcher: Dispatcher::new(config.dispatch),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        })
    }

    /// Build the scenario's world and fleet, then post the first order.
    pub fn from_scenario(scenario: &Scenario, config: SimConfig) -> Result<Self, SimError> {
        let mut engine = Self::new(config)?;
        for n in &scenario.nodes {
            engine.construct_node(&n.name, n.kind, n.x, n.y)?;
        }
        for e in &scenario.edges {
            engine.construct_edge(&e.a, &e.b, e.distance, e.road)?;
        }
        for t in &scenario.trucks {
            engine.add_truck(&t.name, t.spec.clone(), &NodeId::new(t.at.as_str()))?;
        }
        engine.generate_order();
        info!(
            nodes = engine.state.graph.nodes().len(),
            trucks = engine.state.fleet.len(),
            "world ready"
        );
        Ok(engine)
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn construct_node(&mut self, name: &str, kind: NodeKind, x: f64, y: f64) -> Result<(), SimError> {
        self.state
            .graph
            .add_node(NodeId::new(name), kind, Position::new(x, y))?;
        Ok(())
    }

    pub fn construct_edge(&mut self, a: &str, b: &str, distance: f64, road: RoadType) -> Result<(), SimError> {
        self.state
            .graph
            .add_edge(&NodeId::new(a), &NodeId::new(b), distance, road)?;
        Ok(())
    }

    /// Place a starting truck. Purchases go through [`Engine::purchase_truck`].
    pub fn add_truck(&mut self, name: &str, spec: TruckSpec, at: &NodeId) -> Result<TruckId, SimError> {
        let node = self
            .state
            .graph
            .node(at)
            .ok_or_else(|| GraphError::UnknownNode(at.clone()))?;
        Ok(self.state.fleet.add(name.to_string(), spec, node)?)
    }

    /// Post one new order; skipped with a warning when the map has no farm or no sink.
    pub fn generate_order(&mut self) -> Option<OrderId> {
        self.state
            .orders
            .try_generate(&self.state.graph, &mut self.rng)
    }

    /// Advance every truck by `elapsed` time units and settle deliveries.
    ///
    /// A delivery completes its order, credits the payout once and posts a
    /// replacement order. Deliveries settle in fleet order after all trucks
    /// have moved.
    pub fn tick(&mut self, elapsed: f64) -> Result<TickReport, SimError> {
        self.state.economy.ensure_running()?;
        let events = self
            .state
            .fleet
            .tick(&self.state.graph, &self.config.road_policy, elapsed);
        let mut report = TickReport::default();
        for event in events {
            match event {
                TruckEvent::Delivered { truck, node, cargo } => {
                    let order = match self.state.orders.complete(cargo.order) {
                        Ok(order) => order,
                        Err(e) => {
                            warn!(%truck, order = %cargo.order, error = %e, "delivery without open order");
                            continue;
                        }
                    };
                    self.state.economy.credit(order.payout);
                    info!(
                        %truck,
                        order = %order.id,
                        at = %node,
                        payout = %order.payout,
                        money = %self.state.economy.money(),
                        "order delivered"
                    );
                    report.deliveries.push(Delivery {
                        truck,
                        order: order.id,
                        node,
                        payout: order.payout,
                    });
                    if let Some(id) = self.generate_order() {
                        report.new_orders.push(id);
                    }
                }
                TruckEvent::Arrived { truck, node } => report.arrivals.push((truck, node)),
                TruckEvent::Stranded { truck, .. } => report.stranded.push(truck),
            }
        }
        Ok(report)
    }

    pub fn assign_order(&mut self, truck: TruckId, order: OrderId) -> Result<Assignment, SimError> {
        self.state.economy.ensure_running()?;
        let s = &mut self.state;
        Ok(self
            .dispatcher
            .assign(&s.graph, &mut s.fleet, &mut s.orders, truck, order)?)
    }

    pub fn auto_assign(&mut self) -> Result<Vec<Assignment>, SimError> {
        self.state.economy.ensure_running()?;
        let s = &mut self.state;
        Ok(self
            .dispatcher
            .auto_assign(&s.graph, &mut s.fleet, &mut s.orders))
    }

    /// Next day, then post one order. Returns the new day number.
    pub fn advance_day(&mut self) -> Result<u32, SimError> {
        let day = self.state.economy.advance_day()?;
        self.generate_order();
        Ok(day)
    }

    /// Buy a truck of the configured model and park it on a random farm.
    pub fn purchase_truck(&mut self) -> Result<TruckId, SimError> {
        let economy = &self.state.economy;
        economy.ensure_running()?;
        let cost = self.config.truck_cost;
        if economy.money() < cost {
            return Err(EconError::InsufficientFunds {
                cost,
                available: economy.money(),
            }
            .into());
        }
        let farm = pick_farm(&self.state.graph, &mut self.rng)?;
        let name = format!("Truck {}", self.state.fleet.len() + 1);
        let id = self
            .state
            .fleet
            .add(name, self.config.purchased_truck.clone(), farm)?;
        self.state.economy.debit(cost)?;
        info!(truck = %id, at = %farm.id, money = %self.state.economy.money(), "truck purchased");
        Ok(id)
    }

    pub fn is_game_over(&self) -> bool {
        self.state.economy.is_game_over()
    }

    pub fn list_nodes(&self) -> &[Node] {
        self.state.graph.nodes()
    }

    pub fn list_edges(&self) -> Vec<Edge> {
        self.state.graph.edges()
    }

    pub fn list_trucks(&self) -> &[Truck] {
        self.state.fleet.trucks()
    }

    pub fn list_orders(&self) -> &[Order] {
        self.state.orders.all()
    }

    pub fn economy_state(&self) -> EconomyState {
        self.state.economy.state()
    }

    pub fn deliveries(&self) -> u64 {
        self.state.orders.completed_count()
    }

    pub fn snapshot(&self) -> SimSnapshot {
        let eco = &self.state.economy;
        SimSnapshot {
            day: eco.day(),
            total_days: eco.total_days(),
            money: eco.money(),
            profit: eco.profit(),
            game_over: eco.is_game_over(),
            deliveries: self.deliveries(),
            nodes: self.list_nodes().to_vec(),
            edges: self.list_edges(),
            trucks: self.list_trucks().iter().map(TruckView::from).collect(),
            orders: self.list_orders().to_vec(),
        }
    }
}

/// Run up to `days` full days: auto-dispatch, `ticks_per_day` unit ticks, then
/// advance the day. Stops early once the game is over.
pub fn run_days_in_place(engine: &mut Engine, days: u32) -> Result<SimSnapshot, SimError> {
    let ticks = engine.config.ticks_per_day;
    for _ in 0..days {
        if engine.is_game_over() {
            break;
        }
        engine.auto_assign()?;
        for _ in 0..ticks {
            engine.tick(1.0)?;
        }
        engine.advance_day()?;
    }
    Ok(engine.snapshot())
}
