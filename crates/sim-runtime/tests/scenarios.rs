use rust_decimal::Decimal;
use sim_core::{
    Fleet, GraphMap, NodeId, NodeKind, OrderConfig, OrderId, RoadType, SimConfig, TruckId, TruckSpec,
    TruckStatus,
};
use sim_dispatch::{AssignmentPolicy, DispatchError, Dispatcher};
use sim_econ::{EconError, Order, OrderStatus};
use sim_runtime::{run_days_in_place, Engine, Scenario, SimError};
use std::collections::HashMap;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

/// Single farm and single market 50 units apart, nothing else.
fn lane(config: SimConfig) -> Engine {
    let mut engine = Engine::new(config).unwrap();
    engine.construct_node("A", NodeKind::Farm, 0.0, 0.0).unwrap();
    engine.construct_node("B", NodeKind::Market, 50.0, 0.0).unwrap();
    engine.construct_edge("A", "B", 50.0, RoadType::Asphalt).unwrap();
    engine
}

#[test]
fn shortest_route_through_junction() {
    let mut engine = Engine::new(SimConfig::default()).unwrap();
    engine.construct_node("FarmA", NodeKind::Farm, 100.0, 100.0).unwrap();
    engine.construct_node("Junction1", NodeKind::Junction, 400.0, 300.0).unwrap();
    engine.construct_node("Market", NodeKind::Market, 700.0, 600.0).unwrap();
    engine.construct_node("DistSouth", NodeKind::Distribution, 300.0, 500.0).unwrap();
    engine.construct_edge("FarmA", "Junction1", 150.0, RoadType::Asphalt).unwrap();
    engine.construct_edge("Junction1", "Market", 350.0, RoadType::Dirt).unwrap();
    engine.construct_edge("Junction1", "DistSouth", 250.0, RoadType::Asphalt).unwrap();
    engine.construct_edge("DistSouth", "Market", 200.0, RoadType::Dirt).unwrap();

    let graph = &engine.state().graph;
    let route = graph.shortest_path(&id("FarmA"), &id("Market")).unwrap();
    assert_eq!(route.nodes, vec![id("FarmA"), id("Junction1"), id("Market")]);
    assert_eq!(route.cost, 500.0);
    let back = graph.shortest_path(&id("Market"), &id("FarmA")).unwrap();
    assert_eq!(back.cost, route.cost);
}

#[test]
fn capacity_checked_on_assignment() {
    let mut cfg = SimConfig::default();
    cfg.order = OrderConfig {
        quantity_min: 30,
        quantity_max: 30,
        ..OrderConfig::default()
    };
    let mut engine = lane(cfg.clone());
    let truck = engine.add_truck("T", TruckSpec::new(100, 0.05), &id("A")).unwrap();
    let order = engine.generate_order().unwrap();
    assert!(engine.assign_order(truck, order).is_ok());

    cfg.order.quantity_min = 150;
    cfg.order.quantity_max = 150;
    let mut engine = lane(cfg);
    let truck = engine.add_truck("T", TruckSpec::new(100, 0.05), &id("A")).unwrap();
    let order = engine.generate_order().unwrap();
    let err = engine.assign_order(truck, order).unwrap_err();
    assert!(matches!(
        err,
        SimError::Dispatch(DispatchError::CapacityExceeded { quantity: 150, capacity: 100, .. })
    ));
    assert!(err.is_recoverable());
    assert_eq!(engine.list_trucks()[0].status(), TruckStatus::Idle);
    assert!(engine.list_trucks()[0].cargo().is_none());
    assert_eq!(engine.list_orders()[0].status, OrderStatus::Pending);
}

#[test]
fn truck_strands_when_tank_runs_dry() {
    let mut engine = lane(SimConfig::default());
    let spec = TruckSpec {
        capacity: 100,
        fuel_capacity: 10.0,
        fuel_rate: 1.0,
        speed: 2.0,
    };
    let truck = engine.add_truck("T", spec, &id("A")).unwrap();
    // Truck already sits at the origin, so the whole path is the 50-unit leg.
    let order = engine.generate_order().unwrap();
    engine.assign_order(truck, order).unwrap();

    let mut stranded = Vec::new();
    for _ in 0..60 {
        let report = engine.tick(1.0).unwrap();
        assert!(report.deliveries.is_empty());
        stranded.extend(report.stranded);
    }
    assert_eq!(stranded, vec![truck]);
    let t = &engine.list_trucks()[0];
    assert_eq!(t.status(), TruckStatus::Stranded);
    assert_eq!(t.fuel(), 0.0);
    assert!((t.position().x - 10.0).abs() < 1e-9);
    assert_eq!(engine.list_orders()[0].status, OrderStatus::Assigned);
}

#[test]
fn purchase_needs_funds_and_a_farm() {
    let mut cfg = SimConfig::default();
    cfg.starting_money = Decimal::new(1500, 0);
    let mut engine = Engine::from_scenario(&Scenario::demo(), cfg).unwrap();
    let err = engine.purchase_truck().unwrap_err();
    assert_eq!(
        err,
        SimError::Econ(EconError::InsufficientFunds {
            cost: Decimal::new(2000, 0),
            available: Decimal::new(1500, 0),
        })
    );
    assert_eq!(engine.economy_state().money, Decimal::new(1500, 0));
    assert_eq!(engine.list_trucks().len(), 2);

    let mut engine = Engine::new(SimConfig::default()).unwrap();
    engine.construct_node("M", NodeKind::Market, 0.0, 0.0).unwrap();
    assert_eq!(
        engine.purchase_truck(),
        Err(SimError::Econ(EconError::NoFarmAvailable))
    );
    assert_eq!(engine.economy_state().money, Decimal::new(5000, 0));

    let mut engine = Engine::from_scenario(&Scenario::demo(), SimConfig::default()).unwrap();
    let bought = engine.purchase_truck().unwrap();
    assert_eq!(bought, TruckId(3));
    assert_eq!(engine.economy_state().money, Decimal::new(3000, 0));
    let t = engine.list_trucks().last().unwrap();
    assert_eq!(t.name(), "Truck 3");
    assert_eq!(t.capacity(), 90);
    let farm = engine.state().graph.node(t.current_node()).unwrap();
    assert_eq!(farm.kind, NodeKind::Farm);
}

#[test]
fn commands_rejected_after_last_day() {
    let mut cfg = SimConfig::default();
    cfg.total_days = 3;
    let mut engine = Engine::from_scenario(&Scenario::demo(), cfg).unwrap();
    assert_eq!(engine.advance_day(), Ok(2));
    assert_eq!(engine.advance_day(), Ok(3));
    assert!(!engine.is_game_over());
    assert_eq!(engine.advance_day(), Ok(4));
    assert!(engine.is_game_over());

    let order = engine.list_orders()[0].id;
    let game_over = Err(SimError::Econ(EconError::GameOver));
    assert_eq!(engine.assign_order(TruckId(1), order).map(|_| ()), game_over);
    assert_eq!(engine.auto_assign().map(|_| ()), game_over);
    assert_eq!(engine.advance_day().map(|_| ()), game_over);
    assert_eq!(engine.purchase_truck().map(|_| ()), game_over);
    assert_eq!(engine.tick(1.0).map(|_| ()), game_over);
    assert_eq!(engine.economy_state().day, 4);
    assert!(engine.is_game_over());
}

/// Append each order's status to its history when it changed.
fn record(orders: &[Order], history: &mut HashMap<OrderId, Vec<OrderStatus>>) {
    for o in orders {
        let h = history.entry(o.id).or_default();
        if h.last() != Some(&o.status) {
            h.push(o.status);
        }
    }
}

#[test]
fn deliveries_pay_exactly_once() {
    let mut engine = Engine::from_scenario(&Scenario::demo(), SimConfig::default()).unwrap();
    let start = engine.economy_state().money;
    let mut paid = Decimal::ZERO;
    let mut seen = HashMap::new();
    let mut history = HashMap::new();
    record(engine.list_orders(), &mut history);

    for _ in 0..15 {
        engine.auto_assign().unwrap();
        record(engine.list_orders(), &mut history);
        for _ in 0..engine.config().ticks_per_day {
            let money_before = engine.economy_state().money;
            let report = engine.tick(1.0).unwrap();
            let tick_paid: Decimal = report.deliveries.iter().map(|d| d.payout).sum();
            assert_eq!(engine.economy_state().money - money_before, tick_paid);
            for d in &report.deliveries {
                assert!(seen.insert(d.order, d.payout).is_none(), "paid twice");
                history.entry(d.order).or_default().push(OrderStatus::Completed);
                paid += d.payout;
            }
            record(engine.list_orders(), &mut history);
        }
        engine.advance_day().unwrap();
        record(engine.list_orders(), &mut history);
    }

    assert!(!seen.is_empty());
    assert_eq!(engine.deliveries(), seen.len() as u64);
    assert_eq!(engine.economy_state().money - start, paid);
    let lifecycle = [OrderStatus::Pending, OrderStatus::Assigned, OrderStatus::Completed];
    for (order, statuses) in history {
        assert!(
            lifecycle.starts_with(&statuses),
            "{order} went through {statuses:?}"
        );
    }
}

#[test]
fn same_tick_deliveries_settle_in_fleet_order() {
    let mut engine = lane(SimConfig::default());
    let fast = TruckSpec {
        speed: 100.0,
        ..TruckSpec::new(100, 0.05)
    };
    let first = engine.add_truck("T1", fast.clone(), &id("A")).unwrap();
    let second = engine.add_truck("T2", fast, &id("A")).unwrap();
    let older = engine.generate_order().unwrap();
    let newer = engine.generate_order().unwrap();
    // Fleet order and order-id order disagree on purpose.
    engine.assign_order(first, newer).unwrap();
    engine.assign_order(second, older).unwrap();
    let payouts: Decimal = engine.list_orders().iter().map(|o| o.payout).sum();
    let money_before = engine.economy_state().money;

    let report = engine.tick(1.0).unwrap();

    let settled: Vec<_> = report.deliveries.iter().map(|d| (d.truck, d.order)).collect();
    assert_eq!(settled, vec![(first, newer), (second, older)]);
    assert!(report.deliveries.iter().all(|d| d.node == id("B")));
    assert_eq!(engine.economy_state().money - money_before, payouts);
    assert_eq!(report.new_orders, vec![OrderId(3), OrderId(4)]);
    assert_eq!(engine.deliveries(), 2);
    let open: Vec<_> = engine.list_orders().iter().map(|o| (o.id, o.status)).collect();
    assert_eq!(
        open,
        vec![(OrderId(3), OrderStatus::Pending), (OrderId(4), OrderStatus::Pending)]
    );
    assert!(engine.list_trucks().iter().all(|t| t.is_available()));
}

#[test]
fn fuel_stays_in_tank_over_long_run() {
    let mut engine = Engine::from_scenario(&Scenario::demo(), SimConfig::default()).unwrap();
    for _ in 0..20 {
        engine.auto_assign().unwrap();
        for _ in 0..50 {
            engine.tick(3.0).unwrap();
            for t in engine.list_trucks() {
                assert!(t.fuel() >= 0.0 && t.fuel() <= t.spec().fuel_capacity);
            }
        }
        engine.advance_day().unwrap();
    }
}

struct NeverDispatch;

impl AssignmentPolicy for NeverDispatch {
    fn name(&self) -> &'static str {
        "never"
    }

    fn rank(&self, _: &GraphMap, _: &Fleet, _: &Order) -> Vec<TruckId> {
        Vec::new()
    }
}

#[test]
fn custom_policy_plugs_into_engine() {
    let mut engine = Engine::from_scenario(&Scenario::demo(), SimConfig::default())
        .unwrap()
        .with_dispatcher(Dispatcher::with_policy(Box::new(NeverDispatch)));
    assert!(engine.auto_assign().unwrap().is_empty());
    let snap = run_days_in_place(&mut engine, 3).unwrap();
    assert_eq!(snap.deliveries, 0);
    assert_eq!(snap.day, 4);
    assert_eq!(snap.orders.len(), 4);
}

#[test]
fn snapshot_serializes() {
    let engine = Engine::from_scenario(&Scenario::demo(), SimConfig::default()).unwrap();
    let json = serde_json::to_value(engine.snapshot()).unwrap();
    assert_eq!(json["day"], 1);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(json["trucks"][0]["name"], "Truck 1");
    assert_eq!(json["trucks"][0]["status"], "Idle");
}
