use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{
    DispatchPolicyKind, Fleet, GraphMap, NodeId, NodeKind, OrderConfig, Position, RoadType,
    TruckSpec,
};
use sim_dispatch::Dispatcher;
use sim_econ::OrderBook;

fn build_world(side: usize, n_trucks: usize) -> (GraphMap, Fleet) {
    let mut g = GraphMap::new();
    let name = |x: usize, y: usize| NodeId(format!("{x},{y}"));
    for y in 0..side {
        for x in 0..side {
            let kind = match (x + 3 * y) % 7 {
                0 => NodeKind::Farm,
                1 => NodeKind::Market,
                2 => NodeKind::Distribution,
                _ => NodeKind::Junction,
            };
            g.add_node(name(x, y), kind, Position::new(x as f64 * 20.0, y as f64 * 20.0))
                .unwrap();
        }
    }
    for y in 0..side {
        for x in 0..side {
            if x + 1 < side {
                g.add_edge(&name(x, y), &name(x + 1, y), 20.0, RoadType::Asphalt)
                    .unwrap();
            }
            if y + 1 < side {
                g.add_edge(&name(x, y), &name(x, y + 1), 25.0, RoadType::Dirt)
                    .unwrap();
            }
        }
    }
    let mut fleet = Fleet::new();
    for i in 0..n_trucks {
        let at = g.nodes()[(i * 13) % g.nodes().len()].clone();
        fleet
            .add(format!("Truck {}", i + 1), TruckSpec::new(100, 0.05), &at)
            .unwrap();
    }
    (g, fleet)
}

fn bench_auto_assign(c: &mut Criterion) {
    let (g, fleet0) = build_world(20, 25);
    let mut orders0 = OrderBook::new(OrderConfig::default()).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..25 {
        orders0.generate(&g, &mut rng).unwrap();
    }
    for (label, kind) in [
        ("auto_assign first_available 25x25", DispatchPolicyKind::FirstAvailable),
        ("auto_assign nearest_truck 25x25", DispatchPolicyKind::NearestTruck),
    ] {
        let d = Dispatcher::new(kind);
        c.bench_function(label, |b| {
            b.iter(|| {
                let mut fleet = fleet0.clone();
                let mut orders = orders0.clone();
                black_box(d.auto_assign(&g, &mut fleet, &mut orders))
            })
        });
    }
}

criterion_group!(benches, bench_auto_assign);
criterion_main!(benches);
