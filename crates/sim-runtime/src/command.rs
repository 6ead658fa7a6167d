//! Request/response interface for front ends.

use crate::{Engine, SimError, TickReport};
use serde::{Deserialize, Serialize};
use sim_core::{NodeKind, OrderId, RoadType, TruckId};
use sim_dispatch::Assignment;

/// A discrete request into the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    ConstructNode {
        name: String,
        kind: NodeKind,
        x: f64,
        y: f64,
    },
    ConstructEdge {
        a: String,
        b: String,
        distance: f64,
        road: RoadType,
    },
    Tick {
        elapsed: f64,
    },
    AssignOrder {
        truck: TruckId,
        order: OrderId,
    },
    AutoAssign,
    AdvanceDay,
    PurchaseTruck,
}

/// Result of a successful command.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Built,
    Ticked(TickReport),
    Assigned(Vec<Assignment>),
    Day(u32),
    Purchased(TruckId),
}

impl Engine {
    /// Execute one command. On error the simulation state is unchanged.
    pub fn apply(&mut self, cmd: Command) -> Result<Outcome, SimError> {
        match cmd {
            Command::ConstructNode { name, kind, x, y } => {
                self.construct_node(&name, kind, x, y)?;
                Ok(Outcome::Built)
            }
            Command::ConstructEdge { a, b, distance, road } => {
                self.construct_edge(&a, &b, distance, road)?;
                Ok(Outcome::Built)
            }
            Command::Tick { elapsed } => self.tick(elapsed).map(Outcome::Ticked),
            Command::AssignOrder { truck, order } => self
                .assign_order(truck, order)
                .map(|a| Outcome::Assigned(vec![a])),
            Command::AutoAssign => self.auto_assign().map(Outcome::Assigned),
            Command::AdvanceDay => self.advance_day().map(Outcome::Day),
            Command::PurchaseTruck => self.purchase_truck().map(Outcome::Purchased),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scenario;
    use sim_core::SimConfig;

    #[test]
    fn commands_parse_from_yaml() {
        let yaml = r#"
- { cmd: construct_node, name: Depot, kind: junction, x: 1.0, y: 2.0 }
- { cmd: construct_edge, a: Depot, b: Farm A, distance: 10.0, road: asphalt }
- { cmd: assign_order, truck: 1, order: 1 }
- { cmd: tick, elapsed: 1.5 }
- { cmd: auto_assign }
- { cmd: advance_day }
- { cmd: purchase_truck }
"#;
        let cmds: Vec<Command> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cmds.len(), 7);
        assert_eq!(
            cmds[2],
            Command::AssignOrder {
                truck: TruckId(1),
                order: OrderId(1)
            }
        );
        assert_eq!(cmds[5], Command::AdvanceDay);
    }

    #[test]
    fn apply_routes_to_engine() {
        let mut engine = Engine::from_scenario(&Scenario::demo(), SimConfig::default()).unwrap();
        assert_eq!(
            engine.apply(Command::ConstructNode {
                name: "Depot".into(),
                kind: NodeKind::Junction,
                x: 0.0,
                y: 0.0
            }),
            Ok(Outcome::Built)
        );
        assert!(engine
            .apply(Command::ConstructNode {
                name: "Depot".into(),
                kind: NodeKind::Junction,
                x: 0.0,
                y: 0.0
            })
            .is_err());
        assert_eq!(engine.apply(Command::AdvanceDay), Ok(Outcome::Day(2)));
        match engine.apply(Command::AutoAssign) {
            Ok(Outcome::Assigned(made)) => assert!(!made.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(
            engine.apply(Command::Tick { elapsed: 1.0 }),
            Ok(Outcome::Ticked(_))
        ));
        assert!(matches!(
            engine.apply(Command::PurchaseTruck),
            Ok(Outcome::Purchased(TruckId(3)))
        ));
    }
}
