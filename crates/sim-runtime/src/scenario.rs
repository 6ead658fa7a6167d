//! World descriptions loaded at startup.

use crate::SimError;
use serde::{Deserialize, Serialize};
use sim_core::{NodeKind, RoadType, TruckSpec};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDef {
    pub a: String,
    pub b: String,
    pub distance: f64,
    pub road: RoadType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckDef {
    pub name: String,
    /// Starting node.
    pub at: String,
    #[serde(flatten)]
    pub spec: TruckSpec,
}

/// Map and starting fleet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    #[serde(default)]
    pub trucks: Vec<TruckDef>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self, SimError> {
        serde_yaml::from_str(text).map_err(|e| SimError::Scenario(e.to_string()))
    }

    /// Two farms feeding a market and a distribution center through one junction.
    pub fn demo() -> Self {
        let node = |name: &str, kind, x, y| NodeDef {
            name: name.to_string(),
            kind,
            x,
            y,
        };
        let edge = |a: &str, b: &str, distance, road| EdgeDef {
            a: a.to_string(),
            b: b.to_string(),
            distance,
            road,
        };
        let truck = |name: &str, at: &str, capacity, rate| TruckDef {
            name: name.to_string(),
            at: at.to_string(),
            spec: TruckSpec::new(capacity, rate),
        };
        Scenario {
            nodes: vec![
                node("Farm A", NodeKind::Farm, 100.0, 100.0),
                node("Main Market", NodeKind::Market, 700.0, 600.0),
                node("South Distribution Center", NodeKind::Distribution, 300.0, 500.0),
                node("Farm B", NodeKind::Farm, 650.0, 150.0),
                node("Junction 1", NodeKind::Junction, 400.0, 300.0),
            ],
            edges: vec![
                edge("Farm A", "Junction 1", 150.0, RoadType::Asphalt),
                edge("Junction 1", "Main Market", 350.0, RoadType::Dirt),
                edge("Junction 1", "South Distribution Center", 250.0, RoadType::Asphalt),
                edge("Farm B", "Junction 1", 200.0, RoadType::Asphalt),
                edge("South Distribution Center", "Main Market", 200.0, RoadType::Dirt),
            ],
            trucks: vec![
                truck("Truck 1", "Farm A", 100, 0.05),
                truck("Truck 2", "Farm B", 80, 0.04),
            ],
        }
    }
}
