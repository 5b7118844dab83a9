//! Strategy graph model edited in the drag-and-drop builder.
//!
//! Nodes are assets, conditions and actions; a directed edge means "output of
//! source feeds input of target". The graph may be incomplete or malformed at any
//! time while the user is editing it, so nothing here validates topology.

use crate::domain::strategy::{ActionSpec, ConditionSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Code of the network's native currency.
pub const NATIVE_CODE: &str = "XLM";
/// Code of the well-known stablecoin.
pub const USDC_CODE: &str = "USDC";
/// Issuer account of the well-known stablecoin.
pub const USDC_ISSUER: &str = "GBBD47IF6LWK7P7MDEVSCWR7DPUWV3NY3DTQEVFL4NAT4AQH3ZLLFLA5";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Asset,
    Condition,
    Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "assetType")]
pub enum AssetType {
    #[serde(rename = "XLM")]
    Native,
    #[serde(rename = "USDC")]
    Stablecoin,
    #[serde(rename = "CUSTOM", rename_all = "camelCase")]
    Custom {
        asset_code: String,
        #[serde(default)]
        asset_issuer: String,
    },
}

impl AssetType {
    /// Classify a code/issuer pair. Only an exact match on the well-known
    /// code (and issuer, for the stablecoin) yields a built-in type.
    pub fn from_code_and_issuer(code: &str, issuer: Option<&str>) -> Self {
        match (code, issuer) {
            (NATIVE_CODE, None) => AssetType::Native,
            (USDC_CODE, Some(USDC_ISSUER)) => AssetType::Stablecoin,
            _ => AssetType::Custom {
                asset_code: code.to_string(),
                asset_issuer: issuer.unwrap_or_default().to_string(),
            },
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AssetType::Native => NATIVE_CODE,
            AssetType::Stablecoin => USDC_CODE,
            AssetType::Custom { asset_code, .. } => asset_code,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            AssetType::Native => None,
            AssetType::Stablecoin => Some(USDC_ISSUER),
            AssetType::Custom { asset_issuer, .. } if asset_issuer.is_empty() => None,
            AssetType::Custom { asset_issuer, .. } => Some(asset_issuer),
        }
    }

    /// Identifier used to match rule parameters against asset nodes.
    pub fn identifier(&self) -> &str {
        self.code()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNodeData {
    #[serde(flatten)]
    pub asset: AssetType,
    pub allocation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionNodeData {
    #[serde(flatten)]
    pub condition: ConditionSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNodeData {
    #[serde(flatten)]
    pub action: ActionSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Asset(AssetNodeData),
    Condition(ConditionNodeData),
    Action(ActionNodeData),
    /// A node the user has not finished configuring. The raw payload is kept
    /// so the graph survives re-export unchanged; it never joins a chain.
    Incomplete {
        kind: NodeKind,
        data: serde_json::Value,
    },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Asset(_) => NodeKind::Asset,
            NodeData::Condition(_) => NodeKind::Condition,
            NodeData::Action(_) => NodeKind::Action,
            NodeData::Incomplete { kind, .. } => *kind,
        }
    }
}

/// Wire shape of a node: `{"id", "type", "position", "data"}`.
#[derive(Serialize, Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct GraphNode {
    pub id: String,
    pub position: Position,
    pub data: NodeData,
}

impl From<RawNode> for GraphNode {
    fn from(raw: RawNode) -> Self {
        let decoded = match raw.kind {
            NodeKind::Asset => serde_json::from_value(raw.data.clone()).map(NodeData::Asset),
            NodeKind::Condition => {
                serde_json::from_value(raw.data.clone()).map(NodeData::Condition)
            }
            NodeKind::Action => serde_json::from_value(raw.data.clone()).map(NodeData::Action),
        };
        let data = decoded.unwrap_or_else(|e| {
            log::debug!("node {} is incomplete: {}", raw.id, e);
            NodeData::Incomplete {
                kind: raw.kind,
                data: raw.data,
            }
        });
        GraphNode {
            id: raw.id,
            position: raw.position,
            data,
        }
    }
}

impl From<GraphNode> for RawNode {
    fn from(node: GraphNode) -> Self {
        let kind = node.kind();
        let data = match &node.data {
            NodeData::Asset(d) => serde_json::to_value(d),
            NodeData::Condition(d) => serde_json::to_value(d),
            NodeData::Action(d) => serde_json::to_value(d),
            NodeData::Incomplete { data, .. } => Ok(data.clone()),
        }
        .unwrap_or(serde_json::Value::Null);
        RawNode {
            id: node.id,
            kind,
            position: node.position,
            data,
        }
    }
}

impl GraphNode {
    pub fn asset(id: impl Into<String>, asset: AssetType, allocation: f64) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            data: NodeData::Asset(AssetNodeData {
                asset,
                allocation,
                label: None,
            }),
        }
    }

    pub fn condition(id: impl Into<String>, condition: ConditionSpec) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            data: NodeData::Condition(ConditionNodeData {
                condition,
                label: None,
            }),
        }
    }

    pub fn action(id: impl Into<String>, action: ActionSpec) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            data: NodeData::Action(ActionNodeData {
                action,
                label: None,
            }),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self.data, NodeData::Incomplete { .. })
    }

    pub fn as_asset(&self) -> Option<&AssetNodeData> {
        match &self.data {
            NodeData::Asset(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_condition(&self) -> Option<&ConditionNodeData> {
        match &self.data {
            NodeData::Condition(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionNodeData> {
        match &self.data {
            NodeData::Action(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    #[serde(rename = "source", alias = "sourceNodeId")]
    pub source_node_id: String,
    #[serde(rename = "target", alias = "targetNodeId")]
    pub target_node_id: String,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyGraph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl StrategyGraph {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }
}

/// Adjacency index over a node/edge collection, built once per compile.
///
/// Edge lists keep edge-collection order, so "first outgoing edge" is well
/// defined. When two nodes share an id the first one wins.
pub struct GraphIndex<'a> {
    nodes: HashMap<&'a str, &'a GraphNode>,
    outgoing: HashMap<&'a str, Vec<&'a GraphEdge>>,
    incoming: HashMap<&'a str, Vec<&'a GraphEdge>>,
}

impl<'a> GraphIndex<'a> {
    pub fn build(nodes: &'a [GraphNode], edges: &'a [GraphEdge]) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for node in nodes {
            by_id.entry(node.id.as_str()).or_insert(node);
        }

        let mut outgoing: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        for edge in edges {
            outgoing
                .entry(edge.source_node_id.as_str())
                .or_default()
                .push(edge);
            incoming
                .entry(edge.target_node_id.as_str())
                .or_default()
                .push(edge);
        }

        Self {
            nodes: by_id,
            outgoing,
            incoming,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a GraphNode> {
        self.nodes.get(id).copied()
    }

    pub fn outgoing(&self, id: &str) -> &[&'a GraphEdge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, id: &str) -> &[&'a GraphEdge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
