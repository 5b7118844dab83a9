//! Rule chain resolution over the strategy graph.
//!
//! A chain is one condition node together with every asset node feeding it and
//! the action node it feeds. Resolution never fails: conditions that do not form
//! a complete Asset -> Condition -> Action chain are skipped.
//!
//! # Tie-breaking
//!
//! - A condition uses the *first* outgoing edge in edge-collection order. If that
//!   edge points at a missing node or a non-action node, the condition yields no
//!   chain, even if a later edge would have reached an action. This is a
//!   simplification inherited from the editor, not a "first added" guarantee.
//! - Incoming sources that are not asset nodes are ignored; repeated edges from
//!   the same asset count once.
//! - A chain touching an incomplete node (one whose payload the editor has not
//!   filled in yet) is skipped as a whole.
//! - Chains are emitted in condition-node order, at most once per node id.

use crate::domain::graph::{
    ActionNodeData, AssetNodeData, ConditionNodeData, GraphEdge, GraphIndex, GraphNode, NodeData,
    NodeKind,
};
use crate::domain::strategy::{ActionSpec, ConditionSpec};
use std::collections::HashSet;

/// A resolved Asset(s) -> Condition -> Action chain borrowed from the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleChain<'a> {
    pub assets: Vec<&'a GraphNode>,
    pub condition: &'a GraphNode,
    pub action: &'a GraphNode,
}

impl<'a> RuleChain<'a> {
    pub fn asset_data(&self) -> impl Iterator<Item = &'a AssetNodeData> + '_ {
        self.assets.iter().filter_map(|n| n.as_asset())
    }

    pub fn condition_data(&self) -> Option<&'a ConditionNodeData> {
        self.condition.as_condition()
    }

    pub fn action_data(&self) -> Option<&'a ActionNodeData> {
        self.action.as_action()
    }

    /// Identifiers of all upstream assets, in edge order.
    pub fn asset_identifiers(&self) -> Vec<String> {
        self.asset_data()
            .map(|a| a.asset.identifier().to_string())
            .collect()
    }
}

pub fn resolve<'a>(nodes: &'a [GraphNode], edges: &'a [GraphEdge]) -> Vec<RuleChain<'a>> {
    let index = GraphIndex::build(nodes, edges);
    let mut processed: HashSet<&str> = HashSet::new();
    let mut chains = Vec::new();

    for condition in nodes {
        if !matches!(condition.data, NodeData::Condition(_)) {
            continue;
        }
        if !processed.insert(condition.id.as_str()) {
            continue;
        }

        let Some(first_out) = index.outgoing(&condition.id).first() else {
            log::debug!("condition {} has no outgoing edge", condition.id);
            continue;
        };
        let action = match index.node(&first_out.target_node_id) {
            Some(node) if node.as_action().is_some() => node,
            Some(node) if node.is_incomplete() => {
                log::debug!(
                    "condition {} feeds incomplete node {}",
                    condition.id,
                    node.id
                );
                continue;
            }
            Some(_) => {
                log::debug!(
                    "condition {} feeds {} which is not an action",
                    condition.id,
                    first_out.target_node_id
                );
                continue;
            }
            None => {
                log::debug!(
                    "condition {} feeds missing node {}",
                    condition.id,
                    first_out.target_node_id
                );
                continue;
            }
        };

        let sources: Vec<&GraphNode> = index
            .incoming(&condition.id)
            .iter()
            .filter_map(|edge| index.node(&edge.source_node_id))
            .collect();
        if let Some(unfinished) = sources
            .iter()
            .find(|node| node.is_incomplete() && node.kind() == NodeKind::Asset)
        {
            log::debug!(
                "condition {} is fed by incomplete asset {}",
                condition.id,
                unfinished.id
            );
            continue;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let assets: Vec<&GraphNode> = sources
            .into_iter()
            .filter(|node| node.as_asset().is_some())
            .filter(|node| seen.insert(node.id.as_str()))
            .collect();

        if assets.is_empty() {
            log::debug!("condition {} has no upstream asset", condition.id);
            continue;
        }

        chains.push(RuleChain {
            assets,
            condition,
            action,
        });
    }

    chains
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Human-readable description of a chain, listing every upstream asset.
pub fn describe_chain(chain: &RuleChain<'_>) -> String {
    let assets = chain.asset_identifiers().join(", ");

    let condition = match chain.condition_data().map(|c| &c.condition) {
        Some(ConditionSpec::Allocation(t)) => format!(
            "{assets} allocation {} {}%",
            t.operator,
            format_number(t.threshold)
        ),
        Some(ConditionSpec::ApyThreshold(t)) => {
            format!("{assets} APY {} {}%", t.operator, format_number(t.threshold))
        }
        Some(ConditionSpec::PriceChange(t)) => format!(
            "{assets} price change {} {}%",
            t.operator,
            format_number(t.threshold)
        ),
        Some(ConditionSpec::TimeBased(i)) => {
            format!("every {} {} for {assets}", i.interval, i.unit.as_str())
        }
        Some(ConditionSpec::Custom(_)) | None => format!("custom condition on {assets}"),
    };

    let action = match chain.action_data().map(|a| &a.action) {
        Some(ActionSpec::Rebalance(r)) => format!(
            "rebalance {} to {}%",
            r.target_asset,
            format_number(r.target_allocation)
        ),
        Some(ActionSpec::Stake(s)) => format!("stake {}%", format_number(s.percentage)),
        Some(ActionSpec::ProvideLiquidity(l)) => {
            format!("provide {}% as liquidity", format_number(l.percentage))
        }
        Some(ActionSpec::Swap(s)) => format!(
            "swap {}% of {} to {}",
            format_number(s.percentage),
            s.from_asset,
            s.to_asset
        ),
        Some(ActionSpec::Custom(_)) | None => "run custom action".to_string(),
    };

    format!("When {condition}, {action}")
}
