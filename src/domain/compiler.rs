//! Strategy compiler: graph <-> canonical vault configuration.
//!
//! `serialize` and `deserialize` are inverse up to node ids and positions:
//! a configuration with well-formed rules survives `deserialize` followed by
//! `serialize` unchanged (assets and rules; metadata belongs to the caller).
//!
//! Allocation values are copied verbatim. Clamping to `[0, 100]` is an editor
//! concern; programmatic callers should run
//! [`validate_vault`](crate::domain::vault_validation::validate_vault).

use crate::domain::chain::resolve;
use crate::domain::error::VaultError;
use crate::domain::graph::{AssetType, GraphEdge, GraphNode, StrategyGraph};
use crate::domain::strategy::{ActionSpec, ConditionSpec};
use crate::domain::vault::{
    AssetAllocation, Rule, RuleAction, RuleCondition, Scoped, VaultConfiguration, VaultMetadata,
};
use serde_json::Value;
use std::str::FromStr;

const ASSET_COLUMN_X: f64 = 100.0;
const CONDITION_COLUMN_X: f64 = 400.0;
const ACTION_COLUMN_X: f64 = 700.0;
const TOP_Y: f64 = 100.0;
const ROW_HEIGHT: f64 = 150.0;

/// How a condition fed by several assets is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiAssetMode {
    /// The condition's `asset` parameter is the first upstream asset; the
    /// others are dropped from the compiled rule.
    #[default]
    FirstAsset,
    /// As `FirstAsset`, and additionally every upstream asset is listed in
    /// `Rule::assets`.
    AllAssets,
}

impl FromStr for MultiAssetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(MultiAssetMode::FirstAsset),
            "all" => Ok(MultiAssetMode::AllAssets),
            other => Err(format!("unknown multi-asset mode '{other}' (expected first or all)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub multi_asset: MultiAssetMode,
}

#[derive(Debug, Clone, Default)]
pub struct StrategyCompiler {
    options: CompileOptions,
}

impl StrategyCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn serialize(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> VaultConfiguration {
        let assets: Vec<AssetAllocation> = nodes
            .iter()
            .filter_map(|n| n.as_asset())
            .map(|a| AssetAllocation {
                code: a.asset.code().to_string(),
                issuer: a.asset.issuer().map(str::to_string),
                allocation: a.allocation,
            })
            .collect();

        let rules: Vec<Rule> = resolve(nodes, edges)
            .iter()
            .filter_map(|chain| {
                let condition = chain.condition_data()?;
                let action = chain.action_data()?;
                let identifiers = chain.asset_identifiers();
                let primary = identifiers.first().cloned();
                Some(Rule {
                    condition: lower_condition(&condition.condition, primary),
                    action: lower_action(&action.action),
                    assets: match self.options.multi_asset {
                        MultiAssetMode::FirstAsset => Vec::new(),
                        MultiAssetMode::AllAssets => identifiers,
                    },
                })
            })
            .collect();

        log::debug!(
            "compiled {} assets and {} rules from {} nodes / {} edges",
            assets.len(),
            rules.len(),
            nodes.len(),
            edges.len()
        );

        VaultConfiguration {
            assets,
            rules,
            metadata: VaultMetadata::default(),
        }
    }

    pub fn serialize_graph(&self, graph: &StrategyGraph) -> VaultConfiguration {
        self.serialize(&graph.nodes, &graph.edges)
    }

    /// Lay a configuration out as a fresh graph: assets in the left column, one
    /// condition/action row per rule. Rule assets that match no asset node by
    /// identifier simply get no edge.
    pub fn deserialize(&self, config: &VaultConfiguration) -> StrategyGraph {
        let mut nodes = Vec::with_capacity(config.assets.len() + config.rules.len() * 2);
        let mut edges = Vec::new();

        for (i, allocation) in config.assets.iter().enumerate() {
            let asset =
                AssetType::from_code_and_issuer(&allocation.code, allocation.issuer.as_deref());
            nodes.push(
                GraphNode::asset(format!("asset-{i}"), asset, allocation.allocation)
                    .at(ASSET_COLUMN_X, row_y(i)),
            );
        }

        for (i, rule) in config.rules.iter().enumerate() {
            let condition_id = format!("condition-{i}");
            let action_id = format!("action-{i}");

            let mut wired: Vec<usize> = Vec::new();
            for identifier in rule.referenced_assets() {
                let matched = nodes.iter().position(|n: &GraphNode| {
                    n.as_asset()
                        .is_some_and(|a| a.asset.identifier() == identifier)
                });
                match matched {
                    Some(j) if !wired.contains(&j) => wired.push(j),
                    Some(_) => {}
                    None => log::debug!("rule {i}: no asset node matches '{identifier}'"),
                }
            }
            for j in wired {
                edges.push(GraphEdge::new(
                    format!("edge-asset-{j}-condition-{i}"),
                    format!("asset-{j}"),
                    condition_id.clone(),
                ));
            }

            nodes.push(
                GraphNode::condition(condition_id.clone(), raise_condition(&rule.condition))
                    .at(CONDITION_COLUMN_X, row_y(i)),
            );
            nodes.push(
                GraphNode::action(action_id.clone(), raise_action(&rule.action))
                    .at(ACTION_COLUMN_X, row_y(i)),
            );
            edges.push(GraphEdge::new(
                format!("edge-condition-{i}-action-{i}"),
                condition_id,
                action_id,
            ));
        }

        StrategyGraph::new(nodes, edges)
    }

    pub fn export_json(&self, config: &VaultConfiguration) -> Result<String, VaultError> {
        Ok(serde_json::to_string_pretty(config)?)
    }

    /// Parse a stored configuration. Only the outer shape is checked here
    /// (`assets` and `rules` must be arrays); allocation sums and asset formats
    /// are left to `validate_vault`.
    pub fn import_json(&self, json: &str) -> Result<VaultConfiguration, VaultError> {
        let value: Value = serde_json::from_str(json).map_err(|e| VaultError::Parse {
            what: "vault configuration".into(),
            reason: e.to_string(),
        })?;

        let object = value
            .as_object()
            .ok_or_else(|| VaultError::validation("configuration must be a JSON object"))?;
        if !object.get("assets").is_some_and(Value::is_array) {
            return Err(VaultError::validation("assets must be an array"));
        }
        if !object.get("rules").is_some_and(Value::is_array) {
            return Err(VaultError::validation("rules must be an array"));
        }

        serde_json::from_value(value).map_err(|e| VaultError::validation(e.to_string()))
    }

    pub fn import_graph_json(&self, json: &str) -> Result<StrategyGraph, VaultError> {
        serde_json::from_str(json).map_err(|e| VaultError::Parse {
            what: "strategy graph".into(),
            reason: e.to_string(),
        })
    }

    pub fn export_graph_json(&self, graph: &StrategyGraph) -> Result<String, VaultError> {
        Ok(serde_json::to_string_pretty(graph)?)
    }
}

fn row_y(row: usize) -> f64 {
    TOP_Y + row as f64 * ROW_HEIGHT
}

fn lower_condition(spec: &ConditionSpec, asset: Option<String>) -> RuleCondition {
    match spec {
        ConditionSpec::Allocation(t) => RuleCondition::Allocation(Scoped::new(asset, t.clone())),
        ConditionSpec::ApyThreshold(t) => {
            RuleCondition::ApyThreshold(Scoped::new(asset, t.clone()))
        }
        ConditionSpec::TimeBased(i) => RuleCondition::TimeBased(Scoped::new(asset, i.clone())),
        ConditionSpec::PriceChange(t) => {
            RuleCondition::PriceChange(Scoped::new(asset, t.clone()))
        }
        ConditionSpec::Custom(fields) => {
            let mut fields = fields.clone();
            if let Some(asset) = asset {
                fields.insert("asset".into(), Value::String(asset));
            }
            RuleCondition::Custom(fields)
        }
    }
}

fn raise_condition(condition: &RuleCondition) -> ConditionSpec {
    match condition {
        RuleCondition::Allocation(s) => ConditionSpec::Allocation(s.spec.clone()),
        RuleCondition::ApyThreshold(s) => ConditionSpec::ApyThreshold(s.spec.clone()),
        RuleCondition::TimeBased(s) => ConditionSpec::TimeBased(s.spec.clone()),
        RuleCondition::PriceChange(s) => ConditionSpec::PriceChange(s.spec.clone()),
        RuleCondition::Custom(fields) => {
            let mut fields = fields.clone();
            fields.remove("asset");
            ConditionSpec::Custom(fields)
        }
    }
}

fn lower_action(spec: &ActionSpec) -> RuleAction {
    match spec {
        ActionSpec::Rebalance(r) => RuleAction::Rebalance(r.clone()),
        ActionSpec::Stake(s) => RuleAction::Stake(s.clone()),
        ActionSpec::ProvideLiquidity(l) => RuleAction::ProvideLiquidity(l.clone()),
        ActionSpec::Swap(s) => RuleAction::Swap(s.clone()),
        ActionSpec::Custom(fields) => RuleAction::Custom(fields.clone()),
    }
}

fn raise_action(action: &RuleAction) -> ActionSpec {
    match action {
        RuleAction::Rebalance(r) => ActionSpec::Rebalance(r.clone()),
        RuleAction::Stake(s) => ActionSpec::Stake(s.clone()),
        RuleAction::ProvideLiquidity(l) => ActionSpec::ProvideLiquidity(l.clone()),
        RuleAction::Swap(s) => ActionSpec::Swap(s.clone()),
        RuleAction::Custom(fields) => ActionSpec::Custom(fields.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{NodeKind, USDC_ISSUER};
    use crate::domain::strategy::{
        IntervalSpec, Operator, RebalanceSpec, StakeSpec, ThresholdSpec, TimeUnit,
    };
    use serde_json::json;

    fn threshold(operator: Operator, threshold: f64) -> ThresholdSpec {
        ThresholdSpec {
            operator,
            threshold,
        }
    }

    fn rebalance(target: &str, allocation: f64) -> ActionSpec {
        ActionSpec::Rebalance(RebalanceSpec {
            target_asset: target.into(),
            target_allocation: allocation,
        })
    }

    fn two_asset_graph() -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let nodes = vec![
            GraphNode::asset("a1", AssetType::Native, 60.0),
            GraphNode::asset("a2", AssetType::Stablecoin, 40.0),
            GraphNode::condition(
                "c1",
                ConditionSpec::Allocation(threshold(Operator::Gt, 50.0)),
            ),
            GraphNode::action("x1", rebalance("USDC", 40.0)),
        ];
        let edges = vec![
            GraphEdge::new("e1", "a1", "c1"),
            GraphEdge::new("e2", "a2", "c1"),
            GraphEdge::new("e3", "c1", "x1"),
        ];
        (nodes, edges)
    }

    #[test]
    fn serialize_assets_by_type() {
        let nodes = vec![
            GraphNode::asset("a1", AssetType::Native, 50.0),
            GraphNode::asset("a2", AssetType::Stablecoin, 30.0),
            GraphNode::asset(
                "a3",
                AssetType::Custom {
                    asset_code: "AQUA".into(),
                    asset_issuer: "GAQUA".into(),
                },
                20.0,
            ),
        ];
        let config = StrategyCompiler::default().serialize(&nodes, &[]);
        assert_eq!(
            config.assets,
            vec![
                AssetAllocation {
                    code: "XLM".into(),
                    issuer: None,
                    allocation: 50.0
                },
                AssetAllocation {
                    code: "USDC".into(),
                    issuer: Some(USDC_ISSUER.into()),
                    allocation: 30.0
                },
                AssetAllocation {
                    code: "AQUA".into(),
                    issuer: Some("GAQUA".into()),
                    allocation: 20.0
                },
            ]
        );
        assert!(config.rules.is_empty());
    }

    #[test]
    fn allocation_is_copied_verbatim() {
        let nodes = vec![GraphNode::asset("a1", AssetType::Native, 140.0)];
        let config = StrategyCompiler::default().serialize(&nodes, &[]);
        assert_eq!(config.assets[0].allocation, 140.0);
    }

    #[test]
    fn multi_asset_condition_keeps_first_asset_only() {
        let (nodes, edges) = two_asset_graph();
        let config = StrategyCompiler::default().serialize(&nodes, &edges);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].condition.asset(), Some("XLM"));
        assert!(config.rules[0].assets.is_empty());
    }

    #[test]
    fn all_assets_mode_records_every_asset() {
        let (nodes, edges) = two_asset_graph();
        let compiler = StrategyCompiler::new(CompileOptions {
            multi_asset: MultiAssetMode::AllAssets,
        });
        let config = compiler.serialize(&nodes, &edges);
        assert_eq!(config.rules[0].condition.asset(), Some("XLM"));
        assert_eq!(config.rules[0].assets, vec!["XLM", "USDC"]);

        let graph = compiler.deserialize(&config);
        let again = compiler.serialize_graph(&graph);
        assert_eq!(again.rules, config.rules);
    }

    #[test]
    fn custom_condition_gets_asset_parameter() {
        let mut fields = serde_json::Map::new();
        fields.insert("expression".into(), json!("tvl > 1000"));
        let nodes = vec![
            GraphNode::asset("a1", AssetType::Native, 100.0),
            GraphNode::condition("c1", ConditionSpec::Custom(fields)),
            GraphNode::action("x1", ActionSpec::Stake(StakeSpec { percentage: 10.0 })),
        ];
        let edges = vec![
            GraphEdge::new("e1", "a1", "c1"),
            GraphEdge::new("e2", "c1", "x1"),
        ];
        let config = StrategyCompiler::default().serialize(&nodes, &edges);
        match &config.rules[0].condition {
            RuleCondition::Custom(params) => {
                assert_eq!(params.get("asset"), Some(&json!("XLM")));
                assert_eq!(params.get("expression"), Some(&json!("tvl > 1000")));
            }
            other => panic!("expected custom condition, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_layout_is_deterministic() {
        let (nodes, edges) = two_asset_graph();
        let compiler = StrategyCompiler::default();
        let config = compiler.serialize(&nodes, &edges);
        let graph = compiler.deserialize(&config);

        let kinds: Vec<NodeKind> = graph.nodes.iter().map(GraphNode::kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Asset,
                NodeKind::Asset,
                NodeKind::Condition,
                NodeKind::Action
            ]
        );
        assert_eq!(graph.nodes[0].position.x, 100.0);
        assert_eq!(graph.nodes[1].position.y, 250.0);
        assert_eq!(graph.nodes[2].position.x, 400.0);
        assert_eq!(graph.nodes[3].position.x, 700.0);
        assert_eq!(graph, compiler.deserialize(&config));
    }

    #[test]
    fn deserialize_omits_edge_for_unknown_asset() {
        let config = VaultConfiguration {
            assets: vec![AssetAllocation {
                code: "XLM".into(),
                issuer: None,
                allocation: 100.0,
            }],
            rules: vec![Rule {
                condition: RuleCondition::PriceChange(Scoped::new(
                    Some("BTC".into()),
                    threshold(Operator::Lt, -10.0),
                )),
                action: RuleAction::Stake(StakeSpec { percentage: 5.0 }),
                assets: vec![],
            }],
            metadata: VaultMetadata::default(),
        };
        let compiler = StrategyCompiler::default();
        let graph = compiler.deserialize(&config);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source_node_id, "condition-0");
        assert!(compiler.serialize_graph(&graph).rules.is_empty());
    }

    #[test]
    fn round_trip_mixed_rules() {
        let config = VaultConfiguration {
            assets: vec![
                AssetAllocation {
                    code: "XLM".into(),
                    issuer: None,
                    allocation: 50.0,
                },
                AssetAllocation {
                    code: "USDC".into(),
                    issuer: Some(USDC_ISSUER.into()),
                    allocation: 25.0,
                },
                AssetAllocation {
                    code: "AQUA".into(),
                    issuer: Some("GAQUAISSUER".into()),
                    allocation: 25.0,
                },
            ],
            rules: vec![
                Rule {
                    condition: RuleCondition::TimeBased(Scoped::new(
                        Some("AQUA".into()),
                        IntervalSpec {
                            interval: 1,
                            unit: TimeUnit::Weeks,
                        },
                    )),
                    action: RuleAction::Stake(StakeSpec { percentage: 20.0 }),
                    assets: vec![],
                },
                Rule {
                    condition: RuleCondition::ApyThreshold(Scoped::new(
                        Some("USDC".into()),
                        threshold(Operator::Lte, 4.0),
                    )),
                    action: RuleAction::Rebalance(RebalanceSpec {
                        target_asset: "XLM".into(),
                        target_allocation: 70.0,
                    }),
                    assets: vec![],
                },
            ],
            metadata: VaultMetadata::default(),
        };
        let compiler = StrategyCompiler::default();
        let graph = compiler.deserialize(&config);
        assert_eq!(compiler.serialize_graph(&graph), config);
    }

    #[test]
    fn import_rejects_non_array_fields() {
        let compiler = StrategyCompiler::default();
        let err = compiler
            .import_json(r#"{"assets": {}, "rules": []}"#)
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation { reason } if reason.contains("assets")));

        let err = compiler.import_json(r#"{"assets": []}"#).unwrap_err();
        assert!(matches!(err, VaultError::Validation { reason } if reason.contains("rules")));
    }

    #[test]
    fn import_rejects_malformed_json() {
        let err = StrategyCompiler::default()
            .import_json("{not json")
            .unwrap_err();
        assert!(matches!(err, VaultError::Parse { .. }));
    }

    #[test]
    fn import_does_not_check_allocation_sum() {
        let json = r#"{
            "assets": [{"code": "XLM", "allocation": 10}, {"code": "USDC", "allocation": 10}],
            "rules": []
        }"#;
        let config = StrategyCompiler::default().import_json(json).unwrap();
        assert_eq!(config.allocation_total(), 20.0);
    }

    #[test]
    fn export_import_round_trip() {
        let (nodes, edges) = two_asset_graph();
        let compiler = StrategyCompiler::default();
        let config = compiler.serialize(&nodes, &edges);
        let json = compiler.export_json(&config).unwrap();
        assert_eq!(compiler.import_json(&json).unwrap(), config);
    }

    #[test]
    fn unfinished_node_does_not_block_complete_chain() {
        let json = r#"{
            "nodes": [
                {"id": "a1", "type": "asset", "position": {"x": 100, "y": 100},
                 "data": {"assetType": "XLM", "allocation": 100}},
                {"id": "c1", "type": "condition", "position": {"x": 400, "y": 100},
                 "data": {"conditionType": "allocation", "operator": "gt", "threshold": 80}},
                {"id": "x1", "type": "action", "position": {"x": 700, "y": 100},
                 "data": {"actionType": "stake", "percentage": 10}},
                {"id": "x2", "type": "action", "position": {"x": 700, "y": 250},
                 "data": {"actionType": "rebalance"}},
                {"id": "c2", "type": "condition", "position": {"x": 400, "y": 250},
                 "data": {}}
            ],
            "edges": [
                {"id": "e1", "source": "a1", "target": "c1"},
                {"id": "e2", "source": "c1", "target": "x1"},
                {"id": "e3", "source": "a1", "target": "c2"}
            ]
        }"#;
        let compiler = StrategyCompiler::default();
        let graph = compiler.import_graph_json(json).unwrap();
        assert_eq!(graph.nodes.len(), 5);
        assert!(graph.nodes[3].is_incomplete());
        assert!(graph.nodes[4].is_incomplete());

        let config = compiler.serialize_graph(&graph);
        assert_eq!(config.assets.len(), 1);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].condition.asset(), Some("XLM"));
        assert_eq!(
            config.rules[0].action,
            RuleAction::Stake(StakeSpec { percentage: 10.0 })
        );

        let exported = compiler.export_graph_json(&graph).unwrap();
        assert_eq!(compiler.import_graph_json(&exported).unwrap(), graph);
    }

    #[test]
    fn import_graph_rejects_non_graph_json() {
        let compiler = StrategyCompiler::default();
        for json in ["{not json", r#"{"nodes": {}}"#, r#"{"nodes": [{"type": "asset"}]}"#] {
            let err = compiler.import_graph_json(json).unwrap_err();
            assert!(matches!(err, VaultError::Parse { .. }), "{json}");
        }
    }

    #[test]
    fn empty_issuer_survives_import_round_trip() {
        let json = r#"{
            "assets": [
                {"code": "XLM", "allocation": 50},
                {"code": "AQUA", "issuer": "", "allocation": 50}
            ],
            "rules": []
        }"#;
        let compiler = StrategyCompiler::default();
        let config = compiler.import_json(json).unwrap();
        assert_eq!(config.assets[1].issuer, None);
        let graph = compiler.deserialize(&config);
        assert_eq!(compiler.serialize_graph(&graph), config);
    }

    #[test]
    fn multi_asset_mode_parses() {
        assert_eq!(
            "first".parse::<MultiAssetMode>().unwrap(),
            MultiAssetMode::FirstAsset
        );
        assert_eq!(
            " ALL ".parse::<MultiAssetMode>().unwrap(),
            MultiAssetMode::AllAssets
        );
        assert!("some".parse::<MultiAssetMode>().is_err());
    }
}
