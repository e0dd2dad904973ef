//! The rule-evaluation orchestrator.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kakoi_model::ParsedModel;
use kakoi_rules::{builtin, RiskRule};
use kakoi_types::{Risk, RiskCategory};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub rules_executed: usize,
    pub rules_failed: usize,
    pub rules_skipped: usize,
    pub risks_generated: usize,
}

/// Runs all enabled rules, built-in and custom, strictly sequentially. A
/// failing rule contributes zero risks and never aborts the run.
pub struct RiskEngine {
    builtin_rules: Vec<Arc<dyn RiskRule>>,
    custom_rules: Vec<Arc<dyn RiskRule>>,
}

impl RiskEngine {
    pub fn new() -> Self {
        Self {
            builtin_rules: builtin::all_rules(),
            custom_rules: Vec::new(),
        }
    }

    pub fn with_rules(builtin_rules: Vec<Arc<dyn RiskRule>>) -> Self {
        Self {
            builtin_rules,
            custom_rules: Vec::new(),
        }
    }

    /// Registers a custom (usually subprocess-backed) rule.
    pub fn add_rule(&mut self, rule: Arc<dyn RiskRule>) {
        self.custom_rules.push(rule);
    }

    pub fn builtin_categories(&self) -> Vec<RiskCategory> {
        self.builtin_rules.iter().map(|rule| rule.category()).collect()
    }

    pub fn custom_categories(&self) -> Vec<RiskCategory> {
        self.custom_rules.iter().map(|rule| rule.category()).collect()
    }

    /// Evaluates every rule not named in the skip list, in deterministic
    /// (category id) order, built-in rules before custom ones. Skip-list ids
    /// that match no rule are reported as a warning.
    pub async fn evaluate(&self, model: &mut ParsedModel, skip_rules: &[String]) -> EvaluationStats {
        let mut stats = EvaluationStats::default();
        let mut skipped: BTreeSet<String> = skip_rules
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        let mut ordered: Vec<(bool, &Arc<dyn RiskRule>)> = Vec::new();
        let mut builtin_sorted: Vec<&Arc<dyn RiskRule>> = self.builtin_rules.iter().collect();
        builtin_sorted.sort_by_key(|rule| rule.category().id);
        let mut custom_sorted: Vec<&Arc<dyn RiskRule>> = self.custom_rules.iter().collect();
        custom_sorted.sort_by_key(|rule| rule.category().id);
        ordered.extend(builtin_sorted.into_iter().map(|rule| (true, rule)));
        ordered.extend(custom_sorted.into_iter().map(|rule| (false, rule)));

        for (is_builtin, rule) in ordered {
            let category = rule.category();
            if skipped.remove(&category.id) {
                info!(rule = %category.id, "skipping risk rule");
                stats.rules_skipped += 1;
                continue;
            }
            debug!(rule = %category.id, builtin = is_builtin, "executing risk rule");
            model.add_to_supported_tags(&rule.supported_tags());
            match rule.generate_risks(model).await {
                Ok(risks) => {
                    stats.rules_executed += 1;
                    let deduplicated = dedup_by_synthetic_id(risks);
                    if !deduplicated.is_empty() {
                        stats.risks_generated += deduplicated.len();
                        model
                            .generated_risks_by_category
                            .entry(category.id.clone())
                            .or_default()
                            .extend(deduplicated);
                    }
                }
                Err(error) => {
                    stats.rules_failed += 1;
                    warn!(rule = %category.id, %error, "risk rule failed, continuing without its results");
                }
            }
        }

        if !skipped.is_empty() {
            let unknown: Vec<String> = skipped.into_iter().collect();
            warn!(rules = ?unknown, "unknown risk rules to skip");
        }

        rebuild_synthetic_id_index(model);
        stats
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Within one rule invocation two risks with the same synthetic id are the
/// same finding; the first one wins.
fn dedup_by_synthetic_id(risks: Vec<Risk>) -> Vec<Risk> {
    let mut seen = BTreeSet::new();
    risks
        .into_iter()
        .filter(|risk| seen.insert(risk.synthetic_id.clone()))
        .collect()
}

/// Lower-cased synthetic id -> risk, used exclusively by risk-tracking
/// lookups.
fn rebuild_synthetic_id_index(model: &mut ParsedModel) {
    let mut index = std::collections::BTreeMap::new();
    for risks in model.generated_risks_by_category.values() {
        for risk in risks {
            index.insert(risk.synthetic_id.to_lowercase(), risk.clone());
        }
    }
    model.generated_risks_by_synthetic_id = index;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kakoi_rules::RuleError;
    use kakoi_types::{RiskFunction, Stride};

    struct StaticRule {
        id: &'static str,
        risks: Vec<Risk>,
        fail: bool,
        tags: Vec<String>,
    }

    #[async_trait]
    impl RiskRule for StaticRule {
        fn category(&self) -> RiskCategory {
            RiskCategory {
                id: self.id.to_string(),
                title: self.id.to_string(),
                function: RiskFunction::Architecture,
                stride: Stride::Tampering,
                ..RiskCategory::default()
            }
        }

        fn supported_tags(&self) -> Vec<String> {
            self.tags.clone()
        }

        async fn generate_risks(&self, _model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
            if self.fail {
                return Err(RuleError::Execution("intentional".to_string()));
            }
            Ok(self.risks.clone())
        }
    }

    fn risk(category: &str, asset: &str) -> Risk {
        let mut risk = Risk {
            category_id: category.to_string(),
            most_relevant_technical_asset_id: asset.to_string(),
            title: format!("{category} at {asset}"),
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risk
    }

    fn engine_with(rules: Vec<Arc<dyn RiskRule>>) -> RiskEngine {
        RiskEngine::with_rules(rules)
    }

    #[tokio::test]
    async fn results_land_under_the_category_id() {
        let engine = engine_with(vec![Arc::new(StaticRule {
            id: "demo",
            risks: vec![risk("demo", "a"), risk("demo", "b")],
            fail: false,
            tags: vec![],
        })]);
        let mut model = ParsedModel::default();
        let stats = engine.evaluate(&mut model, &[]).await;
        assert_eq!(stats.rules_executed, 1);
        assert_eq!(stats.risks_generated, 2);
        assert_eq!(model.generated_risks_by_category["demo"].len(), 2);
        // secondary index is keyed by lower-cased synthetic id
        assert!(model.generated_risks_by_synthetic_id.contains_key("demo@a"));
    }

    #[tokio::test]
    async fn duplicate_synthetic_ids_within_one_rule_are_deduplicated() {
        let engine = engine_with(vec![Arc::new(StaticRule {
            id: "demo",
            risks: vec![risk("demo", "a"), risk("demo", "a")],
            fail: false,
            tags: vec![],
        })]);
        let mut model = ParsedModel::default();
        let stats = engine.evaluate(&mut model, &[]).await;
        assert_eq!(stats.risks_generated, 1);
        assert_eq!(model.generated_risks_by_category["demo"].len(), 1);
    }

    #[tokio::test]
    async fn failing_rule_degrades_gracefully() {
        let engine = engine_with(vec![
            Arc::new(StaticRule {
                id: "broken",
                risks: vec![],
                fail: true,
                tags: vec![],
            }),
            Arc::new(StaticRule {
                id: "working",
                risks: vec![risk("working", "x")],
                fail: false,
                tags: vec![],
            }),
        ]);
        let mut model = ParsedModel::default();
        let stats = engine.evaluate(&mut model, &[]).await;
        assert_eq!(stats.rules_failed, 1);
        assert_eq!(stats.rules_executed, 1);
        assert!(model.generated_risks_by_category.contains_key("working"));
        assert!(!model.generated_risks_by_category.contains_key("broken"));
    }

    #[tokio::test]
    async fn skip_list_suppresses_rules_and_registers_no_tags() {
        let engine = engine_with(vec![Arc::new(StaticRule {
            id: "noisy",
            risks: vec![risk("noisy", "x")],
            fail: false,
            tags: vec!["noise".to_string()],
        })]);
        let mut model = ParsedModel::default();
        let stats = engine
            .evaluate(&mut model, &["noisy".to_string(), "ghost".to_string()])
            .await;
        assert_eq!(stats.rules_skipped, 1);
        assert!(model.generated_risks_by_category.is_empty());
        assert!(!model.all_supported_tags.contains("noise"));
    }

    #[tokio::test]
    async fn supported_tags_are_registered_for_executed_rules() {
        let engine = engine_with(vec![Arc::new(StaticRule {
            id: "tagged",
            risks: vec![],
            fail: false,
            tags: vec!["git".to_string()],
        })]);
        let mut model = ParsedModel::default();
        engine.evaluate(&mut model, &[]).await;
        assert!(model.all_supported_tags.contains("git"));
    }

    #[tokio::test]
    async fn empty_rule_results_create_no_category_entry() {
        let engine = engine_with(vec![Arc::new(StaticRule {
            id: "quiet",
            risks: vec![],
            fail: false,
            tags: vec![],
        })]);
        let mut model = ParsedModel::default();
        engine.evaluate(&mut model, &[]).await;
        assert!(!model.generated_risks_by_category.contains_key("quiet"));
    }
}
