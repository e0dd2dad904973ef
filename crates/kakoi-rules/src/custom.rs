//! Subprocess-backed rule variant.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_plugin::{CustomRuleSpec, MODE_EXPLAIN_RISK, MODE_GENERATE_RISKS};
use kakoi_types::{Risk, RiskCategory};

use crate::traits::{RiskRule, RuleError};

/// A custom rule driven over the plugin protocol. The whole linked model is
/// handed to the executable as JSON; the executable answers with a JSON list
/// of risks.
#[derive(Debug, Clone)]
pub struct SubprocessRule {
    spec: CustomRuleSpec,
}

impl SubprocessRule {
    pub fn new(spec: CustomRuleSpec) -> Self {
        Self { spec }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// On-demand `-explain-risk` pass-through for report tooling.
    pub async fn explain_risk(&self, risk_id: &str) -> Result<serde_json::Value, RuleError> {
        let explanation = self
            .spec
            .runner
            .run::<(), serde_json::Value>(None, &[MODE_EXPLAIN_RISK, risk_id])
            .await?;
        Ok(explanation)
    }
}

#[async_trait]
impl RiskRule for SubprocessRule {
    fn category(&self) -> RiskCategory {
        self.spec.category.clone()
    }

    fn supported_tags(&self) -> Vec<String> {
        self.spec.tags.clone()
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let risks: Vec<Risk> = self
            .spec
            .runner
            .run(Some(model), &[MODE_GENERATE_RISKS])
            .await?;
        Ok(risks)
    }
}
