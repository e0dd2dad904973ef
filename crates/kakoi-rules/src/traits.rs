//! The rule contract shared by built-in and subprocess-backed rules.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::{Risk, RiskCategory};

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Plugin(#[from] kakoi_plugin::PluginError),
}

/// One unit of detection logic. `generate_risks` must be a pure function of
/// the model: no rule observes another rule's output, and evaluation order
/// between rules must not matter.
#[async_trait]
pub trait RiskRule: Send + Sync {
    fn category(&self) -> RiskCategory;

    /// Tags this rule understands; registered into the model's supported-tag
    /// set before evaluation.
    fn supported_tags(&self) -> Vec<String> {
        Vec::new()
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError>;
}
