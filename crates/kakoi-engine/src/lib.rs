//! Risk evaluation orchestration.
//!
//! [`RiskEngine`] drives every enabled rule over a linked model, isolates
//! per-rule failures, deduplicates results and maintains the synthetic-id
//! index. [`run_analysis`] is the whole pipeline behind one call: load
//! technologies, parse and link the model, discover custom-rule plugins,
//! evaluate, reconcile risk tracking.

pub mod config;
pub mod engine;

use std::time::Duration;

use tracing::info;

use kakoi_model::{link_model, ModelError, ModelInput, ParsedModel};
use kakoi_plugin::load_custom_rules;
use kakoi_rules::SubprocessRule;
use kakoi_types::TechnologyRegistry;

pub use config::{AnalysisConfig, ConfigError};
pub use engine::{EvaluationStats, RiskEngine};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T, EngineError> {
    let data = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| EngineError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// One full analysis run: a single architecture snapshot in, the final
/// annotated risk set (inside the returned model) out.
pub async fn run_analysis(config: &AnalysisConfig) -> Result<(ParsedModel, EvaluationStats), EngineError> {
    let mut technologies = TechnologyRegistry::builtin();
    if let Some(technology_file) = &config.technology_file {
        let additional: TechnologyRegistry = read_json(technology_file)?;
        technologies.merge(additional);
    }

    let input: ModelInput = read_json(&config.model_file)?;

    let mut engine = RiskEngine::new();
    let plugin_timeout = config.plugin_timeout_secs.map(Duration::from_secs);
    for spec in load_custom_rules(&config.custom_rule_plugins, plugin_timeout).await {
        engine.add_rule(std::sync::Arc::new(SubprocessRule::new(spec)));
    }

    let builtin_categories = engine.builtin_categories();
    let custom_categories = engine.custom_categories();

    info!(model = %config.model_file.display(), "linking architecture model");
    let mut model = link_model(&input, &technologies, &builtin_categories, &custom_categories)?;

    let stats = engine.evaluate(&mut model, &config.skip_rules).await;

    model.apply_wildcard_risk_tracking(config.ignore_orphaned_risk_tracking)?;
    model.check_risk_tracking(config.ignore_orphaned_risk_tracking)?;

    Ok((model, stats))
}
