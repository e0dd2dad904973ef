//! # kakoi - threat-modeling engine
//!
//! kakoi ingests a declarative description of a software architecture
//! (technical assets, data assets, communication links, trust boundaries,
//! shared runtimes) and evaluates a catalog of security-risk rules against
//! the resulting graph, producing identified risks with severity ratings,
//! deterministic identities and reconciled tracking status.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kakoi::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = ModelInput::from_json(&std::fs::read_to_string("model.json")?)?;
//!     let technologies = TechnologyRegistry::builtin();
//!
//!     let engine = RiskEngine::new();
//!     let mut model = link_model(
//!         &input,
//!         &technologies,
//!         &engine.builtin_categories(),
//!         &[],
//!     )?;
//!
//!     let stats = engine.evaluate(&mut model, &[]).await;
//!     model.apply_wildcard_risk_tracking(false)?;
//!     model.check_risk_tracking(false)?;
//!
//!     println!("{} risks identified", model.total_risk_count());
//!     let _ = stats;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - **`kakoi-types`**: classification enums, entities, technology registry
//! - **`kakoi-model`**: input records, linker/validator, graph queries,
//!   risk-tracking reconciliation
//! - **`kakoi-rules`**: the `RiskRule` contract and the built-in rule catalog
//! - **`kakoi-plugin`**: the subprocess protocol for custom rules
//! - **`kakoi-engine`**: rule-evaluation orchestration and configuration

#[cfg(feature = "kakoi-types")]
pub use kakoi_types as types;

#[cfg(feature = "kakoi-model")]
pub use kakoi_model as model;

#[cfg(feature = "kakoi-rules")]
pub use kakoi_rules as rules;

#[cfg(feature = "kakoi-plugin")]
pub use kakoi_plugin as plugin;

#[cfg(feature = "kakoi-engine")]
pub use kakoi_engine as engine;

pub mod prelude {
    #[cfg(feature = "kakoi-types")]
    pub use kakoi_types::{
        calculate_severity, Risk, RiskCategory, RiskSeverity, RiskStatus, TechnologyRegistry,
    };

    #[cfg(feature = "kakoi-model")]
    pub use kakoi_model::{link_model, ModelError, ModelInput, ParsedModel};

    #[cfg(feature = "kakoi-rules")]
    pub use kakoi_rules::{RiskRule, RuleError, SubprocessRule};

    #[cfg(feature = "kakoi-plugin")]
    pub use kakoi_plugin::{load_custom_rules, PluginRunner};

    #[cfg(feature = "kakoi-engine")]
    pub use kakoi_engine::{run_analysis, AnalysisConfig, EvaluationStats, RiskEngine};
}
