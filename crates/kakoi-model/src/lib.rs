//! Model linking, validation and graph queries.
//!
//! The raw input records ([`input::ModelInput`]) are turned into a fully
//! linked [`ParsedModel`] by [`link_model`]: references resolved, derived
//! indices built, ratings propagated, inconsistencies rejected. The linked
//! model is read-only for rule evaluation; only the risk-tracking
//! reconciliation pass adds synthesized tracking entries afterwards.

pub mod boundaries;
pub mod input;
pub mod linker;
pub mod model;
pub mod risks;
pub mod tracking;

pub use input::ModelInput;
pub use linker::{derive_link_id, link_model, ModelError};
pub use model::{Author, Overview, ParsedModel};
