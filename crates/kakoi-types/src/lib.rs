//! Core data model of the kakoi threat-modeling engine.
//!
//! This crate holds the domain vocabulary shared by every other kakoi crate:
//! the ordered classification enums (confidentiality, criticality, protocols,
//! risk ratings, ...), the technology registry, and the architecture entities
//! (technical assets, data assets, communication links, trust boundaries,
//! shared runtimes) together with the risk types produced by rule evaluation.
//!
//! Everything here is plain serde-serializable data; linking, indexing and
//! graph queries live in `kakoi-model`.

pub mod entities;
pub mod enums;
pub mod protocol;
pub mod risk;
pub mod technology;

pub use entities::{
    synthetic_risk_id, CommunicationLink, DataAsset, Risk, RiskCategory, RiskTracking,
    SharedRuntime, TechnicalAsset, TrustBoundary,
};
pub use enums::{
    Authentication, Authorization, Confidentiality, Criticality, DataFormat, EncryptionStyle,
    Quantity, TechnicalAssetMachine, TechnicalAssetSize, TechnicalAssetType, TrustBoundaryType,
    UnknownEnumValue, Usage,
};
pub use protocol::Protocol;
pub use risk::{
    calculate_severity, DataBreachProbability, RiskExploitationImpact,
    RiskExploitationLikelihood, RiskFunction, RiskSeverity, RiskStatus, Stride,
};
pub use technology::{attributes, Technology, TechnologyRegistry};
