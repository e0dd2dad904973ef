//! Raw, loosely typed input records as authored by the modeler.
//!
//! Every classification field is a plain string here; the linker parses and
//! validates them. Collections are keyed by title, which also fixes the
//! processing order (ordered maps make linking deterministic).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Author, Overview};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub business_overview: Overview,
    #[serde(default)]
    pub technical_overview: Overview,
    #[serde(default)]
    pub business_criticality: String,
    #[serde(default)]
    pub management_summary_comment: String,
    #[serde(default)]
    pub security_requirements: BTreeMap<String, String>,
    #[serde(default)]
    pub questions: BTreeMap<String, String>,
    #[serde(default)]
    pub abuse_cases: BTreeMap<String, String>,
    #[serde(default)]
    pub tags_available: Vec<String>,
    #[serde(default)]
    pub data_assets: BTreeMap<String, DataAssetInput>,
    #[serde(default)]
    pub technical_assets: BTreeMap<String, TechnicalAssetInput>,
    #[serde(default)]
    pub trust_boundaries: BTreeMap<String, TrustBoundaryInput>,
    #[serde(default)]
    pub shared_runtimes: BTreeMap<String, SharedRuntimeInput>,
    #[serde(default)]
    pub individual_risk_categories: BTreeMap<String, IndividualRiskCategoryInput>,
    #[serde(default)]
    pub risk_tracking: BTreeMap<String, RiskTrackingInput>,
}

impl ModelInput {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataAssetInput {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub confidentiality: String,
    #[serde(default)]
    pub integrity: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub justification_cia_rating: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalAssetInput {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub asset_type: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub used_as_client_by_human: bool,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub internet: bool,
    #[serde(default)]
    pub encryption: String,
    #[serde(default)]
    pub multi_tenant: bool,
    #[serde(default)]
    pub redundant: bool,
    #[serde(default)]
    pub custom_developed_parts: bool,
    #[serde(default)]
    pub out_of_scope: bool,
    #[serde(default)]
    pub justification_out_of_scope: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub confidentiality: String,
    #[serde(default)]
    pub integrity: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub justification_cia_rating: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub data_assets_processed: Vec<String>,
    #[serde(default)]
    pub data_assets_stored: Vec<String>,
    #[serde(default)]
    pub data_formats_accepted: Vec<String>,
    #[serde(default)]
    pub communication_links: BTreeMap<String, CommunicationLinkInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunicationLinkInput {
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub authentication: String,
    #[serde(default)]
    pub authorization: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub vpn: bool,
    #[serde(default)]
    pub ip_filtered: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub data_assets_sent: Vec<String>,
    #[serde(default)]
    pub data_assets_received: Vec<String>,
    #[serde(default)]
    pub diagram_tweak_weight: i64,
    #[serde(default)]
    pub diagram_tweak_constraint: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustBoundaryInput {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub boundary_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technical_assets_inside: Vec<String>,
    #[serde(default)]
    pub trust_boundaries_nested: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedRuntimeInput {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technical_assets_running: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndividualRiskCategoryInput {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub asvs: String,
    #[serde(default)]
    pub cheat_sheet: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub mitigation: String,
    #[serde(default)]
    pub check: String,
    #[serde(default)]
    pub detection_logic: String,
    #[serde(default)]
    pub risk_assessment: String,
    #[serde(default)]
    pub false_positives: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub stride: String,
    #[serde(default)]
    pub model_failure_possible_reason: bool,
    #[serde(default)]
    pub cwe: i32,
    #[serde(default)]
    pub risks_identified: BTreeMap<String, IndividualRiskInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndividualRiskInput {
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub exploitation_likelihood: String,
    #[serde(default)]
    pub exploitation_impact: String,
    #[serde(default)]
    pub data_breach_probability: String,
    #[serde(default)]
    pub data_breach_technical_assets: Vec<String>,
    #[serde(default)]
    pub most_relevant_data_asset: String,
    #[serde(default)]
    pub most_relevant_technical_asset: String,
    #[serde(default)]
    pub most_relevant_communication_link: String,
    #[serde(default)]
    pub most_relevant_trust_boundary: String,
    #[serde(default)]
    pub most_relevant_shared_runtime: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskTrackingInput {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub checked_by: String,
    #[serde(default)]
    pub date: String,
}
