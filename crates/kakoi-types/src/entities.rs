//! Architecture entities and the risk types produced by rule evaluation.
//!
//! Entities reference each other by id only; resolution happens through the
//! lookup tables of the linked model (`kakoi-model`), so there are no
//! ownership cycles between assets, links and boundaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{
    Authentication, Authorization, Confidentiality, Criticality, DataFormat, EncryptionStyle,
    Quantity, TechnicalAssetMachine, TechnicalAssetSize, TechnicalAssetType, TrustBoundaryType,
    Usage,
};
use crate::protocol::Protocol;
use crate::risk::{
    DataBreachProbability, RiskExploitationImpact, RiskExploitationLikelihood, RiskFunction,
    RiskSeverity, RiskStatus, Stride,
};
use crate::technology::{list_has_attribute, list_is_unknown, Technology};

fn tagged_with_any(own_tags: &[String], tags: &[&str]) -> bool {
    own_tags.iter().any(|own| {
        tags.iter()
            .any(|tag| own.trim().eq_ignore_ascii_case(tag.trim()))
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    pub usage: Usage,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub owner: String,
    pub quantity: Quantity,
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
    #[serde(default)]
    pub justification_cia_rating: String,
}

impl DataAsset {
    pub fn is_tagged_with_any(&self, tags: &[&str]) -> bool {
        tagged_with_any(&self.tags, tags)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunicationLink {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub title: String,
    pub description: String,
    pub protocol: Protocol,
    pub authentication: Authentication,
    pub authorization: Authorization,
    pub usage: Usage,
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

impl CommunicationLink {
    pub fn is_tagged_with_any(&self, tags: &[&str]) -> bool {
        tagged_with_any(&self.tags, tags)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    pub usage: Usage,
    #[serde(rename = "type")]
    pub asset_type: TechnicalAssetType,
    pub size: TechnicalAssetSize,
    pub technologies: Vec<Technology>,
    pub machine: TechnicalAssetMachine,
    #[serde(default)]
    pub internet: bool,
    pub encryption: EncryptionStyle,
    #[serde(default)]
    pub multi_tenant: bool,
    #[serde(default)]
    pub redundant: bool,
    #[serde(default)]
    pub custom_developed_parts: bool,
    #[serde(default)]
    pub used_as_client_by_human: bool,
    #[serde(default)]
    pub out_of_scope: bool,
    #[serde(default)]
    pub justification_out_of_scope: String,
    #[serde(default)]
    pub owner: String,
    pub confidentiality: Confidentiality,
    pub integrity: Criticality,
    pub availability: Criticality,
    #[serde(default)]
    pub justification_cia_rating: String,
    /// Relative attacker attractiveness, written by an external scoring pass.
    #[serde(default)]
    pub raa: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub data_assets_processed: Vec<String>,
    #[serde(default)]
    pub data_assets_stored: Vec<String>,
    #[serde(default)]
    pub data_formats_accepted: Vec<DataFormat>,
    /// Outgoing links, owned by this (source) asset.
    #[serde(default)]
    pub communication_links: Vec<CommunicationLink>,
}

impl TechnicalAsset {
    pub fn is_tagged_with_any(&self, tags: &[&str]) -> bool {
        tagged_with_any(&self.tags, tags)
    }

    /// True if any of the asset's technologies carries the attribute.
    pub fn tech_attribute(&self, name: &str) -> bool {
        list_has_attribute(&self.technologies, name)
    }

    pub fn has_technology(&self, name: &str) -> bool {
        self.technologies.iter().any(|t| t.is(name))
    }

    pub fn technology_unknown(&self) -> bool {
        list_is_unknown(&self.technologies)
    }

    pub fn has_direct_connection(&self, other_asset_id: &str) -> bool {
        self.communication_links
            .iter()
            .any(|link| link.target_id == other_asset_id)
    }

    pub fn highest_sensitivity_score(&self) -> f64 {
        self.confidentiality.attacker_attractiveness_for_asset()
            + self.integrity.attacker_attractiveness_for_asset()
            + self.availability.attacker_attractiveness_for_asset()
    }

    pub fn accepts_data_format(&self, format: DataFormat) -> bool {
        self.data_formats_accepted.contains(&format)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustBoundary {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub boundary_type: TrustBoundaryType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technical_assets_inside: Vec<String>,
    #[serde(default)]
    pub trust_boundaries_nested: Vec<String>,
}

impl TrustBoundary {
    pub fn is_tagged_with_any(&self, tags: &[&str]) -> bool {
        tagged_with_any(&self.tags, tags)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedRuntime {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technical_assets_running: Vec<String>,
}

impl SharedRuntime {
    pub fn is_tagged_with_any(&self, tags: &[&str]) -> bool {
        tagged_with_any(&self.tags, tags)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskCategory {
    pub id: String,
    pub title: String,
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
    pub function: RiskFunction,
    pub stride: Stride,
    /// Marks categories whose findings usually indicate a modeling mistake
    /// rather than a vulnerability of the modeled system.
    #[serde(default)]
    pub model_failure_possible_reason: bool,
    #[serde(default)]
    pub cwe: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Risk {
    #[serde(rename = "category")]
    pub category_id: String,
    pub severity: RiskSeverity,
    pub exploitation_likelihood: RiskExploitationLikelihood,
    pub exploitation_impact: RiskExploitationImpact,
    pub title: String,
    pub synthetic_id: String,
    /// Optional entity references; empty means not set, keeping the wire
    /// format identical to what independently built plugins emit.
    #[serde(rename = "most_relevant_data_asset", default)]
    pub most_relevant_data_asset_id: String,
    #[serde(rename = "most_relevant_technical_asset", default)]
    pub most_relevant_technical_asset_id: String,
    #[serde(rename = "most_relevant_trust_boundary", default)]
    pub most_relevant_trust_boundary_id: String,
    #[serde(rename = "most_relevant_shared_runtime", default)]
    pub most_relevant_shared_runtime_id: String,
    #[serde(rename = "most_relevant_communication_link", default)]
    pub most_relevant_communication_link_id: String,
    pub data_breach_probability: DataBreachProbability,
    #[serde(rename = "data_breach_technical_assets", default)]
    pub data_breach_technical_asset_ids: Vec<String>,
}

impl Risk {
    /// Recompute the synthetic id from the category and entity references.
    pub fn update_synthetic_id(&mut self) {
        self.synthetic_id = synthetic_risk_id(
            &self.category_id,
            &self.most_relevant_technical_asset_id,
            &self.most_relevant_communication_link_id,
            &self.most_relevant_trust_boundary_id,
            &self.most_relevant_shared_runtime_id,
            &self.most_relevant_data_asset_id,
        );
    }
}

/// Deterministic composite risk identity: the category id followed by every
/// non-empty entity reference, each in a fixed position. The id is the sole
/// key for deduplication and cross-run tracking.
pub fn synthetic_risk_id(
    category_id: &str,
    technical_asset_id: &str,
    communication_link_id: &str,
    trust_boundary_id: &str,
    shared_runtime_id: &str,
    data_asset_id: &str,
) -> String {
    let mut result = category_id.to_string();
    for part in [
        technical_asset_id,
        communication_link_id,
        trust_boundary_id,
        shared_runtime_id,
        data_asset_id,
    ] {
        if !part.is_empty() {
            result.push('@');
            result.push_str(part);
        }
    }
    result
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskTracking {
    pub synthetic_risk_id: String,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub checked_by: String,
    pub status: RiskStatus,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_id_keeps_reference_order() {
        assert_eq!(synthetic_risk_id("xss", "web-1", "", "", "", ""), "xss@web-1");
        assert_eq!(
            synthetic_risk_id("sqli", "db-1", "app>query", "", "", "customer-data"),
            "sqli@db-1@app>query@customer-data"
        );
        assert_eq!(synthetic_risk_id("missing-vault", "", "", "", "", ""), "missing-vault");
    }

    #[test]
    fn update_synthetic_id_reads_reference_fields() {
        let mut risk = Risk {
            category_id: "unguarded-access".to_string(),
            most_relevant_technical_asset_id: "db".to_string(),
            most_relevant_communication_link_id: "app>read".to_string(),
            ..Risk::default()
        };
        risk.update_synthetic_id();
        assert_eq!(risk.synthetic_id, "unguarded-access@db@app>read");
    }

    #[test]
    fn tags_match_case_insensitively() {
        let asset = TechnicalAsset {
            tags: vec!["Git".to_string(), "  legacy ".to_string()],
            ..TechnicalAsset::default()
        };
        assert!(asset.is_tagged_with_any(&["git"]));
        assert!(asset.is_tagged_with_any(&["LEGACY", "other"]));
        assert!(!asset.is_tagged_with_any(&["svn"]));
    }

    #[test]
    fn risk_serializes_with_original_wire_names() {
        let risk = Risk {
            category_id: "xss".to_string(),
            most_relevant_technical_asset_id: "web".to_string(),
            ..Risk::default()
        };
        let value = serde_json::to_value(&risk).unwrap();
        assert_eq!(value["category"], "xss");
        assert_eq!(value["most_relevant_technical_asset"], "web");
        assert_eq!(value["data_breach_probability"], "improbable");
    }
}
