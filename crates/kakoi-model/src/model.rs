//! The linked architecture model and its query surface.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kakoi_types::{
    CommunicationLink, Confidentiality, Criticality, DataAsset, Risk, RiskCategory, RiskTracking,
    SharedRuntime, TechnicalAsset, TrustBoundary,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub homepage: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub description: String,
    /// Image file name mapped to its caption, one map per image.
    #[serde(default)]
    pub images: Vec<BTreeMap<String, String>>,
}

/// Fully linked architecture model. Built once by the linker, read-only for
/// rule evaluation; the derived indices at the bottom are rebuilt every run
/// and never authored by users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedModel {
    pub title: String,
    pub author: Author,
    pub date: NaiveDate,
    pub management_summary_comment: String,
    pub business_overview: Overview,
    pub technical_overview: Overview,
    pub business_criticality: Criticality,
    pub security_requirements: BTreeMap<String, String>,
    pub questions: BTreeMap<String, String>,
    pub abuse_cases: BTreeMap<String, String>,
    pub tags_available: Vec<String>,
    pub data_assets: BTreeMap<String, DataAsset>,
    pub technical_assets: BTreeMap<String, TechnicalAsset>,
    pub trust_boundaries: BTreeMap<String, TrustBoundary>,
    pub shared_runtimes: BTreeMap<String, SharedRuntime>,
    pub individual_risk_categories: BTreeMap<String, RiskCategory>,
    pub built_in_risk_categories: BTreeMap<String, RiskCategory>,
    pub risk_tracking: BTreeMap<String, RiskTracking>,

    /// Every communication link, addressable by its derived id.
    pub communication_links: BTreeMap<String, CommunicationLink>,
    /// Reverse traversal: who is calling me.
    pub incoming_links_by_target_id: BTreeMap<String, Vec<CommunicationLink>>,
    /// Direct (not transitive) trust-boundary membership, boundary id per asset.
    pub direct_containing_trust_boundary_by_asset_id: BTreeMap<String, String>,
    pub all_supported_tags: BTreeSet<String>,
    pub generated_risks_by_category: BTreeMap<String, Vec<Risk>>,
    /// Lower-cased synthetic id -> risk, rebuilt after rule evaluation; used
    /// exclusively by risk-tracking lookups.
    pub generated_risks_by_synthetic_id: BTreeMap<String, Risk>,
}

impl ParsedModel {
    pub fn in_scope_technical_assets(&self) -> Vec<&TechnicalAsset> {
        self.technical_assets
            .values()
            .filter(|asset| !asset.out_of_scope)
            .collect()
    }

    pub fn out_of_scope_technical_assets(&self) -> Vec<&TechnicalAsset> {
        let mut assets: Vec<&TechnicalAsset> = self
            .technical_assets
            .values()
            .filter(|asset| asset.out_of_scope)
            .collect();
        assets.sort_by(|a, b| a.title.cmp(&b.title));
        assets
    }

    /// Already sorted thanks to the ordered asset map.
    pub fn sorted_technical_asset_ids(&self) -> Vec<&str> {
        self.technical_assets.keys().map(String::as_str).collect()
    }

    pub fn incoming_links(&self, target_id: &str) -> &[CommunicationLink] {
        self.incoming_links_by_target_id
            .get(target_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn add_to_supported_tags(&mut self, tags: &[String]) {
        self.all_supported_tags.extend(tags.iter().cloned());
    }

    pub fn tags_actually_used(&self) -> Vec<String> {
        self.tags_available
            .iter()
            .filter(|tag| {
                let tags = [tag.as_str()];
                !self.technical_assets_tagged_with_any(&tags).is_empty()
                    || !self.communication_links_tagged_with_any(&tags).is_empty()
                    || !self.data_assets_tagged_with_any(&tags).is_empty()
                    || !self.trust_boundaries_tagged_with_any(&tags).is_empty()
                    || !self.shared_runtimes_tagged_with_any(&tags).is_empty()
            })
            .cloned()
            .collect()
    }

    pub fn technical_assets_tagged_with_any(&self, tags: &[&str]) -> Vec<&TechnicalAsset> {
        self.technical_assets
            .values()
            .filter(|candidate| candidate.is_tagged_with_any(tags))
            .collect()
    }

    pub fn communication_links_tagged_with_any(&self, tags: &[&str]) -> Vec<&CommunicationLink> {
        self.technical_assets
            .values()
            .flat_map(|asset| asset.communication_links.iter())
            .filter(|candidate| candidate.is_tagged_with_any(tags))
            .collect()
    }

    pub fn data_assets_tagged_with_any(&self, tags: &[&str]) -> Vec<&DataAsset> {
        self.data_assets
            .values()
            .filter(|candidate| candidate.is_tagged_with_any(tags))
            .collect()
    }

    pub fn trust_boundaries_tagged_with_any(&self, tags: &[&str]) -> Vec<&TrustBoundary> {
        self.trust_boundaries
            .values()
            .filter(|candidate| candidate.is_tagged_with_any(tags))
            .collect()
    }

    pub fn shared_runtimes_tagged_with_any(&self, tags: &[&str]) -> Vec<&SharedRuntime> {
        self.shared_runtimes
            .values()
            .filter(|candidate| candidate.is_tagged_with_any(tags))
            .collect()
    }

    fn data_asset_ratings<'a>(
        &'a self,
        asset: &'a TechnicalAsset,
    ) -> impl Iterator<Item = &'a DataAsset> {
        asset
            .data_assets_processed
            .iter()
            .chain(asset.data_assets_stored.iter())
            .filter_map(|id| self.data_assets.get(id))
    }

    /// The asset's own rating or the highest rating of any data asset it
    /// touches, whichever is greater.
    pub fn highest_processed_confidentiality(&self, asset: &TechnicalAsset) -> Confidentiality {
        self.data_asset_ratings(asset)
            .map(|data| data.confidentiality)
            .max()
            .map_or(asset.confidentiality, |highest| {
                highest.max(asset.confidentiality)
            })
    }

    pub fn highest_processed_integrity(&self, asset: &TechnicalAsset) -> Criticality {
        self.data_asset_ratings(asset)
            .map(|data| data.integrity)
            .max()
            .map_or(asset.integrity, |highest| highest.max(asset.integrity))
    }

    pub fn highest_processed_availability(&self, asset: &TechnicalAsset) -> Criticality {
        self.data_asset_ratings(asset)
            .map(|data| data.availability)
            .max()
            .map_or(asset.availability, |highest| highest.max(asset.availability))
    }

    fn link_data_assets<'a>(
        &'a self,
        link: &'a CommunicationLink,
    ) -> impl Iterator<Item = &'a DataAsset> {
        link.data_assets_sent
            .iter()
            .chain(link.data_assets_received.iter())
            .filter_map(|id| self.data_assets.get(id))
    }

    pub fn link_highest_confidentiality(&self, link: &CommunicationLink) -> Confidentiality {
        self.link_data_assets(link)
            .map(|data| data.confidentiality)
            .max()
            .unwrap_or_default()
    }

    pub fn link_highest_integrity(&self, link: &CommunicationLink) -> Criticality {
        self.link_data_assets(link)
            .map(|data| data.integrity)
            .max()
            .unwrap_or_default()
    }

    pub fn link_highest_availability(&self, link: &CommunicationLink) -> Criticality {
        self.link_data_assets(link)
            .map(|data| data.availability)
            .max()
            .unwrap_or_default()
    }

    pub fn trust_boundary_highest_confidentiality(
        &self,
        boundary: &TrustBoundary,
    ) -> Confidentiality {
        self.recursively_all_technical_asset_ids_inside(boundary)
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .map(|asset| self.highest_processed_confidentiality(asset))
            .max()
            .unwrap_or_default()
    }

    pub fn trust_boundary_highest_integrity(&self, boundary: &TrustBoundary) -> Criticality {
        self.recursively_all_technical_asset_ids_inside(boundary)
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .map(|asset| self.highest_processed_integrity(asset))
            .max()
            .unwrap_or_default()
    }

    pub fn trust_boundary_highest_availability(&self, boundary: &TrustBoundary) -> Criticality {
        self.recursively_all_technical_asset_ids_inside(boundary)
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .map(|asset| self.highest_processed_availability(asset))
            .max()
            .unwrap_or_default()
    }

    pub fn shared_runtime_highest_confidentiality(
        &self,
        runtime: &SharedRuntime,
    ) -> Confidentiality {
        runtime
            .technical_assets_running
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .map(|asset| self.highest_processed_confidentiality(asset))
            .max()
            .unwrap_or_default()
    }

    pub fn shared_runtime_highest_integrity(&self, runtime: &SharedRuntime) -> Criticality {
        runtime
            .technical_assets_running
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .map(|asset| self.highest_processed_integrity(asset))
            .max()
            .unwrap_or_default()
    }

    pub fn shared_runtime_highest_availability(&self, runtime: &SharedRuntime) -> Criticality {
        runtime
            .technical_assets_running
            .iter()
            .filter_map(|id| self.technical_assets.get(id))
            .map(|asset| self.highest_processed_availability(asset))
            .max()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakoi_types::Usage;

    fn model_with_data_asset(confidentiality: Confidentiality) -> ParsedModel {
        let mut model = ParsedModel::default();
        model.data_assets.insert(
            "records".to_string(),
            DataAsset {
                id: "records".to_string(),
                title: "Records".to_string(),
                confidentiality,
                integrity: Criticality::Critical,
                availability: Criticality::Operational,
                ..DataAsset::default()
            },
        );
        model
    }

    #[test]
    fn highest_processed_ratings_never_drop_below_own_rating() {
        let model = model_with_data_asset(Confidentiality::Restricted);
        let asset = TechnicalAsset {
            id: "app".to_string(),
            confidentiality: Confidentiality::Confidential,
            integrity: Criticality::Operational,
            data_assets_processed: vec!["records".to_string()],
            ..TechnicalAsset::default()
        };
        // own confidentiality higher than the data asset's
        assert_eq!(
            model.highest_processed_confidentiality(&asset),
            Confidentiality::Confidential
        );
        // data asset integrity higher than the asset's own
        assert_eq!(
            model.highest_processed_integrity(&asset),
            Criticality::Critical
        );
    }

    #[test]
    fn link_ratings_cover_sent_and_received() {
        let model = model_with_data_asset(Confidentiality::StrictlyConfidential);
        let link = CommunicationLink {
            data_assets_received: vec!["records".to_string()],
            usage: Usage::Business,
            ..CommunicationLink::default()
        };
        assert_eq!(
            model.link_highest_confidentiality(&link),
            Confidentiality::StrictlyConfidential
        );
        assert_eq!(model.link_highest_integrity(&link), Criticality::Critical);
    }

    #[test]
    fn empty_model_queries_return_empty_collections() {
        let model = ParsedModel::default();
        assert!(model.in_scope_technical_assets().is_empty());
        assert!(model.sorted_technical_asset_ids().is_empty());
        assert!(model.tags_actually_used().is_empty());
        assert!(model.incoming_links("nowhere").is_empty());
    }
}
