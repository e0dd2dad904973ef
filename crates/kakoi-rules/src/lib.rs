//! Risk rules: the polymorphic rule contract and the built-in catalog.
//!
//! A rule is a pure function of the linked model. Built-in rules run
//! in-process; custom rules are backed by plugin executables
//! ([`custom::SubprocessRule`]). The orchestrator in `kakoi-engine` treats
//! both uniformly through the [`RiskRule`] trait.

pub mod builtin;
pub mod custom;
pub mod traits;

pub use custom::SubprocessRule;
pub use traits::{RiskRule, RuleError};

#[cfg(test)]
pub(crate) mod test_support {
    use kakoi_model::ParsedModel;
    use kakoi_types::{
        CommunicationLink, Confidentiality, Criticality, DataAsset, TechnicalAsset,
        TechnicalAssetType, TechnologyRegistry, TrustBoundary, TrustBoundaryType,
    };

    pub fn asset(id: &str, technology: &str) -> TechnicalAsset {
        let registry = TechnologyRegistry::builtin();
        TechnicalAsset {
            id: id.to_string(),
            title: id.to_string(),
            technologies: registry
                .get(technology)
                .cloned()
                .map(|t| vec![t])
                .unwrap_or_default(),
            ..TechnicalAsset::default()
        }
    }

    pub fn datastore(id: &str, technology: &str) -> TechnicalAsset {
        TechnicalAsset {
            asset_type: TechnicalAssetType::Datastore,
            ..asset(id, technology)
        }
    }

    pub fn link(source: &str, target: &str) -> CommunicationLink {
        CommunicationLink {
            id: format!("{source}>{target}"),
            source_id: source.to_string(),
            target_id: target.to_string(),
            title: format!("{source} to {target}"),
            ..CommunicationLink::default()
        }
    }

    pub fn sensitive_data(id: &str) -> DataAsset {
        DataAsset {
            id: id.to_string(),
            title: id.to_string(),
            confidentiality: Confidentiality::StrictlyConfidential,
            integrity: Criticality::Critical,
            availability: Criticality::Operational,
            ..DataAsset::default()
        }
    }

    pub fn network_boundary(id: &str, asset_ids: &[&str]) -> TrustBoundary {
        TrustBoundary {
            id: id.to_string(),
            title: id.to_string(),
            boundary_type: TrustBoundaryType::NetworkOnPrem,
            technical_assets_inside: asset_ids.iter().map(|s| s.to_string()).collect(),
            ..TrustBoundary::default()
        }
    }

    /// Assembles a model with the derived indices rules rely on (incoming
    /// links, link table, boundary containment).
    pub fn model(
        assets: Vec<TechnicalAsset>,
        data_assets: Vec<DataAsset>,
        boundaries: Vec<TrustBoundary>,
    ) -> ParsedModel {
        let mut model = ParsedModel::default();
        for data_asset in data_assets {
            model.data_assets.insert(data_asset.id.clone(), data_asset);
        }
        for boundary in boundaries {
            for asset_id in &boundary.technical_assets_inside {
                model
                    .direct_containing_trust_boundary_by_asset_id
                    .insert(asset_id.clone(), boundary.id.clone());
            }
            model.trust_boundaries.insert(boundary.id.clone(), boundary);
        }
        for asset in assets {
            for link in &asset.communication_links {
                model
                    .communication_links
                    .insert(link.id.clone(), link.clone());
                model
                    .incoming_links_by_target_id
                    .entry(link.target_id.clone())
                    .or_default()
                    .push(link.clone());
            }
            model.technical_assets.insert(asset.id.clone(), asset);
        }
        model
    }
}
