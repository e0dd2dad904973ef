//! Rules about reachability: datastores exposed across network boundaries,
//! internet-facing access and missing segmentation.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::technology::attributes;
use kakoi_types::{
    calculate_severity, CommunicationLink, Confidentiality, Criticality, DataBreachProbability,
    Protocol, Risk, RiskCategory, RiskExploitationImpact, RiskExploitationLikelihood,
    RiskFunction, Stride, TechnicalAsset, TechnicalAssetType, Usage,
};

use crate::traits::{RiskRule, RuleError};

pub struct UnguardedDirectDatastoreAccessRule;

impl UnguardedDirectDatastoreAccessRule {
    fn create_risk(
        &self,
        datastore: &TechnicalAsset,
        data_flow: &CommunicationLink,
        more_risky: bool,
    ) -> Risk {
        let impact = if more_risky || datastore.raa > 40.0 {
            RiskExploitationImpact::Medium
        } else {
            RiskExploitationImpact::Low
        };
        let mut risk = Risk {
            category_id: self.category().id,
            severity: calculate_severity(RiskExploitationLikelihood::Likely, impact),
            exploitation_likelihood: RiskExploitationLikelihood::Likely,
            exploitation_impact: impact,
            title: format!(
                "Unguarded direct datastore access of {} via {}",
                datastore.title, data_flow.title
            ),
            most_relevant_technical_asset_id: datastore.id.clone(),
            most_relevant_communication_link_id: data_flow.id.clone(),
            data_breach_probability: DataBreachProbability::Improbable,
            data_breach_technical_asset_ids: vec![datastore.id.clone()],
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risk
    }
}

fn file_server_access_via_ftp(asset: &TechnicalAsset, incoming: &CommunicationLink) -> bool {
    asset.tech_attribute(attributes::FILE_STORAGE)
        && matches!(
            incoming.protocol,
            Protocol::Ftp | Protocol::Ftps | Protocol::Sftp
        )
}

#[async_trait]
impl RiskRule for UnguardedDirectDatastoreAccessRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "unguarded-direct-datastore-access".to_string(),
            title: "Unguarded Direct Datastore Access".to_string(),
            description: "Datastores accessed across trust boundaries should be guarded by a \
                          protecting service or application."
                .to_string(),
            impact: "Attackers may directly target sensitive datastores without any protecting \
                     component in between."
                .to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Encapsulation of Datastore".to_string(),
            mitigation: "Put a guarding service in front of the datastore.".to_string(),
            check: "Is the datastore only reachable through a guarding service?".to_string(),
            detection_logic: "In-scope datastores with confidentiality confidential (or higher) \
                              or integrity critical (or higher) receiving non-DevOps data flows \
                              from assets beyond a network trust boundary; identity stores \
                              accessed by identity providers and file servers accessed via file \
                              transfer protocols are excluded."
                .to_string(),
            risk_assessment: "Medium impact when the datastore is rated strictly-confidential or \
                              mission-critical or carries a high attacker attractiveness."
                .to_string(),
            false_positives: "Callers that are fully trusted parts of the datastore itself."
                .to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: false,
            cwe: 501,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope || asset.asset_type != TechnicalAssetType::Datastore {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                let Some(source) = model.technical_assets.get(&incoming.source_id) else {
                    continue;
                };
                if asset.tech_attribute(attributes::IDENTITY_STORE)
                    && source.tech_attribute(attributes::IDENTITY_PROVIDER)
                {
                    continue;
                }
                if asset.confidentiality < Confidentiality::Confidential
                    && asset.integrity < Criticality::Critical
                {
                    continue;
                }
                if incoming.usage == Usage::DevOps {
                    continue;
                }
                if !model.is_across_trust_boundary_network_only(incoming)
                    || file_server_access_via_ftp(asset, incoming)
                    || model.is_sharing_same_parent_trust_boundary(&asset.id, &source.id)
                {
                    continue;
                }
                let more_risky = asset.confidentiality == Confidentiality::StrictlyConfidential
                    || asset.integrity == Criticality::MissionCritical;
                risks.push(self.create_risk(asset, incoming, more_risky));
            }
        }
        Ok(risks)
    }
}

pub struct UnguardedAccessFromInternetRule;

impl UnguardedAccessFromInternetRule {
    fn create_risk(
        &self,
        asset: &TechnicalAsset,
        data_flow: &CommunicationLink,
        more_risky: bool,
    ) -> Risk {
        let impact = if more_risky || asset.raa > 40.0 {
            RiskExploitationImpact::Medium
        } else {
            RiskExploitationImpact::Low
        };
        let mut risk = Risk {
            category_id: self.category().id,
            severity: calculate_severity(RiskExploitationLikelihood::VeryLikely, impact),
            exploitation_likelihood: RiskExploitationLikelihood::VeryLikely,
            exploitation_impact: impact,
            title: format!(
                "Unguarded access from internet to {} via {}",
                asset.title, data_flow.title
            ),
            most_relevant_technical_asset_id: asset.id.clone(),
            most_relevant_communication_link_id: data_flow.id.clone(),
            data_breach_probability: DataBreachProbability::Possible,
            data_breach_technical_asset_ids: vec![asset.id.clone()],
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risk
    }
}

#[async_trait]
impl RiskRule for UnguardedAccessFromInternetRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "unguarded-access-from-internet".to_string(),
            title: "Unguarded Access From Internet".to_string(),
            description: "Internet-exposed assets should be guarded by a protecting layer."
                .to_string(),
            impact: "Internet attackers may directly reach sensitive components.".to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Encapsulation of Technical Asset".to_string(),
            mitigation: "Encapsulate the asset behind a guarding service, gateway or proxy."
                .to_string(),
            check: "Is the asset only reachable from the internet through a hardened entry \
                    point?"
                .to_string(),
            detection_logic: "In-scope sensitive assets (other than load balancers and, for \
                              non-custom-developed web infrastructure, plain HTTP(S) entry \
                              points) directly called by internet-facing assets outside VPN \
                              protection."
                .to_string(),
            risk_assessment: "Medium impact when the asset is rated strictly-confidential or \
                              mission-critical."
                .to_string(),
            false_positives: "Deliberately public endpoints serving only public data.".to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: false,
            cwe: 862,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope || asset.has_technology("load-balancer") {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                let Some(source) = model.technical_assets.get(&incoming.source_id) else {
                    continue;
                };
                if !asset.custom_developed_parts {
                    let web_entry_point = (asset.has_technology("web-server")
                        || asset.has_technology("web-application")
                        || asset.has_technology("reverse-proxy")
                        || asset.has_technology("waf")
                        || asset.has_technology("gateway"))
                        && matches!(incoming.protocol, Protocol::Http | Protocol::Https);
                    let file_transfer_gateway = asset.has_technology("gateway")
                        && matches!(
                            incoming.protocol,
                            Protocol::Ftp | Protocol::Ftps | Protocol::Sftp
                        );
                    if web_entry_point || file_transfer_gateway {
                        continue;
                    }
                }
                if source.has_technology("monitoring") || incoming.vpn {
                    continue;
                }
                if asset.confidentiality < Confidentiality::Confidential
                    && asset.integrity < Criticality::Critical
                {
                    continue;
                }
                if source.internet {
                    let more_risky = asset.confidentiality
                        == Confidentiality::StrictlyConfidential
                        || asset.integrity == Criticality::MissionCritical;
                    risks.push(self.create_risk(asset, incoming, more_risky));
                }
            }
        }
        Ok(risks)
    }
}

pub struct MissingNetworkSegmentationRule;

const RAA_LIMIT: f64 = 50.0;

impl MissingNetworkSegmentationRule {
    fn create_risk(&self, asset: &TechnicalAsset, more_risky: bool) -> Risk {
        let impact = if more_risky {
            RiskExploitationImpact::Medium
        } else {
            RiskExploitationImpact::Low
        };
        let mut risk = Risk {
            category_id: self.category().id,
            severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
            exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
            exploitation_impact: impact,
            title: format!(
                "Missing network segmentation to protect {} from lower-protected assets in the \
                 same network segment",
                asset.title
            ),
            most_relevant_technical_asset_id: asset.id.clone(),
            data_breach_probability: DataBreachProbability::Improbable,
            data_breach_technical_asset_ids: vec![asset.id.clone()],
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risk
    }
}

#[async_trait]
impl RiskRule for MissingNetworkSegmentationRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "missing-network-segmentation".to_string(),
            title: "Missing Network Segmentation".to_string(),
            description: "High-value targets should be segmented away from unrelated, less \
                          protected assets."
                .to_string(),
            impact: "A compromised low-value asset in the same segment eases lateral movement \
                     towards high-value targets."
                .to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Network Segmentation".to_string(),
            mitigation: "Apply a zero-trust network architecture or segment sensitive assets \
                         into their own network zones."
                .to_string(),
            check: "Are sensitive assets isolated in dedicated network segments?".to_string(),
            detection_logic: "In-scope attacker-attractive assets (datastores or assets rated \
                              confidential/critical or higher) sharing their network segment \
                              with unrelated lower-protected assets they have no direct \
                              connection with; traffic-forwarding and security-control assets \
                              are exempt."
                .to_string(),
            risk_assessment: "Medium impact for strictly-confidential or mission-critical \
                              assets."
                .to_string(),
            false_positives: "Deliberately co-located assets forming one deployment unit."
                .to_string(),
            function: RiskFunction::Operations,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: false,
            cwe: 1008,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope
                || asset.tech_attribute(attributes::NO_NETWORK_SEGMENTATION_REQUIRED)
                || asset.tech_attribute(attributes::SECURITY_CONTROL_RELATED)
            {
                continue;
            }
            let attractive = asset.raa >= RAA_LIMIT
                && (asset.asset_type == TechnicalAssetType::Datastore
                    || asset.confidentiality >= Confidentiality::Confidential
                    || asset.integrity >= Criticality::Critical
                    || asset.availability >= Criticality::Critical);
            if !attractive {
                continue;
            }
            let exposed = model.technical_assets.values().any(|sparring| {
                sparring.id != asset.id
                    && sparring.tech_attribute(attributes::LESS_PROTECTED_TYPE)
                    && model.is_same_trust_boundary_network_only(&asset.id, &sparring.id)
                    && !asset.has_direct_connection(&sparring.id)
                    && !sparring.has_direct_connection(&asset.id)
                    && !sparring.tech_attribute(attributes::CLOSE_TO_HIGH_VALUE_TARGETS_TOLERATED)
            });
            if exposed {
                let more_risky = asset.confidentiality == Confidentiality::StrictlyConfidential
                    || asset.integrity == Criticality::MissionCritical
                    || asset.availability == Criticality::MissionCritical;
                risks.push(self.create_risk(asset, more_risky));
            }
        }
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{datastore, link, model, network_boundary, sensitive_data};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    #[test]
    fn datastore_accessed_across_network_boundary_is_flagged() {
        let mut db = datastore("db", "database");
        db.confidentiality = Confidentiality::StrictlyConfidential;
        let mut app = crate::test_support::asset("app", "web-application");
        app.communication_links.push(link("app", "db"));
        let model = model(
            vec![app, db],
            vec![sensitive_data("records")],
            vec![
                network_boundary("dmz", &["app"]),
                network_boundary("core", &["db"]),
            ],
        );

        let risks = runtime()
            .block_on(UnguardedDirectDatastoreAccessRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(
            risks[0].synthetic_id,
            "unguarded-direct-datastore-access@db@app>db"
        );
        // strictly-confidential datastore tiers up to medium impact
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
    }

    #[test]
    fn same_boundary_access_is_not_flagged() {
        let mut db = datastore("db", "database");
        db.confidentiality = Confidentiality::Confidential;
        let mut app = crate::test_support::asset("app", "web-application");
        app.communication_links.push(link("app", "db"));
        let model = model(
            vec![app, db],
            vec![],
            vec![network_boundary("core", &["app", "db"])],
        );
        let risks = runtime()
            .block_on(UnguardedDirectDatastoreAccessRule.generate_risks(&model))
            .unwrap();
        assert!(risks.is_empty());
    }

    #[test]
    fn internet_source_triggers_unguarded_access() {
        let mut backend = crate::test_support::asset("backend", "application-server");
        backend.confidentiality = Confidentiality::Confidential;
        backend.custom_developed_parts = true;
        let mut client = crate::test_support::asset("client", "browser");
        client.internet = true;
        let mut incoming = link("client", "backend");
        incoming.protocol = Protocol::Https;
        client.communication_links.push(incoming);
        let model = model(vec![client, backend], vec![], vec![]);

        let risks = runtime()
            .block_on(UnguardedAccessFromInternetRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].most_relevant_technical_asset_id, "backend");
    }

    #[test]
    fn segmentation_rule_needs_high_raa_and_a_less_protected_neighbor() {
        let mut db = datastore("db", "database");
        db.raa = 60.0;
        db.confidentiality = Confidentiality::Confidential;
        let mailer = crate::test_support::asset("mailer", "mail-server");
        let model = model(
            vec![db.clone(), mailer],
            vec![],
            vec![network_boundary("core", &["db", "mailer"])],
        );
        let risks = runtime()
            .block_on(MissingNetworkSegmentationRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);

        // below the attractiveness limit nothing fires
        db.raa = 10.0;
        let mailer = crate::test_support::asset("mailer", "mail-server");
        let quiet = crate::test_support::model(
            vec![db, mailer],
            vec![],
            vec![network_boundary("core", &["db", "mailer"])],
        );
        let risks = runtime()
            .block_on(MissingNetworkSegmentationRule.generate_risks(&quiet))
            .unwrap();
        assert!(risks.is_empty());
    }
}
