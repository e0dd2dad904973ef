//! Rules about data in transit.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::technology::attributes;
use kakoi_types::{
    calculate_severity, Authentication, CommunicationLink, Confidentiality, Criticality,
    DataBreachProbability, Risk, RiskCategory, RiskExploitationImpact,
    RiskExploitationLikelihood, RiskFunction, Stride, TechnicalAsset, Usage,
};

use crate::traits::{RiskRule, RuleError};

pub struct UnencryptedCommunicationRule;

fn high_sensitivity(model: &ParsedModel, data_asset_id: &str) -> bool {
    model
        .data_assets
        .get(data_asset_id)
        .map(|data| {
            data.confidentiality == Confidentiality::StrictlyConfidential
                || data.integrity == Criticality::MissionCritical
        })
        .unwrap_or(false)
}

fn medium_sensitivity(model: &ParsedModel, data_asset_id: &str) -> bool {
    model
        .data_assets
        .get(data_asset_id)
        .map(|data| {
            data.confidentiality == Confidentiality::Confidential
                || data.integrity == Criticality::Critical
        })
        .unwrap_or(false)
}

impl UnencryptedCommunicationRule {
    fn create_risk(
        &self,
        model: &ParsedModel,
        source: &TechnicalAsset,
        data_flow: &CommunicationLink,
        high_risk: bool,
        transferring_auth_data: bool,
    ) -> Risk {
        let impact = if high_risk {
            RiskExploitationImpact::High
        } else {
            RiskExploitationImpact::Medium
        };
        let likelihood = if model.is_across_trust_boundary_network_only(data_flow) {
            RiskExploitationLikelihood::Likely
        } else {
            RiskExploitationLikelihood::Unlikely
        };
        let target_title = model
            .technical_assets
            .get(&data_flow.target_id)
            .map(|target| target.title.clone())
            .unwrap_or_else(|| data_flow.target_id.clone());
        let mut title = format!(
            "Unencrypted communication {} between {} and {target_title}",
            data_flow.title, source.title
        );
        if transferring_auth_data {
            title.push_str(" transferring authentication data");
        }
        let mut risk = Risk {
            category_id: self.category().id,
            severity: calculate_severity(likelihood, impact),
            exploitation_likelihood: likelihood,
            exploitation_impact: impact,
            title,
            most_relevant_technical_asset_id: source.id.clone(),
            most_relevant_communication_link_id: data_flow.id.clone(),
            data_breach_probability: DataBreachProbability::Possible,
            data_breach_technical_asset_ids: vec![data_flow.target_id.clone()],
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risk
    }
}

#[async_trait]
impl RiskRule for UnencryptedCommunicationRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "unencrypted-communication".to_string(),
            title: "Unencrypted Communication".to_string(),
            description: "Sensitive data in transit requires transport encryption.".to_string(),
            impact: "Eavesdroppers on the network path can read or modify transferred data."
                .to_string(),
            asvs: "V9 - Communications Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Transport_Layer_Protection_Cheat_Sheet.html"
                    .to_string(),
            action: "Encryption of Communication Links".to_string(),
            mitigation: "Switch the link to an encrypted protocol variant.".to_string(),
            check: "Is every link carrying sensitive or authentication data encrypted?"
                .to_string(),
            detection_logic: "Unencrypted, non-process-local links transferring sensitive data \
                              or authentication material; endpoints tolerating unprotected \
                              communication are exempt, VPN only downgrades medium-sensitivity \
                              findings."
                .to_string(),
            risk_assessment: "High impact for strictly-confidential or mission-critical \
                              payloads and for authentication data."
                .to_string(),
            false_positives: "Links carrying exclusively public data.".to_string(),
            function: RiskFunction::Operations,
            stride: Stride::InformationDisclosure,
            model_failure_possible_reason: false,
            cwe: 319,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for source in model.technical_assets.values() {
            for data_flow in &source.communication_links {
                let Some(target) = model.technical_assets.get(&data_flow.target_id) else {
                    continue;
                };
                if source.out_of_scope && target.out_of_scope {
                    continue;
                }
                if data_flow.protocol.is_encrypted()
                    || data_flow.protocol.is_process_local()
                    || source.tech_attribute(attributes::UNPROTECTED_COMMUNICATIONS_TOLERATED)
                    || target.tech_attribute(attributes::UNPROTECTED_COMMUNICATIONS_TOLERATED)
                {
                    continue;
                }
                let transferring_auth_data = data_flow.authentication != Authentication::None;
                for data_asset_id in data_flow
                    .data_assets_sent
                    .iter()
                    .chain(data_flow.data_assets_received.iter())
                {
                    if high_sensitivity(model, data_asset_id) || transferring_auth_data {
                        risks.push(self.create_risk(
                            model,
                            source,
                            data_flow,
                            true,
                            transferring_auth_data,
                        ));
                        break;
                    }
                    if !data_flow.vpn && medium_sensitivity(model, data_asset_id) {
                        risks.push(self.create_risk(
                            model,
                            source,
                            data_flow,
                            false,
                            transferring_auth_data,
                        ));
                        break;
                    }
                }
            }
        }
        Ok(risks)
    }
}

pub struct DosRiskyAccessAcrossTrustBoundaryRule;

impl DosRiskyAccessAcrossTrustBoundaryRule {
    fn check_flow(
        &self,
        model: &ParsedModel,
        asset: &TechnicalAsset,
        incoming: &CommunicationLink,
        hop_between: &str,
        risks: &mut Vec<Risk>,
    ) {
        if !model.is_across_trust_boundary_network_only(incoming)
            || incoming.protocol.is_process_local()
            || incoming.usage == Usage::DevOps
        {
            return;
        }
        let more_risky = asset.availability == Criticality::MissionCritical
            && !incoming.vpn
            && !incoming.ip_filtered
            && !asset.redundant;
        let impact = if more_risky {
            RiskExploitationImpact::Medium
        } else {
            RiskExploitationImpact::Low
        };
        let hop = if hop_between.is_empty() {
            String::new()
        } else {
            format!(" forwarded via {hop_between}")
        };
        let mut risk = Risk {
            category_id: self.category().id,
            severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
            exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
            exploitation_impact: impact,
            title: format!(
                "Denial-of-service risky access of {} via {}{hop}",
                asset.title, incoming.title
            ),
            most_relevant_technical_asset_id: asset.id.clone(),
            most_relevant_communication_link_id: incoming.id.clone(),
            data_breach_probability: DataBreachProbability::Improbable,
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risks.push(risk);
    }
}

#[async_trait]
impl RiskRule for DosRiskyAccessAcrossTrustBoundaryRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "dos-risky-access-across-trust-boundary".to_string(),
            title: "DoS-risky Access Across Trust Boundary".to_string(),
            description: "Availability-critical assets reached across network boundaries are \
                          denial-of-service targets."
                .to_string(),
            impact: "An attacker outside the boundary can degrade a critical service."
                .to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Denial_of_Service_Cheat_Sheet.html"
                    .to_string(),
            action: "Anti-DoS Measures".to_string(),
            mitigation: "Apply rate limiting, IP filtering, VPN protection or redundancy."
                .to_string(),
            check: "Are boundary-crossing accesses to critical services throttled or shielded?"
                .to_string(),
            detection_logic: "Non-DevOps, non-process-local accesses across a network trust \
                              boundary into in-scope assets rated critical (or higher) for \
                              availability; traffic-forwarding callers are traversed one hop."
                .to_string(),
            risk_assessment: "Medium impact for mission-critical availability without VPN, IP \
                              filtering or redundancy."
                .to_string(),
            false_positives: "Accesses already throttled upstream.".to_string(),
            function: RiskFunction::Operations,
            stride: Stride::DenialOfService,
            model_failure_possible_reason: false,
            cwe: 400,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope
                || asset.has_technology("load-balancer")
                || asset.availability < Criticality::Critical
            {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                let Some(source) = model.technical_assets.get(&incoming.source_id) else {
                    continue;
                };
                if source.tech_attribute(attributes::TRAFFIC_FORWARDING) {
                    // walk one hop up to the forwarder's callers
                    for callers_link in model.incoming_links(&source.id) {
                        self.check_flow(model, asset, callers_link, &source.title, &mut risks);
                    }
                } else {
                    self.check_flow(model, asset, incoming, "", &mut risks);
                }
            }
        }
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{asset, link, model, network_boundary, sensitive_data};
    use kakoi_types::Protocol;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    #[test]
    fn plaintext_sensitive_transfer_is_flagged_high() {
        let mut app = asset("app", "application-server");
        let mut flow = link("app", "db");
        flow.protocol = Protocol::Jdbc;
        flow.data_assets_sent = vec!["records".to_string()];
        app.communication_links.push(flow);
        let db = crate::test_support::datastore("db", "database");
        let model = model(vec![app, db], vec![sensitive_data("records")], vec![]);
        let risks = runtime()
            .block_on(UnencryptedCommunicationRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
    }

    #[test]
    fn encrypted_protocol_produces_no_risk() {
        let mut app = asset("app", "application-server");
        let mut flow = link("app", "db");
        flow.protocol = Protocol::JdbcEncrypted;
        flow.data_assets_sent = vec!["records".to_string()];
        app.communication_links.push(flow);
        let db = crate::test_support::datastore("db", "database");
        let model = model(vec![app, db], vec![sensitive_data("records")], vec![]);
        let risks = runtime()
            .block_on(UnencryptedCommunicationRule.generate_risks(&model))
            .unwrap();
        assert!(risks.is_empty());
    }

    #[test]
    fn auth_data_on_plaintext_link_is_flagged_even_without_payload_sensitivity() {
        let mut client = asset("client", "client-system");
        let mut flow = link("client", "app");
        flow.protocol = Protocol::Http;
        flow.authentication = Authentication::Credentials;
        flow.data_assets_sent = vec!["telemetry".to_string()];
        client.communication_links.push(flow);
        let app = asset("app", "application-server");
        let mut telemetry = sensitive_data("telemetry");
        telemetry.confidentiality = Confidentiality::Internal;
        telemetry.integrity = Criticality::Operational;
        let model = model(vec![client, app], vec![telemetry], vec![]);
        let risks = runtime()
            .block_on(UnencryptedCommunicationRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert!(risks[0].title.contains("authentication data"));
    }

    #[test]
    fn dos_rule_requires_boundary_crossing_and_availability() {
        let mut core = asset("core", "application-server");
        core.availability = Criticality::MissionCritical;
        let mut outside = asset("outside", "client-system");
        let mut flow = link("outside", "core");
        flow.protocol = Protocol::Https;
        outside.communication_links.push(flow);
        let model = model(
            vec![outside, core],
            vec![],
            vec![network_boundary("internal", &["core"])],
        );
        let risks = runtime()
            .block_on(DosRiskyAccessAcrossTrustBoundaryRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        // mission-critical without protections tiers up
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::Medium);
    }

    #[test]
    fn devops_flows_are_exempt_from_dos_rule() {
        let mut core = asset("core", "application-server");
        core.availability = Criticality::Critical;
        let mut outside = asset("outside", "devops-client");
        let mut flow = link("outside", "core");
        flow.protocol = Protocol::Ssh;
        flow.usage = Usage::DevOps;
        outside.communication_links.push(flow);
        let model = model(
            vec![outside, core],
            vec![],
            vec![network_boundary("internal", &["core"])],
        );
        let risks = runtime()
            .block_on(DosRiskyAccessAcrossTrustBoundaryRule.generate_risks(&model))
            .unwrap();
        assert!(risks.is_empty());
    }
}
