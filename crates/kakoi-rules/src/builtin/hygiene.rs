//! Model-hygiene rules: findings here usually point at the model itself.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::{
    calculate_severity, Confidentiality, Criticality, DataBreachProbability, Protocol, Risk,
    RiskCategory, RiskExploitationImpact, RiskExploitationLikelihood, RiskFunction, Stride,
};

use crate::traits::{RiskRule, RuleError};

pub struct IncompleteModelRule;

#[async_trait]
impl RiskRule for IncompleteModelRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "incomplete-model".to_string(),
            title: "Incomplete Model".to_string(),
            description: "Unknown technologies and unknown protocols hint at an unfinished \
                          model."
                .to_string(),
            impact: "Risks stay invisible where the model is vague.".to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Threat_Modeling_Cheat_Sheet.html"
                    .to_string(),
            action: "Threat Modeling Completeness".to_string(),
            mitigation: "Replace unknown technologies and protocols with their real values."
                .to_string(),
            check: "Are all technologies and protocols modeled concretely?".to_string(),
            detection_logic: "In-scope assets with unknown technology and communication links \
                              with unknown protocol."
                .to_string(),
            risk_assessment: "Low.".to_string(),
            false_positives: "None; the finding is about the model, not the system.".to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::InformationDisclosure,
            model_failure_possible_reason: true,
            cwe: 1008,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope {
                continue;
            }
            if asset.technology_unknown() {
                let mut risk = Risk {
                    category_id: self.category().id,
                    severity: calculate_severity(
                        RiskExploitationLikelihood::Unlikely,
                        RiskExploitationImpact::Low,
                    ),
                    exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
                    exploitation_impact: RiskExploitationImpact::Low,
                    title: format!("Unknown technology specified at {}", asset.title),
                    most_relevant_technical_asset_id: asset.id.clone(),
                    data_breach_probability: DataBreachProbability::Improbable,
                    data_breach_technical_asset_ids: vec![asset.id.clone()],
                    ..Risk::default()
                };
                risk.update_synthetic_id();
                risks.push(risk);
            }
            for link in &asset.communication_links {
                if link.protocol == Protocol::UnknownProtocol {
                    let mut risk = Risk {
                        category_id: self.category().id,
                        severity: calculate_severity(
                            RiskExploitationLikelihood::Unlikely,
                            RiskExploitationImpact::Low,
                        ),
                        exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
                        exploitation_impact: RiskExploitationImpact::Low,
                        title: format!(
                            "Unknown protocol specified for communication link {} at {}",
                            link.title, asset.title
                        ),
                        most_relevant_technical_asset_id: asset.id.clone(),
                        most_relevant_communication_link_id: link.id.clone(),
                        data_breach_probability: DataBreachProbability::Improbable,
                        data_breach_technical_asset_ids: vec![asset.id.clone()],
                        ..Risk::default()
                    };
                    risk.update_synthetic_id();
                    risks.push(risk);
                }
            }
        }
        Ok(risks)
    }
}

pub struct MissingVaultRule;

#[async_trait]
impl RiskRule for MissingVaultRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "missing-vault".to_string(),
            title: "Missing Vault (Secret Storage)".to_string(),
            description: "Architectures without a vault usually keep secrets in config files."
                .to_string(),
            impact: "Secrets spread over configuration are easy to leak and hard to rotate."
                .to_string(),
            asvs: "V6 - Stored Cryptography Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Secrets_Management_Cheat_Sheet.html"
                    .to_string(),
            action: "Vault (Secret Storage)".to_string(),
            mitigation: "Introduce a vault component to store and rotate secrets.".to_string(),
            check: "Is a dedicated secret storage in place?".to_string(),
            detection_logic: "Models without any vault technology; the most sensitive asset is \
                              referenced as an example."
                .to_string(),
            risk_assessment: "Medium impact once any asset is rated confidential/critical or \
                              higher."
                .to_string(),
            false_positives: "Architectures without any secrets to manage.".to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::InformationDisclosure,
            model_failure_possible_reason: false,
            cwe: 522,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut has_vault = false;
        let mut impact = RiskExploitationImpact::Low;
        let mut most_relevant_id = String::new();
        let mut most_relevant_score = f64::MIN;
        for asset in model.technical_assets.values() {
            if asset.has_technology("vault") {
                has_vault = true;
            }
            if model.highest_processed_confidentiality(asset) >= Confidentiality::Confidential
                || model.highest_processed_integrity(asset) >= Criticality::Critical
                || model.highest_processed_availability(asset) >= Criticality::Critical
            {
                impact = RiskExploitationImpact::Medium;
            }
            // reference the most sensitive asset as the finding's example
            if asset.highest_sensitivity_score() > most_relevant_score {
                most_relevant_score = asset.highest_sensitivity_score();
                most_relevant_id = asset.id.clone();
            }
        }
        if has_vault {
            return Ok(Vec::new());
        }
        let mut risk = Risk {
            category_id: self.category().id,
            severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
            exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
            exploitation_impact: impact,
            title: "Missing vault (secret storage) in the modeled architecture".to_string(),
            most_relevant_technical_asset_id: most_relevant_id,
            data_breach_probability: DataBreachProbability::Improbable,
            ..Risk::default()
        };
        risk.update_synthetic_id();
        Ok(vec![risk])
    }
}

pub struct UnnecessaryCommunicationLinkRule;

#[async_trait]
impl RiskRule for UnnecessaryCommunicationLinkRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "unnecessary-communication-link".to_string(),
            title: "Unnecessary Communication Link".to_string(),
            description: "Links transferring no data assets are either unnecessary or \
                          incompletely modeled."
                .to_string(),
            impact: "Every needless link widens the attack surface.".to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Attack Surface Reduction".to_string(),
            mitigation: "Remove the link or model the data it actually transfers.".to_string(),
            check: "Does every link transfer at least one data asset?".to_string(),
            detection_logic: "Communication links with neither sent nor received data assets \
                              where either endpoint is in scope."
                .to_string(),
            risk_assessment: "Low.".to_string(),
            false_positives: "None; the finding is about the model, not the system.".to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: true,
            cwe: 1008,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            for link in &asset.communication_links {
                if !link.data_assets_sent.is_empty() || !link.data_assets_received.is_empty() {
                    continue;
                }
                let target_out_of_scope = model
                    .technical_assets
                    .get(&link.target_id)
                    .map(|target| target.out_of_scope)
                    .unwrap_or(false);
                if asset.out_of_scope && target_out_of_scope {
                    continue;
                }
                let mut risk = Risk {
                    category_id: self.category().id,
                    severity: calculate_severity(
                        RiskExploitationLikelihood::Unlikely,
                        RiskExploitationImpact::Low,
                    ),
                    exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
                    exploitation_impact: RiskExploitationImpact::Low,
                    title: format!(
                        "Unnecessary communication link {} at {}",
                        link.title, asset.title
                    ),
                    most_relevant_technical_asset_id: asset.id.clone(),
                    most_relevant_communication_link_id: link.id.clone(),
                    data_breach_probability: DataBreachProbability::Improbable,
                    data_breach_technical_asset_ids: vec![asset.id.clone()],
                    ..Risk::default()
                };
                risk.update_synthetic_id();
                risks.push(risk);
            }
        }
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{asset, link, model};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    #[test]
    fn unknown_technology_and_protocol_are_model_failures() {
        let mut vague = asset("mystery", "unknown-technology");
        let mut unknown_link = link("mystery", "other");
        unknown_link.protocol = Protocol::UnknownProtocol;
        vague.communication_links.push(unknown_link);
        let other = asset("other", "database");
        let model = model(vec![vague, other], vec![], vec![]);
        let rule = IncompleteModelRule;
        assert!(rule.category().model_failure_possible_reason);
        let risks = runtime().block_on(rule.generate_risks(&model)).unwrap();
        assert_eq!(risks.len(), 2);
    }

    #[test]
    fn vault_presence_suppresses_missing_vault_finding() {
        let with_vault = model(vec![asset("safe", "vault")], vec![], vec![]);
        let risks = runtime()
            .block_on(MissingVaultRule.generate_risks(&with_vault))
            .unwrap();
        assert!(risks.is_empty());

        let without = model(vec![asset("app", "web-application")], vec![], vec![]);
        let risks = runtime()
            .block_on(MissingVaultRule.generate_risks(&without))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "missing-vault@app");
    }

    #[test]
    fn dataless_link_is_unnecessary() {
        let mut app = asset("app", "web-application");
        app.communication_links.push(link("app", "db"));
        let db = asset("db", "database");
        let model = model(vec![app, db], vec![], vec![]);
        let risks = runtime()
            .block_on(UnnecessaryCommunicationLinkRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
    }
}
