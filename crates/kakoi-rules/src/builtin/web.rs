//! Rules around web surfaces and authentication coverage.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::technology::attributes;
use kakoi_types::{
    calculate_severity, Authentication, CommunicationLink, Confidentiality, Criticality,
    DataBreachProbability, Risk, RiskCategory, RiskExploitationImpact,
    RiskExploitationLikelihood, RiskFunction, Stride, TechnicalAsset, TechnicalAssetType, Usage,
};

use crate::traits::{RiskRule, RuleError};

pub struct CrossSiteScriptingRule;

#[async_trait]
impl RiskRule for CrossSiteScriptingRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "cross-site-scripting".to_string(),
            title: "Cross-Site Scripting (XSS)".to_string(),
            description: "Web applications are potentially vulnerable to cross-site scripting."
                .to_string(),
            impact: "Attackers may steal sessions or act on behalf of victims inside the \
                     application."
                .to_string(),
            asvs: "V5 - Validation, Sanitization and Encoding Verification Requirements"
                .to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Cross_Site_Scripting_Prevention_Cheat_Sheet.html"
                    .to_string(),
            action: "XSS Prevention".to_string(),
            mitigation: "Apply contextual output encoding and sanitize untrusted input."
                .to_string(),
            check: "Is output encoding applied for every sink rendering untrusted data?"
                .to_string(),
            detection_logic: "Every in-scope web application.".to_string(),
            risk_assessment: "High impact when the application processes strictly-confidential \
                              or mission-critical data."
                .to_string(),
            false_positives: "Applications rendering no untrusted data at all.".to_string(),
            function: RiskFunction::Development,
            stride: Stride::Tampering,
            model_failure_possible_reason: false,
            cwe: 79,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope || !asset.tech_attribute(attributes::WEB_APPLICATION) {
                continue;
            }
            let impact = if model.highest_processed_confidentiality(asset)
                == Confidentiality::StrictlyConfidential
                || model.highest_processed_integrity(asset) == Criticality::MissionCritical
            {
                RiskExploitationImpact::High
            } else {
                RiskExploitationImpact::Medium
            };
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(RiskExploitationLikelihood::Likely, impact),
                exploitation_likelihood: RiskExploitationLikelihood::Likely,
                exploitation_impact: impact,
                title: format!("Cross-site scripting risk at {}", asset.title),
                most_relevant_technical_asset_id: asset.id.clone(),
                data_breach_probability: DataBreachProbability::Possible,
                data_breach_technical_asset_ids: vec![asset.id.clone()],
                ..Risk::default()
            };
            risk.update_synthetic_id();
            risks.push(risk);
        }
        Ok(risks)
    }
}

pub struct CrossSiteRequestForgeryRule;

#[async_trait]
impl RiskRule for CrossSiteRequestForgeryRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "cross-site-request-forgery".to_string(),
            title: "Cross-Site Request Forgery (CSRF)".to_string(),
            description: "Web applications reached over web protocols are potentially \
                          vulnerable to cross-site request forgery."
                .to_string(),
            impact: "Attackers may trick victims' browsers into issuing authenticated requests."
                .to_string(),
            asvs: "V4 - Access Control Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Cross-Site_Request_Forgery_Prevention_Cheat_Sheet.html"
                    .to_string(),
            action: "CSRF Prevention".to_string(),
            mitigation: "Use anti-CSRF tokens or same-site cookie attributes.".to_string(),
            check: "Are state-changing requests protected against request forgery?".to_string(),
            detection_logic: "Incoming web-protocol data flows into in-scope web applications."
                .to_string(),
            risk_assessment: "Medium impact when the flow carries mission-critical integrity \
                              data."
                .to_string(),
            false_positives: "Pure machine-to-machine APIs not driven by browsers.".to_string(),
            function: RiskFunction::Development,
            stride: Stride::Spoofing,
            model_failure_possible_reason: false,
            cwe: 352,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope || !asset.tech_attribute(attributes::WEB_APPLICATION) {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                if !incoming.protocol.is_potential_web_access_protocol() {
                    continue;
                }
                let likelihood = if incoming.usage == Usage::DevOps {
                    RiskExploitationLikelihood::Likely
                } else {
                    RiskExploitationLikelihood::VeryLikely
                };
                let impact =
                    if model.link_highest_integrity(incoming) == Criticality::MissionCritical {
                        RiskExploitationImpact::Medium
                    } else {
                        RiskExploitationImpact::Low
                    };
                let mut risk = Risk {
                    category_id: self.category().id,
                    severity: calculate_severity(likelihood, impact),
                    exploitation_likelihood: likelihood,
                    exploitation_impact: impact,
                    title: format!(
                        "Cross-site request forgery risk at {} via {}",
                        asset.title, incoming.title
                    ),
                    most_relevant_technical_asset_id: asset.id.clone(),
                    most_relevant_communication_link_id: incoming.id.clone(),
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

pub struct MissingWafRule;

#[async_trait]
impl RiskRule for MissingWafRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "missing-waf".to_string(),
            title: "Missing Web Application Firewall (WAF)".to_string(),
            description: "Web applications and services reached across a network boundary \
                          benefit from a WAF as defense in depth."
                .to_string(),
            impact: "Known attack patterns reach the application unfiltered.".to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Virtual_Patching_Cheat_Sheet.html"
                    .to_string(),
            action: "Web Application Firewall (WAF)".to_string(),
            mitigation: "Route inbound web traffic through a WAF.".to_string(),
            check: "Is inbound web traffic filtered by a WAF component?".to_string(),
            detection_logic: "In-scope web applications or web services receiving web-protocol \
                              traffic from across a network trust boundary without a WAF in \
                              front."
                .to_string(),
            risk_assessment: "Medium impact for strictly-confidential or mission-critical \
                              targets."
                .to_string(),
            false_positives: "Targets already protected by an equivalent filtering gateway."
                .to_string(),
            function: RiskFunction::Operations,
            stride: Stride::Tampering,
            model_failure_possible_reason: false,
            cwe: 1008,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope
                || !(asset.tech_attribute(attributes::WEB_APPLICATION)
                    || asset.tech_attribute(attributes::WEB_SERVICE))
            {
                continue;
            }
            let unprotected = model.incoming_links(&asset.id).iter().any(|incoming| {
                model.is_across_trust_boundary_network_only(incoming)
                    && incoming.protocol.is_potential_web_access_protocol()
                    && model
                        .technical_assets
                        .get(&incoming.source_id)
                        .map(|source| !source.has_technology("waf"))
                        .unwrap_or(true)
            });
            if !unprotected {
                continue;
            }
            let impact = if model.highest_processed_confidentiality(asset)
                == Confidentiality::StrictlyConfidential
                || model.highest_processed_integrity(asset) == Criticality::MissionCritical
                || model.highest_processed_availability(asset) == Criticality::MissionCritical
            {
                RiskExploitationImpact::Medium
            } else {
                RiskExploitationImpact::Low
            };
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
                exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
                exploitation_impact: impact,
                title: format!("Missing web application firewall for {}", asset.title),
                most_relevant_technical_asset_id: asset.id.clone(),
                data_breach_probability: DataBreachProbability::Improbable,
                data_breach_technical_asset_ids: vec![asset.id.clone()],
                ..Risk::default()
            };
            risk.update_synthetic_id();
            risks.push(risk);
        }
        Ok(risks)
    }
}

/// Shared risk shape of both authentication rules.
fn create_missing_authentication_risk(
    category_id: String,
    asset: &TechnicalAsset,
    incoming: &CommunicationLink,
    origin_title: &str,
    hop_between: &str,
    impact: RiskExploitationImpact,
    likelihood: RiskExploitationLikelihood,
    two_factor: bool,
) -> Risk {
    let factor = if two_factor { "two-factor " } else { "" };
    let hop = if hop_between.is_empty() {
        String::new()
    } else {
        format!(" forwarded via {hop_between}")
    };
    let mut risk = Risk {
        category_id,
        severity: calculate_severity(likelihood, impact),
        exploitation_likelihood: likelihood,
        exploitation_impact: impact,
        title: format!(
            "Missing {factor}authentication covering communication link {} from {origin_title}{hop} to {}",
            incoming.title, asset.title
        ),
        most_relevant_technical_asset_id: asset.id.clone(),
        most_relevant_communication_link_id: incoming.id.clone(),
        data_breach_probability: DataBreachProbability::Possible,
        data_breach_technical_asset_ids: vec![asset.id.clone()],
        ..Risk::default()
    };
    risk.update_synthetic_id();
    risk
}

fn caller_exempt(caller: &TechnicalAsset) -> bool {
    caller.tech_attribute(attributes::UNPROTECTED_COMMUNICATIONS_TOLERATED)
        || caller.asset_type == TechnicalAssetType::Datastore
}

fn asset_needs_authentication(model: &ParsedModel, asset: &TechnicalAsset) -> bool {
    model.highest_processed_confidentiality(asset) >= Confidentiality::Confidential
        || model.highest_processed_integrity(asset) >= Criticality::Critical
        || model.highest_processed_availability(asset) >= Criticality::Critical
        || asset.multi_tenant
}

pub struct MissingAuthenticationRule;

#[async_trait]
impl RiskRule for MissingAuthenticationRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "missing-authentication".to_string(),
            title: "Missing Authentication".to_string(),
            description: "Sensitive targets require authenticated incoming communication."
                .to_string(),
            impact: "Anyone able to reach the endpoint can use it.".to_string(),
            asvs: "V2 - Authentication Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Authentication_Cheat_Sheet.html"
                    .to_string(),
            action: "Authentication of Incoming Requests".to_string(),
            mitigation: "Authenticate callers on every non-process-local channel.".to_string(),
            check: "Does every incoming channel authenticate its caller?".to_string(),
            detection_logic: "Incoming unauthenticated, non-process-local data flows into \
                              in-scope sensitive assets; datastore callers and \
                              traffic-tolerating infrastructure are exempt."
                .to_string(),
            risk_assessment: "Impact tiers with the sensitivity of the transferred data."
                .to_string(),
            false_positives: "Channels carrying exclusively public data.".to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: false,
            cwe: 306,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope
                || asset.tech_attribute(attributes::NO_AUTHENTICATION_REQUIRED)
                || asset.tech_attribute(attributes::SECURITY_CONTROL_RELATED)
            {
                continue;
            }
            if !asset_needs_authentication(model, asset) {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                let Some(caller) = model.technical_assets.get(&incoming.source_id) else {
                    continue;
                };
                if caller_exempt(caller) {
                    continue;
                }
                if incoming.authentication != Authentication::None
                    || incoming.protocol.is_process_local()
                {
                    continue;
                }
                let link_confidentiality = model.link_highest_confidentiality(incoming);
                let link_integrity = model.link_highest_integrity(incoming);
                let impact = if link_confidentiality == Confidentiality::StrictlyConfidential
                    || link_integrity == Criticality::MissionCritical
                {
                    RiskExploitationImpact::High
                } else if link_confidentiality <= Confidentiality::Internal
                    && link_integrity == Criticality::Operational
                {
                    RiskExploitationImpact::Low
                } else {
                    RiskExploitationImpact::Medium
                };
                risks.push(create_missing_authentication_risk(
                    self.category().id,
                    asset,
                    incoming,
                    &caller.title,
                    "",
                    impact,
                    RiskExploitationLikelihood::Likely,
                    false,
                ));
            }
        }
        Ok(risks)
    }
}

pub struct MissingAuthenticationSecondFactorRule;

#[async_trait]
impl RiskRule for MissingAuthenticationSecondFactorRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "missing-authentication-second-factor".to_string(),
            title: "Missing Two-Factor Authentication (2FA)".to_string(),
            description: "Human-used entry points into sensitive assets should require a second \
                          authentication factor."
                .to_string(),
            impact: "Phished or leaked credentials directly compromise sensitive functionality."
                .to_string(),
            asvs: "V2 - Authentication Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Multifactor_Authentication_Cheat_Sheet.html"
                    .to_string(),
            action: "Authentication with Second Factor".to_string(),
            mitigation: "Require a second factor for human access to sensitive assets."
                .to_string(),
            check: "Do human users authenticate with a second factor?".to_string(),
            detection_logic: "Sensitive in-scope assets reached by human-used clients (directly \
                              or one traffic-forwarding hop away) without two-factor \
                              authentication on the carrying link."
                .to_string(),
            risk_assessment: "Medium impact throughout; the likelihood stays unlikely."
                .to_string(),
            false_positives: "Machine-only channels misrepresented as human-used.".to_string(),
            function: RiskFunction::BusinessSide,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: false,
            cwe: 308,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope
                || asset.tech_attribute(attributes::TRAFFIC_FORWARDING)
                || asset.tech_attribute(attributes::UNPROTECTED_COMMUNICATIONS_TOLERATED)
            {
                continue;
            }
            if !asset_needs_authentication(model, asset) {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                let Some(caller) = model.technical_assets.get(&incoming.source_id) else {
                    continue;
                };
                if caller_exempt(caller) {
                    continue;
                }
                if caller.used_as_client_by_human {
                    let more_risky = model.link_highest_confidentiality(incoming)
                        >= Confidentiality::Confidential
                        || model.link_highest_integrity(incoming) >= Criticality::Critical;
                    if more_risky && incoming.authentication != Authentication::TwoFactor {
                        risks.push(create_missing_authentication_risk(
                            self.category().id,
                            asset,
                            incoming,
                            &caller.title,
                            "",
                            RiskExploitationImpact::Medium,
                            RiskExploitationLikelihood::Unlikely,
                            true,
                        ));
                    }
                } else if caller.tech_attribute(attributes::TRAFFIC_FORWARDING) {
                    // one hop up the call chain to find the human client
                    for callers_link in model.incoming_links(&caller.id) {
                        let Some(callers_caller) =
                            model.technical_assets.get(&callers_link.source_id)
                        else {
                            continue;
                        };
                        if caller_exempt(callers_caller) || !callers_caller.used_as_client_by_human
                        {
                            continue;
                        }
                        let more_risky = model.link_highest_confidentiality(callers_link)
                            >= Confidentiality::Confidential
                            || model.link_highest_integrity(callers_link) >= Criticality::Critical;
                        if more_risky && callers_link.authentication != Authentication::TwoFactor {
                            risks.push(create_missing_authentication_risk(
                                self.category().id,
                                asset,
                                incoming,
                                &callers_caller.title,
                                &caller.title,
                                RiskExploitationImpact::Medium,
                                RiskExploitationLikelihood::Unlikely,
                                true,
                            ));
                        }
                    }
                }
            }
        }
        Ok(risks)
    }
}
