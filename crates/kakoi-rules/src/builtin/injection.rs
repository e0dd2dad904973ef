//! Injection-style rules: query languages, paths, serialized payloads.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::technology::attributes;
use kakoi_types::{
    calculate_severity, CommunicationLink, Confidentiality, Criticality, DataBreachProbability,
    DataFormat, Protocol, Risk, RiskCategory, RiskExploitationImpact,
    RiskExploitationLikelihood, RiskFunction, Stride, TechnicalAsset, Usage,
};

use crate::traits::{RiskRule, RuleError};

/// Impact tier shared by the query-injection style rules: high when the
/// target handles the most sensitive data, medium otherwise.
fn injection_impact(model: &ParsedModel, target: &TechnicalAsset) -> RiskExploitationImpact {
    if model.highest_processed_confidentiality(target) == Confidentiality::StrictlyConfidential
        || model.highest_processed_integrity(target) == Criticality::MissionCritical
    {
        RiskExploitationImpact::High
    } else {
        RiskExploitationImpact::Medium
    }
}

fn caller_flow_risk(
    category_id: String,
    verb: &str,
    model: &ParsedModel,
    target: &TechnicalAsset,
    incoming: &CommunicationLink,
    likelihood: RiskExploitationLikelihood,
) -> Risk {
    let caller_title = model
        .technical_assets
        .get(&incoming.source_id)
        .map(|caller| caller.title.clone())
        .unwrap_or_else(|| incoming.source_id.clone());
    let impact = injection_impact(model, target);
    let mut risk = Risk {
        category_id,
        severity: calculate_severity(likelihood, impact),
        exploitation_likelihood: likelihood,
        exploitation_impact: impact,
        title: format!(
            "{verb} risk at {caller_title} against {} via {}",
            target.title, incoming.title
        ),
        most_relevant_technical_asset_id: incoming.source_id.clone(),
        most_relevant_communication_link_id: incoming.id.clone(),
        data_breach_probability: DataBreachProbability::Probable,
        data_breach_technical_asset_ids: vec![target.id.clone()],
        ..Risk::default()
    };
    risk.update_synthetic_id();
    risk
}

pub struct SqlNosqlInjectionRule;

#[async_trait]
impl RiskRule for SqlNosqlInjectionRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "sql-nosql-injection".to_string(),
            title: "SQL/NoSQL-Injection".to_string(),
            description: "Database access over query languages is potentially vulnerable to \
                          injection."
                .to_string(),
            impact: "Attackers may read or modify the complete database content.".to_string(),
            asvs: "V5 - Validation, Sanitization and Encoding Verification Requirements"
                .to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/SQL_Injection_Prevention_Cheat_Sheet.html"
                    .to_string(),
            action: "Injection Prevention".to_string(),
            mitigation: "Use parameterized queries and strict input validation on the caller \
                         side."
                .to_string(),
            check: "Are all database queries parameterized?".to_string(),
            detection_logic: "Database-access data flows into query-injectable targets; strict \
                              database protocols count regardless of the target technology."
                .to_string(),
            risk_assessment: "High impact when the database holds strictly-confidential or \
                              mission-critical data."
                .to_string(),
            false_positives: "Callers issuing exclusively static queries.".to_string(),
            function: RiskFunction::Development,
            stride: Stride::Tampering,
            model_failure_possible_reason: false,
            cwe: 89,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            for incoming in model.incoming_links(&asset.id) {
                let source_out_of_scope = model
                    .technical_assets
                    .get(&incoming.source_id)
                    .map(|source| source.out_of_scope)
                    .unwrap_or(true);
                if source_out_of_scope {
                    continue;
                }
                let lax_match = incoming.protocol.is_potential_database_access_protocol(true)
                    && asset.tech_attribute(attributes::VULNERABLE_TO_QUERY_INJECTION);
                let strict_match = incoming.protocol.is_potential_database_access_protocol(false);
                if lax_match || strict_match {
                    let likelihood = if incoming.usage == Usage::DevOps {
                        RiskExploitationLikelihood::Likely
                    } else {
                        RiskExploitationLikelihood::VeryLikely
                    };
                    risks.push(caller_flow_risk(
                        self.category().id,
                        "SQL/NoSQL-injection",
                        model,
                        asset,
                        incoming,
                        likelihood,
                    ));
                }
            }
        }
        Ok(risks)
    }
}

pub struct LdapInjectionRule;

#[async_trait]
impl RiskRule for LdapInjectionRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "ldap-injection".to_string(),
            title: "LDAP-Injection".to_string(),
            description: "LDAP lookups built from untrusted input are potentially vulnerable to \
                          injection."
                .to_string(),
            impact: "Attackers may read or modify directory entries beyond their authorization."
                .to_string(),
            asvs: "V5 - Validation, Sanitization and Encoding Verification Requirements"
                .to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/LDAP_Injection_Prevention_Cheat_Sheet.html"
                    .to_string(),
            action: "Injection Prevention".to_string(),
            mitigation: "Escape LDAP meta characters and validate input on the caller side."
                .to_string(),
            check: "Are LDAP filters built without string concatenation of untrusted input?"
                .to_string(),
            detection_logic: "LDAP(S) data flows from in-scope callers.".to_string(),
            risk_assessment: "High impact when the directory holds strictly-confidential or \
                              mission-critical data."
                .to_string(),
            false_positives: "Callers issuing exclusively static directory lookups.".to_string(),
            function: RiskFunction::Development,
            stride: Stride::Tampering,
            model_failure_possible_reason: false,
            cwe: 90,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            for incoming in model.incoming_links(&asset.id) {
                let source_out_of_scope = model
                    .technical_assets
                    .get(&incoming.source_id)
                    .map(|source| source.out_of_scope)
                    .unwrap_or(true);
                if source_out_of_scope {
                    continue;
                }
                if matches!(incoming.protocol, Protocol::Ldap | Protocol::Ldaps) {
                    let likelihood = if incoming.usage == Usage::DevOps {
                        RiskExploitationLikelihood::Unlikely
                    } else {
                        RiskExploitationLikelihood::Likely
                    };
                    risks.push(caller_flow_risk(
                        self.category().id,
                        "LDAP-injection",
                        model,
                        asset,
                        incoming,
                        likelihood,
                    ));
                }
            }
        }
        Ok(risks)
    }
}

pub struct PathTraversalRule;

#[async_trait]
impl RiskRule for PathTraversalRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "path-traversal".to_string(),
            title: "Path-Traversal".to_string(),
            description: "Filesystem access with caller-supplied paths is potentially vulnerable \
                          to traversal."
                .to_string(),
            impact: "Attackers may read files outside the intended directory tree.".to_string(),
            asvs: "V12 - File and Resources Verification Requirements".to_string(),
            cheat_sheet: "https://cheatsheetseries.owasp.org/cheatsheets/Input_Validation_Cheat_Sheet.html"
                .to_string(),
            action: "Path-Traversal Prevention".to_string(),
            mitigation: "Canonicalize paths and enforce an allow-listed base directory."
                .to_string(),
            check: "Are caller-supplied path fragments validated before filesystem access?"
                .to_string(),
            detection_logic: "Data flows from in-scope callers into file-storage targets."
                .to_string(),
            risk_assessment: "High impact when the filesystem holds strictly-confidential or \
                              mission-critical data."
                .to_string(),
            false_positives: "Access limited to fixed, non-derived paths.".to_string(),
            function: RiskFunction::Development,
            stride: Stride::InformationDisclosure,
            model_failure_possible_reason: false,
            cwe: 22,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if !asset.tech_attribute(attributes::FILE_STORAGE) {
                continue;
            }
            for incoming in model.incoming_links(&asset.id) {
                let source_out_of_scope = model
                    .technical_assets
                    .get(&incoming.source_id)
                    .map(|source| source.out_of_scope)
                    .unwrap_or(true);
                if source_out_of_scope {
                    continue;
                }
                let likelihood = if incoming.usage == Usage::DevOps {
                    RiskExploitationLikelihood::Likely
                } else {
                    RiskExploitationLikelihood::VeryLikely
                };
                risks.push(caller_flow_risk(
                    self.category().id,
                    "Path-traversal",
                    model,
                    asset,
                    incoming,
                    likelihood,
                ));
            }
        }
        Ok(risks)
    }
}

pub struct UntrustedDeserializationRule;

#[async_trait]
impl RiskRule for UntrustedDeserializationRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "untrusted-deserialization".to_string(),
            title: "Untrusted Deserialization".to_string(),
            description: "Deserializing untrusted object graphs can execute attacker-chosen \
                          logic."
                .to_string(),
            impact: "Deserialization gadgets may lead to remote code execution.".to_string(),
            asvs: "V5 - Validation, Sanitization and Encoding Verification Requirements"
                .to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Deserialization_Cheat_Sheet.html"
                    .to_string(),
            action: "Prevention of Deserialization of Untrusted Data".to_string(),
            mitigation: "Avoid native serialization formats across trust boundaries; use data \
                         formats with no code-execution surface."
                .to_string(),
            check: "Is no native serialization format accepted from untrusted sources?"
                .to_string(),
            detection_logic: "In-scope assets accepting serialization data formats or EJB-style \
                              remoting, including incoming IIOP/JRMP protocols."
                .to_string(),
            risk_assessment: "Very high impact when the asset handles strictly-confidential or \
                              mission-critical data; likelihood rises across trust boundaries."
                .to_string(),
            false_positives: "Serialization used exclusively between equally trusted components."
                .to_string(),
            function: RiskFunction::Architecture,
            stride: Stride::Tampering,
            model_failure_possible_reason: false,
            cwe: 502,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope {
                continue;
            }
            let mut has_one = asset.accepts_data_format(DataFormat::Serialization)
                || asset.has_technology("ejb");
            let mut across_boundary = false;
            let mut boundary_link_title = String::new();
            for incoming in model.incoming_links(&asset.id) {
                if matches!(
                    incoming.protocol,
                    Protocol::Iiop | Protocol::IiopEncrypted | Protocol::Jrmp
                        | Protocol::JrmpEncrypted
                ) {
                    has_one = true;
                    if model.is_across_trust_boundary_network_only(incoming) {
                        across_boundary = true;
                        boundary_link_title = incoming.title.clone();
                    }
                }
            }
            if !has_one {
                continue;
            }
            let likelihood = if across_boundary {
                RiskExploitationLikelihood::VeryLikely
            } else {
                RiskExploitationLikelihood::Likely
            };
            let impact = if model.highest_processed_confidentiality(asset)
                == Confidentiality::StrictlyConfidential
                || model.highest_processed_integrity(asset) == Criticality::MissionCritical
                || model.highest_processed_availability(asset) == Criticality::MissionCritical
            {
                RiskExploitationImpact::VeryHigh
            } else {
                RiskExploitationImpact::High
            };
            let mut title = format!("Untrusted deserialization risk at {}", asset.title);
            if across_boundary {
                title.push_str(&format!(
                    " across a trust boundary (at least via {boundary_link_title})"
                ));
            }
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(likelihood, impact),
                exploitation_likelihood: likelihood,
                exploitation_impact: impact,
                title,
                most_relevant_technical_asset_id: asset.id.clone(),
                data_breach_probability: DataBreachProbability::Probable,
                data_breach_technical_asset_ids: vec![asset.id.clone()],
                ..Risk::default()
            };
            risk.update_synthetic_id();
            risks.push(risk);
        }
        Ok(risks)
    }
}

pub struct XmlExternalEntityRule;

#[async_trait]
impl RiskRule for XmlExternalEntityRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "xml-external-entity".to_string(),
            title: "XML External Entity (XXE)".to_string(),
            description: "XML parsers resolving external entities can be abused to read local \
                          resources."
                .to_string(),
            impact: "Attackers may read local files or trigger server-side requests.".to_string(),
            asvs: "V5 - Validation, Sanitization and Encoding Verification Requirements"
                .to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/XML_External_Entity_Prevention_Cheat_Sheet.html"
                    .to_string(),
            action: "XML Parser Hardening".to_string(),
            mitigation: "Disable external entity resolution in every XML parser.".to_string(),
            check: "Is DTD/external-entity processing disabled?".to_string(),
            detection_logic: "In-scope assets accepting the XML data format.".to_string(),
            risk_assessment: "High impact when the asset handles strictly-confidential or \
                              mission-critical data."
                .to_string(),
            false_positives: "Parsers verified to reject DOCTYPE declarations.".to_string(),
            function: RiskFunction::Development,
            stride: Stride::InformationDisclosure,
            model_failure_possible_reason: false,
            cwe: 611,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope || !asset.accepts_data_format(DataFormat::Xml) {
                continue;
            }
            let impact = if model.highest_processed_confidentiality(asset)
                == Confidentiality::StrictlyConfidential
                || model.highest_processed_integrity(asset) == Criticality::MissionCritical
                || model.highest_processed_availability(asset) == Criticality::MissionCritical
            {
                RiskExploitationImpact::High
            } else {
                RiskExploitationImpact::Medium
            };
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(RiskExploitationLikelihood::VeryLikely, impact),
                exploitation_likelihood: RiskExploitationLikelihood::VeryLikely,
                exploitation_impact: impact,
                title: format!("XML external entity risk at {}", asset.title),
                most_relevant_technical_asset_id: asset.id.clone(),
                data_breach_probability: DataBreachProbability::Probable,
                data_breach_technical_asset_ids: vec![asset.id.clone()],
                ..Risk::default()
            };
            risk.update_synthetic_id();
            risks.push(risk);
        }
        Ok(risks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{asset, datastore, link, model, sensitive_data};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    #[test]
    fn database_protocol_into_injectable_target_is_flagged() {
        let mut db = datastore("db", "database");
        db.data_assets_stored = vec!["records".to_string()];
        let mut app = asset("app", "application-server");
        let mut query = link("app", "db");
        query.protocol = Protocol::Jdbc;
        app.communication_links.push(query);
        let model = model(vec![app, db], vec![sensitive_data("records")], vec![]);
        let risks = runtime()
            .block_on(SqlNosqlInjectionRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        // caller is the most relevant asset for injection findings
        assert_eq!(risks[0].most_relevant_technical_asset_id, "app");
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
    }

    #[test]
    fn https_only_counts_against_query_injectable_targets() {
        let plain = datastore("files", "file-server");
        let mut app = asset("app", "application-server");
        let mut rest = link("app", "files");
        rest.protocol = Protocol::Https;
        app.communication_links.push(rest);
        let model = model(vec![app, plain], vec![], vec![]);
        let risks = runtime()
            .block_on(SqlNosqlInjectionRule.generate_risks(&model))
            .unwrap();
        assert!(risks.is_empty());
    }

    #[test]
    fn ldap_devops_usage_lowers_likelihood() {
        let directory = asset("directory", "ldap-server");
        let mut app = asset("app", "application-server");
        let mut lookup = link("app", "directory");
        lookup.protocol = Protocol::Ldaps;
        lookup.usage = Usage::DevOps;
        app.communication_links.push(lookup);
        let model = model(vec![app, directory], vec![], vec![]);
        let risks = runtime()
            .block_on(LdapInjectionRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(
            risks[0].exploitation_likelihood,
            RiskExploitationLikelihood::Unlikely
        );
    }

    #[test]
    fn serialization_format_triggers_deserialization_risk() {
        let mut service = asset("service", "web-service-rest");
        service.data_formats_accepted = vec![DataFormat::Serialization];
        let model = model(vec![service], vec![], vec![]);
        let risks = runtime()
            .block_on(UntrustedDeserializationRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
    }

    #[test]
    fn xml_format_triggers_xxe_risk() {
        let mut service = asset("service", "web-service-soap");
        service.data_formats_accepted = vec![DataFormat::Xml, DataFormat::Json];
        let quiet = asset("other", "web-service-rest");
        let model = model(vec![service, quiet], vec![], vec![]);
        let risks = runtime()
            .block_on(XmlExternalEntityRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].synthetic_id, "xml-external-entity@service");
    }
}
