//! Rules about runtime platforms and the development supply chain.

use async_trait::async_trait;

use kakoi_model::ParsedModel;
use kakoi_types::technology::attributes;
use kakoi_types::{
    calculate_severity, Confidentiality, Criticality, DataBreachProbability, Risk, RiskCategory,
    RiskExploitationImpact, RiskExploitationLikelihood, RiskFunction, Stride,
    TechnicalAssetMachine, Usage,
};

use crate::traits::{RiskRule, RuleError};

pub struct ContainerPlatformEscapeRule;

#[async_trait]
impl RiskRule for ContainerPlatformEscapeRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "container-platform-escape".to_string(),
            title: "Container Platform Escape".to_string(),
            description: "Container platforms are high-value targets; escaping one container \
                          threatens every workload on the platform."
                .to_string(),
            impact: "A single container breakout may compromise all containerized assets."
                .to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Docker_Security_Cheat_Sheet.html"
                    .to_string(),
            action: "Container Platform Hardening".to_string(),
            mitigation: "Harden the platform, minimize privileged containers, patch the runtime."
                .to_string(),
            check: "Is the container platform hardened according to vendor baselines?"
                .to_string(),
            detection_logic: "Every in-scope container platform.".to_string(),
            risk_assessment: "High impact when the platform hosts strictly-confidential or \
                              mission-critical workloads."
                .to_string(),
            false_positives: "Fully isolated single-tenant platforms with no sensitive \
                              workloads."
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
            if asset.out_of_scope || !asset.tech_attribute(attributes::CONTAINER_PLATFORM) {
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
            // a breakout threatens every containerized asset
            let data_breach_technical_asset_ids: Vec<String> = model
                .technical_assets
                .values()
                .filter(|candidate| candidate.machine == TechnicalAssetMachine::Container)
                .map(|candidate| candidate.id.clone())
                .collect();
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
                exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
                exploitation_impact: impact,
                title: format!("Container platform escape risk at {}", asset.title),
                most_relevant_technical_asset_id: asset.id.clone(),
                data_breach_probability: DataBreachProbability::Probable,
                data_breach_technical_asset_ids,
                ..Risk::default()
            };
            risk.update_synthetic_id();
            risks.push(risk);
        }
        Ok(risks)
    }
}

pub struct AccidentalSecretLeakRule;

#[async_trait]
impl RiskRule for AccidentalSecretLeakRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "accidental-secret-leak".to_string(),
            title: "Accidental Secret Leak".to_string(),
            description: "Source-code repositories and artifact registries tend to accumulate \
                          secrets."
                .to_string(),
            impact: "Leaked credentials grant direct access to downstream systems.".to_string(),
            asvs: "V14 - Configuration Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Build Pipeline Hardening".to_string(),
            mitigation: "Scan for committed secrets; for Git also consider history rewrites and \
                         leak-prevention tooling."
                .to_string(),
            check: "Are repositories and registries scanned for committed secrets?".to_string(),
            detection_logic: "In-scope assets whose technology may contain secrets and is \
                              development-relevant (source-code repositories, artifact \
                              registries)."
                .to_string(),
            risk_assessment: "Impact tiers with the sensitivity of the processed data."
                .to_string(),
            false_positives: "Repositories verified to hold no credentials.".to_string(),
            function: RiskFunction::Operations,
            stride: Stride::InformationDisclosure,
            model_failure_possible_reason: false,
            cwe: 200,
        }
    }

    fn supported_tags(&self) -> Vec<String> {
        vec!["git".to_string(), "nexus".to_string()]
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope
                || !(asset.tech_attribute(attributes::MAY_CONTAIN_SECRETS)
                    && asset.tech_attribute(attributes::DEVELOPMENT_RELEVANT))
            {
                continue;
            }
            let git_flavored = asset.is_tagged_with_any(&["git"]);
            let highest_confidentiality = model.highest_processed_confidentiality(asset);
            let highest_integrity = model.highest_processed_integrity(asset);
            let highest_availability = model.highest_processed_availability(asset);
            let impact = if highest_confidentiality == Confidentiality::StrictlyConfidential
                || highest_integrity == Criticality::MissionCritical
                || highest_availability == Criticality::MissionCritical
            {
                RiskExploitationImpact::High
            } else if highest_confidentiality >= Confidentiality::Confidential
                || highest_integrity >= Criticality::Critical
                || highest_availability >= Criticality::Critical
            {
                RiskExploitationImpact::Medium
            } else {
                RiskExploitationImpact::Low
            };
            let title = if git_flavored {
                format!("Accidental secret leak (Git) risk at {}", asset.title)
            } else {
                format!("Accidental secret leak risk at {}", asset.title)
            };
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
                exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
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

pub struct CodeBackdooringRule;

#[async_trait]
impl RiskRule for CodeBackdooringRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "code-backdooring".to_string(),
            title: "Code Backdooring".to_string(),
            description: "Internet-reachable development infrastructure invites injection of \
                          backdoored artifacts."
                .to_string(),
            impact: "Backdoored builds propagate to every deployment target.".to_string(),
            asvs: "V10 - Malicious Code Verification Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Build Pipeline Hardening".to_string(),
            mitigation: "Shield development infrastructure from the internet, sign artifacts, \
                         review changes."
                .to_string(),
            check: "Is development infrastructure unreachable from untrusted networks?"
                .to_string(),
            detection_logic: "In-scope development-relevant assets that are internet-facing or \
                              called from internet-facing or out-of-scope assets without VPN."
                .to_string(),
            risk_assessment: "Impact rises with exposure and the sensitivity of the processed \
                              data; code-inspection platforms stay low."
                .to_string(),
            false_positives: "Fully internal development setups behind VPN.".to_string(),
            function: RiskFunction::Operations,
            stride: Stride::Tampering,
            model_failure_possible_reason: false,
            cwe: 912,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for asset in model.technical_assets.values() {
            if asset.out_of_scope || !asset.tech_attribute(attributes::DEVELOPMENT_RELEVANT) {
                continue;
            }
            let elevated = asset.internet
                || model.incoming_links(&asset.id).iter().any(|incoming| {
                    model
                        .technical_assets
                        .get(&incoming.source_id)
                        .map(|caller| (!incoming.vpn && caller.internet) || caller.out_of_scope)
                        .unwrap_or(false)
                });
            if !elevated {
                continue;
            }
            let mut impact = RiskExploitationImpact::Low;
            if !asset.tech_attribute(attributes::CODE_INSPECTION_PLATFORM) {
                impact = RiskExploitationImpact::Medium;
                if model.highest_processed_confidentiality(asset) >= Confidentiality::Confidential
                    || model.highest_processed_integrity(asset) >= Criticality::Critical
                {
                    impact = RiskExploitationImpact::High;
                }
            }
            // data breach extends to all deployment targets of this asset
            let mut data_breach_ids = vec![asset.id.clone()];
            for deployment_link in &asset.communication_links {
                if deployment_link.usage != Usage::DevOps {
                    continue;
                }
                let ships_code = deployment_link.data_assets_sent.iter().any(|data_id| {
                    model
                        .data_assets
                        .get(data_id)
                        .map(|data| data.integrity >= Criticality::Important)
                        .unwrap_or(false)
                });
                if ships_code && !data_breach_ids.contains(&deployment_link.target_id) {
                    data_breach_ids.push(deployment_link.target_id.clone());
                }
            }
            let mut risk = Risk {
                category_id: self.category().id,
                severity: calculate_severity(RiskExploitationLikelihood::Unlikely, impact),
                exploitation_likelihood: RiskExploitationLikelihood::Unlikely,
                exploitation_impact: impact,
                title: format!("Code backdooring risk at {}", asset.title),
                most_relevant_technical_asset_id: asset.id.clone(),
                data_breach_probability: DataBreachProbability::Probable,
                data_breach_technical_asset_ids: data_breach_ids,
                ..Risk::default()
            };
            risk.update_synthetic_id();
            risks.push(risk);
        }
        Ok(risks)
    }
}

pub struct MixedTargetsOnSharedRuntimeRule;

#[async_trait]
impl RiskRule for MixedTargetsOnSharedRuntimeRule {
    fn category(&self) -> RiskCategory {
        RiskCategory {
            id: "mixed-targets-on-shared-runtime".to_string(),
            title: "Mixed Targets on Shared Runtime".to_string(),
            description: "Running differently trusted workloads on one runtime couples their \
                          fates."
                .to_string(),
            impact: "Compromising a less valuable workload may yield the more valuable one on \
                     the same runtime."
                .to_string(),
            asvs: "V1 - Architecture, Design and Threat Modeling Requirements".to_string(),
            cheat_sheet:
                "https://cheatsheetseries.owasp.org/cheatsheets/Attack_Surface_Analysis_Cheat_Sheet.html"
                    .to_string(),
            action: "Runtime Separation".to_string(),
            mitigation: "Separate frontend and backend workloads and different trust zones onto \
                         dedicated runtimes."
                .to_string(),
            check: "Do shared runtimes host only same-trust workloads?".to_string(),
            detection_logic: "Shared runtimes hosting assets from different trust boundaries or \
                              mixing frontend- and backend-related technologies."
                .to_string(),
            risk_assessment: "Medium impact when any hosted asset is rated \
                              strictly-confidential or mission-critical."
                .to_string(),
            false_positives: "Runtimes whose workloads are deliberately one deployment unit."
                .to_string(),
            function: RiskFunction::Operations,
            stride: Stride::ElevationOfPrivilege,
            model_failure_possible_reason: false,
            cwe: 1008,
        }
    }

    async fn generate_risks(&self, model: &ParsedModel) -> Result<Vec<Risk>, RuleError> {
        let mut risks = Vec::new();
        for runtime in model.shared_runtimes.values() {
            let mut current_boundary: Option<&str> = None;
            let mut mixed_boundaries = false;
            let mut has_frontend = false;
            let mut has_backend = false;
            for asset_id in &runtime.technical_assets_running {
                let Some(asset) = model.technical_assets.get(asset_id) else {
                    continue;
                };
                let boundary = model
                    .direct_containing_trust_boundary_by_asset_id
                    .get(asset_id)
                    .map(String::as_str)
                    .unwrap_or("");
                if let Some(previous) = current_boundary {
                    if previous != boundary {
                        mixed_boundaries = true;
                        break;
                    }
                }
                current_boundary = Some(boundary);
                if asset.tech_attribute(attributes::FRONTEND_RELATED) {
                    has_frontend = true;
                }
                if asset.tech_attribute(attributes::BACKEND_RELATED) {
                    has_backend = true;
                }
            }
            if !(mixed_boundaries || (has_frontend && has_backend)) {
                continue;
            }
            let more_risky = runtime
                .technical_assets_running
                .iter()
                .filter_map(|id| model.technical_assets.get(id))
                .any(|asset| {
                    asset.confidentiality == Confidentiality::StrictlyConfidential
                        || asset.integrity == Criticality::MissionCritical
                        || asset.availability == Criticality::MissionCritical
                });
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
                    "Mixed targets on shared runtime {} ease lateral movement between workloads",
                    runtime.title
                ),
                most_relevant_shared_runtime_id: runtime.id.clone(),
                data_breach_probability: DataBreachProbability::Improbable,
                data_breach_technical_asset_ids: runtime.technical_assets_running.clone(),
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
    use crate::test_support::{asset, model};
    use kakoi_types::SharedRuntime;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    #[test]
    fn container_platform_breach_lists_all_containerized_assets() {
        let platform = asset("k8s", "container-platform");
        let mut service_a = asset("svc-a", "web-service-rest");
        service_a.machine = TechnicalAssetMachine::Container;
        let mut service_b = asset("svc-b", "web-service-rest");
        service_b.machine = TechnicalAssetMachine::Container;
        let vm = asset("legacy", "application-server");
        let model = model(vec![platform, service_a, service_b, vm], vec![], vec![]);
        let risks = runtime()
            .block_on(ContainerPlatformEscapeRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(
            risks[0].data_breach_technical_asset_ids,
            vec!["svc-a".to_string(), "svc-b".to_string()]
        );
    }

    #[test]
    fn git_tagged_repository_gets_flavored_title() {
        let mut repo = asset("repo", "sourcecode-repository");
        repo.tags = vec!["git".to_string()];
        let model = model(vec![repo], vec![], vec![]);
        let risks = runtime()
            .block_on(AccidentalSecretLeakRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert!(risks[0].title.contains("(Git)"));
    }

    #[test]
    fn internet_facing_build_infrastructure_is_backdooring_risk() {
        let mut pipeline = asset("ci", "build-pipeline");
        pipeline.internet = true;
        let shielded = asset("repo", "sourcecode-repository");
        let model = model(vec![pipeline, shielded], vec![], vec![]);
        let risks = runtime()
            .block_on(CodeBackdooringRule.generate_risks(&model))
            .unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].most_relevant_technical_asset_id, "ci");
    }

    #[test]
    fn shared_runtime_mixing_boundaries_is_flagged() {
        let frontend = asset("web", "web-application");
        let backend = asset("db", "database");
        let mut parsed = model(vec![frontend, backend], vec![], vec![]);
        parsed.shared_runtimes.insert(
            "metal".to_string(),
            SharedRuntime {
                id: "metal".to_string(),
                title: "Bare Metal".to_string(),
                technical_assets_running: vec!["web".to_string(), "db".to_string()],
                ..SharedRuntime::default()
            },
        );
        let risks = runtime()
            .block_on(MixedTargetsOnSharedRuntimeRule.generate_risks(&parsed))
            .unwrap();
        // frontend + backend related technologies on one runtime
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].most_relevant_shared_runtime_id, "metal");
    }
}
