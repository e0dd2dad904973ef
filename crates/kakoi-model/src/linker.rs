//! Turns raw input records into a fully linked [`ParsedModel`].
//!
//! Any inconsistency aborts linking with a single contextual error; there is
//! never a partial model.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

use kakoi_types::{
    synthetic_risk_id, Authentication, Authorization, CommunicationLink, Confidentiality,
    Criticality, DataAsset, DataFormat, EncryptionStyle, Protocol, Quantity, Risk, RiskCategory,
    RiskExploitationImpact, RiskExploitationLikelihood, RiskFunction, RiskSeverity, RiskStatus,
    RiskTracking, SharedRuntime, Stride, TechnicalAsset, TechnicalAssetMachine,
    TechnicalAssetSize, TechnicalAssetType, TechnologyRegistry, TrustBoundary, TrustBoundaryType,
    Usage,
};
use kakoi_types::technology::{Technology, UNKNOWN_TECHNOLOGY};
use kakoi_types::UnknownEnumValue;

use crate::input::ModelInput;
use crate::model::{Overview, ParsedModel};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unknown {field:?} value of {entity}: {value:?}")]
    UnknownEnumValue {
        field: &'static str,
        value: String,
        entity: String,
    },
    #[error("unknown technology {name:?} referenced by {entity}")]
    UnknownTechnology { name: String, entity: String },
    #[error("missing referenced {kind} at {referenced_by}: {id}")]
    MissingReference {
        kind: &'static str,
        id: String,
        referenced_by: String,
    },
    #[error("duplicate id used: {id}")]
    DuplicateId { id: String },
    #[error("invalid id syntax (only letters, digits and hyphens allowed): {id:?}")]
    InvalidIdSyntax { id: String },
    #[error(
        "technical asset {asset_id:?} at trust boundary {boundary:?} is modeled in multiple trust boundaries"
    )]
    DuplicateTrustBoundaryMembership { asset_id: String, boundary: String },
    #[error("missing referenced nested trust boundary: {id}")]
    MissingNestedTrustBoundary { id: String },
    #[error("missing referenced tag in overall tag list at {entity}: {tag}")]
    UnknownTag { tag: String, entity: String },
    #[error("unable to parse {field:?} date of {entity} (expected yyyy-mm-dd): {value:?}")]
    InvalidDate {
        field: &'static str,
        value: String,
        entity: String,
    },
    #[error("risk tracking does not match any generated risk: {id}")]
    OrphanedRiskTracking { id: String },
}

fn enum_error(
    field: &'static str,
    entity: &str,
) -> impl FnOnce(UnknownEnumValue) -> ModelError {
    let entity = entity.to_string();
    move |err| ModelError::UnknownEnumValue {
        field,
        value: err.value,
        entity,
    }
}

pub(crate) fn check_id_syntax(id: &str) -> Result<(), ModelError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ModelError::InvalidIdSyntax { id: id.to_string() });
    }
    Ok(())
}

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new("[^A-Za-z0-9]+").expect("static pattern"))
}

/// Derived communication-link id: the source asset id, a `>` separator, and
/// the lower-cased title with every non-alphanumeric run collapsed to one
/// hyphen. Stable and idempotent for the same inputs.
pub fn derive_link_id(source_asset_id: &str, title: &str) -> String {
    let lowercased = title.to_lowercase();
    let slug = slug_regex().replace_all(&lowercased, "-");
    format!(
        "{}>{}",
        source_asset_id,
        slug.trim_matches(|c| c == '-' || c == ' ')
    )
}

fn with_default(value: &str, default_when_empty: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default_when_empty.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn lower_case_and_trim(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .collect()
}

fn parse_date(
    value: &str,
    field: &'static str,
    entity: &str,
) -> Result<Option<NaiveDate>, ModelError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ModelError::InvalidDate {
            field,
            value: value.to_string(),
            entity: entity.to_string(),
        })
}

/// Report images are referenced by file name only; strip any path elements
/// an input may try to smuggle in.
fn sanitize_overview(overview: &Overview) -> Overview {
    Overview {
        description: overview.description.clone(),
        images: overview
            .images
            .iter()
            .map(|image| {
                image
                    .iter()
                    .map(|(file, caption)| {
                        let base = Path::new(file)
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        (base, caption.clone())
                    })
                    .collect()
            })
            .collect(),
    }
}

fn check_tags(
    model: &ParsedModel,
    tags: Vec<String>,
    entity: &str,
) -> Result<Vec<String>, ModelError> {
    for tag in &tags {
        if !model.tags_available.contains(tag) {
            return Err(ModelError::UnknownTag {
                tag: tag.clone(),
                entity: entity.to_string(),
            });
        }
    }
    Ok(tags)
}

fn check_data_asset_exists(
    model: &ParsedModel,
    id: &str,
    referenced_by: &str,
) -> Result<(), ModelError> {
    if model.data_assets.contains_key(id) {
        Ok(())
    } else {
        Err(ModelError::MissingReference {
            kind: "data asset",
            id: id.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }
}

fn check_technical_asset_exists(
    model: &ParsedModel,
    id: &str,
    referenced_by: &str,
) -> Result<(), ModelError> {
    if model.technical_assets.contains_key(id) {
        Ok(())
    } else {
        Err(ModelError::MissingReference {
            kind: "technical asset",
            id: id.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }
}

fn resolve_technologies(
    registry: &TechnologyRegistry,
    names: &[String],
    entity: &str,
) -> Result<Vec<Technology>, ModelError> {
    if names.is_empty() {
        let unknown = registry
            .get(UNKNOWN_TECHNOLOGY)
            .cloned()
            .unwrap_or_else(|| Technology {
                name: UNKNOWN_TECHNOLOGY.to_string(),
                ..Technology::default()
            });
        return Ok(vec![unknown]);
    }
    names
        .iter()
        .map(|name| {
            registry
                .get(name)
                .cloned()
                .ok_or_else(|| ModelError::UnknownTechnology {
                    name: name.trim().to_string(),
                    entity: entity.to_string(),
                })
        })
        .collect()
}

/// Links and validates the whole model, in the required order: scalars, data
/// assets, technical assets with their communication links, the two
/// propagation passes, trust boundaries, shared runtimes, rule categories,
/// individually authored risks, risk tracking, and the final link-target
/// consistency check.
pub fn link_model(
    input: &ModelInput,
    technologies: &TechnologyRegistry,
    builtin_categories: &[RiskCategory],
    custom_categories: &[RiskCategory],
) -> Result<ParsedModel, ModelError> {
    let mut model = ParsedModel {
        title: input.title.clone(),
        author: input.author.clone(),
        date: match parse_date(&input.date, "date", "the model file")? {
            Some(date) => date,
            None => Local::now().date_naive(),
        },
        management_summary_comment: input.management_summary_comment.clone(),
        business_overview: sanitize_overview(&input.business_overview),
        technical_overview: sanitize_overview(&input.technical_overview),
        business_criticality: Criticality::parse(&input.business_criticality)
            .map_err(enum_error("business_criticality", "the application"))?,
        security_requirements: input.security_requirements.clone(),
        questions: input.questions.clone(),
        abuse_cases: input.abuse_cases.clone(),
        tags_available: lower_case_and_trim(&input.tags_available),
        ..ParsedModel::default()
    };

    // Data assets ----------------------------------------------------------
    for (title, asset) in &input.data_assets {
        let entity = format!("data asset {title:?}");
        let data_asset = DataAsset {
            id: asset.id.clone(),
            title: title.clone(),
            description: with_default(&asset.description, title),
            usage: Usage::parse(&asset.usage).map_err(enum_error("usage", &entity))?,
            tags: check_tags(&model, lower_case_and_trim(&asset.tags), &entity)?,
            origin: asset.origin.clone(),
            owner: asset.owner.clone(),
            quantity: Quantity::parse(&asset.quantity).map_err(enum_error("quantity", &entity))?,
            confidentiality: Confidentiality::parse(&asset.confidentiality)
                .map_err(enum_error("confidentiality", &entity))?,
            integrity: Criticality::parse(&asset.integrity)
                .map_err(enum_error("integrity", &entity))?,
            availability: Criticality::parse(&asset.availability)
                .map_err(enum_error("availability", &entity))?,
            justification_cia_rating: asset.justification_cia_rating.clone(),
        };
        check_id_syntax(&data_asset.id)?;
        if model.data_assets.contains_key(&data_asset.id) {
            return Err(ModelError::DuplicateId {
                id: data_asset.id,
            });
        }
        model.data_assets.insert(data_asset.id.clone(), data_asset);
    }

    // Technical assets and their communication links -----------------------
    for (title, asset) in &input.technical_assets {
        let entity = format!("technical asset {title:?}");
        let id = asset.id.clone();

        let mut data_assets_stored = Vec::new();
        for referenced in &asset.data_assets_stored {
            if data_assets_stored.contains(referenced) {
                continue;
            }
            check_data_asset_exists(&model, referenced, &entity)?;
            data_assets_stored.push(referenced.clone());
        }

        let mut data_assets_processed = data_assets_stored.clone();
        for referenced in &asset.data_assets_processed {
            if data_assets_processed.contains(referenced) {
                continue;
            }
            check_data_asset_exists(&model, referenced, &entity)?;
            data_assets_processed.push(referenced.clone());
        }

        let mut data_formats_accepted = Vec::new();
        for format_name in &asset.data_formats_accepted {
            data_formats_accepted.push(
                DataFormat::parse(format_name)
                    .map_err(enum_error("data_formats_accepted", &entity))?,
            );
        }

        let mut communication_links = Vec::new();
        for (link_title, link) in &asset.communication_links {
            let link_entity =
                format!("communication link {link_title:?} of technical asset {title:?}");

            let mut data_assets_sent = Vec::new();
            for referenced in &link.data_assets_sent {
                if data_assets_sent.contains(referenced) {
                    continue;
                }
                check_data_asset_exists(&model, referenced, &link_entity)?;
                data_assets_sent.push(referenced.clone());
                if !data_assets_processed.contains(referenced) {
                    data_assets_processed.push(referenced.clone());
                }
            }

            let mut data_assets_received = Vec::new();
            for referenced in &link.data_assets_received {
                if data_assets_received.contains(referenced) {
                    continue;
                }
                check_data_asset_exists(&model, referenced, &link_entity)?;
                data_assets_received.push(referenced.clone());
                if !data_assets_processed.contains(referenced) {
                    data_assets_processed.push(referenced.clone());
                }
            }

            let communication_link = CommunicationLink {
                id: derive_link_id(&id, link_title),
                source_id: id.clone(),
                target_id: link.target.clone(),
                title: link_title.clone(),
                description: with_default(&link.description, link_title),
                protocol: Protocol::parse(&link.protocol)
                    .map_err(enum_error("protocol", &link_entity))?,
                authentication: Authentication::parse(&link.authentication)
                    .map_err(enum_error("authentication", &link_entity))?,
                authorization: Authorization::parse(&link.authorization)
                    .map_err(enum_error("authorization", &link_entity))?,
                usage: Usage::parse(&link.usage).map_err(enum_error("usage", &link_entity))?,
                tags: check_tags(&model, lower_case_and_trim(&link.tags), &link_entity)?,
                vpn: link.vpn,
                ip_filtered: link.ip_filtered,
                readonly: link.readonly,
                data_assets_sent,
                data_assets_received,
                diagram_tweak_weight: link.diagram_tweak_weight.max(1),
                diagram_tweak_constraint: !link.diagram_tweak_constraint,
            };

            model
                .communication_links
                .insert(communication_link.id.clone(), communication_link.clone());
            model
                .incoming_links_by_target_id
                .entry(communication_link.target_id.clone())
                .or_default()
                .push(communication_link.clone());
            communication_links.push(communication_link);
        }

        let technical_asset = TechnicalAsset {
            id: id.clone(),
            title: title.clone(),
            description: with_default(&asset.description, title),
            usage: Usage::parse(&asset.usage).map_err(enum_error("usage", &entity))?,
            asset_type: TechnicalAssetType::parse(&asset.asset_type)
                .map_err(enum_error("type", &entity))?,
            size: TechnicalAssetSize::parse(&asset.size).map_err(enum_error("size", &entity))?,
            technologies: resolve_technologies(technologies, &asset.technologies, &entity)?,
            machine: TechnicalAssetMachine::parse(&asset.machine)
                .map_err(enum_error("machine", &entity))?,
            internet: asset.internet,
            encryption: EncryptionStyle::parse(&asset.encryption)
                .map_err(enum_error("encryption", &entity))?,
            multi_tenant: asset.multi_tenant,
            redundant: asset.redundant,
            custom_developed_parts: asset.custom_developed_parts,
            used_as_client_by_human: asset.used_as_client_by_human,
            out_of_scope: asset.out_of_scope,
            justification_out_of_scope: asset.justification_out_of_scope.clone(),
            owner: asset.owner.clone(),
            confidentiality: Confidentiality::parse(&asset.confidentiality)
                .map_err(enum_error("confidentiality", &entity))?,
            integrity: Criticality::parse(&asset.integrity)
                .map_err(enum_error("integrity", &entity))?,
            availability: Criticality::parse(&asset.availability)
                .map_err(enum_error("availability", &entity))?,
            justification_cia_rating: asset.justification_cia_rating.clone(),
            raa: 0.0,
            tags: check_tags(&model, lower_case_and_trim(&asset.tags), &entity)?,
            data_assets_processed,
            data_assets_stored,
            data_formats_accepted,
            communication_links,
        };

        check_id_syntax(&technical_asset.id)?;
        if model.technical_assets.contains_key(&technical_asset.id) {
            return Err(ModelError::DuplicateId {
                id: technical_asset.id,
            });
        }
        model
            .technical_assets
            .insert(technical_asset.id.clone(), technical_asset);
    }

    propagate_data_asset_ratings(&mut model);
    propagate_transferred_data_assets(&mut model);

    // Trust boundaries ------------------------------------------------------
    let mut already_contained: BTreeSet<String> = BTreeSet::new();
    for (title, boundary) in &input.trust_boundaries {
        let entity = format!("trust boundary {title:?}");

        for asset_id in &boundary.technical_assets_inside {
            check_technical_asset_exists(&model, asset_id, &entity)?;
            if !already_contained.insert(asset_id.clone()) {
                return Err(ModelError::DuplicateTrustBoundaryMembership {
                    asset_id: asset_id.clone(),
                    boundary: title.clone(),
                });
            }
        }

        let trust_boundary = TrustBoundary {
            id: boundary.id.clone(),
            title: title.clone(),
            description: with_default(&boundary.description, title),
            boundary_type: TrustBoundaryType::parse(&boundary.boundary_type)
                .map_err(enum_error("type", &entity))?,
            tags: check_tags(&model, lower_case_and_trim(&boundary.tags), &entity)?,
            technical_assets_inside: boundary.technical_assets_inside.clone(),
            trust_boundaries_nested: boundary.trust_boundaries_nested.clone(),
        };
        check_id_syntax(&trust_boundary.id)?;
        if model.trust_boundaries.contains_key(&trust_boundary.id) {
            return Err(ModelError::DuplicateId {
                id: trust_boundary.id,
            });
        }
        for asset_id in &trust_boundary.technical_assets_inside {
            model
                .direct_containing_trust_boundary_by_asset_id
                .insert(asset_id.clone(), trust_boundary.id.clone());
        }
        model
            .trust_boundaries
            .insert(trust_boundary.id.clone(), trust_boundary);
    }
    for boundary in model.trust_boundaries.values() {
        for nested_id in &boundary.trust_boundaries_nested {
            if !model.trust_boundaries.contains_key(nested_id) {
                return Err(ModelError::MissingNestedTrustBoundary {
                    id: nested_id.clone(),
                });
            }
        }
    }

    // Shared runtimes --------------------------------------------------------
    for (title, runtime) in &input.shared_runtimes {
        let entity = format!("shared runtime {title:?}");
        for asset_id in &runtime.technical_assets_running {
            check_technical_asset_exists(&model, asset_id, &entity)?;
        }
        let shared_runtime = SharedRuntime {
            id: runtime.id.clone(),
            title: title.clone(),
            description: with_default(&runtime.description, title),
            tags: check_tags(&model, lower_case_and_trim(&runtime.tags), &entity)?,
            technical_assets_running: runtime.technical_assets_running.clone(),
        };
        check_id_syntax(&shared_runtime.id)?;
        if model.shared_runtimes.contains_key(&shared_runtime.id) {
            return Err(ModelError::DuplicateId {
                id: shared_runtime.id,
            });
        }
        model
            .shared_runtimes
            .insert(shared_runtime.id.clone(), shared_runtime);
    }

    // Rule categories, registered for later reporting ------------------------
    for category in builtin_categories {
        model
            .built_in_risk_categories
            .insert(category.id.clone(), category.clone());
    }
    for category in custom_categories {
        model
            .individual_risk_categories
            .insert(category.id.clone(), category.clone());
    }

    // Individually authored risks -------------------------------------------
    for (title, individual) in &input.individual_risk_categories {
        let entity = format!("individual risk category {title:?}");
        let category = RiskCategory {
            id: individual.id.clone(),
            title: title.clone(),
            description: with_default(&individual.description, title),
            impact: individual.impact.clone(),
            asvs: individual.asvs.clone(),
            cheat_sheet: individual.cheat_sheet.clone(),
            action: individual.action.clone(),
            mitigation: individual.mitigation.clone(),
            check: individual.check.clone(),
            detection_logic: individual.detection_logic.clone(),
            risk_assessment: individual.risk_assessment.clone(),
            false_positives: individual.false_positives.clone(),
            function: RiskFunction::parse(&individual.function)
                .map_err(enum_error("function", &entity))?,
            stride: Stride::parse(&individual.stride).map_err(enum_error("stride", &entity))?,
            model_failure_possible_reason: individual.model_failure_possible_reason,
            cwe: individual.cwe,
        };
        check_id_syntax(&category.id)?;
        if model.individual_risk_categories.contains_key(&category.id) {
            return Err(ModelError::DuplicateId { id: category.id });
        }
        let category_id = category.id.clone();
        model
            .individual_risk_categories
            .insert(category_id.clone(), category);

        for (risk_title, instance) in &individual.risks_identified {
            let risk_entity = format!("individual risk instance {risk_title:?}");

            if !instance.most_relevant_data_asset.is_empty() {
                check_data_asset_exists(&model, &instance.most_relevant_data_asset, &risk_entity)?;
            }
            if !instance.most_relevant_technical_asset.is_empty() {
                check_technical_asset_exists(
                    &model,
                    &instance.most_relevant_technical_asset,
                    &risk_entity,
                )?;
            }
            if !instance.most_relevant_communication_link.is_empty()
                && !model
                    .communication_links
                    .contains_key(&instance.most_relevant_communication_link)
            {
                return Err(ModelError::MissingReference {
                    kind: "communication link",
                    id: instance.most_relevant_communication_link.clone(),
                    referenced_by: risk_entity,
                });
            }
            if !instance.most_relevant_trust_boundary.is_empty()
                && !model
                    .trust_boundaries
                    .contains_key(&instance.most_relevant_trust_boundary)
            {
                return Err(ModelError::MissingReference {
                    kind: "trust boundary",
                    id: instance.most_relevant_trust_boundary.clone(),
                    referenced_by: risk_entity,
                });
            }
            if !instance.most_relevant_shared_runtime.is_empty()
                && !model
                    .shared_runtimes
                    .contains_key(&instance.most_relevant_shared_runtime)
            {
                return Err(ModelError::MissingReference {
                    kind: "shared runtime",
                    id: instance.most_relevant_shared_runtime.clone(),
                    referenced_by: risk_entity,
                });
            }
            for asset_id in &instance.data_breach_technical_assets {
                check_technical_asset_exists(
                    &model,
                    asset_id,
                    &format!("data breach technical assets of {risk_entity}"),
                )?;
            }

            let risk = Risk {
                category_id: category_id.clone(),
                severity: RiskSeverity::parse(&instance.severity)
                    .map_err(enum_error("severity", &risk_entity))?,
                exploitation_likelihood: RiskExploitationLikelihood::parse(
                    &instance.exploitation_likelihood,
                )
                .map_err(enum_error("exploitation_likelihood", &risk_entity))?,
                exploitation_impact: RiskExploitationImpact::parse(
                    &instance.exploitation_impact,
                )
                .map_err(enum_error("exploitation_impact", &risk_entity))?,
                title: risk_title.clone(),
                synthetic_id: synthetic_risk_id(
                    &category_id,
                    &instance.most_relevant_technical_asset,
                    &instance.most_relevant_communication_link,
                    &instance.most_relevant_trust_boundary,
                    &instance.most_relevant_shared_runtime,
                    &instance.most_relevant_data_asset,
                ),
                most_relevant_data_asset_id: instance.most_relevant_data_asset.clone(),
                most_relevant_technical_asset_id: instance.most_relevant_technical_asset.clone(),
                most_relevant_trust_boundary_id: instance.most_relevant_trust_boundary.clone(),
                most_relevant_shared_runtime_id: instance.most_relevant_shared_runtime.clone(),
                most_relevant_communication_link_id: instance
                    .most_relevant_communication_link
                    .clone(),
                data_breach_probability: kakoi_types::DataBreachProbability::parse(
                    &instance.data_breach_probability,
                )
                .map_err(enum_error("data_breach_probability", &risk_entity))?,
                data_breach_technical_asset_ids: instance.data_breach_technical_assets.clone(),
            };
            model
                .generated_risks_by_category
                .entry(category_id.clone())
                .or_default()
                .push(risk);
        }
    }

    // Risk tracking ----------------------------------------------------------
    for (synthetic_id, tracking) in &input.risk_tracking {
        let entity = format!("risk tracking {synthetic_id:?}");
        let entry = RiskTracking {
            synthetic_risk_id: synthetic_id.trim().to_string(),
            justification: tracking.justification.clone(),
            ticket: tracking.ticket.clone(),
            checked_by: tracking.checked_by.clone(),
            status: RiskStatus::parse(&tracking.status).map_err(enum_error("status", &entity))?,
            date: parse_date(&tracking.date, "date", &entity)?,
        };
        model.risk_tracking.insert(synthetic_id.clone(), entry);
    }

    // Final consistency pass: every link target must resolve.
    for asset in model.technical_assets.values() {
        for link in &asset.communication_links {
            if !model.technical_assets.contains_key(&link.target_id) {
                return Err(ModelError::MissingReference {
                    kind: "technical asset",
                    id: link.target_id.clone(),
                    referenced_by: format!(
                        "communication link {:?} of technical asset {:?}",
                        link.title, asset.title
                    ),
                });
            }
        }
    }

    Ok(model)
}

/// Confidentiality/integrity/availability of an asset are raised to the
/// highest rating of any data asset it processes or stores.
fn propagate_data_asset_ratings(model: &mut ParsedModel) {
    let updates: Vec<(String, Confidentiality, Criticality, Criticality)> = model
        .technical_assets
        .values()
        .map(|asset| {
            (
                asset.id.clone(),
                model.highest_processed_confidentiality(asset),
                model.highest_processed_integrity(asset),
                model.highest_processed_availability(asset),
            )
        })
        .collect();
    for (id, confidentiality, integrity, availability) in updates {
        if let Some(asset) = model.technical_assets.get_mut(&id) {
            asset.confidentiality = asset.confidentiality.max(confidentiality);
            asset.integrity = asset.integrity.max(integrity);
            asset.availability = asset.availability.max(availability);
        }
    }
}

/// The target of a communication link implicitly processes everything sent
/// over or received through that link. One hop only, no transitive closure.
fn propagate_transferred_data_assets(model: &mut ParsedModel) {
    let transfers: Vec<(String, Vec<String>)> = model
        .technical_assets
        .values()
        .flat_map(|asset| {
            asset
                .communication_links
                .iter()
                .filter(|link| link.target_id != asset.id)
                .map(|link| {
                    let mut transferred = link.data_assets_sent.clone();
                    transferred.extend(link.data_assets_received.iter().cloned());
                    (link.target_id.clone(), transferred)
                })
        })
        .collect();
    for (target_id, transferred) in transfers {
        if let Some(target) = model.technical_assets.get_mut(&target_id) {
            for data_asset_id in transferred {
                if !target.data_assets_processed.contains(&data_asset_id) {
                    target.data_assets_processed.push(data_asset_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{
        CommunicationLinkInput, DataAssetInput, TechnicalAssetInput, TrustBoundaryInput,
    };

    fn registry() -> TechnologyRegistry {
        TechnologyRegistry::builtin()
    }

    fn minimal_input() -> ModelInput {
        ModelInput {
            title: "Test Architecture".to_string(),
            business_criticality: "important".to_string(),
            ..ModelInput::default()
        }
    }

    fn data_asset(id: &str, confidentiality: &str) -> DataAssetInput {
        DataAssetInput {
            id: id.to_string(),
            usage: "business".to_string(),
            quantity: "many".to_string(),
            confidentiality: confidentiality.to_string(),
            integrity: "important".to_string(),
            availability: "operational".to_string(),
            ..DataAssetInput::default()
        }
    }

    fn technical_asset(id: &str) -> TechnicalAssetInput {
        TechnicalAssetInput {
            id: id.to_string(),
            asset_type: "process".to_string(),
            usage: "business".to_string(),
            size: "service".to_string(),
            technologies: vec!["web-application".to_string()],
            machine: "container".to_string(),
            encryption: "none".to_string(),
            confidentiality: "internal".to_string(),
            integrity: "operational".to_string(),
            availability: "operational".to_string(),
            ..TechnicalAssetInput::default()
        }
    }

    #[test]
    fn empty_model_links_with_empty_collections() {
        let model = link_model(&minimal_input(), &registry(), &[], &[]).unwrap();
        assert!(model.technical_assets.is_empty());
        assert!(model.data_assets.is_empty());
        assert!(model.communication_links.is_empty());
        assert!(model.incoming_links_by_target_id.is_empty());
        assert!(model.generated_risks_by_category.is_empty());
        assert_eq!(model.business_criticality, Criticality::Important);
    }

    #[test]
    fn derive_link_id_is_stable_and_slugs_title() {
        assert_eq!(derive_link_id("app", "DB Query"), "app>db-query");
        assert_eq!(
            derive_link_id("app", "  Read / Write (async)!  "),
            "app>read-write-async"
        );
        // idempotent for the same inputs
        assert_eq!(
            derive_link_id("gateway", "Fetch Rates"),
            derive_link_id("gateway", "Fetch Rates")
        );
        assert!(derive_link_id("svc-a", "x").starts_with("svc-a>"));
    }

    #[test]
    fn unknown_enum_value_names_field_and_entity() {
        let mut input = minimal_input();
        input
            .data_assets
            .insert("Customer Data".to_string(), data_asset("customer-data", "totally-secret"));
        let err = link_model(&input, &registry(), &[], &[]).unwrap_err();
        match err {
            ModelError::UnknownEnumValue {
                field,
                value,
                entity,
            } => {
                assert_eq!(field, "confidentiality");
                assert_eq!(value, "totally-secret");
                assert!(entity.contains("Customer Data"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_technology_is_rejected_with_asset_title() {
        let mut input = minimal_input();
        let mut asset = technical_asset("web");
        asset.technologies = vec!["quantum-mainframe".to_string()];
        input.technical_assets.insert("Web App".to_string(), asset);
        let err = link_model(&input, &registry(), &[], &[]).unwrap_err();
        match err {
            ModelError::UnknownTechnology { name, entity } => {
                assert_eq!(name, "quantum-mainframe");
                assert!(entity.contains("Web App"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut input = minimal_input();
        input
            .data_assets
            .insert("First".to_string(), data_asset("dup", "internal"));
        input
            .data_assets
            .insert("Second".to_string(), data_asset("dup", "internal"));
        assert!(matches!(
            link_model(&input, &registry(), &[], &[]),
            Err(ModelError::DuplicateId { .. })
        ));
    }

    #[test]
    fn invalid_id_syntax_is_rejected() {
        let mut input = minimal_input();
        input
            .data_assets
            .insert("Bad".to_string(), data_asset("not ok!", "internal"));
        assert!(matches!(
            link_model(&input, &registry(), &[], &[]),
            Err(ModelError::InvalidIdSyntax { .. })
        ));
    }

    #[test]
    fn cia_ratings_propagate_from_data_assets() {
        let mut input = minimal_input();
        input.data_assets.insert(
            "Secrets".to_string(),
            data_asset("secrets", "strictly-confidential"),
        );
        let mut asset = technical_asset("app");
        asset.data_assets_processed = vec!["secrets".to_string()];
        input.technical_assets.insert("App".to_string(), asset);

        let model = link_model(&input, &registry(), &[], &[]).unwrap();
        let app = &model.technical_assets["app"];
        assert_eq!(app.confidentiality, Confidentiality::StrictlyConfidential);
        assert_eq!(app.integrity, Criticality::Important);
    }

    #[test]
    fn link_target_gains_transferred_data_assets() {
        let mut input = minimal_input();
        input
            .data_assets
            .insert("Orders".to_string(), data_asset("orders", "confidential"));
        let mut source = technical_asset("frontend");
        source.communication_links.insert(
            "Submit Order".to_string(),
            CommunicationLinkInput {
                target: "backend".to_string(),
                protocol: "https".to_string(),
                authentication: "token".to_string(),
                authorization: "enduser-identity-propagation".to_string(),
                usage: "business".to_string(),
                data_assets_sent: vec!["orders".to_string()],
                ..CommunicationLinkInput::default()
            },
        );
        input.technical_assets.insert("Frontend".to_string(), source);
        input
            .technical_assets
            .insert("Backend".to_string(), technical_asset("backend"));

        let model = link_model(&input, &registry(), &[], &[]).unwrap();
        // the source processes what it sends
        assert!(model.technical_assets["frontend"]
            .data_assets_processed
            .contains(&"orders".to_string()));
        // the target implicitly processes what it is sent
        assert!(model.technical_assets["backend"]
            .data_assets_processed
            .contains(&"orders".to_string()));
        // derived link id and reverse index
        let link = &model.communication_links["frontend>submit-order"];
        assert_eq!(link.target_id, "backend");
        assert_eq!(model.incoming_links("backend").len(), 1);
    }

    #[test]
    fn dangling_link_target_fails_the_final_pass() {
        let mut input = minimal_input();
        let mut source = technical_asset("frontend");
        source.communication_links.insert(
            "Call".to_string(),
            CommunicationLinkInput {
                target: "ghost".to_string(),
                protocol: "https".to_string(),
                usage: "business".to_string(),
                ..CommunicationLinkInput::default()
            },
        );
        input.technical_assets.insert("Frontend".to_string(), source);
        let err = link_model(&input, &registry(), &[], &[]).unwrap_err();
        assert!(matches!(err, ModelError::MissingReference { kind, .. } if kind == "technical asset"));
    }

    #[test]
    fn asset_in_two_trust_boundaries_is_rejected() {
        let mut input = minimal_input();
        input
            .technical_assets
            .insert("App".to_string(), technical_asset("app"));
        input.trust_boundaries.insert(
            "First".to_string(),
            TrustBoundaryInput {
                id: "first".to_string(),
                boundary_type: "network-on-prem".to_string(),
                technical_assets_inside: vec!["app".to_string()],
                ..TrustBoundaryInput::default()
            },
        );
        input.trust_boundaries.insert(
            "Second".to_string(),
            TrustBoundaryInput {
                id: "second".to_string(),
                boundary_type: "network-on-prem".to_string(),
                technical_assets_inside: vec!["app".to_string()],
                ..TrustBoundaryInput::default()
            },
        );
        let err = link_model(&input, &registry(), &[], &[]).unwrap_err();
        match err {
            ModelError::DuplicateTrustBoundaryMembership { asset_id, boundary } => {
                assert_eq!(asset_id, "app");
                assert_eq!(boundary, "Second");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_boundary_must_exist() {
        let mut input = minimal_input();
        input.trust_boundaries.insert(
            "Outer".to_string(),
            TrustBoundaryInput {
                id: "outer".to_string(),
                boundary_type: "network-on-prem".to_string(),
                trust_boundaries_nested: vec!["missing".to_string()],
                ..TrustBoundaryInput::default()
            },
        );
        assert!(matches!(
            link_model(&input, &registry(), &[], &[]),
            Err(ModelError::MissingNestedTrustBoundary { .. })
        ));
    }

    #[test]
    fn tags_are_normalized_and_validated() {
        let mut input = minimal_input();
        input.tags_available = vec!["Git".to_string(), "legacy".to_string()];
        let mut asset = technical_asset("repo");
        asset.tags = vec![" GIT ".to_string()];
        input.technical_assets.insert("Repo".to_string(), asset);
        let model = link_model(&input, &registry(), &[], &[]).unwrap();
        assert_eq!(model.technical_assets["repo"].tags, vec!["git".to_string()]);

        let mut bad = minimal_input();
        let mut asset = technical_asset("repo");
        asset.tags = vec!["unregistered".to_string()];
        bad.technical_assets.insert("Repo".to_string(), asset);
        assert!(matches!(
            link_model(&bad, &registry(), &[], &[]),
            Err(ModelError::UnknownTag { .. })
        ));
    }

    proptest::proptest! {
        #[test]
        fn derived_link_ids_stay_in_the_id_alphabet(title in ".{0,40}") {
            let id = derive_link_id("asset-1", &title);
            let slug = id.strip_prefix("asset-1>").unwrap();
            proptest::prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            // idempotent: deriving again from the same inputs changes nothing
            proptest::prop_assert_eq!(derive_link_id("asset-1", &title), id);
        }
    }

    #[test]
    fn tracking_keys_stay_raw_but_entry_ids_are_trimmed() {
        let mut input = minimal_input();
        input.risk_tracking.insert(
            " xss@web ".to_string(),
            crate::input::RiskTrackingInput {
                status: "accepted".to_string(),
                ..crate::input::RiskTrackingInput::default()
            },
        );
        let model = link_model(&input, &registry(), &[], &[]).unwrap();
        let entry = &model.risk_tracking[" xss@web "];
        assert_eq!(entry.synthetic_risk_id, "xss@web");
        assert_eq!(entry.status, RiskStatus::Accepted);
    }
}
