// Integration tests for kakoi components
// These tests verify end-to-end functionality across multiple crates

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use kakoi_engine::RiskEngine;
use kakoi_model::{link_model, ModelInput, ParsedModel};
use kakoi_plugin::load_custom_rules;
use kakoi_rules::SubprocessRule;
use kakoi_types::{RiskSeverity, RiskStatus, TechnologyRegistry};

/// A small web shop: browser-facing web application in a DMZ querying a
/// strictly-confidential database in the core network over plain JDBC.
fn fixture_input() -> ModelInput {
    ModelInput::from_json(
        r#"{
        "title": "Web Shop",
        "business_criticality": "critical",
        "tags_available": ["git"],
        "data_assets": {
            "Customer Data": {
                "id": "customer-data",
                "usage": "business",
                "quantity": "many",
                "confidentiality": "strictly-confidential",
                "integrity": "critical",
                "availability": "operational"
            }
        },
        "technical_assets": {
            "Web Shop": {
                "id": "web-shop",
                "type": "process",
                "usage": "business",
                "size": "application",
                "technologies": ["web-application"],
                "machine": "container",
                "encryption": "none",
                "custom_developed_parts": true,
                "confidentiality": "confidential",
                "integrity": "critical",
                "availability": "operational",
                "communication_links": {
                    "Query Data": {
                        "target": "customer-db",
                        "protocol": "jdbc",
                        "authentication": "none",
                        "authorization": "none",
                        "usage": "business",
                        "data_assets_sent": ["customer-data"],
                        "data_assets_received": ["customer-data"]
                    }
                }
            },
            "Customer DB": {
                "id": "customer-db",
                "type": "datastore",
                "usage": "business",
                "size": "component",
                "technologies": ["database"],
                "machine": "virtual",
                "encryption": "none",
                "confidentiality": "confidential",
                "integrity": "critical",
                "availability": "important",
                "data_assets_stored": ["customer-data"]
            }
        },
        "trust_boundaries": {
            "DMZ": {
                "id": "dmz",
                "type": "network-cloud-security-group",
                "technical_assets_inside": ["web-shop"]
            },
            "Core Network": {
                "id": "core",
                "type": "network-virtual-lan",
                "technical_assets_inside": ["customer-db"]
            }
        },
        "risk_tracking": {
            "unguarded-direct-datastore-access@customer-db@web-shop>query-data": {
                "status": "mitigated",
                "justification": "moved behind the api gateway",
                "checked_by": "jane",
                "date": "2024-11-05"
            },
            "cross-site-scripting@*": {
                "status": "accepted",
                "justification": "framework auto-escapes"
            }
        }
    }"#,
    )
    .expect("fixture parses")
}

async fn analyzed_fixture() -> ParsedModel {
    let engine = RiskEngine::new();
    let technologies = TechnologyRegistry::builtin();
    let mut model = link_model(
        &fixture_input(),
        &technologies,
        &engine.builtin_categories(),
        &[],
    )
    .expect("fixture links");
    engine.evaluate(&mut model, &[]).await;
    model
        .apply_wildcard_risk_tracking(false)
        .expect("wildcard tracking applies");
    model.check_risk_tracking(false).expect("tracking consistent");
    model
}

#[tokio::test]
async fn end_to_end_pipeline_produces_expected_findings() {
    let model = analyzed_fixture().await;

    // the database inherits the stored data asset's confidentiality
    let db = &model.technical_assets["customer-db"];
    assert_eq!(
        db.confidentiality,
        kakoi_types::Confidentiality::StrictlyConfidential
    );

    let synthetic_ids: Vec<&str> = model
        .generated_risks_by_synthetic_id
        .keys()
        .map(String::as_str)
        .collect();
    for expected in [
        "cross-site-scripting@web-shop",
        "sql-nosql-injection@web-shop@web-shop>query-data",
        "unguarded-direct-datastore-access@customer-db@web-shop>query-data",
        "unencrypted-communication@web-shop@web-shop>query-data",
        "missing-authentication@customer-db@web-shop>query-data",
    ] {
        assert!(
            synthetic_ids.contains(&expected),
            "missing expected finding {expected}, got: {synthetic_ids:?}"
        );
    }
    assert!(model
        .generated_risks_by_category
        .contains_key("missing-vault"));
}

#[tokio::test]
async fn severity_tiers_follow_the_fixed_table() {
    let model = analyzed_fixture().await;
    // very-likely (3) x high (3) = 9 -> high severity
    let sqli = &model.generated_risks_by_synthetic_id
        ["sql-nosql-injection@web-shop@web-shop>query-data"];
    assert_eq!(sqli.severity, RiskSeverity::High);
}

#[tokio::test]
async fn tracking_reconciliation_applies_literals_and_wildcards() {
    let model = analyzed_fixture().await;

    let unguarded = &model.generated_risks_by_synthetic_id
        ["unguarded-direct-datastore-access@customer-db@web-shop>query-data"];
    assert_eq!(model.risk_tracking_status(unguarded), RiskStatus::Mitigated);

    // wildcard expansion synthesized a direct entry for the XSS finding
    let xss = &model.generated_risks_by_synthetic_id["cross-site-scripting@web-shop"];
    assert_eq!(model.risk_tracking_status(xss), RiskStatus::Accepted);
    assert_eq!(
        model.risk_tracking["cross-site-scripting@web-shop"].justification,
        "framework auto-escapes"
    );

    // untracked findings stay unchecked and still-at-risk filters drop the
    // mitigated one
    let missing_auth = &model.generated_risks_by_synthetic_id
        ["missing-authentication@customer-db@web-shop>query-data"];
    assert_eq!(model.risk_tracking_status(missing_auth), RiskStatus::Unchecked);
    let still_at_risk = model.filtered_by_still_at_risk();
    assert!(still_at_risk
        .iter()
        .all(|risk| risk.synthetic_id != unguarded.synthetic_id));
}

#[tokio::test]
async fn orphaned_tracking_entry_aborts_unless_ignored() {
    let mut input = fixture_input();
    input.risk_tracking.insert(
        "missing-waf@nonexistent".to_string(),
        kakoi_model::input::RiskTrackingInput {
            status: "accepted".to_string(),
            ..Default::default()
        },
    );
    let engine = RiskEngine::new();
    let technologies = TechnologyRegistry::builtin();
    let mut model = link_model(&input, &technologies, &engine.builtin_categories(), &[]).unwrap();
    engine.evaluate(&mut model, &[]).await;
    model.apply_wildcard_risk_tracking(true).unwrap();
    assert!(model.check_risk_tracking(false).is_err());
    assert!(model.check_risk_tracking(true).is_ok());
}

#[tokio::test]
async fn skip_list_suppresses_named_rules() {
    let engine = RiskEngine::new();
    let technologies = TechnologyRegistry::builtin();
    let mut input = fixture_input();
    input.risk_tracking.clear();
    let mut model = link_model(&input, &technologies, &engine.builtin_categories(), &[]).unwrap();
    let stats = engine
        .evaluate(&mut model, &["cross-site-scripting".to_string()])
        .await;
    assert_eq!(stats.rules_skipped, 1);
    assert!(!model
        .generated_risks_by_category
        .contains_key("cross-site-scripting"));
}

fn write_plugin(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("demo-rule");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"#!/bin/sh
case "$1" in
-get-info)
    echo '{{"id":"demo-custom","tags":["demo"],"category":{{"id":"demo-custom","title":"Demo Custom Rule","function":"architecture","stride":"tampering"}}}}'
    ;;
-generate-risks)
    cat >/dev/null
    echo '[{{"category":"demo-custom","severity":"medium","exploitation_likelihood":"likely","exploitation_impact":"medium","title":"Custom finding","synthetic_id":"demo-custom@web-shop","most_relevant_technical_asset":"web-shop","data_breach_probability":"possible","data_breach_technical_assets":[]}}]'
    ;;
esac
"#
    )
    .unwrap();
    let mut permissions = file.metadata().unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

#[tokio::test]
async fn custom_plugin_rule_contributes_risks() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = write_plugin(&dir);
    let specs = load_custom_rules(&[plugin], None).await;
    assert_eq!(specs.len(), 1);

    let mut engine = RiskEngine::new();
    for spec in specs {
        engine.add_rule(Arc::new(SubprocessRule::new(spec)));
    }

    let technologies = TechnologyRegistry::builtin();
    let mut input = fixture_input();
    input.risk_tracking.clear();
    let mut model = link_model(
        &input,
        &technologies,
        &engine.builtin_categories(),
        &engine.custom_categories(),
    )
    .unwrap();
    engine.evaluate(&mut model, &[]).await;

    assert!(model.all_supported_tags.contains("demo"));
    assert!(model
        .individual_risk_categories
        .contains_key("demo-custom"));
    let custom = &model.generated_risks_by_synthetic_id["demo-custom@web-shop"];
    assert_eq!(custom.title, "Custom finding");
}
