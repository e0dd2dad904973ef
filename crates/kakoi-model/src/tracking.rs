//! Risk-tracking reconciliation: wildcard expansion and consistency checks.
//!
//! A tracking key containing `*` is a wildcard pattern. Matching compiles the
//! pattern by regex-quoting it and replacing each quoted `\*` with `[^@]+`, so
//! a wildcard covers exactly one `@`-delimited segment of a synthetic id and
//! never crosses an `@`.

use regex::Regex;
use tracing::{info, warn};

use kakoi_types::RiskTracking;

use crate::linker::ModelError;
use crate::model::ParsedModel;

fn wildcard_pattern(tracking_id: &str) -> Option<Regex> {
    let expression = regex::escape(tracking_id).replace(r"\*", "[^@]+");
    Regex::new(&expression).ok()
}

impl ParsedModel {
    /// Expands wildcard tracking entries against every generated risk whose
    /// synthetic id matches and has no direct (non-wildcard) tracking entry
    /// yet. The synthesized entries copy the wildcard entry's disposition, so
    /// matched risks count as tracked from here on.
    pub fn apply_wildcard_risk_tracking(
        &mut self,
        ignore_orphaned: bool,
    ) -> Result<(), ModelError> {
        info!("applying wildcard risk tracking evaluation");
        let deferred: Vec<(String, RiskTracking)> = self
            .risk_tracking
            .iter()
            .filter(|(key, _)| key.contains('*'))
            .map(|(key, tracking)| (key.clone(), tracking.clone()))
            .collect();

        for (pattern_key, tracking) in deferred {
            info!(pattern = %pattern_key, "applying wildcard risk tracking");
            let Some(expression) = wildcard_pattern(tracking.synthetic_risk_id.as_str()) else {
                continue;
            };

            let matches: Vec<String> = self
                .generated_risks_by_synthetic_id
                .values()
                .map(|risk| risk.synthetic_id.clone())
                .filter(|synthetic_id| {
                    expression.is_match(&synthetic_id.to_lowercase())
                        && !self.risk_tracking.contains_key(synthetic_id)
                })
                .collect();

            if matches.is_empty() {
                if ignore_orphaned {
                    warn!(pattern = %pattern_key, "wildcard risk tracking does not match any risk id");
                    continue;
                }
                return Err(ModelError::OrphanedRiskTracking { id: pattern_key });
            }

            for synthetic_id in matches {
                self.risk_tracking.insert(
                    synthetic_id.clone(),
                    RiskTracking {
                        synthetic_risk_id: synthetic_id.trim().to_string(),
                        justification: tracking.justification.clone(),
                        ticket: tracking.ticket.clone(),
                        checked_by: tracking.checked_by.clone(),
                        status: tracking.status,
                        date: tracking.date,
                    },
                );
            }
        }
        Ok(())
    }

    /// Verifies that every tracking entry, wildcard or literal, matches at
    /// least one generated risk. Orphaned entries are fatal unless
    /// explicitly suppressed.
    pub fn check_risk_tracking(&self, ignore_orphaned: bool) -> Result<(), ModelError> {
        info!("checking risk tracking consistency");
        for tracking in self.risk_tracking.values() {
            let Some(expression) = wildcard_pattern(&tracking.synthetic_risk_id) else {
                continue;
            };
            let found = self
                .generated_risks_by_synthetic_id
                .keys()
                .any(|synthetic_id| {
                    expression.is_match(&tracking_case_normalized(synthetic_id))
                });
            if !found {
                if ignore_orphaned {
                    info!(
                        id = %tracking.synthetic_risk_id,
                        "risk tracking references unknown risk id"
                    );
                    continue;
                }
                return Err(ModelError::OrphanedRiskTracking {
                    id: tracking.synthetic_risk_id.clone(),
                });
            }
        }
        Ok(())
    }
}

fn tracking_case_normalized(synthetic_id: &str) -> String {
    synthetic_id.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakoi_types::{Risk, RiskStatus};

    fn model_with_risks(synthetic_ids: &[&str]) -> ParsedModel {
        let mut model = ParsedModel::default();
        for synthetic_id in synthetic_ids {
            let risk = Risk {
                synthetic_id: synthetic_id.to_string(),
                ..Risk::default()
            };
            model
                .generated_risks_by_synthetic_id
                .insert(synthetic_id.to_lowercase(), risk);
        }
        model
    }

    fn tracking(id: &str, status: RiskStatus) -> RiskTracking {
        RiskTracking {
            synthetic_risk_id: id.trim().to_string(),
            status,
            ..RiskTracking::default()
        }
    }

    #[test]
    fn wildcard_expands_to_matching_untracked_risks() {
        let mut model = model_with_risks(&["xss@web-1", "xss@web-2", "sqli@db"]);
        model.risk_tracking.insert(
            "xss@*".to_string(),
            tracking("xss@*", RiskStatus::Accepted),
        );
        model.apply_wildcard_risk_tracking(false).unwrap();
        assert_eq!(
            model.risk_tracking["xss@web-1"].status,
            RiskStatus::Accepted
        );
        assert_eq!(
            model.risk_tracking["xss@web-2"].status,
            RiskStatus::Accepted
        );
        assert!(!model.risk_tracking.contains_key("sqli@db"));
    }

    #[test]
    fn wildcard_does_not_cross_at_separators() {
        let mut model = model_with_risks(&["access@db@app>read", "access@db"]);
        model.risk_tracking.insert(
            "access@*".to_string(),
            tracking("access@*", RiskStatus::FalsePositive),
        );
        model.apply_wildcard_risk_tracking(false).unwrap();
        // the single-segment id matches fully, the two-segment one only
        // partially (the wildcard stops at the next @)
        assert!(model.risk_tracking.contains_key("access@db"));
    }

    #[test]
    fn direct_entries_win_over_wildcards() {
        let mut model = model_with_risks(&["xss@web-1"]);
        model.risk_tracking.insert(
            "xss@web-1".to_string(),
            tracking("xss@web-1", RiskStatus::Mitigated),
        );
        model.risk_tracking.insert(
            "xss@*".to_string(),
            tracking("xss@*", RiskStatus::Accepted),
        );
        model.apply_wildcard_risk_tracking(false).unwrap();
        assert_eq!(
            model.risk_tracking["xss@web-1"].status,
            RiskStatus::Mitigated
        );
    }

    #[test]
    fn unmatched_wildcard_is_fatal_unless_suppressed() {
        let mut model = model_with_risks(&["sqli@db"]);
        model.risk_tracking.insert(
            "xss@*".to_string(),
            tracking("xss@*", RiskStatus::Accepted),
        );
        assert!(matches!(
            model.clone().apply_wildcard_risk_tracking(false),
            Err(ModelError::OrphanedRiskTracking { .. })
        ));
        assert!(model.apply_wildcard_risk_tracking(true).is_ok());
    }

    #[test]
    fn orphaned_literal_entry_is_fatal_unless_suppressed() {
        let mut model = model_with_risks(&["sqli@db"]);
        model.risk_tracking.insert(
            "gone@asset".to_string(),
            tracking("gone@asset", RiskStatus::Mitigated),
        );
        assert!(matches!(
            model.check_risk_tracking(false),
            Err(ModelError::OrphanedRiskTracking { .. })
        ));
        assert!(model.check_risk_tracking(true).is_ok());
    }

    #[test]
    fn literal_entry_matching_a_risk_passes_the_check() {
        let mut model = model_with_risks(&["sqli@db"]);
        model.risk_tracking.insert(
            "sqli@db".to_string(),
            tracking("sqli@db", RiskStatus::InProgress),
        );
        model.check_risk_tracking(false).unwrap();
    }
}
