//! Risk collection queries, filters and deterministic orderings.

use std::cmp::Ordering;

use kakoi_types::{Risk, RiskSeverity, RiskStatus};

use crate::model::ParsedModel;

impl ParsedModel {
    pub fn all_risks(&self) -> Vec<&Risk> {
        self.generated_risks_by_category
            .values()
            .flatten()
            .collect()
    }

    pub fn total_risk_count(&self) -> usize {
        self.generated_risks_by_category
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Tracking status of a risk, defaulting to unchecked. Lookup is by
    /// synthetic id, case-insensitively.
    pub fn risk_tracking_status(&self, risk: &Risk) -> RiskStatus {
        if let Some(tracking) = self.risk_tracking.get(&risk.synthetic_id) {
            return tracking.status;
        }
        self.risk_tracking
            .values()
            .find(|tracking| {
                tracking
                    .synthetic_risk_id
                    .eq_ignore_ascii_case(&risk.synthetic_id)
            })
            .map(|tracking| tracking.status)
            .unwrap_or_default()
    }

    pub fn is_risk_tracked(&self, risk: &Risk) -> bool {
        self.risk_tracking.contains_key(&risk.synthetic_id)
    }

    pub fn reduce_to_only_still_at_risk<'a>(&self, risks: &[&'a Risk]) -> Vec<&'a Risk> {
        risks
            .iter()
            .filter(|risk| self.risk_tracking_status(risk).is_still_at_risk())
            .copied()
            .collect()
    }

    pub fn filtered_by_still_at_risk(&self) -> Vec<&Risk> {
        self.all_risks()
            .into_iter()
            .filter(|risk| self.risk_tracking_status(risk).is_still_at_risk())
            .collect()
    }

    pub fn filtered_by_tracking_status(&self, status: RiskStatus) -> Vec<&Risk> {
        self.all_risks()
            .into_iter()
            .filter(|risk| self.risk_tracking_status(risk) == status)
            .collect()
    }

    pub fn filtered_by_severity(&self, severity: RiskSeverity) -> Vec<&Risk> {
        self.all_risks()
            .into_iter()
            .filter(|risk| risk.severity == severity)
            .collect()
    }

    pub fn highest_severity(risks: &[&Risk]) -> RiskSeverity {
        risks
            .iter()
            .map(|risk| risk.severity)
            .max()
            .unwrap_or_default()
    }

    pub fn highest_severity_still_at_risk(&self, risks: &[&Risk]) -> RiskSeverity {
        risks
            .iter()
            .filter(|risk| self.risk_tracking_status(risk).is_still_at_risk())
            .map(|risk| risk.severity)
            .max()
            .unwrap_or_default()
    }

    /// Report ordering: severity descending, then tracking status ascending
    /// (open findings first), impact and likelihood descending, title as the
    /// final tiebreaker.
    pub fn sort_risks_by_severity(&self, risks: &mut [Risk]) {
        risks.sort_by(|left, right| {
            right
                .severity
                .cmp(&left.severity)
                .then_with(|| {
                    self.risk_tracking_status(left)
                        .cmp(&self.risk_tracking_status(right))
                })
                .then_with(|| right.exploitation_impact.cmp(&left.exploitation_impact))
                .then_with(|| {
                    right
                        .exploitation_likelihood
                        .cmp(&left.exploitation_likelihood)
                })
                .then_with(|| left.title.cmp(&right.title))
        });
    }

    pub fn sorted_risks_of_category(&self, category_id: &str) -> Vec<Risk> {
        let mut risks = self
            .generated_risks_by_category
            .get(category_id)
            .cloned()
            .unwrap_or_default();
        self.sort_risks_by_severity(&mut risks);
        risks
    }

    /// Category ids ordered by their highest still-open severity, then by
    /// category title.
    pub fn sorted_risk_category_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.generated_risks_by_category.keys().cloned().collect();
        ids.sort_by(|left, right| {
            let left_risks: Vec<&Risk> = self
                .generated_risks_by_category
                .get(left)
                .map(|risks| risks.iter().collect())
                .unwrap_or_default();
            let right_risks: Vec<&Risk> = self
                .generated_risks_by_category
                .get(right)
                .map(|risks| risks.iter().collect())
                .unwrap_or_default();
            let left_highest = self.highest_severity_still_at_risk(&left_risks);
            let right_highest = self.highest_severity_still_at_risk(&right_risks);
            match right_highest.cmp(&left_highest) {
                Ordering::Equal => {
                    let left_title = self.risk_category_title(left);
                    let right_title = self.risk_category_title(right);
                    left_title.cmp(&right_title)
                }
                other => other,
            }
        });
        ids
    }

    pub fn risk_category(&self, category_id: &str) -> Option<&kakoi_types::RiskCategory> {
        self.built_in_risk_categories
            .get(category_id)
            .or_else(|| self.individual_risk_categories.get(category_id))
    }

    fn risk_category_title(&self, category_id: &str) -> String {
        self.risk_category(category_id)
            .map(|category| category.title.clone())
            .unwrap_or_else(|| category_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakoi_types::{
        calculate_severity, RiskExploitationImpact, RiskExploitationLikelihood, RiskTracking,
    };

    fn risk(category: &str, asset: &str, severity: RiskSeverity) -> Risk {
        let mut risk = Risk {
            category_id: category.to_string(),
            severity,
            title: format!("{category} at {asset}"),
            most_relevant_technical_asset_id: asset.to_string(),
            ..Risk::default()
        };
        risk.update_synthetic_id();
        risk
    }

    #[test]
    fn untracked_risks_default_to_unchecked() {
        let model = ParsedModel::default();
        let risk = risk("xss", "web", RiskSeverity::Medium);
        assert_eq!(model.risk_tracking_status(&risk), RiskStatus::Unchecked);
        assert!(!model.is_risk_tracked(&risk));
    }

    #[test]
    fn mitigated_risks_drop_out_of_still_at_risk_filters() {
        let mut model = ParsedModel::default();
        let open = risk("xss", "web", RiskSeverity::Medium);
        let mitigated = risk("sqli", "db", RiskSeverity::High);
        model.risk_tracking.insert(
            mitigated.synthetic_id.clone(),
            RiskTracking {
                synthetic_risk_id: mitigated.synthetic_id.clone(),
                status: RiskStatus::Mitigated,
                ..RiskTracking::default()
            },
        );
        model
            .generated_risks_by_category
            .insert("xss".to_string(), vec![open.clone()]);
        model
            .generated_risks_by_category
            .insert("sqli".to_string(), vec![mitigated.clone()]);

        let still_at_risk = model.filtered_by_still_at_risk();
        assert_eq!(still_at_risk.len(), 1);
        assert_eq!(still_at_risk[0].synthetic_id, open.synthetic_id);
        assert_eq!(
            model
                .filtered_by_tracking_status(RiskStatus::Mitigated)
                .len(),
            1
        );
    }

    #[test]
    fn status_lookup_is_case_insensitive() {
        let mut model = ParsedModel::default();
        let mut tracked = risk("xss", "Web-Shop", RiskSeverity::Medium);
        tracked.synthetic_id = "xss@Web-Shop".to_string();
        model.risk_tracking.insert(
            "xss@web-shop".to_string(),
            RiskTracking {
                synthetic_risk_id: "xss@web-shop".to_string(),
                status: RiskStatus::Accepted,
                ..RiskTracking::default()
            },
        );
        assert_eq!(model.risk_tracking_status(&tracked), RiskStatus::Accepted);
    }

    #[test]
    fn severity_sort_is_deterministic() {
        let model = ParsedModel::default();
        let mut risks = vec![
            risk("b-cat", "asset-1", RiskSeverity::Medium),
            risk("a-cat", "asset-2", RiskSeverity::High),
            risk("c-cat", "asset-3", RiskSeverity::Medium),
        ];
        model.sort_risks_by_severity(&mut risks);
        assert_eq!(risks[0].severity, RiskSeverity::High);
        // equal severity/status/impact/likelihood falls back to title order
        assert!(risks[1].title < risks[2].title);
    }

    #[test]
    fn severity_sort_prefers_higher_impact_at_equal_severity() {
        let model = ParsedModel::default();
        let mut low_impact = risk("cat", "a", RiskSeverity::Elevated);
        low_impact.exploitation_likelihood = RiskExploitationLikelihood::VeryLikely;
        low_impact.exploitation_impact = RiskExploitationImpact::Medium;
        low_impact.severity = calculate_severity(
            low_impact.exploitation_likelihood,
            low_impact.exploitation_impact,
        );
        let mut high_impact = risk("cat", "b", RiskSeverity::Elevated);
        high_impact.exploitation_likelihood = RiskExploitationLikelihood::Likely;
        high_impact.exploitation_impact = RiskExploitationImpact::High;
        high_impact.severity = calculate_severity(
            high_impact.exploitation_likelihood,
            high_impact.exploitation_impact,
        );
        let mut risks = vec![low_impact, high_impact];
        model.sort_risks_by_severity(&mut risks);
        assert_eq!(risks[0].exploitation_impact, RiskExploitationImpact::High);
    }
}
