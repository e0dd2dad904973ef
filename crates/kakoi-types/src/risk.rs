//! Risk rating enums and the severity scoring table.

use serde::{Deserialize, Serialize};

use crate::enums::{impl_display, parse_named, UnknownEnumValue};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RiskSeverity {
    #[default]
    Low,
    Medium,
    Elevated,
    High,
    Critical,
}

impl RiskSeverity {
    pub const VALUES: [Self; 5] = [
        Self::Low,
        Self::Medium,
        Self::Elevated,
        Self::High,
        Self::Critical,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Elevated => "elevated",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::Elevated => "Elevated",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RiskExploitationLikelihood {
    #[default]
    Unlikely,
    Likely,
    VeryLikely,
    Frequent,
}

impl RiskExploitationLikelihood {
    pub const VALUES: [Self; 4] = [
        Self::Unlikely,
        Self::Likely,
        Self::VeryLikely,
        Self::Frequent,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unlikely => "unlikely",
            Self::Likely => "likely",
            Self::VeryLikely => "very-likely",
            Self::Frequent => "frequent",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    pub const fn weight(self) -> u32 {
        self as u32 + 1
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RiskExploitationImpact {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskExploitationImpact {
    pub const VALUES: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    pub const fn weight(self) -> u32 {
        self as u32 + 1
    }
}

/// Fixed thresholds over the likelihood*impact weight product. The table is
/// part of the engine's contract; risk counts in downstream reports depend
/// on it.
pub const fn calculate_severity(
    likelihood: RiskExploitationLikelihood,
    impact: RiskExploitationImpact,
) -> RiskSeverity {
    let product = likelihood.weight() * impact.weight();
    if product <= 1 {
        RiskSeverity::Low
    } else if product <= 3 {
        RiskSeverity::Medium
    } else if product <= 8 {
        RiskSeverity::Elevated
    } else if product <= 12 {
        RiskSeverity::High
    } else {
        RiskSeverity::Critical
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DataBreachProbability {
    #[default]
    Improbable,
    Possible,
    Probable,
}

impl DataBreachProbability {
    pub const VALUES: [Self; 3] = [Self::Improbable, Self::Possible, Self::Probable];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Improbable => "improbable",
            Self::Possible => "possible",
            Self::Probable => "probable",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }
}

/// The organizational function responsible for mitigating a risk category.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFunction {
    #[default]
    BusinessSide,
    Architecture,
    Development,
    Operations,
}

impl RiskFunction {
    pub const VALUES: [Self; 4] = [
        Self::BusinessSide,
        Self::Architecture,
        Self::Development,
        Self::Operations,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BusinessSide => "business-side",
            Self::Architecture => "architecture",
            Self::Development => "development",
            Self::Operations => "operations",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stride {
    #[default]
    Spoofing,
    Tampering,
    Repudiation,
    InformationDisclosure,
    DenialOfService,
    ElevationOfPrivilege,
}

impl Stride {
    pub const VALUES: [Self; 6] = [
        Self::Spoofing,
        Self::Tampering,
        Self::Repudiation,
        Self::InformationDisclosure,
        Self::DenialOfService,
        Self::ElevationOfPrivilege,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spoofing => "spoofing",
            Self::Tampering => "tampering",
            Self::Repudiation => "repudiation",
            Self::InformationDisclosure => "information-disclosure",
            Self::DenialOfService => "denial-of-service",
            Self::ElevationOfPrivilege => "elevation-of-privilege",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }
}

/// Disposition of a tracked risk. The order matters: the first four statuses
/// mean the finding is still open, the last two that it is resolved.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RiskStatus {
    #[default]
    Unchecked,
    InDiscussion,
    Accepted,
    InProgress,
    Mitigated,
    FalsePositive,
}

impl RiskStatus {
    pub const VALUES: [Self; 6] = [
        Self::Unchecked,
        Self::InDiscussion,
        Self::Accepted,
        Self::InProgress,
        Self::Mitigated,
        Self::FalsePositive,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::InDiscussion => "in-discussion",
            Self::Accepted => "accepted",
            Self::InProgress => "in-progress",
            Self::Mitigated => "mitigated",
            Self::FalsePositive => "false-positive",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    pub const fn is_still_at_risk(self) -> bool {
        matches!(
            self,
            Self::Unchecked | Self::InDiscussion | Self::Accepted | Self::InProgress
        )
    }
}

impl_display!(
    RiskSeverity,
    RiskExploitationLikelihood,
    RiskExploitationImpact,
    DataBreachProbability,
    RiskFunction,
    Stride,
    RiskStatus,
);
