//! Ordered classification enums of the architecture model.
//!
//! Every enum here is a closed, totally ordered set with a canonical
//! kebab-case string form. Parsing trims whitespace and matches
//! case-insensitively; empty input yields the lowest variant (absent optional
//! fields rate conservatively low). Unknown text fails with
//! [`UnknownEnumValue`] so callers can attach the field name and the owning
//! entity to the message.

use serde::{Deserialize, Serialize};

/// A value that does not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value {value:?}")]
pub struct UnknownEnumValue {
    pub value: String,
}

pub(crate) fn parse_named<T: Copy>(
    values: &[T],
    name_of: fn(T) -> &'static str,
    value: &str,
) -> Result<T, UnknownEnumValue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(values[0]);
    }
    values
        .iter()
        .copied()
        .find(|candidate| name_of(*candidate).eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| UnknownEnumValue {
            value: trimmed.to_string(),
        })
}

macro_rules! impl_display {
    ($($ty:ty),+ $(,)?) => {$(
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )+};
}
pub(crate) use impl_display;

/// How much of a data asset exists (drives attacker attractiveness).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Quantity {
    #[default]
    VeryFew,
    Few,
    Many,
    VeryMany,
}

impl Quantity {
    pub const VALUES: [Self; 4] = [Self::VeryFew, Self::Few, Self::Many, Self::VeryMany];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryFew => "very-few",
            Self::Few => "few",
            Self::Many => "many",
            Self::VeryMany => "very-many",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    /// Fibonacci ladder starting at 1, used by the attractiveness scoring.
    pub const fn quantity_factor(self) -> f64 {
        match self {
            Self::VeryFew => 1.0,
            Self::Few => 2.0,
            Self::Many => 3.0,
            Self::VeryMany => 5.0,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Confidentiality {
    #[default]
    Public,
    Internal,
    Restricted,
    Confidential,
    StrictlyConfidential,
}

impl Confidentiality {
    pub const VALUES: [Self; 5] = [
        Self::Public,
        Self::Internal,
        Self::Restricted,
        Self::Confidential,
        Self::StrictlyConfidential,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Restricted => "restricted",
            Self::Confidential => "confidential",
            Self::StrictlyConfidential => "strictly-confidential",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    // Fibonacci ladders; consumed by the attacker-attractiveness collaborator.
    pub const fn attacker_attractiveness_for_asset(self) -> f64 {
        [8.0, 13.0, 21.0, 34.0, 55.0][self as usize]
    }

    pub const fn attacker_attractiveness_for_processed_or_stored_data(self) -> f64 {
        [5.0, 8.0, 13.0, 21.0, 34.0][self as usize]
    }

    pub const fn attacker_attractiveness_for_transferred_data(self) -> f64 {
        [2.0, 3.0, 5.0, 8.0, 13.0][self as usize]
    }
}

/// Integrity/availability rating ladder, also used for business criticality.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Criticality {
    #[default]
    Archive,
    Operational,
    Important,
    Critical,
    MissionCritical,
}

impl Criticality {
    pub const VALUES: [Self; 5] = [
        Self::Archive,
        Self::Operational,
        Self::Important,
        Self::Critical,
        Self::MissionCritical,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Operational => "operational",
            Self::Important => "important",
            Self::Critical => "critical",
            Self::MissionCritical => "mission-critical",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    pub const fn attacker_attractiveness_for_asset(self) -> f64 {
        [8.0, 13.0, 21.0, 34.0, 55.0][self as usize]
    }

    pub const fn attacker_attractiveness_for_processed_or_stored_data(self) -> f64 {
        [5.0, 8.0, 13.0, 21.0, 34.0][self as usize]
    }

    pub const fn attacker_attractiveness_for_transferred_data(self) -> f64 {
        [2.0, 3.0, 5.0, 8.0, 13.0][self as usize]
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Usage {
    #[default]
    Business,
    // kebab-case would split this into "dev-ops"
    #[serde(rename = "devops")]
    DevOps,
}

impl Usage {
    pub const VALUES: [Self; 2] = [Self::Business, Self::DevOps];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::DevOps => "devops",
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
pub enum EncryptionStyle {
    #[default]
    None,
    Transparent,
    DataWithSymmetricSharedKey,
    DataWithAsymmetricSharedKey,
    DataWithEnduserIndividualKey,
}

impl EncryptionStyle {
    pub const VALUES: [Self; 5] = [
        Self::None,
        Self::Transparent,
        Self::DataWithSymmetricSharedKey,
        Self::DataWithAsymmetricSharedKey,
        Self::DataWithEnduserIndividualKey,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Transparent => "transparent",
            Self::DataWithSymmetricSharedKey => "data-with-symmetric-shared-key",
            Self::DataWithAsymmetricSharedKey => "data-with-asymmetric-shared-key",
            Self::DataWithEnduserIndividualKey => "data-with-enduser-individual-key",
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
pub enum DataFormat {
    #[default]
    Json,
    Xml,
    Serialization,
    File,
    Csv,
}

impl DataFormat {
    pub const VALUES: [Self; 5] = [
        Self::Json,
        Self::Xml,
        Self::Serialization,
        Self::File,
        Self::Csv,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Serialization => "serialization",
            Self::File => "file",
            Self::Csv => "csv",
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
pub enum TechnicalAssetType {
    #[default]
    ExternalEntity,
    Process,
    Datastore,
}

impl TechnicalAssetType {
    pub const VALUES: [Self; 3] = [Self::ExternalEntity, Self::Process, Self::Datastore];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExternalEntity => "external-entity",
            Self::Process => "process",
            Self::Datastore => "datastore",
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
pub enum TechnicalAssetSize {
    #[default]
    System,
    Service,
    Application,
    Component,
}

impl TechnicalAssetSize {
    pub const VALUES: [Self; 4] = [
        Self::System,
        Self::Service,
        Self::Application,
        Self::Component,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Service => "service",
            Self::Application => "application",
            Self::Component => "component",
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
pub enum TechnicalAssetMachine {
    #[default]
    Physical,
    Virtual,
    Container,
    Serverless,
}

impl TechnicalAssetMachine {
    pub const VALUES: [Self; 4] = [
        Self::Physical,
        Self::Virtual,
        Self::Container,
        Self::Serverless,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Virtual => "virtual",
            Self::Container => "container",
            Self::Serverless => "serverless",
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
pub enum TrustBoundaryType {
    #[default]
    NetworkOnPrem,
    NetworkDedicatedHoster,
    NetworkVirtualLan,
    NetworkCloudProvider,
    NetworkCloudSecurityGroup,
    NetworkPolicyNamespaceIsolation,
    ExecutionEnvironment,
}

impl TrustBoundaryType {
    pub const VALUES: [Self; 7] = [
        Self::NetworkOnPrem,
        Self::NetworkDedicatedHoster,
        Self::NetworkVirtualLan,
        Self::NetworkCloudProvider,
        Self::NetworkCloudSecurityGroup,
        Self::NetworkPolicyNamespaceIsolation,
        Self::ExecutionEnvironment,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkOnPrem => "network-on-prem",
            Self::NetworkDedicatedHoster => "network-dedicated-hoster",
            Self::NetworkVirtualLan => "network-virtual-lan",
            Self::NetworkCloudProvider => "network-cloud-provider",
            Self::NetworkCloudSecurityGroup => "network-cloud-security-group",
            Self::NetworkPolicyNamespaceIsolation => "network-policy-namespace-isolation",
            Self::ExecutionEnvironment => "execution-environment",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    /// Execution environments group processes, not networks; they do not
    /// count as network isolation.
    pub const fn is_network_boundary(self) -> bool {
        !matches!(self, Self::ExecutionEnvironment)
    }

    pub const fn is_within_cloud(self) -> bool {
        matches!(
            self,
            Self::NetworkCloudProvider | Self::NetworkCloudSecurityGroup
        )
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Authentication {
    #[default]
    None,
    Credentials,
    SessionId,
    Token,
    ClientCertificate,
    TwoFactor,
    Externalized,
}

impl Authentication {
    pub const VALUES: [Self; 7] = [
        Self::None,
        Self::Credentials,
        Self::SessionId,
        Self::Token,
        Self::ClientCertificate,
        Self::TwoFactor,
        Self::Externalized,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Credentials => "credentials",
            Self::SessionId => "session-id",
            Self::Token => "token",
            Self::ClientCertificate => "client-certificate",
            Self::TwoFactor => "two-factor",
            Self::Externalized => "externalized",
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
pub enum Authorization {
    #[default]
    None,
    TechnicalUser,
    EnduserIdentityPropagation,
}

impl Authorization {
    pub const VALUES: [Self; 3] = [
        Self::None,
        Self::TechnicalUser,
        Self::EnduserIdentityPropagation,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TechnicalUser => "technical-user",
            Self::EnduserIdentityPropagation => "enduser-identity-propagation",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }
}

impl_display!(
    Quantity,
    Confidentiality,
    Criticality,
    Usage,
    EncryptionStyle,
    DataFormat,
    TechnicalAssetType,
    TechnicalAssetSize,
    TechnicalAssetMachine,
    TrustBoundaryType,
    Authentication,
    Authorization,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(
            Confidentiality::parse("  Strictly-Confidential ").unwrap(),
            Confidentiality::StrictlyConfidential
        );
        assert_eq!(Usage::parse("DEVOPS").unwrap(), Usage::DevOps);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = Criticality::parse("nuclear").unwrap_err();
        assert_eq!(err.value, "nuclear");
    }

    #[test]
    fn empty_input_parses_to_lowest_variant() {
        assert_eq!(Quantity::parse("").unwrap(), Quantity::VeryFew);
        assert_eq!(EncryptionStyle::parse("  ").unwrap(), EncryptionStyle::None);
    }

    #[test]
    fn ratings_are_totally_ordered() {
        assert!(Confidentiality::Public < Confidentiality::StrictlyConfidential);
        assert!(Criticality::Operational < Criticality::Critical);
        let mut values = Confidentiality::VALUES;
        values.sort();
        assert_eq!(values, Confidentiality::VALUES);
    }

    #[test]
    fn serde_round_trip_uses_canonical_names() {
        let json = serde_json::to_string(&TrustBoundaryType::NetworkCloudSecurityGroup).unwrap();
        assert_eq!(json, "\"network-cloud-security-group\"");
        let back: TrustBoundaryType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TrustBoundaryType::NetworkCloudSecurityGroup);
        // serde names must match the parse() tables exactly
        for usage in Usage::VALUES {
            let json = serde_json::to_string(&usage).unwrap();
            assert_eq!(json, format!("\"{}\"", usage.as_str()));
        }
    }

    #[test]
    fn every_canonical_name_parses_back() {
        for value in Authentication::VALUES {
            assert_eq!(Authentication::parse(value.as_str()).unwrap(), value);
        }
        for value in TrustBoundaryType::VALUES {
            assert_eq!(TrustBoundaryType::parse(value.as_str()).unwrap(), value);
        }
    }

    proptest::proptest! {
        #[test]
        fn canonical_names_parse_with_case_and_padding_noise(
            index in 0usize..Confidentiality::VALUES.len(),
            left in " {0,3}",
            right in " {0,3}",
        ) {
            let value = Confidentiality::VALUES[index];
            let noisy = format!("{left}{}{right}", value.as_str().to_uppercase());
            proptest::prop_assert_eq!(Confidentiality::parse(&noisy).unwrap(), value);
        }
    }

    #[test]
    fn network_boundary_predicate() {
        assert!(TrustBoundaryType::NetworkOnPrem.is_network_boundary());
        assert!(TrustBoundaryType::NetworkPolicyNamespaceIsolation.is_network_boundary());
        assert!(!TrustBoundaryType::ExecutionEnvironment.is_network_boundary());
    }
}
