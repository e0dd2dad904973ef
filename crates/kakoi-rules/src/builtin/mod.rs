//! Built-in risk rules, grouped by theme.

pub mod access;
pub mod hygiene;
pub mod injection;
pub mod platform;
pub mod transport;
pub mod web;

use std::sync::Arc;

use crate::traits::RiskRule;

pub use access::{
    MissingNetworkSegmentationRule, UnguardedAccessFromInternetRule,
    UnguardedDirectDatastoreAccessRule,
};
pub use hygiene::{IncompleteModelRule, MissingVaultRule, UnnecessaryCommunicationLinkRule};
pub use injection::{
    LdapInjectionRule, PathTraversalRule, SqlNosqlInjectionRule, UntrustedDeserializationRule,
    XmlExternalEntityRule,
};
pub use platform::{
    AccidentalSecretLeakRule, CodeBackdooringRule, ContainerPlatformEscapeRule,
    MixedTargetsOnSharedRuntimeRule,
};
pub use transport::{DosRiskyAccessAcrossTrustBoundaryRule, UnencryptedCommunicationRule};
pub use web::{
    CrossSiteRequestForgeryRule, CrossSiteScriptingRule, MissingAuthenticationRule,
    MissingAuthenticationSecondFactorRule, MissingWafRule,
};

/// The full built-in catalog, in no particular order; the orchestrator runs
/// rules sorted by category id.
pub fn all_rules() -> Vec<Arc<dyn RiskRule>> {
    vec![
        Arc::new(UnguardedDirectDatastoreAccessRule),
        Arc::new(UnguardedAccessFromInternetRule),
        Arc::new(MissingNetworkSegmentationRule),
        Arc::new(CrossSiteScriptingRule),
        Arc::new(CrossSiteRequestForgeryRule),
        Arc::new(MissingWafRule),
        Arc::new(MissingAuthenticationRule),
        Arc::new(MissingAuthenticationSecondFactorRule),
        Arc::new(SqlNosqlInjectionRule),
        Arc::new(LdapInjectionRule),
        Arc::new(PathTraversalRule),
        Arc::new(UntrustedDeserializationRule),
        Arc::new(XmlExternalEntityRule),
        Arc::new(UnencryptedCommunicationRule),
        Arc::new(DosRiskyAccessAcrossTrustBoundaryRule),
        Arc::new(ContainerPlatformEscapeRule),
        Arc::new(AccidentalSecretLeakRule),
        Arc::new(CodeBackdooringRule),
        Arc::new(MixedTargetsOnSharedRuntimeRule),
        Arc::new(IncompleteModelRule),
        Arc::new(MissingVaultRule),
        Arc::new(UnnecessaryCommunicationLinkRule),
    ]
}
