//! Technology registry: named technology records with boolean attributes.
//!
//! Technical assets reference technologies by name; the linker resolves the
//! names against a [`TechnologyRegistry`] and embeds the resolved records so
//! rules can query derived predicates without consulting the registry again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attribute keys understood by the built-in rules. Additional keys may be
/// introduced by externally loaded technology files; unknown keys are kept
/// and simply never queried.
pub mod attributes {
    pub const WEB_APPLICATION: &str = "web_application";
    pub const WEB_SERVICE: &str = "web_service";
    pub const IDENTITY_PROVIDER: &str = "identity_provider";
    pub const IDENTITY_STORE: &str = "identity_store";
    pub const FILE_STORAGE: &str = "file_storage";
    pub const MAY_CONTAIN_SECRETS: &str = "may_contain_secrets";
    pub const NO_AUTHENTICATION_REQUIRED: &str = "no_authentication_required";
    pub const HIGH_VALUE_TARGET: &str = "high_value_target";
    pub const NO_NETWORK_SEGMENTATION_REQUIRED: &str = "no_network_segmentation_required";
    pub const VULNERABLE_TO_QUERY_INJECTION: &str = "vulnerable_to_query_injection";
    pub const SECURITY_CONTROL_RELATED: &str = "security_control_related";
    pub const UNPROTECTED_COMMUNICATIONS_TOLERATED: &str = "unprotected_communications_tolerated";
    pub const CLOSE_TO_HIGH_VALUE_TARGETS_TOLERATED: &str =
        "close_to_high_value_targets_tolerated";
    pub const CLIENT: &str = "client";
    pub const LESS_PROTECTED_TYPE: &str = "less_protected_type";
    pub const PROCESSING_END_USER_REQUESTS: &str = "processing_end_user_requests";
    pub const STORING_END_USER_DATA: &str = "storing_end_user_data";
    pub const FRONTEND_RELATED: &str = "frontend_related";
    pub const BACKEND_RELATED: &str = "backend_related";
    pub const DEVELOPMENT_RELEVANT: &str = "development_relevant";
    pub const TRAFFIC_FORWARDING: &str = "traffic_forwarding";
    pub const EMBEDDED_COMPONENT: &str = "embedded_component";
    pub const CONTAINER_PLATFORM: &str = "container_platform";
    pub const CODE_INSPECTION_PLATFORM: &str = "code_inspection_platform";
}

pub const UNKNOWN_TECHNOLOGY: &str = "unknown-technology";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, bool>,
}

impl Technology {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn get_attribute(&self, name: &str) -> bool {
        self.attributes.get(name).copied().unwrap_or(false)
    }

    pub fn is_unknown(&self) -> bool {
        self.name.is_empty() || self.is(UNKNOWN_TECHNOLOGY)
    }
}

/// Name-keyed technology table. The linker only needs `get`; merging allows
/// an externally supplied technology file to extend or override the built-in
/// catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnologyRegistry {
    technologies: BTreeMap<String, Technology>,
}

impl TechnologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Technology> {
        self.technologies.get(name.trim())
    }

    pub fn insert(&mut self, technology: Technology) {
        self.technologies
            .insert(technology.name.clone(), technology);
    }

    pub fn merge(&mut self, other: TechnologyRegistry) {
        self.technologies.extend(other.technologies);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.technologies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    /// The standard catalog. An additional technology file merged on top can
    /// extend it with organization-specific entries.
    pub fn builtin() -> Self {
        use attributes::*;

        fn tech(name: &str, attrs: &[&str]) -> Technology {
            Technology {
                name: name.to_string(),
                attributes: attrs.iter().map(|a| (a.to_string(), true)).collect(),
                ..Technology::default()
            }
        }

        let mut registry = Self::new();
        for technology in [
            tech(UNKNOWN_TECHNOLOGY, &[]),
            tech("client-system", &[CLIENT, LESS_PROTECTED_TYPE]),
            tech("browser", &[CLIENT, LESS_PROTECTED_TYPE, FRONTEND_RELATED]),
            tech("desktop", &[CLIENT, LESS_PROTECTED_TYPE, FRONTEND_RELATED]),
            tech("mobile-app", &[CLIENT, LESS_PROTECTED_TYPE, FRONTEND_RELATED]),
            tech("iot-device", &[CLIENT, LESS_PROTECTED_TYPE]),
            tech(
                "devops-client",
                &[CLIENT, LESS_PROTECTED_TYPE, DEVELOPMENT_RELEVANT],
            ),
            tech(
                "web-server",
                &[PROCESSING_END_USER_REQUESTS, FRONTEND_RELATED, LESS_PROTECTED_TYPE],
            ),
            tech(
                "web-application",
                &[
                    WEB_APPLICATION,
                    PROCESSING_END_USER_REQUESTS,
                    FRONTEND_RELATED,
                    LESS_PROTECTED_TYPE,
                ],
            ),
            tech(
                "application-server",
                &[PROCESSING_END_USER_REQUESTS, BACKEND_RELATED],
            ),
            tech(
                "cms",
                &[WEB_APPLICATION, PROCESSING_END_USER_REQUESTS, LESS_PROTECTED_TYPE],
            ),
            tech(
                "report-engine",
                &[WEB_APPLICATION, PROCESSING_END_USER_REQUESTS],
            ),
            tech(
                "web-service-rest",
                &[WEB_SERVICE, PROCESSING_END_USER_REQUESTS, BACKEND_RELATED],
            ),
            tech(
                "web-service-soap",
                &[WEB_SERVICE, PROCESSING_END_USER_REQUESTS, BACKEND_RELATED],
            ),
            tech("ejb", &[BACKEND_RELATED]),
            tech(
                "database",
                &[
                    VULNERABLE_TO_QUERY_INJECTION,
                    STORING_END_USER_DATA,
                    BACKEND_RELATED,
                ],
            ),
            tech(
                "identity-provider",
                &[
                    IDENTITY_PROVIDER,
                    HIGH_VALUE_TARGET,
                    PROCESSING_END_USER_REQUESTS,
                    BACKEND_RELATED,
                ],
            ),
            tech(
                "identity-store-ldap",
                &[IDENTITY_STORE, HIGH_VALUE_TARGET, BACKEND_RELATED],
            ),
            tech(
                "identity-store-database",
                &[
                    IDENTITY_STORE,
                    HIGH_VALUE_TARGET,
                    VULNERABLE_TO_QUERY_INJECTION,
                    BACKEND_RELATED,
                ],
            ),
            tech("ldap-server", &[BACKEND_RELATED]),
            tech("file-server", &[FILE_STORAGE, STORING_END_USER_DATA]),
            tech(
                "local-file-system",
                &[FILE_STORAGE, UNPROTECTED_COMMUNICATIONS_TOLERATED],
            ),
            tech(
                "block-storage",
                &[FILE_STORAGE, UNPROTECTED_COMMUNICATIONS_TOLERATED],
            ),
            tech(
                "reverse-proxy",
                &[
                    TRAFFIC_FORWARDING,
                    NO_NETWORK_SEGMENTATION_REQUIRED,
                    NO_AUTHENTICATION_REQUIRED,
                ],
            ),
            tech(
                "load-balancer",
                &[
                    TRAFFIC_FORWARDING,
                    NO_NETWORK_SEGMENTATION_REQUIRED,
                    NO_AUTHENTICATION_REQUIRED,
                ],
            ),
            tech(
                "waf",
                &[
                    TRAFFIC_FORWARDING,
                    SECURITY_CONTROL_RELATED,
                    NO_NETWORK_SEGMENTATION_REQUIRED,
                    NO_AUTHENTICATION_REQUIRED,
                ],
            ),
            tech(
                "ids",
                &[
                    SECURITY_CONTROL_RELATED,
                    NO_NETWORK_SEGMENTATION_REQUIRED,
                    NO_AUTHENTICATION_REQUIRED,
                ],
            ),
            tech(
                "ips",
                &[
                    SECURITY_CONTROL_RELATED,
                    NO_NETWORK_SEGMENTATION_REQUIRED,
                    NO_AUTHENTICATION_REQUIRED,
                ],
            ),
            tech(
                "monitoring",
                &[
                    UNPROTECTED_COMMUNICATIONS_TOLERATED,
                    CLOSE_TO_HIGH_VALUE_TARGETS_TOLERATED,
                    SECURITY_CONTROL_RELATED,
                ],
            ),
            tech(
                "service-registry",
                &[
                    NO_NETWORK_SEGMENTATION_REQUIRED,
                    NO_AUTHENTICATION_REQUIRED,
                    CLOSE_TO_HIGH_VALUE_TARGETS_TOLERATED,
                ],
            ),
            tech("service-mesh", &[TRAFFIC_FORWARDING, NO_NETWORK_SEGMENTATION_REQUIRED]),
            tech(
                "vault",
                &[HIGH_VALUE_TARGET, MAY_CONTAIN_SECRETS, BACKEND_RELATED],
            ),
            tech("hsm", &[HIGH_VALUE_TARGET, MAY_CONTAIN_SECRETS]),
            tech(
                "sourcecode-repository",
                &[DEVELOPMENT_RELEVANT, MAY_CONTAIN_SECRETS],
            ),
            tech(
                "artifact-registry",
                &[DEVELOPMENT_RELEVANT, MAY_CONTAIN_SECRETS],
            ),
            tech("build-pipeline", &[DEVELOPMENT_RELEVANT]),
            tech(
                "code-inspection-platform",
                &[DEVELOPMENT_RELEVANT, CODE_INSPECTION_PLATFORM],
            ),
            tech("container-platform", &[CONTAINER_PLATFORM, HIGH_VALUE_TARGET]),
            tech("message-queue", &[BACKEND_RELATED]),
            tech("stream-processing", &[BACKEND_RELATED]),
            tech("batch-processing", &[BACKEND_RELATED]),
            tech("search-index", &[VULNERABLE_TO_QUERY_INJECTION, BACKEND_RELATED]),
            tech("search-engine", &[VULNERABLE_TO_QUERY_INJECTION, BACKEND_RELATED]),
            tech("erp", &[PROCESSING_END_USER_REQUESTS, STORING_END_USER_DATA]),
            tech("mainframe", &[STORING_END_USER_DATA, BACKEND_RELATED]),
            tech("mail-server", &[LESS_PROTECTED_TYPE]),
            tech("gateway", &[]),
            tech("library", &[EMBEDDED_COMPONENT]),
            tech("scheduler", &[]),
            tech("task", &[]),
            tech("function", &[]),
            tech("cli", &[CLIENT]),
            tech("tool", &[CLIENT]),
        ] {
            registry.insert(technology);
        }
        registry
    }
}

/// Any-member semantics over an asset's resolved technology list.
pub fn list_has_attribute(technologies: &[Technology], name: &str) -> bool {
    technologies.iter().any(|t| t.get_attribute(name))
}

pub fn list_is_unknown(technologies: &[Technology]) -> bool {
    technologies.is_empty() || technologies.iter().all(Technology::is_unknown)
}
