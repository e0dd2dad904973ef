//! Custom-rule plugin protocol.
//!
//! A custom risk rule is an independently built executable driven over a
//! fixed contract: one mode flag as the first argument, the JSON encoding of
//! the input value (or the literal `null`) on stdin, the JSON result on
//! stdout, diagnostics on stderr. Third-party plugins are compiled against
//! this contract, so it must not drift.

pub mod runner;

pub use runner::{
    load_custom_rules, CustomRuleSpec, PluginError, PluginInfo, PluginRunner, MODE_EXPLAIN_RISK,
    MODE_GENERATE_RISKS, MODE_GET_INFO,
};
