//! Runtime options threaded into setup as an explicit context.
//!
//! A `RunConfig` is a typed key/value oracle with a registrar of documented
//! options. Components read their parameters with [`RunConfig::get_or`]
//! during setup; nothing in the crate consults process-wide state.

use std::collections::HashMap;
use std::str::FromStr;

/// A registered option: group, name and a one-line description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionSpec {
    pub group: String,
    pub name: String,
    pub doc: String,
}

/// String-keyed runtime configuration with typed lookup.
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    values: HashMap<String, String>,
    options: Vec<OptionSpec>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option so front-ends can enumerate and document it.
    pub fn add_option(&mut self, group: &str, name: &str, doc: &str) {
        self.options.push(OptionSpec {
            group: group.to_string(),
            name: name.to_string(),
            doc: doc.to_string(),
        });
    }

    /// All registered options, in registration order.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Set a value; the string form is parsed on lookup.
    pub fn set(&mut self, name: &str, value: impl ToString) {
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Typed lookup with a default. A present but unparsable value logs a
    /// warning and falls back to the default.
    pub fn get_or<T: FromStr + Clone>(&self, name: &str, default: T) -> T {
        match self.values.get(name) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("option {name} has unparsable value {raw:?}; using default");
                default
            }),
        }
    }
}
