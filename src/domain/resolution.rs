// Per-request variable resolution outcomes
use std::collections::HashMap;

/// A variable after resolution: its final string value plus, when an
/// inventory query was used, the full attribute set of the matched record
/// (available to later variables' templates by name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    pub name: String,
    pub value: String,
    pub attrs: HashMap<String, String>,
}

impl ResolvedVariable {
    pub fn plain(name: String, value: String) -> Self {
        Self {
            name,
            value,
            attrs: HashMap::new(),
        }
    }
}

/// One entry of a disambiguation menu: (display name, modelattr value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub display: String,
    pub value: String,
}

/// Outcome of resolving a panel's variables. `NeedsChoice` is normal control
/// flow, not an error: the user is asked to re-invoke with one of the
/// offered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Complete(Vec<ResolvedVariable>),
    NeedsChoice {
        variable: String,
        prompt: String,
        choices: Vec<Choice>,
    },
}
