// Error taxonomy for a single panel request
use thiserror::Error;

/// Invalid render-option override supplied by the chat user. Each variant
/// carries the corrective hint shown back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("{0} is an invalid width, please enter an integer")]
    InvalidWidth(String),
    #[error("{0} is an invalid height, please enter an integer")]
    InvalidHeight(String),
    #[error("{0} is an invalid theme, please choose light or dark")]
    InvalidTheme(String),
    #[error(
        "{0} is an invalid timespan (e.g. 'P12M' for the past 12 months), please see \
         https://en.wikipedia.org/wiki/ISO_8601#Durations for more information"
    )]
    InvalidTimespan(String),
    #[error("{0} is an invalid timezone")]
    InvalidTimezone(String),
}

/// Template rendering failure inside a filter or value expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template references unknown variable {0}")]
    UnknownVariable(String),
    #[error("template references unknown attribute {attr} of variable {variable}")]
    UnknownAttribute { variable: String, attr: String },
    #[error("unclosed expression in template {0:?}")]
    Syntax(String),
}

/// Panel-definition errors raised while resolving query-backed variables.
/// These are configuration mistakes, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unable to find entity type {0} in the inventory")]
    UnknownQueryType(String),
    #[error("variable {0} specifies a query, so a modelattr is also required")]
    MissingModelAttr(String),
    #[error("the query for {0} returned no objects")]
    EmptyQueryResult(String),
    #[error("unable to filter {query} by {filter}")]
    InvalidFilter { query: String, filter: String },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Panels configuration schema violations, caught by the validation pass
/// before any request is served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate dashboard slug {0}")]
    DuplicateSlug(String),
    #[error("duplicate panel command name {0}")]
    DuplicateCommand(String),
    #[error("dashboard {0} has an empty slug or uid")]
    IncompleteDashboard(String),
    #[error("panel {panel}: variable {variable} has an empty name")]
    UnnamedVariable { panel: String, variable: usize },
    #[error("panel {panel}: variable {variable} specifies a query without a modelattr")]
    QueryWithoutModelAttr { panel: String, variable: String },
}
