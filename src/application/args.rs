// Chat token parsing for a panel subcommand
use crate::domain::dashboard::PanelDef;
use crate::domain::options::OptionField;
use std::collections::HashMap;

/// Raw parsed arguments for one invocation: a raw string per variable name,
/// plus the render-option overrides the user supplied as `key=value` tokens.
/// Pure strings; option validation happens in the dispatch pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub variables: HashMap<String, String>,
    pub overrides: Vec<(OptionField, String)>,
}

/// Map the ordered chat tokens onto the panel's variables.
///
/// Positional tokens are consumed in declaration order by the variables with
/// `includeincmd` set; a missing token falls back to the variable's
/// `response` default. Hidden variables never read from tokens and always
/// take their `response` default. Tokens of the form `width=...`,
/// `height=...`, `theme=...`, `timespan=...` or `timezone=...` are option
/// overrides and may appear in any order.
pub fn parse_args(panel: &PanelDef, tokens: &[String]) -> ParsedArgs {
    let mut overrides = Vec::new();
    let mut positionals = Vec::new();
    for token in tokens {
        match token.split_once('=').and_then(|(key, value)| {
            OptionField::from_key(key).map(|field| (field, value.to_string()))
        }) {
            Some(pair) => overrides.push(pair),
            // Anything else is a positional value; values may contain '='.
            None => positionals.push(token.as_str()),
        }
    }

    let mut positionals = positionals.into_iter();
    let mut variables = HashMap::new();
    for variable in &panel.variables {
        let value = if variable.includeincmd {
            positionals
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| variable.response.clone())
        } else {
            variable.response.clone()
        };
        variables.insert(variable.name.clone(), value);
    }

    ParsedArgs {
        variables,
        overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::VariableDef;
    use std::collections::BTreeMap;

    fn variable(name: &str, includeincmd: bool, response: &str) -> VariableDef {
        VariableDef {
            name: name.to_string(),
            friendly_name: String::new(),
            query: None,
            modelattr: None,
            filter: BTreeMap::new(),
            value: None,
            response: response.to_string(),
            includeincmd,
            includeinurl: true,
        }
    }

    fn panel(variables: Vec<VariableDef>) -> PanelDef {
        PanelDef {
            command_name: "cpu-utilization".to_string(),
            panel_id: 7,
            friendly_name: "CPU Utilization".to_string(),
            variables,
        }
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_positionals_consumed_in_declaration_order() {
        let panel = panel(vec![
            variable("device", true, ""),
            variable("interface", true, "eth0"),
        ]);
        let parsed = parse_args(&panel, &tokens(&["router1", "xe-0/0/0"]));
        assert_eq!(parsed.variables["device"], "router1");
        assert_eq!(parsed.variables["interface"], "xe-0/0/0");
    }

    #[test]
    fn test_missing_positional_uses_response_default() {
        let panel = panel(vec![
            variable("device", true, ""),
            variable("interface", true, "eth0"),
        ]);
        let parsed = parse_args(&panel, &tokens(&["router1"]));
        assert_eq!(parsed.variables["device"], "router1");
        assert_eq!(parsed.variables["interface"], "eth0");
    }

    #[test]
    fn test_hidden_variable_never_reads_tokens() {
        let panel = panel(vec![
            variable("site", false, "ams01"),
            variable("device", true, ""),
        ]);
        let parsed = parse_args(&panel, &tokens(&["router1"]));
        assert_eq!(parsed.variables["site"], "ams01");
        assert_eq!(parsed.variables["device"], "router1");
    }

    #[test]
    fn test_no_tokens_populates_everything_from_defaults() {
        let panel = panel(vec![
            variable("site", false, "ams01"),
            variable("role", false, "edge"),
        ]);
        let parsed = parse_args(&panel, &[]);
        assert_eq!(parsed.variables["site"], "ams01");
        assert_eq!(parsed.variables["role"], "edge");
        assert!(parsed.overrides.is_empty());
    }

    #[test]
    fn test_option_overrides_in_any_order() {
        let panel = panel(vec![variable("device", true, "")]);
        let parsed = parse_args(
            &panel,
            &tokens(&["theme=dark", "router1", "timespan=P1D", "width=300"]),
        );
        assert_eq!(parsed.variables["device"], "router1");
        assert_eq!(
            parsed.overrides,
            vec![
                (OptionField::Theme, "dark".to_string()),
                (OptionField::Timespan, "P1D".to_string()),
                (OptionField::Width, "300".to_string()),
            ]
        );
    }

    #[test]
    fn test_value_containing_equals_is_positional() {
        let panel = panel(vec![variable("expr", true, "")]);
        let parsed = parse_args(&panel, &tokens(&["rate=fast"]));
        assert_eq!(parsed.variables["expr"], "rate=fast");
    }
}
