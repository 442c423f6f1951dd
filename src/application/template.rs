// Template substitution over the resolved-variable map
use crate::domain::error::TemplateError;
use crate::domain::resolution::ResolvedVariable;
use std::collections::HashMap;

/// Render `{{ name }}` and `{{ name.attr }}` expressions against the
/// variables resolved so far. `{{ name }}` yields the variable's final
/// value; `{{ name.attr }}` reaches into the attribute set of a
/// query-resolved variable. This is deliberately the whole language: no
/// filters, no control flow, and every lookup miss is a named error
/// instead of an exception from a general templating engine.
pub fn render(
    template: &str,
    resolved: &HashMap<String, ResolvedVariable>,
) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| TemplateError::Syntax(template.to_string()))?;
        let expr = after[..end].trim();
        output.push_str(&lookup(expr, resolved)?);
        rest = &after[end + 2..];
    }
    output.push_str(rest);
    Ok(output)
}

fn lookup(
    expr: &str,
    resolved: &HashMap<String, ResolvedVariable>,
) -> Result<String, TemplateError> {
    let (name, attr) = match expr.split_once('.') {
        Some((name, attr)) => (name.trim(), Some(attr.trim())),
        None => (expr, None),
    };
    let variable = resolved
        .get(name)
        .ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;
    match attr {
        None => Ok(variable.value.clone()),
        Some(attr) => variable
            .attrs
            .get(attr)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownAttribute {
                variable: name.to_string(),
                attr: attr.to_string(),
            }),
    }
}
