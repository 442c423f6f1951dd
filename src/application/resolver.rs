// Variable resolution: raw chat input to final templated values
use crate::application::catalog::{CatalogError, EntityCatalog, EntityRecord};
use crate::application::template;
use crate::domain::dashboard::{PanelDef, VariableDef};
use crate::domain::error::ResolveError;
use crate::domain::resolution::{Choice, ResolvedVariable, Resolution};
use std::collections::{BTreeMap, HashMap};

/// Resolve every variable of `panel`, in declaration order, against the raw
/// parsed arguments.
///
/// Variables without a query pass their raw argument straight to the value
/// template. Query-backed variables fetch the entity set, apply the rendered
/// filter (plus `modelattr == raw input` when the user supplied one), and
/// require exactly one match; zero-after-filtering or multiple matches
/// suspend resolution with a disambiguation menu. Resolution is strictly
/// sequential: later variables' templates may reference earlier variables'
/// record attributes.
pub async fn resolve_variables(
    panel: &PanelDef,
    args: &HashMap<String, String>,
    catalog: &dyn EntityCatalog,
) -> Result<Resolution, ResolveError> {
    let mut resolved: HashMap<String, ResolvedVariable> = HashMap::new();
    let mut ordered: Vec<ResolvedVariable> = Vec::with_capacity(panel.variables.len());

    for variable in &panel.variables {
        let raw = args.get(&variable.name).cloned().unwrap_or_default();
        tracing::debug!(variable = %variable.name, input = %raw, "resolving variable");

        let entry = match &variable.query {
            None => finish(variable, raw, HashMap::new(), &resolved)?,
            Some(query) => {
                match resolve_query(panel, variable, query, &raw, &resolved, catalog).await? {
                    QueryOutcome::Matched(record) => {
                        let modelattr = variable.modelattr.as_deref().unwrap_or_default();
                        let value = record.get(modelattr).unwrap_or_default().to_string();
                        finish(variable, value, record.attrs, &resolved)?
                    }
                    QueryOutcome::Ambiguous { prompt, choices } => {
                        return Ok(Resolution::NeedsChoice {
                            variable: variable.name.clone(),
                            prompt,
                            choices,
                        });
                    }
                }
            }
        };

        resolved.insert(variable.name.clone(), entry.clone());
        ordered.push(entry);
    }

    Ok(Resolution::Complete(ordered))
}

enum QueryOutcome {
    Matched(EntityRecord),
    Ambiguous {
        prompt: String,
        choices: Vec<Choice>,
    },
}

async fn resolve_query(
    panel: &PanelDef,
    variable: &VariableDef,
    query: &str,
    raw: &str,
    resolved: &HashMap<String, ResolvedVariable>,
    catalog: &dyn EntityCatalog,
) -> Result<QueryOutcome, ResolveError> {
    // A query without a modelattr is a definition error, caught before any
    // inventory access.
    let modelattr = variable
        .modelattr
        .as_deref()
        .ok_or_else(|| ResolveError::MissingModelAttr(variable.name.clone()))?;

    let all = catalog
        .find(query, &BTreeMap::new())
        .await
        .map_err(|err| map_catalog_error(err, query, &format_filter(&variable.filter)))?;
    if all.is_empty() {
        return Err(ResolveError::EmptyQueryResult(query.to_string()));
    }

    let mut filter = variable.filter.clone();
    if !raw.is_empty() {
        filter.insert(modelattr.to_string(), raw.to_string());
    }
    for value in filter.values_mut() {
        *value = template::render(value, resolved)?;
    }

    let filter_text = format_filter(&filter);
    let mut matches = catalog
        .find(query, &filter)
        .await
        .map_err(|err| map_catalog_error(err, query, &filter_text))?;

    if matches.len() == 1 {
        let record = matches.remove(0);
        tracing::debug!(variable = %variable.name, "resolved to exactly one record");
        return Ok(QueryOutcome::Matched(record));
    }

    // More than one match: offer the filtered set. No match at all: fall
    // back to offering the full unfiltered set.
    let candidates = if matches.len() > 1 { matches } else { all };
    let choices = candidates
        .iter()
        .map(|record| Choice {
            display: record.display_name(modelattr),
            value: record.get(modelattr).unwrap_or_default().to_string(),
        })
        .collect();
    let prompt = format!("{} requires {}", panel.friendly_name, variable.label());
    Ok(QueryOutcome::Ambiguous { prompt, choices })
}

/// Apply the value template and record the resolved variable.
fn finish(
    variable: &VariableDef,
    base_value: String,
    attrs: HashMap<String, String>,
    resolved: &HashMap<String, ResolvedVariable>,
) -> Result<ResolvedVariable, ResolveError> {
    // The value template sees earlier variables plus this one under its own
    // name, so `{{ device.site }}` works inside device's own template.
    let mut scope = resolved.clone();
    scope.insert(
        variable.name.clone(),
        ResolvedVariable {
            name: variable.name.clone(),
            value: base_value.clone(),
            attrs: attrs.clone(),
        },
    );
    let value = match &variable.value {
        Some(tpl) => template::render(tpl, &scope)?,
        None => base_value,
    };
    Ok(ResolvedVariable {
        name: variable.name.clone(),
        value,
        attrs,
    })
}

fn map_catalog_error(err: CatalogError, query: &str, filter: &str) -> ResolveError {
    match err {
        CatalogError::UnknownEntityType(_) => ResolveError::UnknownQueryType(query.to_string()),
        CatalogError::UnknownField { .. } => ResolveError::InvalidFilter {
            query: query.to_string(),
            filter: filter.to_string(),
        },
    }
}

fn format_filter(filter: &BTreeMap<String, String>) -> String {
    let pairs: Vec<String> = filter
        .iter()
        .map(|(field, value)| format!("{field}={value}"))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCatalog {
        devices: Vec<EntityRecord>,
        calls: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_devices(names: &[(&str, &str)]) -> Self {
            let devices = names
                .iter()
                .map(|(name, site)| {
                    let mut attrs = HashMap::new();
                    attrs.insert("name".to_string(), name.to_string());
                    attrs.insert("site".to_string(), site.to_string());
                    EntityRecord::new(attrs)
                })
                .collect();
            Self {
                devices,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EntityCatalog for FakeCatalog {
        async fn find(
            &self,
            entity_type: &str,
            filter: &BTreeMap<String, String>,
        ) -> Result<Vec<EntityRecord>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if entity_type != "Device" {
                return Err(CatalogError::UnknownEntityType(entity_type.to_string()));
            }
            if let Some(field) = filter.keys().find(|f| !["name", "site"].contains(&f.as_str())) {
                return Err(CatalogError::UnknownField {
                    entity_type: entity_type.to_string(),
                    field: field.clone(),
                });
            }
            Ok(self
                .devices
                .iter()
                .filter(|record| {
                    filter
                        .iter()
                        .all(|(field, value)| record.get(field) == Some(value.as_str()))
                })
                .cloned()
                .collect())
        }
    }

    fn query_variable(name: &str, query: &str, modelattr: Option<&str>) -> VariableDef {
        VariableDef {
            name: name.to_string(),
            friendly_name: String::new(),
            query: Some(query.to_string()),
            modelattr: modelattr.map(str::to_string),
            filter: BTreeMap::new(),
            value: None,
            response: String::new(),
            includeincmd: true,
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

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_exact_match_resolves() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01"), ("switch1", "ams01")]);
        let panel = panel(vec![query_variable("device", "Device", Some("name"))]);
        let resolution = resolve_variables(&panel, &args(&[("device", "router1")]), &catalog)
            .await
            .unwrap();
        match resolution {
            Resolution::Complete(vars) => {
                assert_eq!(vars.len(), 1);
                assert_eq!(vars[0].value, "router1");
                assert_eq!(vars[0].attrs["site"], "ams01");
            }
            other => panic!("expected complete resolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multiple_matches_suspend_with_filtered_choices() {
        let catalog = FakeCatalog::with_devices(&[
            ("router1", "ams01"),
            ("router2", "ams01"),
            ("router3", "fra02"),
        ]);
        let mut variable = query_variable("device", "Device", Some("name"));
        variable.filter.insert("site".to_string(), "ams01".to_string());
        let panel = panel(vec![variable]);
        let resolution = resolve_variables(&panel, &args(&[("device", "")]), &catalog)
            .await
            .unwrap();
        match resolution {
            Resolution::NeedsChoice { variable, choices, .. } => {
                assert_eq!(variable, "device");
                let names: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
                assert_eq!(names, vec!["router1", "router2"]);
            }
            other => panic!("expected a choice menu, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_matches_fall_back_to_unfiltered_choices() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01"), ("router2", "fra02")]);
        let panel = panel(vec![query_variable("device", "Device", Some("name"))]);
        let resolution = resolve_variables(&panel, &args(&[("device", "no-such-device")]), &catalog)
            .await
            .unwrap();
        match resolution {
            Resolution::NeedsChoice { choices, .. } => {
                assert_eq!(choices.len(), 2);
            }
            other => panic!("expected a choice menu, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_modelattr_fails_before_inventory_access() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01")]);
        let panel = panel(vec![query_variable("device", "Device", None)]);
        let err = resolve_variables(&panel, &args(&[("device", "router1")]), &catalog)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::MissingModelAttr("device".to_string()));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_query_type() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01")]);
        let panel = panel(vec![query_variable("device", "Rack", Some("name"))]);
        let err = resolve_variables(&panel, &args(&[("device", "")]), &catalog)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::UnknownQueryType("Rack".to_string()));
    }

    #[tokio::test]
    async fn test_empty_entity_set() {
        let catalog = FakeCatalog::with_devices(&[]);
        let panel = panel(vec![query_variable("device", "Device", Some("name"))]);
        let err = resolve_variables(&panel, &args(&[("device", "router1")]), &catalog)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::EmptyQueryResult("Device".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_filter_field() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01")]);
        let mut variable = query_variable("device", "Device", Some("name"));
        variable.filter.insert("region".to_string(), "emea".to_string());
        let panel = panel(vec![variable]);
        let err = resolve_variables(&panel, &args(&[("device", "router1")]), &catalog)
            .await
            .unwrap_err();
        // The error names the filter that could not be applied.
        assert_eq!(
            err,
            ResolveError::InvalidFilter {
                query: "Device".to_string(),
                filter: "{name=router1, region=emea}".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_later_filter_templates_see_earlier_attributes() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01"), ("router2", "fra02")]);
        let first = query_variable("device", "Device", Some("name"));
        let mut second = query_variable("peer", "Device", Some("name"));
        // Restrict the peer lookup to the first device's site.
        second
            .filter
            .insert("site".to_string(), "{{ device.site }}".to_string());
        let panel = panel(vec![first, second]);
        let resolution =
            resolve_variables(&panel, &args(&[("device", "router1"), ("peer", "")]), &catalog)
                .await
                .unwrap();
        match resolution {
            Resolution::Complete(vars) => {
                assert_eq!(vars[1].name, "peer");
                assert_eq!(vars[1].value, "router1");
            }
            other => panic!("expected complete resolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_value_template_renders_final_value() {
        let catalog = FakeCatalog::with_devices(&[("router1", "ams01")]);
        let mut variable = query_variable("device", "Device", Some("name"));
        variable.value = Some("{{ device.name }}.{{ device.site }}.net".to_string());
        let panel = panel(vec![variable]);
        let resolution = resolve_variables(&panel, &args(&[("device", "router1")]), &catalog)
            .await
            .unwrap();
        match resolution {
            Resolution::Complete(vars) => assert_eq!(vars[0].value, "router1.ams01.net"),
            other => panic!("expected complete resolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plain_variable_passes_through() {
        let catalog = FakeCatalog::with_devices(&[]);
        let mut variable = query_variable("interval", "Device", Some("name"));
        variable.query = None;
        variable.modelattr = None;
        let panel = panel(vec![variable]);
        let resolution = resolve_variables(&panel, &args(&[("interval", "5m")]), &catalog)
            .await
            .unwrap();
        match resolution {
            Resolution::Complete(vars) => {
                assert_eq!(vars[0].value, "5m");
                assert!(vars[0].attrs.is_empty());
            }
            other => panic!("expected complete resolution, got {other:?}"),
        }
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }
}
