//! Action reference visibility
//!
//! `${alias}` references another action's working directory and
//! `${alias:OUTPUT:name}` one of its declared outputs. Both resolve only
//! when the referenced action sits in an earlier stage: a stage's aliases
//! and outputs join the table after the whole stage has been checked, so
//! same-stage and later-stage references never become visible.

use crate::spec::{Action, ActionSpec, StageSpec};
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^{}]+)\}").expect("hard-coded pattern"));

/// One reference found in an action's params or cache paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRef {
    /// `${alias}`: the referenced action's working directory
    Alias(String),

    /// `${alias:OUTPUT:name}`: one named output of the referenced action
    Output { alias: String, name: String },
}

impl ActionRef {
    pub fn alias(&self) -> &str {
        match self {
            ActionRef::Alias(alias) => alias,
            ActionRef::Output { alias, .. } => alias,
        }
    }
}

/// Extracts action references from one piece of text.
///
/// `${...}` groups that are neither a bare alias nor the three-part
/// OUTPUT form are skipped; env and platform placeholders share the
/// delimiters and are substituted elsewhere.
pub fn scan_refs(text: &str) -> Vec<ActionRef> {
    REF_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).and_then(|m| parse_ref(m.as_str().trim())))
        .collect()
}

fn parse_ref(inner: &str) -> Option<ActionRef> {
    if inner.is_empty() {
        return None;
    }
    if !inner.contains(':') {
        return Some(ActionRef::Alias(inner.to_string()));
    }
    let mut parts = inner.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(alias), Some("OUTPUT"), Some(name)) if !alias.is_empty() && !name.is_empty() => {
            Some(ActionRef::Output {
                alias: alias.to_string(),
                name: name.to_string(),
            })
        }
        _ => None,
    }
}

/// Collects every reference an action makes: string params (nested
/// arrays and objects included) plus its cache paths.
pub fn action_refs(action: &Action) -> Vec<ActionRef> {
    let mut found = Vec::new();
    for value in action.params.values() {
        collect_value_refs(value, &mut found);
    }
    for cache in &action.caches {
        found.extend(scan_refs(&cache.path));
    }
    found
}

fn collect_value_refs(value: &Value, found: &mut Vec<ActionRef>) {
    match value {
        Value::String(text) => found.extend(scan_refs(text)),
        Value::Array(items) => {
            for item in items {
                collect_value_refs(item, found);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_value_refs(item, found);
            }
        }
        _ => {}
    }
}

/// Running table of the aliases and outputs visible to the stage
/// currently being checked
#[derive(Debug, Default)]
pub struct RefTable {
    outputs: HashMap<String, HashSet<String>>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a finished stage: its aliases become visible and the
    /// outputs their action specs declare become referencable.
    pub fn admit_stage(&mut self, stage: &StageSpec, specs: &HashMap<String, ActionSpec>) {
        for action in &stage.actions {
            let declared = specs
                .get(&action.action_type)
                .map(|spec| spec.outputs.iter().cloned().collect())
                .unwrap_or_default();
            self.outputs.insert(action.alias.clone(), declared);
        }
    }

    pub fn is_visible(&self, alias: &str) -> bool {
        self.outputs.contains_key(alias)
    }

    pub fn has_output(&self, alias: &str, name: &str) -> bool {
        self.outputs
            .get(alias)
            .is_some_and(|outs| outs.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scan_refs_recognizes_both_forms() {
        let refs = scan_refs("cp ${java-build}/target ${java-build:OUTPUT:buildPath}/app");
        assert_eq!(
            refs,
            vec![
                ActionRef::Alias("java-build".to_string()),
                ActionRef::Output {
                    alias: "java-build".to_string(),
                    name: "buildPath".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_scan_refs_skips_malformed_groups() {
        assert!(scan_refs("${}").is_empty());
        assert!(scan_refs("${a:OUT:b}").is_empty());
        assert!(scan_refs("${:OUTPUT:x}").is_empty());
        assert!(scan_refs("plain text, no refs").is_empty());
    }

    #[test]
    fn test_action_refs_digs_into_nested_params_and_caches() {
        let action = Action {
            alias: "deploy".to_string(),
            action_type: "release".to_string(),
            params: [(
                "files".to_string(),
                json!([{"src": "${build:OUTPUT:artifact}"}]),
            )]
            .into_iter()
            .collect(),
            caches: vec![crate::spec::ActionCache {
                path: "${build}/cache".to_string(),
                key: None,
            }],
        };
        let refs = action_refs(&action);
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.alias() == "build"));
    }

    #[test]
    fn test_table_tracks_aliases_and_declared_outputs() {
        let mut table = RefTable::new();
        let stage = StageSpec {
            actions: vec![Action {
                alias: "build".to_string(),
                action_type: "buildpack".to_string(),
                ..Default::default()
            }],
        };
        let specs = [(
            "buildpack".to_string(),
            ActionSpec {
                outputs: vec!["buildPath".to_string()],
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();

        assert!(!table.is_visible("build"));
        table.admit_stage(&stage, &specs);
        assert!(table.is_visible("build"));
        assert!(table.has_output("build", "buildPath"));
        assert!(!table.has_output("build", "imageID"));
    }
}
