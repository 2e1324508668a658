//! Per-action checks
//!
//! The generic checks (spec existence, required params, cache-path
//! syntax) apply to every action. Type-specific checkers are keyed by
//! the action's type string and only the types with known pitfalls have
//! one; unknown types pass through.

use crate::diceyml::DiceYml;
use crate::error::CheckError;
use crate::spec::{Action, ActionSpec};
use crate::PreCheckResult;
use serde_json::Value;
use std::collections::HashMap;

/// Result-map key under which the release checker publishes the
/// resolved `cross_cluster` flag for later creation steps.
pub const RELEASE_CROSS_CLUSTER_KEY: &str = "release.cross_cluster";

/// Addon product an `api-register` action needs in the companion manifest
pub const API_GATEWAY_ADDON: &str = "api-gateway";

pub(crate) const ACTION_TYPE_API_REGISTER: &str = "api-register";
pub(crate) const ACTION_TYPE_BUILDPACK: &str = "buildpack";
pub(crate) const ACTION_TYPE_RELEASE: &str = "release";

const PARAM_MODULES: &str = "modules";
const PARAM_CROSS_CLUSTER: &str = "cross_cluster";

/// Verifies the action type exists in the catalog and every required
/// parameter without a default is supplied.
pub(crate) fn check_spec_and_params(
    action: &Action,
    specs: &HashMap<String, ActionSpec>,
    result: &mut PreCheckResult,
) {
    let Some(spec) = specs.get(&action.action_type) else {
        result.aborts.push(format!(
            "unknown action type {} for action {}",
            action.action_type, action.alias
        ));
        return;
    };
    for param in &spec.params {
        if param.required && param.default.is_none() && !action.params.contains_key(&param.name) {
            result.aborts.push(format!(
                "action {} is missing required param {}",
                action.alias, param.name
            ));
        }
    }
}

/// Returns the first cache path that is neither absolute, dot-prefixed,
/// nor anchored on an `${alias}` reference.
pub(crate) fn first_invalid_cache_path(action: &Action) -> Option<&str> {
    action
        .caches
        .iter()
        .map(|cache| cache.path.as_str())
        .find(|path| !valid_cache_path(path))
}

fn valid_cache_path(path: &str) -> bool {
    let path = path.trim();
    !path.is_empty()
        && (path.starts_with('/')
            || path.starts_with('.')
            || (path.starts_with("${") && path.contains('}')))
}

/// Runs the checker registered for this action's type, if any.
pub(crate) fn run_type_checker(
    action: &Action,
    spec: Option<&ActionSpec>,
    dice: Option<&DiceYml>,
    result: &mut PreCheckResult,
) -> Result<(), CheckError> {
    match action.action_type.as_str() {
        ACTION_TYPE_API_REGISTER => check_api_register(action, dice, result),
        ACTION_TYPE_BUILDPACK => check_buildpack(action, dice, result)?,
        ACTION_TYPE_RELEASE => check_release(action, spec, result)?,
        _ => {}
    }
    Ok(())
}

fn check_api_register(action: &Action, dice: Option<&DiceYml>, result: &mut PreCheckResult) {
    let registered = dice.is_some_and(|d| d.has_addon(API_GATEWAY_ADDON));
    if !registered {
        result.aborts.push(format!(
            "action {} requires an {} addon in dice.yml",
            action.alias, API_GATEWAY_ADDON
        ));
    }
}

/// Every declared module must land on a service already present in
/// dice.yml; a name with no matching service would only surface as a
/// deploy failure much later.
fn check_buildpack(
    action: &Action,
    dice: Option<&DiceYml>,
    result: &mut PreCheckResult,
) -> Result<(), CheckError> {
    let names = module_names(action)?;
    if names.is_empty() {
        return Ok(());
    }
    let Some(dice) = dice else {
        result.aborts.push(format!(
            "action {} declares modules but the request carries no dice.yml",
            action.alias
        ));
        return Ok(());
    };
    for name in names {
        if !dice.has_service(&name) {
            result.aborts.push(format!(
                "module {} of action {} does not match any dice.yml service",
                name, action.alias
            ));
        }
    }
    Ok(())
}

fn module_names(action: &Action) -> Result<Vec<String>, CheckError> {
    let Some(value) = action.params.get(PARAM_MODULES) else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = value else {
        return Err(CheckError::NotAList {
            action: action.alias.clone(),
            param: PARAM_MODULES.to_string(),
        });
    };
    Ok(items.iter().filter_map(module_name).collect())
}

fn module_name(item: &Value) -> Option<String> {
    match item {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

/// Resolves the optional `cross_cluster` flag (given value, falling back
/// to the spec's declared default) and publishes it for later steps.
fn check_release(
    action: &Action,
    spec: Option<&ActionSpec>,
    result: &mut PreCheckResult,
) -> Result<(), CheckError> {
    let declared = spec.and_then(|s| s.param(PARAM_CROSS_CLUSTER));
    let given = action.params.get(PARAM_CROSS_CLUSTER);
    if given.is_some() && declared.is_none() {
        result.warnings.push(format!(
            "action {} passes {} but its spec does not declare it",
            action.alias, PARAM_CROSS_CLUSTER
        ));
    }
    let resolved = match given.or_else(|| declared.and_then(|p| p.default.as_ref())) {
        Some(value) => value_as_bool(action, PARAM_CROSS_CLUSTER, value)?,
        None => false,
    };
    result.results.insert(
        RELEASE_CROSS_CLUSTER_KEY.to_string(),
        resolved.to_string(),
    );
    Ok(())
}

fn value_as_bool(action: &Action, param: &str, value: &Value) -> Result<bool, CheckError> {
    let not_a_boolean = || CheckError::NotABoolean {
        action: action.alias.clone(),
        param: param.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(not_a_boolean()),
        },
        _ => Err(not_a_boolean()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ActionCache, ParamSpec};
    use serde_json::json;

    fn action_with_params(params: &[(&str, Value)]) -> Action {
        Action {
            alias: "release".to_string(),
            action_type: ACTION_TYPE_RELEASE.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            caches: Vec::new(),
        }
    }

    #[test]
    fn test_cache_path_accepts_the_three_forms_only() {
        for ok in ["/root/.m2", ".cache/pip", "${build}/target", " /spaced"] {
            assert!(valid_cache_path(ok), "{:?} should be valid", ok);
        }
        for bad in ["relative/path", "", "target", "$HOME/cache"] {
            assert!(!valid_cache_path(bad), "{:?} should be invalid", bad);
        }
    }

    #[test]
    fn test_first_invalid_cache_path_reports_in_order() {
        let action = Action {
            caches: vec![
                ActionCache {
                    path: "/ok".to_string(),
                    key: None,
                },
                ActionCache {
                    path: "bad/one".to_string(),
                    key: None,
                },
                ActionCache {
                    path: "bad/two".to_string(),
                    key: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(first_invalid_cache_path(&action), Some("bad/one"));
    }

    #[test]
    fn test_module_names_accepts_strings_and_objects() {
        let action = action_with_params(&[(
            PARAM_MODULES,
            json!(["web", {"name": "worker", "path": "./worker"}]),
        )]);
        assert_eq!(module_names(&action).unwrap(), vec!["web", "worker"]);

        let malformed = action_with_params(&[(PARAM_MODULES, json!("web,worker"))]);
        assert!(matches!(
            module_names(&malformed),
            Err(CheckError::NotAList { .. })
        ));
    }

    #[test]
    fn test_release_resolves_given_value_over_default() {
        let spec = ActionSpec {
            params: vec![ParamSpec {
                name: PARAM_CROSS_CLUSTER.to_string(),
                required: false,
                default: Some(json!(true)),
            }],
            outputs: Vec::new(),
        };
        let mut result = PreCheckResult::default();
        let action = action_with_params(&[(PARAM_CROSS_CLUSTER, json!("False"))]);
        check_release(&action, Some(&spec), &mut result).unwrap();
        assert_eq!(
            result.results.get(RELEASE_CROSS_CLUSTER_KEY),
            Some(&"false".to_string())
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_release_falls_back_to_declared_default() {
        let spec = ActionSpec {
            params: vec![ParamSpec {
                name: PARAM_CROSS_CLUSTER.to_string(),
                required: false,
                default: Some(json!(true)),
            }],
            outputs: Vec::new(),
        };
        let mut result = PreCheckResult::default();
        check_release(&action_with_params(&[]), Some(&spec), &mut result).unwrap();
        assert_eq!(
            result.results.get(RELEASE_CROSS_CLUSTER_KEY),
            Some(&"true".to_string())
        );
    }

    #[test]
    fn test_release_rejects_non_boolean_values() {
        let mut result = PreCheckResult::default();
        let action = action_with_params(&[(PARAM_CROSS_CLUSTER, json!(1))]);
        let err = check_release(&action, None, &mut result).unwrap_err();
        assert!(matches!(err, CheckError::NotABoolean { .. }));
    }

    #[test]
    fn test_api_register_aborts_without_manifest() {
        let mut result = PreCheckResult::default();
        let action = Action {
            alias: "register".to_string(),
            action_type: ACTION_TYPE_API_REGISTER.to_string(),
            ..Default::default()
        };
        check_api_register(&action, None, &mut result);
        assert_eq!(result.aborts.len(), 1);
    }
}
