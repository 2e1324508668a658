//! Gantry PreCheck
//!
//! Static validation gate run before a pipeline's tasks are ever created.
//!
//! [`pre_check`] walks the stages in declared order and runs three checks
//! per action (spec existence + required params, cache-path syntax,
//! reference visibility) plus a type-specific checker where one exists.
//! A cache-path violation aborts the whole run immediately; every other
//! abort accumulates so the user sees all problems in one pass. Warnings
//! are surfaced but never block creation.

pub mod checkers;
pub mod diceyml;
pub mod error;
pub mod refs;
pub mod spec;

use refs::{ActionRef, RefTable};
use spec::Action;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub use checkers::{API_GATEWAY_ADDON, RELEASE_CROSS_CLUSTER_KEY};
pub use diceyml::DiceYml;
pub use error::CheckError;
pub use spec::{ActionSpec, ItemsForCheck, ParamSpec, PipelineSpec, StageSpec};

/// Outcome of one precheck run
#[derive(Debug, Clone, Default)]
pub struct PreCheckResult {
    /// Hard failure: pipeline creation must not proceed
    pub abort: bool,

    /// One message per failed check
    pub aborts: Vec<String>,

    /// Surfaced to the user, never block creation
    pub warnings: Vec<String>,

    /// Values checkers publish for later creation steps, keyed by
    /// well-known constants such as [`RELEASE_CROSS_CLUSTER_KEY`]
    pub results: HashMap<String, String>,
}

/// Checks a parsed pipeline definition against the request's
/// [`ItemsForCheck`] bundle.
///
/// Checker errors (broken manifest, unparseable param values) become
/// aborts rather than propagating: a malformed input must fail the
/// precheck, not crash it.
pub fn pre_check(pipeline: &PipelineSpec, items: &ItemsForCheck) -> PreCheckResult {
    let mut result = PreCheckResult::default();

    let dice = match &items.dice_yml {
        Some(content) => match DiceYml::parse(content) {
            Ok(dice) => Some(dice),
            Err(err) => {
                result.aborts.push(err.to_string());
                None
            }
        },
        None => None,
    };

    let all_aliases: HashSet<&str> = pipeline
        .stages
        .iter()
        .flat_map(|stage| stage.actions.iter())
        .map(|action| action.alias.as_str())
        .collect();

    let mut table = RefTable::new();
    for stage in &pipeline.stages {
        for action in &stage.actions {
            checkers::check_spec_and_params(action, &items.action_specs, &mut result);

            if let Some(path) = checkers::first_invalid_cache_path(action) {
                warn!(
                    "precheck aborted: invalid cache path {:?} for action {}",
                    path, action.alias
                );
                result.aborts.push(format!(
                    "invalid cache path {:?} for action {}: must be absolute, dot-prefixed, or an ${{alias}} reference",
                    path, action.alias
                ));
                result.abort = true;
                return result;
            }

            check_refs(action, &table, &all_aliases, &mut result);

            let spec = items.action_specs.get(&action.action_type);
            if let Err(err) = checkers::run_type_checker(action, spec, dice.as_ref(), &mut result)
            {
                result.aborts.push(err.to_string());
            }
        }
        table.admit_stage(stage, &items.action_specs);
    }

    result.abort = !result.aborts.is_empty();
    debug!(
        "precheck finished, aborts: {}, warnings: {}",
        result.aborts.len(),
        result.warnings.len()
    );
    result
}

/// References are valid only against earlier stages. A bare `${name}`
/// that matches no action alias at all is left for env and platform
/// substitution; the OUTPUT form always names an action, so an unknown
/// alias there is an abort.
fn check_refs(
    action: &Action,
    table: &RefTable,
    all_aliases: &HashSet<&str>,
    result: &mut PreCheckResult,
) {
    for found in refs::action_refs(action) {
        let alias = found.alias();
        match &found {
            ActionRef::Alias(_) => {
                if all_aliases.contains(alias) && !table.is_visible(alias) {
                    result.aborts.push(format!(
                        "action {} references {} which runs in the same or a later stage",
                        action.alias, alias
                    ));
                }
            }
            ActionRef::Output { name, .. } => {
                if !all_aliases.contains(alias) {
                    result.aborts.push(format!(
                        "action {} references output {} of unknown action {}",
                        action.alias, name, alias
                    ));
                } else if !table.is_visible(alias) {
                    result.aborts.push(format!(
                        "action {} references {} which runs in the same or a later stage",
                        action.alias, alias
                    ));
                } else if !table.has_output(alias, name) {
                    result.aborts.push(format!(
                        "action {} declares no output {} (referenced by {})",
                        alias, name, action.alias
                    ));
                }
            }
        }
    }
}
