//! Precheck input model
//!
//! The precheck runs before any task record exists, so it works on the
//! parsed pipeline definition (stages of actions as the user wrote them)
//! plus an [`ItemsForCheck`] bundle the caller assembles: companion file
//! contents, the action-spec catalog, and the label/env/secret maps that
//! accompany the creation request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Parsed pipeline definition, stages in declared order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSpec {
    pub stages: Vec<StageSpec>,
}

/// One stage: actions that run concurrently once the stage is reached
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSpec {
    pub actions: Vec<Action>,
}

/// One action as declared in the pipeline definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub alias: String,

    #[serde(rename = "type")]
    pub action_type: String,

    pub params: HashMap<String, Value>,

    pub caches: Vec<ActionCache>,
}

/// Cache declaration on an action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCache {
    pub path: String,
    pub key: Option<String>,
}

/// Catalog entry describing one action type: its parameters and the
/// outputs instances of it publish for later stages to reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    pub params: Vec<ParamSpec>,
    pub outputs: Vec<String>,
}

/// Parameter declaration inside an [`ActionSpec`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSpec {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
}

/// Everything the checkers may consult besides the pipeline itself.
///
/// `dice_yml` holds the raw text of the companion deployment manifest when
/// the creation request carried one. The action-spec catalog is keyed by
/// action type. Labels, envs and secrets ride along from the request so
/// checkers can inspect them without another lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemsForCheck {
    pub dice_yml: Option<String>,
    pub action_specs: HashMap<String, ActionSpec>,
    pub labels: HashMap<String, String>,
    pub envs: HashMap<String, String>,
    pub secrets: HashMap<String, String>,
}

impl ActionSpec {
    /// Looks up a parameter declaration by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}
