//! Precheck errors
//!
//! A `CheckError` is a checker that could not reach a verdict, not a
//! verdict itself. The driver converts these into abort messages so a
//! broken input fails the precheck instead of crashing it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid dice.yml: {0}")]
    InvalidDiceYml(#[from] serde_yaml::Error),

    #[error("param {param} of action {action} is not a boolean, got {value}")]
    NotABoolean {
        action: String,
        param: String,
        value: String,
    },

    #[error("param {param} of action {action} is not a list")]
    NotAList { action: String, param: String },
}
