//! Companion deployment manifest (dice.yml)
//!
//! Only the slice the checkers consult is modeled: the services map
//! (buildpack modules must land on declared services) and the addon
//! blocks, both global and per-environment. Everything else in the
//! manifest deserializes into ignored fields.
//!
//! Map values are `Option` because the manifest allows bare keys
//! (`web:` with no body is a valid, empty service).

use crate::error::CheckError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiceYml {
    pub services: HashMap<String, Option<DiceService>>,
    pub addons: HashMap<String, Option<DiceAddon>>,
    pub environments: HashMap<String, Option<DiceEnvironment>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiceService {
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiceAddon {
    pub plan: String,
    pub options: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiceEnvironment {
    pub addons: HashMap<String, Option<DiceAddon>>,
}

impl DiceYml {
    pub fn parse(content: &str) -> Result<Self, CheckError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// True when the services map declares a service under this name.
    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// True when an addon of this product is declared anywhere: in the
    /// global addons block or in any environment-specific block. An addon
    /// matches by its key or by the product half of its plan
    /// (`api-gateway:basic` is the `api-gateway` product).
    pub fn has_addon(&self, product: &str) -> bool {
        let block_has = |addons: &HashMap<String, Option<DiceAddon>>| {
            addons.iter().any(|(name, addon)| {
                name == product
                    || addon
                        .as_ref()
                        .is_some_and(|a| a.plan.split(':').next() == Some(product))
            })
        };
        block_has(&self.addons)
            || self
                .environments
                .values()
                .flatten()
                .any(|env| block_has(&env.addons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
version: "2.0"
services:
  web:
    image: registry.local/web:latest
  worker:
addons:
  db:
    plan: mysql:basic
environments:
  production:
    addons:
      gateway:
        plan: api-gateway:professional
"#;

    #[test]
    fn test_parse_and_service_lookup() {
        let dice = DiceYml::parse(MANIFEST).unwrap();
        assert!(dice.has_service("web"));
        assert!(dice.has_service("worker"));
        assert!(!dice.has_service("api"));
    }

    #[test]
    fn test_addon_lookup_spans_environment_blocks() {
        let dice = DiceYml::parse(MANIFEST).unwrap();
        assert!(dice.has_addon("mysql"));
        assert!(dice.has_addon("api-gateway"));
        assert!(!dice.has_addon("redis"));
    }

    #[test]
    fn test_addon_matches_by_key_without_plan() {
        let dice = DiceYml::parse("addons:\n  api-gateway:\n").unwrap();
        assert!(dice.has_addon("api-gateway"));
    }

    #[test]
    fn test_parse_error_is_a_check_error() {
        let err = DiceYml::parse("services: [not, a, map]").unwrap_err();
        assert!(matches!(err, CheckError::InvalidDiceYml(_)));
    }
}
