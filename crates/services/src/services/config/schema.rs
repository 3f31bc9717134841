use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

pub const APP_ENV: &str = "APP_ENV";
pub const CORS_ORIGIN: &str = "CORS_ORIGIN";
pub const SEED_DEMO_DATA: &str = "SEED_DEMO_DATA";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
#[ts(use_ts_enum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

fn default_seed_demo_data() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    /// Allowed CORS origin. Any origin when unset.
    pub cors_origin: Option<String>,
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            cors_origin: None,
            seed_demo_data: default_seed_demo_data(),
        }
    }
}

impl Config {
    pub fn from_raw(raw_config: &str) -> Self {
        match serde_json::from_str::<Config>(raw_config) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config (line {}, column {}): {}, using default",
                    e.line(),
                    e.column(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        if matches!(self.cors_origin.as_deref(), Some(origin) if origin.trim().is_empty()) {
            self.cors_origin = None;
        }
        self.cors_origin = self.cors_origin.map(|origin| origin.trim().to_string());
        self
    }

    /// Applies `APP_ENV`, `CORS_ORIGIN` and `SEED_DEMO_DATA` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(APP_ENV) {
            match raw.trim().parse::<Environment>() {
                Ok(environment) => self.environment = environment,
                Err(_) => tracing::warn!("Ignoring unknown {}='{}'", APP_ENV, raw),
            }
        }
        if let Some(origin) = lookup(CORS_ORIGIN) {
            self.cors_origin = Some(origin);
        }
        if let Some(raw) = lookup(SEED_DEMO_DATA) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.seed_demo_data = true,
                "0" | "false" | "no" | "off" => self.seed_demo_data = false,
                _ => tracing::warn!("Ignoring unknown {}='{}'", SEED_DEMO_DATA, raw),
            }
        }
        self.normalized()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config = Config::from_raw(r#"{"environment":"production"}"#);
        assert!(config.is_production());
        assert!(config.seed_demo_data);
        assert_eq!(config.cors_origin, None);
    }

    #[test]
    fn blank_cors_origin_is_unset() {
        let config = Config::from_raw(r#"{"cors_origin":"  "}"#);
        assert_eq!(config.cors_origin, None);
    }

    #[test]
    fn environment_overrides_win() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (APP_ENV, "Production"),
            (CORS_ORIGIN, "http://example.test"),
            (SEED_DEMO_DATA, "false"),
        ]);
        let config = Config::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.cors_origin.as_deref(), Some("http://example.test"));
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn unknown_override_values_are_ignored() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(APP_ENV, "staging"), (SEED_DEMO_DATA, "maybe")]);
        let config = Config::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config, Config::default());
    }
}
