//! Runtime configuration
//!
//! Loaded from TOML, with `SCOPERC_*` environment variables taking priority.
//!
//! ```toml
//! [heap]
//! initial_slots = 1024
//! max_list_len = 1000000
//! audit_scopes = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::builtins::MAX_LIST;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub heap: HeapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapConfig {
    /// Record table slots reserved up front
    #[serde(default = "default_initial_slots")]
    pub initial_slots: usize,

    /// Longest list the runtime will grow; clamped to `MAX_LIST`
    #[serde(default = "default_max_list_len")]
    pub max_list_len: usize,

    /// Report records that outlive the scope that created them
    #[serde(default = "default_false")]
    pub audit_scopes: bool,

    /// Report records still live at teardown
    #[serde(default = "default_true")]
    pub leak_report: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            initial_slots: default_initial_slots(),
            max_list_len: default_max_list_len(),
            audit_scopes: false,
            leak_report: true,
        }
    }
}

impl HeapConfig {
    /// Effective list length bound
    pub fn list_limit(&self) -> usize {
        self.max_list_len.min(MAX_LIST)
    }
}

fn default_initial_slots() -> usize {
    256
}

fn default_max_list_len() -> usize {
    MAX_LIST
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `SCOPERC_*` overrides on top of the current values
    pub fn apply_env(&mut self) -> Result<(), String> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), String> {
        if let Some(v) = var("SCOPERC_INITIAL_SLOTS") {
            self.heap.initial_slots = parse_number("SCOPERC_INITIAL_SLOTS", &v)?;
        }
        if let Some(v) = var("SCOPERC_MAX_LIST_LEN") {
            self.heap.max_list_len = parse_number("SCOPERC_MAX_LIST_LEN", &v)?;
        }
        if let Some(v) = var("SCOPERC_AUDIT_SCOPES") {
            self.heap.audit_scopes = parse_flag(&v);
        }
        if let Some(v) = var("SCOPERC_LEAK_REPORT") {
            self.heap.leak_report = parse_flag(&v);
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{} must be a non-negative integer, got '{}'", key, value))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RuntimeConfig::parse("").unwrap();
        assert_eq!(config.heap.initial_slots, 256);
        assert_eq!(config.heap.max_list_len, MAX_LIST);
        assert!(!config.heap.audit_scopes);
        assert!(config.heap.leak_report);
    }

    #[test]
    fn heap_table_overrides_fields() {
        let config = RuntimeConfig::parse("[heap]\nmax_list_len = 16\naudit_scopes = true\n").unwrap();
        assert_eq!(config.heap.max_list_len, 16);
        assert!(config.heap.audit_scopes);
        assert_eq!(config.heap.initial_slots, 256);
    }

    #[test]
    fn malformed_document_is_rejected() {
        let err = RuntimeConfig::parse("[heap]\nmax_list_len = \"many\"").unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }

    #[test]
    fn list_limit_is_clamped() {
        let heap = HeapConfig { max_list_len: usize::MAX, ..HeapConfig::default() };
        assert_eq!(heap.list_limit(), MAX_LIST);
    }

    #[test]
    fn variables_override_values() {
        let vars: HashMap<&str, &str> =
            [("SCOPERC_MAX_LIST_LEN", "64"), ("SCOPERC_LEAK_REPORT", "off")].into_iter().collect();
        let mut config = RuntimeConfig::default();
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.heap.max_list_len, 64);
        assert!(!config.heap.leak_report);
    }

    #[test]
    fn bad_number_names_the_variable() {
        let mut config = RuntimeConfig::default();
        let err = config
            .apply_vars(|k| (k == "SCOPERC_INITIAL_SLOTS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.contains("SCOPERC_INITIAL_SLOTS"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scoperc.toml");
        fs::write(&path, "[heap]\ninitial_slots = 8\n").unwrap();
        assert_eq!(RuntimeConfig::load(&path).unwrap().heap.initial_slots, 8);
    }
}
