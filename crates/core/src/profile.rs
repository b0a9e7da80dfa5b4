// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed cluster/agent profile configuration (§3, supplementing §1's
//! "configuration parsing" exclusion — the CI server hands us settings maps
//! already turned into these structs; their shape and range validation is a
//! core data-model concern).

use crate::error::ProfileError;
use crate::resources::ResourceVector;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const CPU_RANGE: (f64, f64) = (0.1, 32.0);
const RAM_RANGE_MIB: (u64, u64) = (256, 262_144);
const DISK_RANGE_MIB: (u64, u64) = (256, 1_048_576);

fn tag_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[a-z]+$").expect("static regex is valid"))
}

/// Immutable per-version cluster target configuration (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub executor_url: String,
    pub cluster_name: String,
    pub role: String,
    pub env: String,
    pub server_api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_source_url: Option<String>,
}

impl ClusterProfile {
    pub fn validate(&self) -> Vec<ProfileError> {
        let mut errors = Vec::new();
        if self.cluster_name.trim().is_empty() {
            errors.push(ProfileError::invalid("clusterName", "must not be blank"));
        }
        if self.executor_url.trim().is_empty() {
            errors.push(ProfileError::invalid("executorUrl", "must not be blank"));
        }
        if self.server_api_url.trim().is_empty() {
            errors.push(ProfileError::invalid("serverApiUrl", "must not be blank"));
        }
        errors
    }
}

/// Immutable agent recipe configuration (§3). `cpu`/`ram`/`disk` are the raw
/// strings the CI server hands us; blank fields are dropped rather than
/// defaulted here — defaults are applied at launch time (§4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub environments: Option<Vec<String>>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub ram: Option<String>,
    #[serde(default)]
    pub disk: Option<String>,
    #[serde(default)]
    pub init_script: Option<String>,
}

impl AgentProfile {
    /// `profileResources(p)` — §4.3: parses present fields, dropping blanks.
    /// Missing/blank fields are left `None`; callers apply launch-time
    /// defaults (see [`ResourceVector::default`]).
    pub fn parsed_resources(&self) -> Result<PartialResources, ProfileError> {
        Ok(PartialResources {
            cpu: parse_blank_ok(&self.cpu, "cpu", |s| {
                s.parse::<f64>().map_err(|_| ProfileError::invalid("cpu", format!("not a number: {s:?}")))
            })?,
            ram: parse_blank_ok(&self.ram, "ram", |s| {
                s.parse::<u64>().map_err(|_| ProfileError::invalid("ram", format!("not a number: {s:?}")))
            })?,
            disk: parse_blank_ok(&self.disk, "disk", |s| {
                s.parse::<u64>().map_err(|_| ProfileError::invalid("disk", format!("not a number: {s:?}")))
            })?,
        })
    }

    pub fn validate(&self) -> Vec<ProfileError> {
        let mut errors = Vec::new();
        if !tag_regex().is_match(&self.tag) {
            errors.push(ProfileError::invalid("tag", "must match [a-z]+"));
        }
        match self.parsed_resources() {
            Ok(parsed) => {
                if let Some(cpu) = parsed.cpu {
                    if !(CPU_RANGE.0..=CPU_RANGE.1).contains(&cpu) {
                        errors.push(ProfileError::invalid(
                            "cpu",
                            format!("must be between {} and {}", CPU_RANGE.0, CPU_RANGE.1),
                        ));
                    }
                }
                if let Some(ram) = parsed.ram {
                    if !(RAM_RANGE_MIB.0..=RAM_RANGE_MIB.1).contains(&ram) {
                        errors.push(ProfileError::invalid(
                            "ram",
                            format!("must be between {} and {} MiB", RAM_RANGE_MIB.0, RAM_RANGE_MIB.1),
                        ));
                    }
                }
                if let Some(disk) = parsed.disk {
                    if !(DISK_RANGE_MIB.0..=DISK_RANGE_MIB.1).contains(&disk) {
                        errors.push(ProfileError::invalid(
                            "disk",
                            format!("must be between {} and {} MiB", DISK_RANGE_MIB.0, DISK_RANGE_MIB.1),
                        ));
                    }
                }
            }
            Err(e) => errors.push(e),
        }
        errors
    }

    /// Resources with launch-time defaults applied (§4.3).
    pub fn resources_or_default(&self) -> ResourceVector {
        let parsed = self.parsed_resources().unwrap_or(PartialResources { cpu: None, ram: None, disk: None });
        let default = ResourceVector::default();
        ResourceVector {
            cpu: parsed.cpu.unwrap_or(default.cpu),
            ram: parsed.ram.unwrap_or(default.ram),
            disk: parsed.disk.unwrap_or(default.disk),
        }
    }
}

/// Resources parsed from a profile before launch-time defaults are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialResources {
    pub cpu: Option<f64>,
    pub ram: Option<u64>,
    pub disk: Option<u64>,
}

fn parse_blank_ok<T>(
    field: &Option<String>,
    _name: &str,
    parse: impl FnOnce(&str) -> Result<T, ProfileError>,
) -> Result<Option<T>, ProfileError> {
    match field {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse(s.trim()).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_resource_fields_are_dropped() {
        let profile = AgentProfile {
            id: "build".into(),
            tag: "build".into(),
            environments: None,
            cpu: Some(String::new()),
            ram: None,
            disk: Some("1024".into()),
            init_script: None,
        };
        let parsed = profile.parsed_resources().unwrap();
        assert_eq!(parsed.cpu, None);
        assert_eq!(parsed.ram, None);
        assert_eq!(parsed.disk, Some(1024));
    }

    #[test]
    fn launch_defaults_fill_missing_fields() {
        let profile = AgentProfile {
            id: "build".into(),
            tag: "build".into(),
            environments: None,
            cpu: Some("2.0".into()),
            ram: None,
            disk: None,
            init_script: None,
        };
        let resources = profile.resources_or_default();
        assert_eq!(resources.cpu, 2.0);
        assert_eq!(resources.ram, crate::resources::DEFAULT_RAM_MIB);
        assert_eq!(resources.disk, crate::resources::DEFAULT_DISK_MIB);
    }

    #[test]
    fn tag_must_be_lowercase_letters() {
        let mut profile = AgentProfile {
            id: "x".into(),
            tag: "Build1".into(),
            environments: None,
            cpu: None,
            ram: None,
            disk: None,
            init_script: None,
        };
        assert!(!profile.validate().is_empty());
        profile.tag = "build".into();
        assert!(profile.validate().is_empty());
    }

    #[test]
    fn resource_ranges_are_enforced() {
        let profile = AgentProfile {
            id: "x".into(),
            tag: "build".into(),
            environments: None,
            cpu: Some("0.01".into()),
            ram: Some("64".into()),
            disk: Some("64".into()),
            init_script: None,
        };
        let errors = profile.validate();
        assert_eq!(errors.len(), 3);
    }
}
