// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request-name-dispatched table of plugin RPCs (§6). The CI server picks
//! a handler by a bit-exact request-name string carried out of band from the
//! JSON body, so — unlike a tagged `serde` enum — parsing is a two-step
//! `request_name` lookup followed by a per-variant body decode.

use crate::error::PluginError;
use es_core::{AgentId, AgentProfile, ClusterProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw CI-server settings map, consumed by `validate-*` and profile-carrying
/// requests before it becomes a typed [`ClusterProfile`]/[`AgentProfile`].
pub type SettingsMap = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
pub struct MigrateConfigRequest {
    pub cluster_profiles: Vec<SettingsMap>,
    pub elastic_agent_profiles: Vec<SettingsMap>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerPingRequest {
    pub all_cluster_profile_properties: Vec<ClusterProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgentRequest {
    pub cluster_profile_properties: ClusterProfile,
    pub elastic_agent_profile_properties: AgentProfile,
    pub environment: String,
    pub auto_register_key: String,
    pub job_identifier: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentRef {
    pub agent_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShouldAssignWorkRequest {
    pub agent: AgentRef,
    pub cluster_profile_properties: ClusterProfile,
    pub elastic_agent_profile_properties: AgentProfile,
    pub job_identifier: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobCompletionRequest {
    pub elastic_agent_id: String,
}

/// `agent-status-report`/`cluster-status-report` carry an optional agent id
/// to scope the report (CI plugin docs; see §6's "see CI plugin docs" row).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusReportRequest {
    #[serde(default)]
    pub elastic_agent_id: Option<String>,
    #[serde(default)]
    pub cluster_profile_properties: Option<ClusterProfile>,
}

/// One row of the §6 request table.
#[derive(Debug, Clone)]
pub enum PluginRequest {
    GetIcon,
    GetCapabilities,
    MigrateConfig(MigrateConfigRequest),
    GetClusterProfileMetadata,
    GetElasticAgentProfileMetadata,
    ValidateClusterProfile(SettingsMap),
    ValidateElasticAgentProfile(SettingsMap),
    ServerPing(ServerPingRequest),
    CreateAgent(CreateAgentRequest),
    ShouldAssignWork(ShouldAssignWorkRequest),
    JobCompletion(JobCompletionRequest),
    AgentStatusReport(StatusReportRequest),
    ClusterStatusReport(StatusReportRequest),
    PluginStatusReport,
}

impl PluginRequest {
    /// The bit-exact request-name string the CI server sends.
    pub fn request_name(&self) -> &'static str {
        match self {
            Self::GetIcon => "get-icon",
            Self::GetCapabilities => "get-capabilities",
            Self::MigrateConfig(_) => "migrate-config",
            Self::GetClusterProfileMetadata => "get-cluster-profile-metadata",
            Self::GetElasticAgentProfileMetadata => "get-elastic-agent-profile-metadata",
            Self::ValidateClusterProfile(_) => "validate-cluster-profile",
            Self::ValidateElasticAgentProfile(_) => "validate-elastic-agent-profile",
            Self::ServerPing(_) => "server-ping",
            Self::CreateAgent(_) => "create-agent",
            Self::ShouldAssignWork(_) => "should-assign-work",
            Self::JobCompletion(_) => "job-completion",
            Self::AgentStatusReport(_) => "agent-status-report",
            Self::ClusterStatusReport(_) => "cluster-status-report",
            Self::PluginStatusReport => "plugin-status-report",
        }
    }

    /// Decode a request body given the out-of-band request-name string.
    /// Bodies for no-input requests are ignored. Malformed or missing fields
    /// surface as [`PluginError::BadRequest`] (§7 kind 1).
    pub fn parse(name: &str, body: &str) -> Result<Self, PluginError> {
        fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, PluginError> {
            serde_json::from_str(body).map_err(|e| PluginError::BadRequest(e.to_string()))
        }

        match name {
            "get-icon" => Ok(Self::GetIcon),
            "get-capabilities" => Ok(Self::GetCapabilities),
            "migrate-config" => Ok(Self::MigrateConfig(decode(body)?)),
            "get-cluster-profile-metadata" => Ok(Self::GetClusterProfileMetadata),
            "get-elastic-agent-profile-metadata" => Ok(Self::GetElasticAgentProfileMetadata),
            "validate-cluster-profile" => Ok(Self::ValidateClusterProfile(decode(body)?)),
            "validate-elastic-agent-profile" => Ok(Self::ValidateElasticAgentProfile(decode(body)?)),
            "server-ping" => Ok(Self::ServerPing(decode(body)?)),
            "create-agent" => Ok(Self::CreateAgent(decode(body)?)),
            "should-assign-work" => Ok(Self::ShouldAssignWork(decode(body)?)),
            "job-completion" => Ok(Self::JobCompletion(decode(body)?)),
            "agent-status-report" => Ok(Self::AgentStatusReport(decode(body)?)),
            "cluster-status-report" => Ok(Self::ClusterStatusReport(decode(body)?)),
            "plugin-status-report" => Ok(Self::PluginStatusReport),
            other => Err(PluginError::UnknownRequest(other.to_string())),
        }
    }
}

/// A single `{key, metadata:{required, secure}}` entry (`get-*-metadata`).
#[derive(Debug, Clone, Serialize)]
pub struct ProfileMetadataEntry {
    pub key: &'static str,
    pub metadata: ProfileMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileMetadata {
    pub required: bool,
    pub secure: bool,
}

impl ProfileMetadataEntry {
    pub const fn new(key: &'static str, required: bool, secure: bool) -> Self {
        Self { key, metadata: ProfileMetadata { required, secure } }
    }
}

/// A single `{key, message}` validation failure entry.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationEntry {
    pub key: String,
    pub message: String,
}

impl From<es_core::ProfileError> for ValidationEntry {
    fn from(e: es_core::ProfileError) -> Self {
        Self { key: e.key().to_string(), message: e.message().to_string() }
    }
}

/// Parse a `agent:{agent_id}` ref into the codec's [`AgentId`] (§6).
pub fn parse_agent_ref(agent: &AgentRef) -> Result<AgentId, PluginError> {
    AgentId::parse(&agent.agent_id).map_err(|e| PluginError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_name_round_trips_no_input_requests() {
        for req in [
            PluginRequest::GetIcon,
            PluginRequest::GetCapabilities,
            PluginRequest::GetClusterProfileMetadata,
            PluginRequest::GetElasticAgentProfileMetadata,
            PluginRequest::PluginStatusReport,
        ] {
            let name = req.request_name();
            let parsed = PluginRequest::parse(name, "").unwrap();
            assert_eq!(parsed.request_name(), name);
        }
    }

    #[test]
    fn unknown_request_name_is_rejected() {
        assert!(matches!(PluginRequest::parse("delete-universe", ""), Err(PluginError::UnknownRequest(_))));
    }

    #[test]
    fn malformed_body_is_a_bad_request() {
        assert!(matches!(PluginRequest::parse("job-completion", "{"), Err(PluginError::BadRequest(_))));
    }

    #[test]
    fn job_completion_decodes_the_agent_id_field() {
        let parsed = PluginRequest::parse("job-completion", r#"{"elastic_agent_id": "aws-dev/www/prod/build-agent-0"}"#).unwrap();
        let PluginRequest::JobCompletion(req) = parsed else { panic!("wrong variant") };
        assert_eq!(req.elastic_agent_id, "aws-dev/www/prod/build-agent-0");
    }
}
