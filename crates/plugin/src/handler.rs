// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches a decoded [`PluginRequest`] to the engine's [`SchedulerRuntime`]
//! and shapes the response body (§6). The CI-server-facing entry point,
//! [`handle`], wraps every call in the catch-all failure policy of §7:
//! errors are logged and turned into a generic failure response, except
//! `validate-*`, which models invalid input as an ordinary response body.

use crate::error::PluginError;
use crate::request::{
    parse_agent_ref, CreateAgentRequest, JobCompletionRequest, MigrateConfigRequest,
    PluginRequest, ProfileMetadataEntry, ServerPingRequest, SettingsMap, ShouldAssignWorkRequest,
    StatusReportRequest, ValidationEntry,
};
use crate::response::{ErrorResponse, PluginResponse};
use es_core::bootstrap::base64_encode;
use es_core::{AgentId, AgentProfile, ClusterProfile, Clock};
use es_engine::SchedulerRuntime;

/// The §6 entry point. Never panics or propagates — every failure becomes an
/// `Err(ErrorResponse)` the transport can turn into a 500-equivalent.
pub async fn handle<C: Clock>(
    runtime: &SchedulerRuntime<C>,
    name: &str,
    body: &str,
) -> Result<PluginResponse, ErrorResponse> {
    let request = match PluginRequest::parse(name, body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(request = name, error = %e, "bad request");
            return Err(ErrorResponse { message: e.to_string() });
        }
    };

    match dispatch(runtime, request).await {
        Ok(response) => Ok(response),
        Err(e) => {
            tracing::error!(request = name, error = %e, "request failed");
            Err(ErrorResponse { message: e.to_string() })
        }
    }
}

async fn dispatch<C: Clock>(
    runtime: &SchedulerRuntime<C>,
    request: PluginRequest,
) -> Result<PluginResponse, PluginError> {
    match request {
        PluginRequest::GetIcon => Ok(icon_response()),
        PluginRequest::GetCapabilities => Ok(capabilities_response()),
        PluginRequest::MigrateConfig(req) => Ok(migrate_config_response(req)),
        PluginRequest::GetClusterProfileMetadata => Ok(PluginResponse::json(cluster_profile_metadata())),
        PluginRequest::GetElasticAgentProfileMetadata => Ok(PluginResponse::json(agent_profile_metadata())),
        PluginRequest::ValidateClusterProfile(settings) => Ok(validate_cluster_profile(&settings)),
        PluginRequest::ValidateElasticAgentProfile(settings) => Ok(validate_agent_profile(&settings)),
        PluginRequest::ServerPing(req) => handle_server_ping(runtime, req).await,
        PluginRequest::CreateAgent(req) => handle_create_agent(runtime, req).await,
        PluginRequest::ShouldAssignWork(req) => handle_should_assign_work(runtime, req),
        PluginRequest::JobCompletion(req) => handle_job_completion(runtime, req).await,
        PluginRequest::AgentStatusReport(req) => Ok(PluginResponse::Html(agent_status_report(runtime, req))),
        PluginRequest::ClusterStatusReport(req) => Ok(PluginResponse::Html(cluster_status_report(runtime, req))),
        PluginRequest::PluginStatusReport => Ok(PluginResponse::Html(plugin_status_report(runtime))),
    }
}

async fn handle_server_ping<C: Clock>(
    runtime: &SchedulerRuntime<C>,
    req: ServerPingRequest,
) -> Result<PluginResponse, PluginError> {
    runtime.server_ping(req.all_cluster_profile_properties).await;
    Ok(PluginResponse::Empty)
}

async fn handle_create_agent<C: Clock>(
    runtime: &SchedulerRuntime<C>,
    req: CreateAgentRequest,
) -> Result<PluginResponse, PluginError> {
    let job_id = job_identifier_string(&req.job_identifier);
    runtime
        .request_new_agent(
            req.cluster_profile_properties,
            req.elastic_agent_profile_properties,
            req.environment,
            job_id,
            req.auto_register_key,
        )
        .await?;
    Ok(PluginResponse::Empty)
}

fn handle_should_assign_work<C: Clock>(
    runtime: &SchedulerRuntime<C>,
    req: ShouldAssignWorkRequest,
) -> Result<PluginResponse, PluginError> {
    let agent_id = parse_agent_ref(&req.agent)?;
    let required = req.elastic_agent_profile_properties.resources_or_default();
    Ok(PluginResponse::Bool(runtime.should_assign_work(&agent_id, &required)))
}

async fn handle_job_completion<C: Clock>(
    runtime: &SchedulerRuntime<C>,
    req: JobCompletionRequest,
) -> Result<PluginResponse, PluginError> {
    let agent_id = AgentId::parse(&req.elastic_agent_id).map_err(|e| PluginError::BadRequest(e.to_string()))?;
    runtime.job_completion(agent_id).await;
    Ok(PluginResponse::Empty)
}

/// A job identifier is an opaque value on the wire (a number in some CI
/// server versions, an object in others); the engine only needs it as a
/// de-dup key, so it is flattened to its string form.
fn job_identifier_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const ICON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><rect width="16" height="16" fill="#2b6cb0"/></svg>"#;

fn icon_response() -> PluginResponse {
    PluginResponse::json(serde_json::json!({
        "content_type": "image/svg+xml",
        "data": base64_encode(ICON_SVG.as_bytes()),
    }))
}

fn capabilities_response() -> PluginResponse {
    PluginResponse::json(serde_json::json!({
        "supports_plugin_status_report": true,
        "supports_cluster_status_report": true,
        "supports_agent_status_report": true,
    }))
}

/// Settings-map normalization (the CI server's historical `migrate-config`
/// contract) is parsing work the transport owns (§1); this passes profiles
/// through unchanged, which is a no-op normalization and always valid.
fn migrate_config_response(req: MigrateConfigRequest) -> PluginResponse {
    PluginResponse::json(serde_json::json!({
        "cluster_profiles": req.cluster_profiles,
        "elastic_agent_profiles": req.elastic_agent_profiles,
    }))
}

fn cluster_profile_metadata() -> Vec<ProfileMetadataEntry> {
    vec![
        ProfileMetadataEntry::new("cluster_name", true, false),
        ProfileMetadataEntry::new("executor_url", true, false),
        ProfileMetadataEntry::new("role", true, false),
        ProfileMetadataEntry::new("env", true, false),
        ProfileMetadataEntry::new("server_api_url", true, false),
        ProfileMetadataEntry::new("agent_source_url", false, false),
    ]
}

fn agent_profile_metadata() -> Vec<ProfileMetadataEntry> {
    vec![
        ProfileMetadataEntry::new("tag", true, false),
        ProfileMetadataEntry::new("environments", false, false),
        ProfileMetadataEntry::new("cpu", false, false),
        ProfileMetadataEntry::new("ram", false, false),
        ProfileMetadataEntry::new("disk", false, false),
        ProfileMetadataEntry::new("init_script", false, false),
    ]
}

/// Settings maps arrive with our own field names already applied — mapping
/// the CI server's raw property keys onto them is the transport's job (§1).
fn validate_cluster_profile(settings: &SettingsMap) -> PluginResponse {
    match serde_json::to_value(settings).and_then(serde_json::from_value::<ClusterProfile>) {
        Ok(profile) => {
            let entries: Vec<ValidationEntry> = profile.validate().into_iter().map(ValidationEntry::from).collect();
            PluginResponse::json(entries)
        }
        Err(e) => PluginResponse::json(vec![ValidationEntry { key: String::new(), message: e.to_string() }]),
    }
}

fn validate_agent_profile(settings: &SettingsMap) -> PluginResponse {
    match serde_json::to_value(settings).and_then(serde_json::from_value::<AgentProfile>) {
        Ok(profile) => {
            let entries: Vec<ValidationEntry> = profile.validate().into_iter().map(ValidationEntry::from).collect();
            PluginResponse::json(entries)
        }
        Err(e) => PluginResponse::json(vec![ValidationEntry { key: String::new(), message: e.to_string() }]),
    }
}

fn agent_status_report<C: Clock>(runtime: &SchedulerRuntime<C>, req: StatusReportRequest) -> String {
    let snapshot = runtime.store().snapshot();
    let rows: String = snapshot
        .agents
        .iter()
        .filter(|(id, _)| req.elastic_agent_id.as_deref().map(|want| id.to_string() == want).unwrap_or(true))
        .map(|(id, record)| format!("<tr><td>{id}</td><td>{}</td><td>{}</td></tr>", record.state, record.idle))
        .collect();
    format!("<table><thead><tr><th>Agent</th><th>State</th><th>Idle</th></tr></thead><tbody>{rows}</tbody></table>")
}

fn cluster_status_report<C: Clock>(runtime: &SchedulerRuntime<C>, req: StatusReportRequest) -> String {
    let snapshot = runtime.store().snapshot();
    let wanted = req.cluster_profile_properties.map(|p| p.cluster_name);
    let rows: String = snapshot
        .clusters
        .iter()
        .filter(|(name, _)| wanted.as_deref().map(|want| name.as_str() == want).unwrap_or(true))
        .map(|(name, state)| {
            let quota = state.quota.map(|q| format!("{:?}", q.available)).unwrap_or_else(|| "unknown".to_string());
            format!("<tr><td>{name}</td><td>{}</td><td>{quota}</td></tr>", state.executor_url)
        })
        .collect();
    format!("<table><thead><tr><th>Cluster</th><th>Executor URL</th><th>Quota</th></tr></thead><tbody>{rows}</tbody></table>")
}

fn plugin_status_report<C: Clock>(runtime: &SchedulerRuntime<C>) -> String {
    let snapshot = runtime.store().snapshot();
    format!(
        "<p>{} clusters, {} agents tracked.</p>",
        snapshot.clusters.len(),
        snapshot.agents.len()
    )
}
