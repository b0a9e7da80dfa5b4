// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent bootstrap payload construction (§6): the task specification shipped
//! to `createJob`, containing the three ordered install/configure/run
//! processes every created agent job runs.

use crate::id::AgentId;
use crate::profile::{AgentProfile, ClusterProfile};
use serde::{Deserialize, Serialize};

const JVM_PORT_MIN: u32 = 57345;
const JVM_PORT_MAX: u32 = 61000;

/// This plugin's fixed GoCD extension id, reported to every agent it
/// bootstraps via `agent.auto.register.elasticAgent.pluginId` — the same
/// value for every cluster, not the cluster name.
pub const PLUGIN_ID: &str = "cd.go.contrib.elastic-agent.scheduler";

/// One process in the task's ordered process list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub name: &'static str,
    pub cmdline: String,
    pub max_failures: u32,
    pub ephemeral: bool,
    pub min_duration: u32,
    pub daemon: bool,
    pub r#final: bool,
}

impl Process {
    fn new(name: &'static str, cmdline: String) -> Self {
        Self { name, cmdline, max_failures: 1, ephemeral: false, min_duration: 5, daemon: false, r#final: false }
    }
}

/// Process ordering constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub order: Vec<&'static str>,
}

/// The task specification handed to `ExecutorClient::create_job` (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub processes: Vec<Process>,
    pub finalization_wait: u32,
    pub max_failures: u32,
    pub max_concurrency: u32,
    pub constraints: Vec<Constraint>,
}

/// Build the three-process bootstrap task spec for a freshly-created agent job.
pub fn build_task_spec(
    cluster: &ClusterProfile,
    profile: &AgentProfile,
    agent_id: &AgentId,
    auto_register_key: &str,
) -> TaskSpec {
    let install = install_process(cluster);
    let configure = configure_process(cluster, profile, agent_id, auto_register_key);
    let run = run_process(profile);

    TaskSpec {
        processes: vec![install, configure, run],
        finalization_wait: 30,
        max_failures: 1,
        max_concurrency: 0,
        constraints: vec![Constraint { order: vec!["install", "configure", "run"] }],
    }
}

fn install_process(cluster: &ClusterProfile) -> Process {
    let source_url = cluster.agent_source_url.clone().unwrap_or_default();
    let cmdline = format!(
        "set -e; wget -O a.zip {source_url}; unzip a.zip; rm a.zip; mv agent-* agent"
    );
    Process::new("install", cmdline)
}

fn configure_process(
    cluster: &ClusterProfile,
    profile: &AgentProfile,
    agent_id: &AgentId,
    auto_register_key: &str,
) -> Process {
    let environments = profile.environments.clone().unwrap_or_default().join(",");
    let wrapper_properties = [
        "wrapper.app.parameter.100=-serverUrl".to_string(),
        format!("wrapper.app.parameter.101={}", cluster.server_api_url),
        "wrapper.port={{executor.ports[wrapper]}}".to_string(),
        format!("wrapper.jvm.port.min={JVM_PORT_MIN}"),
        format!("wrapper.jvm.port.max={JVM_PORT_MAX}"),
    ]
    .join("\n");

    let autoregister_properties = [
        format!("agent.auto.register.key={auto_register_key}"),
        "agent.auto.register.hostname={{thermos.task_id}}".to_string(),
        format!("agent.auto.register.environments={environments}"),
        format!("agent.auto.register.elasticAgent.pluginId={PLUGIN_ID}"),
        format!("agent.auto.register.elasticAgent.agentId={agent_id}"),
    ]
    .join("\n");

    let cmdline = format!(
        "set -e\n\
         mkdir -p agent/wrapper-config agent/config\n\
         cat > agent/wrapper-config/wrapper-properties.conf <<'EOF'\n{wrapper_properties}\nEOF\n\
         cat > agent/config/autoregister.properties <<'EOF'\n{autoregister_properties}\nEOF\n\
         echo {logback_b64} | base64 -d > agent/config/agent-logback.xml\n\
         cp agent/config/agent-logback.xml agent/config/agent-bootstrapper-logback.xml\n\
         cp agent/config/agent-logback.xml agent/config/agent-launcher-logback.xml",
        wrapper_properties = wrapper_properties,
        autoregister_properties = autoregister_properties,
        logback_b64 = logback_base64(),
    );
    Process::new("configure", cmdline)
}

fn run_process(profile: &AgentProfile) -> Process {
    let init = profile.init_script.clone().unwrap_or_default();
    let cmdline = format!("{init}export PATH=\"$HOME/bin:$PATH\"\nagent/bin/agent console");
    Process::new("run", cmdline)
}

/// The (fixed) logback configuration materialized on every agent, base64-encoded.
fn logback_base64() -> String {
    const LOGBACK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<configuration>
  <appender name="STDOUT" class="ch.qos.logback.core.ConsoleAppender">
    <encoder><pattern>%d{ISO8601} %-5level [%thread] %logger{36} - %msg%n</pattern></encoder>
  </appender>
  <root level="INFO"><appender-ref ref="STDOUT"/></root>
</configuration>
"#;
    base64_encode(LOGBACK_XML.as_bytes())
}

/// Minimal base64 encoder — no crate in the workspace's stack needs this
/// outside the bootstrap payload and the plugin's `get-icon` response, so it
/// stays hand-rolled rather than pulling in a dependency for one call site.
pub fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let n = (b0 << 16) | (b1 << 8) | b2;
        out.push(ALPHABET[((n >> 18) & 0x3F) as usize] as char);
        out.push(ALPHABET[((n >> 12) & 0x3F) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[((n >> 6) & 0x3F) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(n & 0x3F) as usize] as char } else { '=' });
    }
    out
}
