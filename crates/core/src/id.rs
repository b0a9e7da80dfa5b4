// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier codec (§4.1).
//!
//! An [`AgentId`] is the opaque string `cluster/role/env/name` used as the key
//! for every per-agent record in the scheduler store. The codec is total on
//! well-formed ids; ids observed from the executor that don't parse are
//! filtered out upstream (treated as "not one of ours").

use crate::error::IdentifierError;
use std::fmt;

mod name_regex {
    use regex::Regex;
    use std::sync::OnceLock;

    pub fn name_regex() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"^[a-z]+-agent-[0-9]+$").expect("static regex is valid"))
    }
}

/// `cluster/role/env/name` identifier for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId {
    pub cluster: String,
    pub role: String,
    pub env: String,
    pub name: String,
}

impl AgentId {
    /// `form(cluster, role, env, name)` — §4.1.
    pub fn form(
        cluster: impl Into<String>,
        role: impl Into<String>,
        env: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let name = name.into();
        if !name_regex::name_regex().is_match(&name) {
            return Err(IdentifierError::InvalidName(name));
        }
        Ok(Self { cluster: cluster.into(), role: role.into(), env: env.into(), name })
    }

    /// `parse(id) -> {cluster, role, env, name}` — §4.1.
    pub fn parse(id: &str) -> Result<Self, IdentifierError> {
        let parts: Vec<&str> = id.split('/').collect();
        let [cluster, role, env, name] = parts.as_slice() else {
            return Err(IdentifierError::Malformed(id.to_string()));
        };
        Self::form(*cluster, *role, *env, *name)
    }

    pub fn tag(&self) -> &str {
        self.name.split("-agent-").next().unwrap_or(&self.name)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.cluster, self.role, self.env, self.name)
    }
}

impl serde::Serialize for AgentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for AgentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AgentId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_well_formed_ids() {
        let id = AgentId::form("aws-dev", "www", "prod", "build-agent-0").unwrap();
        assert_eq!(id.to_string(), "aws-dev/www/prod/build-agent-0");
        let parsed = AgentId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(matches!(
            AgentId::form("c", "r", "e", "BuildAgent0"),
            Err(IdentifierError::InvalidName(_))
        ));
        assert!(matches!(
            AgentId::form("c", "r", "e", "build-agent"),
            Err(IdentifierError::InvalidName(_))
        ));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(matches!(AgentId::parse("too/few/parts"), Err(IdentifierError::Malformed(_))));
        assert!(matches!(
            AgentId::parse("a/b/c/d/e"),
            Err(IdentifierError::Malformed(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn round_trip_prop(
            cluster in "[a-z]{1,8}",
            role in "[a-z]{1,8}",
            env in "[a-z]{1,8}",
            tag in "[a-z]{1,8}",
            n in 0u32..10_000,
        ) {
            let name = format!("{tag}-agent-{n}");
            let id = AgentId::form(&cluster, &role, &env, &name).unwrap();
            let parsed = AgentId::parse(&id.to_string()).unwrap();
            proptest::prop_assert_eq!(parsed, id);
        }
    }
}
