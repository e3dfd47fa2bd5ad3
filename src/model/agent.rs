use chrono::{DateTime, Utc};
use labels::LabelSet;
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A profiling agent and the targets it currently observes.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Agent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<LabelSet>,
}

/// What the presentation layer shows per agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSummary {
    pub name: String,
    pub targets: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        AgentSummary {
            name: agent.name.clone(),
            targets: agent.targets.len(),
            last_updated: agent.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize() {
        let agent: Agent = serde_json::from_str(
            r#"{
                "name": "agent-1",
                "last_updated": "2024-01-02T03:04:05Z",
                "targets": [{"namespace": "dev"}, {"namespace": "prod", "pod": "api-0"}]
            }"#,
        )
        .unwrap();

        assert_eq!(agent.name, "agent-1");
        assert_eq!(agent.targets.len(), 2);
        assert_eq!(agent.targets[1].get("pod"), "api-0");

        let summary = AgentSummary::from(&agent);
        assert_eq!(summary.targets, 2);
        assert_eq!(
            summary.last_updated.map(|t| t.to_rfc3339()),
            Some("2024-01-02T03:04:05+00:00".to_string())
        );
    }

    #[test]
    fn optional_fields() {
        let agent: Agent = serde_json::from_str(r#"{"name": "agent-2"}"#).unwrap();

        assert!(agent.targets.is_empty());
        assert!(agent.last_updated.is_none());

        let agent: Agent =
            serde_json::from_str(r#"{"name": null, "targets": null, "last_updated": null}"#)
                .unwrap();
        assert_eq!(agent, Agent::default());
    }
}
