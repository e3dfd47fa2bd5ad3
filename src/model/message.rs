//! The JSON envelope exchanged with the rules server.
//!
//! Every frame is an object `{"type": ..., "payload": ...}`. The payload shape
//! is fixed by the type, so the envelope is modelled as an adjacently tagged
//! enum and unknown types fail to decode instead of being guessed at.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Agent, Rule, null_as_default};

pub const TOPIC_RULES: &str = "rules";
pub const TOPIC_AGENTS: &str = "agents";

#[derive(Debug, Error)]
pub enum Error {
    #[error("decode message failed: {0}")]
    Decode(serde_json::Error),
    #[error("encode message failed: {0}")]
    Encode(serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    #[serde(rename = "subscribe")]
    Subscribe(Subscribe),
    #[serde(rename = "data")]
    Data(#[serde(deserialize_with = "null_as_default")] Data),
    #[serde(rename = "rule.insert")]
    RuleInsert(RuleInsert),
    #[serde(rename = "rule.delete")]
    RuleDelete(RuleDelete),
}

impl Message {
    /// Subscribe to both rule and agent updates.
    pub fn subscribe() -> Self {
        Message::Subscribe(Subscribe {
            topics: vec![TOPIC_RULES.to_string(), TOPIC_AGENTS.to_string()],
        })
    }

    pub fn rule_insert(rule: Rule) -> Self {
        Message::RuleInsert(RuleInsert { rule, after: None })
    }

    pub fn rule_delete(id: i64) -> Self {
        Message::RuleDelete(RuleDelete { id })
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Message::Subscribe(_) => "subscribe",
            Message::Data(_) => "data",
            Message::RuleInsert(_) => "rule.insert",
            Message::RuleDelete(_) => "rule.delete",
        }
    }

    pub fn decode(text: &str) -> Result<Message, Error> {
        serde_json::from_str(text).map_err(Error::Decode)
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Error::Encode)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Subscribe {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

/// A server push. Absent or `null` sections leave the local copy untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Data {
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    #[serde(default)]
    pub agents: Option<Vec<Agent>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RuleInsert {
    pub rule: Rule,
    /// Insert after the rule with this id, at the front when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RuleDelete {
    pub id: i64,
}
