mod agent;
pub mod message;
mod rule;

pub use agent::{Agent, AgentSummary};
pub use message::{Data, Message, RuleDelete, RuleInsert, Subscribe};
pub use rule::{Action, Clause, Operator, Rule, Selector};
use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
