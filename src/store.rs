use std::collections::BTreeSet;

use labels::LabelSet;

use crate::model::{Agent, AgentSummary};

/// The current fleet snapshot.
///
/// Every agents push replaces the whole store, there is no identity tracking
/// of targets across snapshots.
#[derive(Clone, Debug, Default)]
pub struct TargetStore {
    agents: Vec<AgentSummary>,
    targets: Vec<LabelSet>,
    label_keys: BTreeSet<String>,
}

impl TargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with the targets of `agents`, flattened in agent
    /// order.
    pub fn replace(&mut self, agents: Vec<Agent>) {
        let mut summaries = Vec::with_capacity(agents.len());
        let mut targets = Vec::with_capacity(agents.iter().map(|a| a.targets.len()).sum());
        let mut label_keys = BTreeSet::new();

        for agent in agents {
            summaries.push(AgentSummary::from(&agent));

            for target in agent.targets {
                label_keys.extend(target.keys().cloned());
                targets.push(target);
            }
        }

        self.agents = summaries;
        self.targets = targets;
        self.label_keys = label_keys;
    }

    #[inline]
    pub fn targets(&self) -> &[LabelSet] {
        &self.targets
    }

    #[inline]
    pub fn agents(&self) -> &[AgentSummary] {
        &self.agents
    }

    /// All label keys seen on any current target, sorted.
    #[inline]
    pub fn label_keys(&self) -> &BTreeSet<String> {
        &self.label_keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use labels::labels;
    use pretty_assertions::assert_eq;

    use super::*;

    fn agent(name: &str, targets: Vec<LabelSet>) -> Agent {
        Agent {
            name: name.to_string(),
            last_updated: None,
            targets,
        }
    }

    #[test]
    fn replace_flattens_agents() {
        let mut store = TargetStore::new();
        store.replace(vec![
            agent("a1", vec![labels!("ns" => "a"), labels!("ns" => "b", "pod" => "p")]),
            agent("a2", vec![labels!("container" => "c")]),
            agent("a3", vec![]),
        ]);

        assert_eq!(store.len(), 3);
        assert_eq!(
            store.targets(),
            &[
                labels!("ns" => "a"),
                labels!("ns" => "b", "pod" => "p"),
                labels!("container" => "c"),
            ]
        );
        assert_eq!(
            store.label_keys().iter().collect::<Vec<_>>(),
            vec!["container", "ns", "pod"]
        );

        let agents = store
            .agents()
            .iter()
            .map(|a| (a.name.as_str(), a.targets))
            .collect::<Vec<_>>();
        assert_eq!(agents, vec![("a1", 2), ("a2", 1), ("a3", 0)]);
    }

    #[test]
    fn replace_is_wholesale() {
        let mut store = TargetStore::new();
        store.replace(vec![agent("a1", vec![labels!("ns" => "a", "pod" => "p")])]);
        store.replace(vec![agent("a2", vec![labels!("ns" => "b")])]);

        assert_eq!(store.targets(), &[labels!("ns" => "b")]);
        assert!(!store.label_keys().contains("pod"));
        assert_eq!(store.agents().len(), 1);

        store.replace(vec![]);
        assert!(store.is_empty());
        assert!(store.label_keys().is_empty());
    }
}
