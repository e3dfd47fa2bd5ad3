//! Aggregation of targets along a user chosen list of label keys.
//!
//! Groups are never patched. Any change of targets, rules or selected keys
//! means calling [`group`] again with the current inputs.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use labels::LabelSet;

use crate::matcher::decide;
use crate::model::Rule;

/// Key selected when nothing else is configured.
pub const DEFAULT_GROUP_BY: &str = "__container_id__";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    NoneKept,
    Partial,
    AllKept,
}

impl GroupStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::NoneKept => "none kept",
            GroupStatus::Partial => "partial",
            GroupStatus::AllKept => "all kept",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Label values of the group, one per grouping key.
    pub values: Vec<String>,
    pub total: usize,
    pub profiled: usize,
}

impl Group {
    pub fn status(&self) -> GroupStatus {
        if self.profiled == 0 {
            GroupStatus::NoneKept
        } else if self.profiled == self.total {
            GroupStatus::AllKept
        } else {
            GroupStatus::Partial
        }
    }

    /// The label assignment this group stands for, `keys[i] => values[i]`.
    pub fn selection<S: AsRef<str>>(&self, keys: &[S]) -> LabelSet {
        keys.iter()
            .zip(&self.values)
            .map(|(key, value)| (key.as_ref(), value.as_str()))
            .collect()
    }
}

#[derive(Default)]
struct Counts {
    total: usize,
    profiled: usize,
}

/// Partition `targets` by their projection onto `keys` and count how many
/// members of each group `rules` keep. Groups appear in the order their first
/// member appears in `targets`.
pub fn group<S: AsRef<str>>(targets: &[LabelSet], keys: &[S], rules: &[Rule]) -> Vec<Group> {
    let mut partitions: IndexMap<Vec<&str>, Counts> = IndexMap::new();

    for target in targets {
        let projection = keys
            .iter()
            .map(|key| target.get(key.as_ref()))
            .collect::<Vec<_>>();

        let counts = partitions.entry(projection).or_default();
        counts.total += 1;
        if decide(rules, target) {
            counts.profiled += 1;
        }
    }

    partitions
        .into_iter()
        .map(|(values, counts)| Group {
            values: values.into_iter().map(str::to_string).collect(),
            total: counts.total,
            profiled: counts.profiled,
        })
        .collect()
}

/// Fleet wide totals over a group list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub targets: usize,
    pub profiled: usize,
    pub groups: usize,
}

impl Summary {
    pub fn of(groups: &[Group]) -> Self {
        groups.iter().fold(
            Summary {
                groups: groups.len(),
                ..Default::default()
            },
            |mut summary, group| {
                summary.targets += group.total;
                summary.profiled += group.profiled;
                summary
            },
        )
    }
}

/// The ordered label keys currently used to group targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grouping {
    keys: Vec<String>,
}

impl Default for Grouping {
    fn default() -> Self {
        Grouping {
            keys: vec![DEFAULT_GROUP_BY.to_string()],
        }
    }
}

impl Grouping {
    /// Duplicated keys are dropped, keeping the first occurrence.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut grouping = Grouping { keys: vec![] };
        for key in keys {
            grouping.select(key);
        }
        grouping
    }

    #[inline]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Append `key`, returns false if it was selected already.
    pub fn select(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.keys.contains(&key) {
            return false;
        }

        self.keys.push(key);
        true
    }

    /// Remove `key`, returns false if it was not selected.
    pub fn deselect(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        before != self.keys.len()
    }

    /// Keys of `universe` which are not selected yet, sorted.
    pub fn available<'a>(&self, universe: &'a BTreeSet<String>) -> Vec<&'a str> {
        universe
            .iter()
            .filter(|key| !self.keys.contains(*key))
            .map(String::as_str)
            .collect()
    }

    pub fn group(&self, targets: &[LabelSet], rules: &[Rule]) -> Vec<Group> {
        group(targets, &self.keys, rules)
    }
}
