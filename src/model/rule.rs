use std::collections::BTreeMap;
use std::fmt;

use labels::LabelSet;
use serde::{Deserialize, Serialize};

/// Comparison operator of a selector clause.
///
/// Only [`Operator::Equal`] takes part in matching. Every other operator,
/// including ones this client does not know, makes its clause fail.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equal,
    NotEqual,
    RegexMatch,
    RegexNoMatch,
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::RegexMatch => "=~",
            Operator::RegexNoMatch => "!~",
            Operator::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "=" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "=~" => Operator::RegexMatch,
            "!~" => Operator::RegexNoMatch,
            _ => Operator::Other(s),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Other(s) => s,
            op => op.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(key, operator, value)` triple, encoded as a three element array.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(
    from = "(String, Operator, String)",
    into = "(String, Operator, String)"
)]
pub struct Clause {
    pub key: String,
    pub op: Operator,
    pub value: String,
}

impl Clause {
    pub fn equal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Clause {
            key: key.into(),
            op: Operator::Equal,
            value: value.into(),
        }
    }

    #[inline]
    pub fn matches(&self, labels: &LabelSet) -> bool {
        self.op == Operator::Equal && labels.get(&self.key) == self.value
    }
}

impl From<(String, Operator, String)> for Clause {
    fn from((key, op, value): (String, Operator, String)) -> Self {
        Clause { key, op, value }
    }
}

impl From<Clause> for (String, Operator, String) {
    fn from(clause: Clause) -> Self {
        (clause.key, clause.op, clause.value)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{:?}", self.key, self.op, self.value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Selector(pub Vec<Clause>);

impl Selector {
    #[inline]
    pub fn clauses(&self) -> &[Clause] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Clause> for Selector {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Selector(iter.into_iter().collect())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            clause.fmt(f)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Keep,
    Drop,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Keep => "keep",
            Action::Drop => "drop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    /// Assigned by the server, absent until the rule has been stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub selector: Selector,
    pub action: Action,
}

impl Rule {
    pub fn new(selector: Selector, action: Action) -> Self {
        Rule {
            id: None,
            selector,
            action,
        }
    }

    /// Build an unsubmitted rule selecting exactly `labels`, one `=` clause
    /// per label in key order.
    pub fn from_selection(labels: &LabelSet, action: Action) -> Self {
        let selector = labels
            .iter()
            .map(|(key, value)| Clause::equal(key.as_str(), value.as_str()))
            .collect();

        Rule::new(selector, action)
    }

    /// Every clause must be an `=` clause satisfied by `labels`. An empty
    /// selector matches everything.
    pub fn matches(&self, labels: &LabelSet) -> bool {
        self.selector.0.iter().all(|clause| clause.matches(labels))
    }

    /// Whether the selector encodes exactly the assignment `labels`: only
    /// `=` clauses, same key set, same values, clause order ignored.
    pub fn equals_selection(&self, labels: &LabelSet) -> bool {
        let mut assignment = BTreeMap::new();
        for clause in &self.selector.0 {
            if clause.op != Operator::Equal {
                return false;
            }

            match assignment.insert(clause.key.as_str(), clause.value.as_str()) {
                Some(prev) if prev != clause.value => return false,
                _ => {}
            }
        }

        assignment.len() == labels.len()
            && labels
                .iter()
                .all(|(key, value)| assignment.get(key.as_str()) == Some(&value.as_str()))
    }
}
