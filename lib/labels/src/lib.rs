//! Label sets identify monitored targets.
//!
//! A label set is a plain string to string mapping. Lookups of absent keys
//! yield the empty string, and equality follows the same rule: a key mapped
//! to `""` is indistinguishable from a key that is not there at all.

use std::collections::BTreeMap;
use std::collections::btree_map::{Iter, Keys};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value of `key`, or `""` when the key is absent.
    #[inline]
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or_default()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a key ordered iterator over all label pairs.
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn keys(&self) -> Keys<'_, String, String> {
        self.0.keys()
    }

    /// Project the label set onto `keys`, keeping their order. Absent keys
    /// project to `""`.
    pub fn project<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        keys.iter()
            .map(|key| self.get(key.as_ref()).to_string())
            .collect()
    }

    /// Effective value equality, see [`PartialEq`].
    pub fn equals(&self, other: &LabelSet) -> bool {
        self.effective_subset_of(other) && other.effective_subset_of(self)
    }

    fn effective_subset_of(&self, other: &LabelSet) -> bool {
        self.0.iter().all(|(key, value)| other.get(key) == value)
    }
}

/// Two label sets are equal when every key present in either of them has the
/// same effective value in both.
impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for LabelSet {}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut labels = LabelSet::new();
        iter.into_iter().for_each(|(k, v)| labels.insert(k, v));
        labels
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value:?}")?;
        }
        f.write_str("}")
    }
}

#[macro_export]
macro_rules! labels {
    // Done without trailing comma
    ( $($x:expr => $y:expr),* ) => ({
        let mut _labels = $crate::LabelSet::new();
        $(
            _labels.insert($x, $y);
        )*
        _labels
    });
    // Done with trailing comma
    ( $($x:expr => $y:expr,)* ) => (
        $crate::labels!{$($x => $y),*}
    );
}
