//! Offline evaluation of a saved server push.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::grouping::{Group, Grouping};
use crate::model::{Data, Message, Rule};
use crate::store::TargetStore;

#[derive(Debug, Error)]
pub enum Error {
    #[error("read {path:?} failed: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("expected a data message, got {0:?}")]
    UnexpectedType(&'static str),

    #[error("decode snapshot failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Rules and targets as they were at one point in time.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub rules: Vec<Rule>,
    pub store: TargetStore,
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Snapshot, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        text.parse()
    }

    pub fn from_data(data: Data) -> Snapshot {
        let mut store = TargetStore::new();
        store.replace(data.agents.unwrap_or_default());

        Snapshot {
            rules: data.rules.unwrap_or_default(),
            store,
        }
    }

    pub fn groups(&self, grouping: &Grouping) -> Vec<Group> {
        grouping.group(self.store.targets(), &self.rules)
    }
}

impl std::str::FromStr for Snapshot {
    type Err = Error;

    /// Accepts a full `data` message or just its payload.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = serde_json::from_str::<serde_json::Value>(s)?;

        let data = if value.get("type").is_some() {
            match serde_json::from_value::<Message>(value)? {
                Message::Data(data) => data,
                msg => return Err(Error::UnexpectedType(msg.type_name())),
            }
        } else {
            serde_json::from_value::<Data>(value)?
        };

        Ok(Snapshot::from_data(data))
    }
}
