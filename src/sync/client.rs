use std::fmt;

use crate::grouping::{Group, Grouping, Summary};
use crate::model::{Action, AgentSummary, Data, Message, Rule};
use crate::store::TargetStore;

/// Connection state as seen by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    Disconnected,
    Connecting,
    Subscribed,
    /// The transport gave up reconnecting.
    Exhausted,
}

impl State {
    pub const fn as_str(&self) -> &'static str {
        match self {
            State::Disconnected => "disconnected",
            State::Connecting => "connecting",
            State::Subscribed => "subscribed",
            State::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consistent, owned snapshot of everything the presentation layer shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct View {
    pub state: State,
    pub rules: Vec<Rule>,
    pub agents: Vec<AgentSummary>,
    pub label_keys: Vec<String>,
    pub keys: Vec<String>,
    pub available_keys: Vec<String>,
    pub groups: Vec<Group>,
    pub summary: Summary,
}

/// Derive the mutations for toggling `group`, which was computed with the
/// grouping `keys`. Nothing is produced when `keys` does not line up with
/// the group's values.
///
/// Every rule selecting exactly the group's labels is deleted first, so at
/// most one such rule exists afterwards. The inserted rule keeps the group
/// when some member is not profiled yet and drops it otherwise.
pub fn toggle_messages<S: AsRef<str>>(rules: &[Rule], keys: &[S], group: &Group) -> Vec<Message> {
    if keys.len() != group.values.len() {
        debug!(
            message = "Grouping keys do not match group values, dropping group toggle",
            keys = keys.len(),
            values = ?group.values,
        );
        return vec![];
    }

    let selection = group.selection(keys);

    let mut messages = rules
        .iter()
        .filter(|rule| rule.equals_selection(&selection))
        .filter_map(|rule| match rule.id {
            Some(id) => Some(Message::rule_delete(id)),
            None => {
                debug!(message = "Equivalent rule without id cannot be deleted", selector = %rule.selector);
                None
            }
        })
        .collect::<Vec<_>>();

    let action = if group.profiled < group.total {
        Action::Keep
    } else {
        Action::Drop
    };
    messages.push(Message::rule_insert(Rule::from_selection(&selection, action)));

    messages
}

/// Client side of the rules protocol.
///
/// The client never performs I/O. Transport events are fed in, and the
/// messages it wants delivered are handed back to the caller.
#[derive(Debug, Default)]
pub struct SyncClient {
    state: State,
    rules: Vec<Rule>,
    store: TargetStore,
    grouping: Grouping,
}

impl SyncClient {
    pub fn new(grouping: Grouping) -> Self {
        SyncClient {
            state: State::Disconnected,
            rules: vec![],
            store: TargetStore::new(),
            grouping,
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Mutations are only delivered while subscribed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == State::Subscribed
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[inline]
    pub fn store(&self) -> &TargetStore {
        &self.store
    }

    #[inline]
    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    /// Recompute the groups from the current targets, keys and rules.
    pub fn groups(&self) -> Vec<Group> {
        self.grouping.group(self.store.targets(), &self.rules)
    }

    pub fn on_connecting(&mut self) {
        self.state = State::Connecting;
    }

    /// The transport is ready. Subscriptions do not survive reconnects, so
    /// the returned subscribe message must be sent on every open.
    pub fn on_open(&mut self) -> Message {
        self.state = State::Subscribed;
        Message::subscribe()
    }

    pub fn on_close(&mut self) {
        self.state = State::Disconnected;
    }

    pub fn on_exhausted(&mut self) {
        self.state = State::Exhausted;
    }

    /// Decode and apply one frame. Malformed frames are logged and dropped.
    /// Returns whether any state changed.
    pub fn receive(&mut self, text: &str) -> bool {
        match Message::decode(text) {
            Ok(msg) => self.apply(msg),
            Err(err) => {
                warn!(message = "Dropping malformed message", %err, size = text.len());
                false
            }
        }
    }

    /// Apply a decoded server message, returns whether any state changed.
    pub fn apply(&mut self, msg: Message) -> bool {
        match msg {
            Message::Data(Data { rules, agents }) => {
                let mut changed = false;

                if let Some(rules) = rules {
                    debug!(message = "Replacing rules", count = rules.len());
                    self.rules = rules;
                    changed = true;
                }

                if let Some(agents) = agents {
                    self.store.replace(agents);
                    debug!(
                        message = "Replacing targets",
                        agents = self.store.agents().len(),
                        targets = self.store.len(),
                    );
                    changed = true;
                }

                changed
            }
            msg => {
                debug!(message = "Ignoring message", r#type = msg.type_name());
                false
            }
        }
    }

    /// Messages deleting the rule `id`, nothing when not subscribed.
    pub fn request_rule_delete(&self, id: i64) -> Vec<Message> {
        if !self.is_ready() {
            debug!(message = "Not subscribed, dropping rule delete", id);
            return vec![];
        }

        vec![Message::rule_delete(id)]
    }

    /// Messages flipping the profiling state of `group`, nothing when not
    /// subscribed. `keys` are the grouping keys `group` was computed with,
    /// which may differ from the current selection.
    pub fn request_group_toggle<S: AsRef<str>>(&self, keys: &[S], group: &Group) -> Vec<Message> {
        if !self.is_ready() {
            debug!(message = "Not subscribed, dropping group toggle", values = ?group.values);
            return vec![];
        }

        toggle_messages(&self.rules, keys, group)
    }

    pub fn select_key(&mut self, key: impl Into<String>) -> bool {
        self.grouping.select(key)
    }

    pub fn deselect_key(&mut self, key: &str) -> bool {
        self.grouping.deselect(key)
    }

    pub fn set_keys(&mut self, keys: Vec<String>) {
        self.grouping = Grouping::new(keys);
    }

    pub fn view(&self) -> View {
        let groups = self.groups();

        View {
            state: self.state,
            rules: self.rules.clone(),
            agents: self.store.agents().to_vec(),
            label_keys: self.store.label_keys().iter().cloned().collect(),
            keys: self.grouping.keys().to_vec(),
            available_keys: self
                .grouping
                .available(self.store.label_keys())
                .into_iter()
                .map(String::from)
                .collect(),
            summary: Summary::of(&groups),
            groups,
        }
    }
}
