use std::future::Future;
use std::time::Duration;

use backoff::Backoff;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use super::client::{SyncClient, View};
use crate::grouping::Group;
use crate::model::Message;
use crate::transport::{self, Connection, Connector, FrameSink};

#[derive(Debug, Error)]
pub enum Error {
    #[error("gave up connecting to {peer} after {attempts} attempts")]
    Exhausted { peer: String, attempts: usize },
}

/// Returned by [`Handle`] once the session has stopped.
#[derive(Debug, Error)]
#[error("session is closed")]
pub struct SessionClosed;

/// Requests from the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Toggle `group`, computed with the grouping `keys`.
    ToggleGroup { keys: Vec<String>, group: Group },
    DeleteRule(i64),
    SelectKey(String),
    DeselectKey(String),
    SetKeys(Vec<String>),
}

/// Cheap, cloneable access to a running [`Session`].
#[derive(Clone, Debug)]
pub struct Handle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<View>,
}

impl Handle {
    pub fn send(&self, command: Command) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }

    /// `keys` must be the grouping keys of the view `group` was taken from.
    pub fn toggle_group(&self, keys: Vec<String>, group: Group) -> Result<(), SessionClosed> {
        self.send(Command::ToggleGroup { keys, group })
    }

    pub fn delete_rule(&self, id: i64) -> Result<(), SessionClosed> {
        self.send(Command::DeleteRule(id))
    }

    pub fn select_key(&self, key: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::SelectKey(key.into()))
    }

    pub fn deselect_key(&self, key: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::DeselectKey(key.into()))
    }

    pub fn set_keys(&self, keys: Vec<String>) -> Result<(), SessionClosed> {
        self.send(Command::SetKeys(keys))
    }

    /// The latest published view.
    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    /// A receiver notified on every published view.
    pub fn watch(&self) -> watch::Receiver<View> {
        self.view.clone()
    }
}

enum Exit {
    Reconnect,
    Shutdown,
}

/// Drives a [`SyncClient`] over connections opened by `C`, reconnecting with
/// the given schedule until it is exhausted.
pub struct Session<C> {
    connector: C,
    client: SyncClient,
    backoff: Backoff,
    commands: mpsc::UnboundedReceiver<Command>,
    view: watch::Sender<View>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, client: SyncClient, backoff: Backoff) -> (Self, Handle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(client.view());

        let session = Session {
            connector,
            client,
            backoff,
            commands: commands_rx,
            view: view_tx,
        };
        let handle = Handle {
            commands: commands_tx,
            view: view_rx,
        };

        (session, handle)
    }

    /// Run until `shutdown` resolves, every [`Handle`] is dropped or the
    /// reconnect schedule is exhausted.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.client.on_connecting();
            self.publish();

            let connected = tokio::select! {
                biased;

                _ = &mut shutdown => return Ok(()),
                result = self.connector.connect() => result,
            };

            match connected {
                Ok(connection) => {
                    info!(message = "Connected", peer = self.connector.peer());

                    self.backoff.reset();
                    let exit = self.serve(connection, &mut shutdown).await;

                    self.client.on_close();
                    self.publish();

                    if let Exit::Shutdown = exit {
                        return Ok(());
                    }
                }
                Err(err) => {
                    warn!(
                        message = "Unable to connect",
                        %err,
                        attempts = self.backoff.attempts(),
                    );

                    self.client.on_close();
                    self.publish();
                }
            }

            let Some(delay) = self.backoff.next_delay() else {
                self.client.on_exhausted();
                self.publish();

                let attempts = self.backoff.attempts();
                error!(
                    message = "Giving up reconnecting",
                    peer = self.connector.peer(),
                    attempts,
                );

                return Err(Error::Exhausted {
                    peer: self.connector.peer().to_string(),
                    attempts,
                });
            };

            debug!(
                message = "Reconnecting",
                ?delay,
                attempt = self.backoff.attempts()
            );

            if let Exit::Shutdown = self.idle(delay, &mut shutdown).await {
                return Ok(());
            }
        }
    }

    async fn serve<S>(&mut self, connection: Connection, shutdown: &mut S) -> Exit
    where
        S: Future<Output = ()> + Unpin,
    {
        let Connection {
            mut sink,
            mut stream,
        } = connection;

        let subscribe = self.client.on_open();
        self.publish();
        if let Err(err) = deliver(&mut sink, vec![subscribe]).await {
            warn!(message = "Subscribe failed", %err);
            return Exit::Reconnect;
        }

        loop {
            tokio::select! {
                biased;

                _ = &mut *shutdown => {
                    if let Err(err) = sink.close().await {
                        debug!(message = "Closing connection failed", %err);
                    }

                    return Exit::Shutdown;
                }

                frame = stream.next() => match frame {
                    Some(Ok(text)) => {
                        if self.client.receive(&text) {
                            self.publish();
                        }
                    }
                    Some(Err(transport::Error::FrameTooLong { max })) => {
                        warn!(message = "Dropping oversized frame", max);
                    }
                    Some(Err(err)) => {
                        warn!(message = "Connection lost", %err);
                        return Exit::Reconnect;
                    }
                    None => {
                        info!(message = "Connection closed by peer");
                        return Exit::Reconnect;
                    }
                },

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return Exit::Shutdown;
                    };

                    let messages = self.handle(command);
                    self.publish();

                    if let Err(err) = deliver(&mut sink, messages).await {
                        warn!(message = "Connection lost while sending", %err);
                        return Exit::Reconnect;
                    }
                }
            }
        }
    }

    /// Wait out `delay` while still serving local commands.
    async fn idle<S>(&mut self, delay: Duration, shutdown: &mut S) -> Exit
    where
        S: Future<Output = ()> + Unpin,
    {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;

                _ = &mut *shutdown => return Exit::Shutdown,
                _ = &mut sleep => return Exit::Reconnect,
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return Exit::Shutdown;
                    };

                    // not subscribed, so nothing can be produced for the server
                    let _ = self.handle(command);
                    self.publish();
                }
            }
        }
    }

    fn handle(&mut self, command: Command) -> Vec<Message> {
        match command {
            Command::ToggleGroup { keys, group } => {
                self.client.request_group_toggle(&keys, &group)
            }
            Command::DeleteRule(id) => self.client.request_rule_delete(id),
            Command::SelectKey(key) => {
                self.client.select_key(key);
                vec![]
            }
            Command::DeselectKey(key) => {
                self.client.deselect_key(&key);
                vec![]
            }
            Command::SetKeys(keys) => {
                self.client.set_keys(keys);
                vec![]
            }
        }
    }

    fn publish(&self) {
        self.view.send_replace(self.client.view());
    }
}

async fn deliver(sink: &mut FrameSink, messages: Vec<Message>) -> Result<(), transport::Error> {
    for msg in messages {
        let text = match msg.encode() {
            Ok(text) => text,
            Err(err) => {
                warn!(message = "Dropping unencodable message", %err);
                continue;
            }
        };

        debug!(message = "Sending message", r#type = msg.type_name());
        sink.send(text).await?;
    }

    Ok(())
}
