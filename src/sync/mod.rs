mod client;
mod session;

pub use client::{State, SyncClient, View, toggle_messages};
pub use session::{Command, Error, Handle, Session, SessionClosed};
