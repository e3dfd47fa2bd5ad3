mod server;
pub mod temp;

// re-export
pub use server::{Peer, RulesServer};
