#![deny(clippy::print_stdout, clippy::print_stderr)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod console;
pub mod grouping;
pub mod matcher;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod trace;
pub mod transport;

pub mod built_info {
    pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
    pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
}
