#![allow(dead_code)]

use std::time::Duration;

use cnc::sync::View;
use tokio::sync::watch;

pub fn trace_init() {
    let level = std::env::var("TEST_LOG").unwrap_or_else(|_| "debug".to_string());

    cnc::trace::init(&level, false);
}

/// Wait until a published view satisfies `f`, panics after 10s.
pub async fn wait_view<F>(views: &mut watch::Receiver<View>, f: F) -> View
where
    F: FnMut(&View) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), views.wait_for(f))
        .await
        .expect("timed out waiting for view")
        .expect("session stopped")
        .clone()
}
