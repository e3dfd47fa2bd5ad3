use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable overriding the `--log-level` flag.
pub const LOG_ENV: &str = "CNC_LOG";

/// Expand a bare level such as `debug` into a filter scoped to this crate
/// and its workspace libraries. Full directives pass through untouched.
pub fn directives(level: &str) -> String {
    if level.contains('=') || level.contains(',') || level == "off" {
        return level.to_string();
    }

    ["cnc", "backoff", "labels"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Logs go to stderr so stdout stays usable
/// for command output.
pub fn init(level: &str, json: bool) {
    let levels = std::env::var(LOG_ENV).unwrap_or_else(|_| directives(level));
    let filter = EnvFilter::try_new(&levels).unwrap_or_else(|err| {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("invalid log filter {levels:?}: {err}, falling back to info");
        }

        EnvFilter::new(directives("info"))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // unwrap cannot be used here, tests may have installed a subscriber already
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_ansi(std::io::stderr().is_terminal())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_level() {
        assert_eq!(directives("debug"), "cnc=debug,backoff=debug,labels=debug");
        assert_eq!(directives("off"), "off");
        assert_eq!(directives("cnc=trace"), "cnc=trace");
        assert_eq!(directives("warn,cnc=info"), "warn,cnc=info");
    }
}
