//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set. Only the first call
/// in a process installs anything; later calls return `false`.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_ignored() {
        init_tracing("chatline=debug");
        assert!(!init_tracing("chatline=debug"));
    }

    #[test]
    fn test_bad_directive_falls_back() {
        // Must not panic even when the directive cannot be parsed
        let _ = init_tracing("=][=");
    }
}
