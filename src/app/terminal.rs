/// Picks the log level used when `RUST_LOG` is not set.
pub(crate) fn resolve_default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > default (info)
pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::resolve_default_log_level;

    #[test]
    fn test_log_level_quiet_wins_over_verbose() {
        assert_eq!(resolve_default_log_level(2, true), "error");
    }

    #[test]
    fn test_log_level_by_verbosity() {
        assert_eq!(resolve_default_log_level(0, false), "info");
        assert_eq!(resolve_default_log_level(1, false), "debug");
        assert_eq!(resolve_default_log_level(2, false), "trace");
        assert_eq!(resolve_default_log_level(5, false), "trace");
    }
}
