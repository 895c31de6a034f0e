//! Logging setup shared by the relay server and the CLI client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default `EnvFilter` directive string, e.g. `tayori_server=debug,tower_http=debug`.
///
/// Crate names are normalised to their module form (`-` → `_`).
pub fn default_directives(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `targets` - Crates and binaries whose logs should be emitted (e.g. `["tayori-server", "tower_http"]`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use tayori_shared::logger::setup_logger;
///
/// setup_logger(&["tayori-server", "tower_http"], "debug");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_normalises_crate_names() {
        // テスト項目: クレート名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let targets = ["tayori-server", "tower_http"];

        // when (操作):
        let directives = default_directives(&targets, "debug");

        // then (期待する結果):
        assert_eq!(directives, "tayori_server=debug,tower_http=debug");
    }

    #[test]
    fn test_default_directives_with_no_targets() {
        // テスト項目: ターゲットが空の場合は空文字列になる
        // given (前提条件):
        let targets: [&str; 0] = [];

        // when (操作):
        let directives = default_directives(&targets, "info");

        // then (期待する結果):
        assert!(directives.is_empty());
    }
}
