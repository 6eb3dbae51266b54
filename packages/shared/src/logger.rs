//! Logging setup utilities for the ecg-live binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library crates whose log output follows the default level.
const WORKSPACE_CRATES: [&str; 3] = ["ecg_live_shared", "ecg_live_server", "ecg_live_client"];

/// Build the default filter directive used when `RUST_LOG` is not set.
///
/// Every workspace library and the binary itself log at `default_log_level`;
/// dependencies stay at their own defaults.
pub fn default_filter_directive(binary_name: &str, default_log_level: &str) -> String {
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
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
/// * `binary_name` - The name of the binary (e.g., "ecg-live-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use ecg_live_shared::logger::setup_logger;
///
/// setup_logger("ecg-live-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_filter_directive(binary_name, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directive_covers_workspace_and_binary() {
        // テスト項目: ワークスペースのクレートとバイナリ名がフィルタに含まれる
        // given (前提条件):
        let binary_name = "replay-tool";

        // when (操作):
        let directive = default_filter_directive(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(
            directive,
            "ecg_live_shared=debug,ecg_live_server=debug,ecg_live_client=debug,replay_tool=debug"
        );
    }
}
