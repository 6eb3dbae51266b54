//! Text formatting for the interactive viewer.

use crate::{
    pacer::PlaybackState,
    relay::ConnectionState,
    session::SessionStatus,
    source::stream_display_name,
};

const RULE: &str = "============================================================";

/// Formatter for console output
pub struct StatusFormatter;

impl StatusFormatter {
    /// Format a session status block
    ///
    /// # Arguments
    ///
    /// * `status` - Snapshot of the viewer session
    ///
    /// # Returns
    ///
    /// A multi-line block with playback, stream and relay information
    pub fn format_status(status: &SessionStatus) -> String {
        let state = match status.state {
            PlaybackState::Idle => "idle",
            PlaybackState::Running => "running",
            PlaybackState::Stopped => "stopped",
        };
        let connection = match status.connection {
            Some(ConnectionState::Connected) => "connected",
            Some(ConnectionState::Disconnected) => "disconnected",
            None => "unbound",
        };
        let subscriber = status.subscriber_id.as_deref().unwrap_or("-");

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", RULE));
        output.push_str(&format!("Viewer:   {}\n", status.viewer_id));
        output.push_str(&format!("Playback: {}\n", state));
        output.push_str(&format!(
            "Stream:   {} ({}/{})\n",
            status.stream_name,
            status.stream_index + 1,
            status.stream_count
        ));
        output.push_str(&format!(
            "Cursor:   {}/{} (chart cursor {})\n",
            status.cursor, status.sample_count, status.write_cursor
        ));
        output.push_str(&format!("Relay:    {} as {}\n", connection, subscriber));
        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the stream list with the current selection marked
    pub fn format_stream_list(streams: &[String], current: usize) -> String {
        let mut output = String::new();
        output.push_str("\nStreams:\n");
        if streams.is_empty() {
            output.push_str("(No streams)\n");
        }
        for (i, file) in streams.iter().enumerate() {
            let marker = if i == current { " (current)" } else { "" };
            output.push_str(&format!(
                "  [{}] {}{}\n",
                i,
                stream_display_name(file),
                marker
            ));
        }
        output
    }

    pub fn format_help() -> String {
        [
            "",
            "Commands:",
            "  start            start playback",
            "  stop             stop playback",
            "  switch <n>       switch to stream n",
            "  next | prev      switch to the next / previous stream",
            "  list             list streams",
            "  status           show playback status",
            "  snapshot <file>  write the current chart as SVG",
            "  help             show this help",
            "  quit             leave",
            "",
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> SessionStatus {
        SessionStatus {
            viewer_id: "ecg-chart".to_string(),
            state: PlaybackState::Running,
            connection: Some(ConnectionState::Connected),
            subscriber_id: Some("abc".to_string()),
            stream_index: 0,
            stream_count: 2,
            stream_name: "100".to_string(),
            cursor: 42,
            sample_count: 650_000,
            write_cursor: 42,
        }
    }

    #[test]
    fn test_format_status_running() {
        // テスト項目: 再生中のステータスが正しくフォーマットされる
        // given (前提条件):
        let status = status();

        // when (操作):
        let result = StatusFormatter::format_status(&status);

        // then (期待する結果):
        assert!(result.contains("Viewer:   ecg-chart"));
        assert!(result.contains("Playback: running"));
        assert!(result.contains("Stream:   100 (1/2)"));
        assert!(result.contains("Cursor:   42/650000"));
        assert!(result.contains("Relay:    connected as abc"));
    }

    #[test]
    fn test_format_status_unbound() {
        // テスト項目: 未接続のセッションは unbound と表示される
        // given (前提条件):
        let status = SessionStatus {
            state: PlaybackState::Idle,
            connection: None,
            subscriber_id: None,
            ..status()
        };

        // when (操作):
        let result = StatusFormatter::format_status(&status);

        // then (期待する結果):
        assert!(result.contains("Playback: idle"));
        assert!(result.contains("Relay:    unbound as -"));
    }

    #[test]
    fn test_format_stream_list_marks_current() {
        // テスト項目: 現在のストリームに印が付く
        // given (前提条件):
        let streams = vec!["100.ecg".to_string(), "101.ecg".to_string()];

        // when (操作):
        let result = StatusFormatter::format_stream_list(&streams, 1);

        // then (期待する結果):
        assert!(result.contains("[0] 100\n"));
        assert!(result.contains("[1] 101 (current)"));
    }

    #[test]
    fn test_format_stream_list_empty() {
        // テスト項目: ストリームがない場合、その旨が表示される
        // given (前提条件):
        let streams: Vec<String> = Vec::new();

        // when (操作):
        let result = StatusFormatter::format_stream_list(&streams, 0);

        // then (期待する結果):
        assert!(result.contains("(No streams)"));
    }

    #[test]
    fn test_format_help_lists_commands() {
        // テスト項目: ヘルプに全コマンドが含まれる
        // given (前提条件):
        let commands = ["start", "stop", "switch", "next", "list", "status", "snapshot", "quit"];

        // when (操作):
        let result = StatusFormatter::format_help();

        // then (期待する結果):
        for command in commands {
            assert!(result.contains(command), "missing {}", command);
        }
    }
}
