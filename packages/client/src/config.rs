//! Playback and chart configuration.

use std::time::Duration;

use crate::error::ClientError;

/// Period of the playback ticker
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(8);

/// Number of points kept in the rolling window
pub const DEFAULT_CAPACITY: usize = 2550;

/// Geometry of the live chart in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub total_width: f64,
    pub total_height: f64,
    /// Left/right margin reserved for axis labels
    pub margin_for_labels: f64,
    /// Bottom margin reserved for the seconds ticks
    pub margin_for_sec_ticks: f64,
    /// Top margin reserved for the mV label
    pub margin_for_mv_label: f64,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            total_width: 2070.0,
            total_height: 555.0,
            margin_for_labels: 35.0,
            margin_for_sec_ticks: 40.0,
            margin_for_mv_label: 35.0,
        }
    }
}

impl ChartLayout {
    /// Inner padding between the margins and the plotted signal
    const SIGNAL_PADDING: f64 = 35.0;
    /// Distance of the cursor dot above the bottom margin
    const DOT_OFFSET: f64 = 10.0;

    /// Horizontal output range `(left, right)`
    pub fn x_range(&self) -> (f64, f64) {
        (
            self.margin_for_labels,
            self.total_width - self.margin_for_labels,
        )
    }

    /// Vertical output range `(bottom, top)`; larger samples are drawn higher.
    pub fn y_range(&self) -> (f64, f64) {
        (
            self.total_height - self.margin_for_sec_ticks - Self::SIGNAL_PADDING,
            self.margin_for_mv_label + Self::SIGNAL_PADDING,
        )
    }

    pub fn marker_top(&self) -> f64 {
        self.margin_for_mv_label
    }

    pub fn marker_bottom(&self) -> f64 {
        self.total_height - self.margin_for_sec_ticks
    }

    pub fn marker_dot_y(&self) -> f64 {
        self.total_height - self.margin_for_sec_ticks - Self::DOT_OFFSET
    }
}

/// Per-viewer playback settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub tick_interval: Duration,
    pub capacity: usize,
    pub layout: ChartLayout,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            capacity: DEFAULT_CAPACITY,
            layout: ChartLayout::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.tick_interval.is_zero() {
            return Err(ClientError::InvalidConfig(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        if self.capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_ranges() {
        // テスト項目: 既定のレイアウトから描画範囲とカーソル位置が導かれる
        // given (前提条件):
        let layout = ChartLayout::default();

        // when (操作):
        let x_range = layout.x_range();
        let y_range = layout.y_range();

        // then (期待する結果):
        assert_eq!(x_range, (35.0, 2035.0));
        assert_eq!(y_range, (480.0, 70.0));
        assert_eq!(layout.marker_top(), 35.0);
        assert_eq!(layout.marker_bottom(), 515.0);
        assert_eq!(layout.marker_dot_y(), 505.0);
    }

    #[test]
    fn test_validate_default_config() {
        // テスト項目: 既定の設定は妥当と判定される
        // given (前提条件):
        let config = PlaybackConfig::default();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(config.tick_interval, Duration::from_millis(8));
        assert_eq!(config.capacity, 2550);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        // テスト項目: tick 間隔 0 や容量 0 は InvalidConfig になる
        // given (前提条件):
        let zero_tick = PlaybackConfig {
            tick_interval: Duration::ZERO,
            ..PlaybackConfig::default()
        };
        let zero_capacity = PlaybackConfig {
            capacity: 0,
            ..PlaybackConfig::default()
        };

        // when (操作):
        let tick_result = zero_tick.validate();
        let capacity_result = zero_capacity.validate();

        // then (期待する結果):
        assert!(matches!(tick_result, Err(ClientError::InvalidConfig(_))));
        assert!(matches!(capacity_result, Err(ClientError::InvalidConfig(_))));
    }
}
