//! Rolling window renderer.
//!
//! Keeps the last `capacity` points of the live chart in a FIFO and turns them into an
//! SVG path. The write cursor sweeps left to right and wraps; the points just ahead of
//! it are drawn with move-to commands, which leaves a visible erase gap between the new
//! trace and the old one.

use std::{collections::VecDeque, fmt::Write};

use ecg_live_server::domain::Sample;

use crate::{config::ChartLayout, error::ClientError};

/// Number of logical positions ahead of the cursor that start the erase gap
pub const GAP_WIDTH: usize = 20;

/// Radius of the dot drawn on the cursor line
pub const MARKER_RADIUS: f64 = 5.0;
/// Stroke width of the signal trace
pub const SIGNAL_LINE_WIDTH: f64 = 2.5;

/// Linear map from a domain interval onto a range interval.
///
/// A degenerate domain maps every input onto the middle of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
}

impl PathCommand {
    pub fn point(&self) -> Point {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => *p,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, PathCommand::MoveTo(_))
    }
}

/// Vertical line plus dot at the most recently drawn x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorMarker {
    pub x: f64,
    pub line_top: f64,
    pub line_bottom: f64,
    pub dot_y: f64,
    pub radius: f64,
}

pub struct RollingWindow {
    capacity: usize,
    layout: ChartLayout,
    x_scale: LinearScale,
    y_scale: LinearScale,
    points: VecDeque<Point>,
    write_cursor: usize,
    path: Vec<PathCommand>,
    marker: Option<CursorMarker>,
}

impl RollingWindow {
    pub fn new(capacity: usize, layout: ChartLayout) -> Result<Self, ClientError> {
        if capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }

        let x_scale = LinearScale::new((0.0, (capacity - 1) as f64), layout.x_range());
        let y_scale = LinearScale::new(
            (f64::from(Sample::MIN), f64::from(Sample::MAX)),
            layout.y_range(),
        );
        let mut window = Self {
            capacity,
            layout,
            x_scale,
            y_scale,
            points: VecDeque::with_capacity(capacity + 1),
            write_cursor: 0,
            path: Vec::with_capacity(capacity),
            marker: None,
        };
        window.reset();
        Ok(window)
    }

    /// Refill with the baseline and move the cursor back to the left edge.
    pub fn reset(&mut self) {
        let baseline_y = self.y(Sample::BASELINE);
        self.points.clear();
        self.points
            .extend((0..self.capacity).map(|i| Point {
                x: self.x_scale.apply(i as f64),
                y: baseline_y,
            }));
        self.write_cursor = 0;
        self.marker = None;
        self.path = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    PathCommand::MoveTo(*p)
                } else {
                    PathCommand::LineTo(*p)
                }
            })
            .collect();
    }

    pub fn render(&mut self, sample: Sample) {
        let point = Point {
            x: self.x_scale.apply(self.write_cursor as f64),
            y: self.y(sample),
        };

        self.points.push_back(point);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }

        self.write_cursor = (self.write_cursor + 1) % self.capacity;
        self.rebuild_path();

        self.marker = Some(CursorMarker {
            x: point.x,
            line_top: self.layout.marker_top(),
            line_bottom: self.layout.marker_bottom(),
            dot_y: self.layout.marker_dot_y(),
            radius: MARKER_RADIUS,
        });
    }

    fn y(&self, sample: Sample) -> f64 {
        self.y_scale.apply(f64::from(sample.value()))
    }

    fn rebuild_path(&mut self) {
        let capacity = self.capacity;
        let cursor = self.write_cursor;
        let len = self.points.len();

        self.path.clear();
        let mut previous_x: Option<f64> = None;
        for (i, point) in self.points.iter().enumerate() {
            let logical = (cursor + capacity + i + 1 - len) % capacity;
            // distance ahead of the cursor, modulo capacity
            let ahead = (logical + capacity - cursor) % capacity;
            let in_gap = (1..GAP_WIDTH).contains(&ahead);
            let wrapped = previous_x.is_some_and(|x| x > point.x);

            let command = if in_gap || previous_x.is_none() || wrapped {
                PathCommand::MoveTo(*point)
            } else {
                PathCommand::LineTo(*point)
            };
            self.path.push(command);
            previous_x = Some(point.x);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn points(&self) -> &VecDeque<Point> {
        &self.points
    }

    pub fn path(&self) -> &[PathCommand] {
        &self.path
    }

    pub fn marker(&self) -> Option<CursorMarker> {
        self.marker
    }

    /// SVG path data, e.g. `M35,274.8 L36,260 ...`.
    pub fn path_data(&self) -> String {
        format_path(&self.path)
    }

    /// Flat line at the baseline across the whole window.
    pub fn baseline_path_data(&self) -> String {
        let y = self.y(Sample::BASELINE);
        let commands: Vec<PathCommand> = (0..self.capacity)
            .map(|i| {
                let p = Point {
                    x: self.x_scale.apply(i as f64),
                    y,
                };
                if i == 0 {
                    PathCommand::MoveTo(p)
                } else {
                    PathCommand::LineTo(p)
                }
            })
            .collect();
        format_path(&commands)
    }

    /// Standalone SVG document with the trace and the cursor marker.
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.layout.total_width,
            h = self.layout.total_height,
        );
        let _ = writeln!(
            svg,
            r#"  <path class="ecg-line" fill="none" stroke="red" stroke-width="{}" d="{}"/>"#,
            SIGNAL_LINE_WIDTH,
            self.path_data()
        );
        if let Some(marker) = self.marker {
            let _ = writeln!(
                svg,
                r#"  <line class="current-line" stroke="black" stroke-width="2.5" x1="{x}" y1="{top}" x2="{x}" y2="{bottom}"/>"#,
                x = marker.x,
                top = marker.line_top,
                bottom = marker.line_bottom,
            );
            let _ = writeln!(
                svg,
                r#"  <circle class="current-line-circle" r="{}" cx="{}" cy="{}"/>"#,
                marker.radius, marker.x, marker.dot_y,
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn format_path(commands: &[PathCommand]) -> String {
    let mut data = String::with_capacity(commands.len() * 16);
    for (i, command) in commands.iter().enumerate() {
        if i > 0 {
            data.push(' ');
        }
        let (letter, p) = match command {
            PathCommand::MoveTo(p) => ('M', p),
            PathCommand::LineTo(p) => ('L', p),
        };
        let _ = write!(data, "{}{},{}", letter, p.x, p.y);
    }
    data
}
