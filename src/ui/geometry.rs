//! Plot areas and axis grid positions.
//!
//! Everything here is derived from the component bounds and the active
//! visualization mode, the painting layer only has to draw the results.

use crate::audio::constants::{
    freq_to_log_position, FREQUENCY_MARKERS, GAIN_MARKERS, GAIN_MAX_DB, GAIN_MIN_DB,
};
use crate::VisualizationMode;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in component pixels, origin at the top left
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Shrink from each edge. Negative amounts grow the rectangle, sizes never
    /// go below zero.
    pub fn inset(self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        let top = top.min(self.height);
        let left = left.min(self.width);
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(0.0),
            height: (self.height - top - bottom).max(0.0),
        }
    }
}

/// Area the visualization is drawn into, leaving room for the axis labels
pub fn render_area(bounds: Rect, mode: VisualizationMode) -> Rect {
    match mode {
        VisualizationMode::Rms => bounds.inset(15.0, 20.0, 0.0, 20.0),
        VisualizationMode::Spectrogram => bounds.inset(0.0, 31.0, -3.0, 0.0),
    }
}

/// Area the path or image is mapped onto
pub fn analysis_area(bounds: Rect, mode: VisualizationMode) -> Rect {
    let area = render_area(bounds, mode);
    match mode {
        VisualizationMode::Rms => area.inset(0.0, 0.0, 2.0, 0.0),
        VisualizationMode::Spectrogram => area.inset(4.0, 0.0, 4.0, 0.0),
    }
}

/// Horizontal pixel position of `freq` on a log axis across `area`
pub fn frequency_to_x(freq: f32, area: Rect) -> f32 {
    area.x + area.width * freq_to_log_position(freq)
}

/// Vertical pixel position of a gain value on the -24..+24 dB grid
pub fn gain_to_y(gain_db: f32, area: Rect) -> f32 {
    let proportion = (gain_db - GAIN_MIN_DB) / (GAIN_MAX_DB - GAIN_MIN_DB);
    area.bottom() - proportion * area.height
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyLine {
    pub x: f32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GainLine {
    pub y: f32,
    pub gain_db: f32,
    /// Drawn at the right edge
    pub label: String,
    /// Drawn at the left edge, the same line read 24 dB lower
    pub offset_label: String,
}

/// Grid lines and their labels for the RMS view
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisGrid {
    pub frequency_lines: Vec<FrequencyLine>,
    pub gain_lines: Vec<GainLine>,
}

impl AxisGrid {
    pub fn new(bounds: Rect) -> Self {
        let area = analysis_area(bounds, VisualizationMode::Rms);

        let frequency_lines = FREQUENCY_MARKERS
            .iter()
            .map(|&freq| FrequencyLine {
                x: frequency_to_x(freq, area),
                label: frequency_label(freq),
            })
            .collect();

        let gain_lines = GAIN_MARKERS
            .iter()
            .map(|&gain_db| GainLine {
                y: gain_to_y(gain_db, area),
                gain_db,
                label: gain_label(gain_db),
                offset_label: format!("{}", gain_db - 24.0),
            })
            .collect();

        Self {
            frequency_lines,
            gain_lines,
        }
    }
}

/// "20Hz", "500Hz", "1kHz", "20kHz"
pub fn frequency_label(freq: f32) -> String {
    if freq > 999.0 {
        format!("{}kHz", freq / 1000.0)
    } else {
        format!("{}Hz", freq)
    }
}

/// "-12", "0", "+12"
pub fn gain_label(gain_db: f32) -> String {
    if gain_db > 0.0 {
        format!("+{}", gain_db)
    } else {
        format!("{}", gain_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 600.0,
        height: 300.0,
    };

    #[test]
    fn rms_areas_leave_room_for_labels() {
        let render = render_area(BOUNDS, VisualizationMode::Rms);
        assert_eq!(render, Rect::new(20.0, 15.0, 560.0, 285.0));

        let analysis = analysis_area(BOUNDS, VisualizationMode::Rms);
        assert_eq!(analysis, Rect::new(20.0, 15.0, 560.0, 283.0));
    }

    #[test]
    fn spectrogram_areas_grow_at_the_bottom() {
        let render = render_area(BOUNDS, VisualizationMode::Spectrogram);
        assert_eq!(render, Rect::new(0.0, 0.0, 569.0, 303.0));

        let analysis = analysis_area(BOUNDS, VisualizationMode::Spectrogram);
        assert_eq!(analysis, Rect::new(0.0, 4.0, 569.0, 295.0));
    }

    #[test]
    fn tiny_bounds_never_go_negative() {
        let area = analysis_area(Rect::new(0.0, 0.0, 10.0, 5.0), VisualizationMode::Rms);
        assert_eq!(area.width, 0.0);
        assert_eq!(area.height, 0.0);
        assert!(area.is_empty());
    }

    #[test]
    fn frequency_lines_are_ordered_left_to_right() {
        let grid = AxisGrid::new(BOUNDS);
        let area = analysis_area(BOUNDS, VisualizationMode::Rms);

        assert_eq!(grid.frequency_lines.len(), FREQUENCY_MARKERS.len());
        assert!(grid
            .frequency_lines
            .windows(2)
            .all(|pair| pair[0].x < pair[1].x));
        assert!((grid.frequency_lines[0].x - area.x).abs() < 1e-3);
        assert!((grid.frequency_lines[9].x - area.right()).abs() < 1e-3);
    }

    #[test]
    fn labels_match_the_axis_style() {
        let grid = AxisGrid::new(BOUNDS);
        let labels: Vec<&str> = grid
            .frequency_lines
            .iter()
            .map(|line| line.label.as_str())
            .collect();
        assert_eq!(
            labels,
            ["20Hz", "50Hz", "100Hz", "200Hz", "500Hz", "1kHz", "2kHz", "5kHz", "10kHz", "20kHz"]
        );

        let zero = &grid.gain_lines[2];
        assert_eq!(zero.label, "0");
        assert_eq!(zero.offset_label, "-24");
        assert_eq!(grid.gain_lines[4].label, "+24");
        assert_eq!(grid.gain_lines[0].offset_label, "-48");
    }

    #[test]
    fn gain_lines_run_bottom_to_top() {
        let area = analysis_area(BOUNDS, VisualizationMode::Rms);
        assert_eq!(gain_to_y(-24.0, area), area.bottom());
        assert_eq!(gain_to_y(24.0, area), area.y);
        assert_eq!(gain_to_y(0.0, area), area.y + area.height / 2.0);
    }
}
