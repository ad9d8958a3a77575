//! Terminal chart of episode ratings
//!
//! Draws one horizontal bar per episode, grouped by season, with optional
//! markers for the series mean and a polynomial trend.

use crate::table::{RatingRow, mean_rating, trend_line};

/// Upper end of the chart axis
const AXIS_MAX: f64 = 10.0;

/// Titles longer than this are cut
const MAX_TITLE_WIDTH: usize = 40;

const BAR: char = '█';
const MEAN_MARKER: char = '┆';
const TREND_MARKER: char = '●';

/// What to draw on top of the bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    /// Mark the mean rating of the whole series
    pub mean: bool,
    /// Mark a least-squares trend of the given polynomial degree
    pub trend_degree: Option<usize>,
    /// Width of the bar area in characters
    pub width: usize,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            mean: false,
            trend_degree: None,
            width: 50,
        }
    }
}

/// Renders the table as a text chart. An empty table renders a short notice.
pub fn render(rows: &[RatingRow], options: &PlotOptions) -> String {
    if rows.is_empty() {
        return "No rated episodes to plot.\n".to_string();
    }

    let width = options.width.max(2);
    let mean = if options.mean { mean_rating(rows) } else { None };
    let trend = options
        .trend_degree
        .and_then(|degree| trend_line(rows, degree));

    let axis = Axis::covering(
        rows.iter()
            .map(|row| row.rating)
            .chain(mean)
            .chain(trend.iter().flatten().copied()),
        width,
    );

    let title_width = rows
        .iter()
        .map(|row| row.title.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_TITLE_WIDTH);

    let mut out = String::new();
    let mut current_season = None;

    for (index, row) in rows.iter().enumerate() {
        if current_season != Some(row.season) {
            if current_season.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("Season {}\n", row.season));
            current_season = Some(row.season);
        }

        let mut cells = vec![' '; width];
        for cell in cells.iter_mut().take(axis.column(row.rating) + 1) {
            *cell = BAR;
        }
        if let Some(mean) = mean {
            cells[axis.column(mean)] = MEAN_MARKER;
        }
        if let Some(trend) = &trend {
            cells[axis.column(trend[index])] = TREND_MARKER;
        }

        out.push_str(&format!(
            "  {:<title_width$}  {:>4.1} |{}\n",
            truncate(&row.title, title_width),
            row.rating,
            cells.into_iter().collect::<String>().trim_end(),
            title_width = title_width,
        ));
    }

    let pad = title_width + 2 + 2 + 4 + 1;
    out.push_str(&format!(
        "{:pad$} {:<half$}{:>rest$}\n",
        "",
        format!("{:.1}", axis.min),
        format!("{:.1}", axis.max),
        pad = pad,
        half = width / 2,
        rest = width - width / 2,
    ));

    if let Some(mean) = mean {
        out.push_str(&format!("{} mean {:.2}\n", MEAN_MARKER, mean));
    }
    if let (Some(degree), Some(_)) = (options.trend_degree, &trend) {
        out.push_str(&format!("{} trend (degree {})\n", TREND_MARKER, degree));
    }

    out
}

/// Maps ratings to bar columns
#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    max: f64,
    width: usize,
}

impl Axis {
    /// Axis from the floor of the smallest value up to 10
    fn covering(values: impl Iterator<Item = f64>, width: usize) -> Self {
        let lowest = values.fold(AXIS_MAX, f64::min);
        let mut min = lowest.floor().clamp(0.0, AXIS_MAX);
        if min >= AXIS_MAX {
            min = AXIS_MAX - 1.0;
        }

        Self {
            min,
            max: AXIS_MAX,
            width,
        }
    }

    fn column(&self, value: f64) -> usize {
        let fraction = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        (fraction * (self.width - 1) as f64).round() as usize
    }
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut cut: String = title.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
