//! Flattened rating table
//!
//! The chart works on one row per episode rather than on nested seasons. This
//! module does the flattening and the statistics drawn on top of it.

use crate::model::Season;
use std::collections::HashMap;

/// One episode in the flattened table
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    /// Season the episode belongs to
    pub season: u32,
    /// Episode title, suffixed with ` (S<n>)` when the title occurs more than once
    pub title: String,
    /// Episode rating
    pub rating: f64,
}

/// Flattens seasons into rows, in season then episode order.
///
/// Titles that occur more than once anywhere in the series (think "Pilot" in
/// a reboot season, or "Untitled") get their season appended, so every row
/// stays distinguishable on the chart axis.
pub fn flatten(seasons: &[Season]) -> Vec<RatingRow> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for episode in seasons.iter().flat_map(|s| &s.episodes) {
        *occurrences.entry(episode.title.as_str()).or_default() += 1;
    }

    seasons
        .iter()
        .flat_map(|season| {
            let occurrences = &occurrences;
            season.episodes.iter().map(move |episode| {
                let title = if occurrences.get(episode.title.as_str()).copied().unwrap_or(0) > 1 {
                    format!("{} (S{})", episode.title, season.season)
                } else {
                    episode.title.clone()
                };

                RatingRow {
                    season: season.season,
                    title,
                    rating: episode.rating,
                }
            })
        })
        .collect()
}

/// Arithmetic mean of all ratings, `None` for an empty table
pub fn mean_rating(rows: &[RatingRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(|row| row.rating).sum::<f64>() / rows.len() as f64)
}

/// Least-squares polynomial trend over the rows, evaluated at every row.
///
/// Rows are placed at evenly spaced positions in table order. The degree is
/// lowered to `rows - 1` when there are too few rows for the requested one.
/// Returns `None` for an empty table or a degenerate system.
pub fn trend_line(rows: &[RatingRow], degree: usize) -> Option<Vec<f64>> {
    let ys: Vec<f64> = rows.iter().map(|row| row.rating).collect();
    let xs = positions(ys.len());
    let polynomial = Polynomial::fit(&xs, &ys, degree)?;

    Some(xs.iter().map(|&x| polynomial.evaluate(x)).collect())
}

/// Row positions scaled to 0.0..=1.0, which keeps the normal equations well conditioned
fn positions(count: usize) -> Vec<f64> {
    let span = count.saturating_sub(1).max(1) as f64;
    (0..count).map(|i| i as f64 / span).collect()
}

/// Polynomial with coefficients in ascending order of power
#[derive(Debug, Clone, PartialEq)]
struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Fits a polynomial of at most `degree` through the points (least squares)
    fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }

        let size = degree.min(xs.len() - 1) + 1;

        // Normal equations: (X^T X) c = X^T y
        let mut power_sums = vec![0.0; 2 * size - 1];
        let mut rhs = vec![0.0; size];
        for (&x, &y) in xs.iter().zip(ys) {
            let mut power = 1.0;
            for (k, sum) in power_sums.iter_mut().enumerate() {
                *sum += power;
                if k < size {
                    rhs[k] += power * y;
                }
                power *= x;
            }
        }

        let mut matrix: Vec<Vec<f64>> = (0..size)
            .map(|row| power_sums[row..row + size].to_vec())
            .collect();

        let coefficients = solve(&mut matrix, &mut rhs)?;
        Some(Self { coefficients })
    }

    fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }
}

/// Gaussian elimination with partial pivoting
fn solve(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Option<Vec<f64>> {
    const EPSILON: f64 = 1e-12;
    let n = rhs.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col].abs() < EPSILON {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                let delta = factor * matrix[col][k];
                matrix[row][k] -= delta;
            }
            let delta = factor * rhs[col];
            rhs[row] -= delta;
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Some(solution)
}
