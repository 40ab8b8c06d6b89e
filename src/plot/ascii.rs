//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Axes are logarithmic: `ln(bac)` horizontally, `ln(loss)` vertically, so
//! every fitted Steinmetz curve is a straight line.
//!
//! Plot elements:
//! - measured points: `o`
//! - fitted curve for each distinct frequency: `-` line over that frequency's bac range

use crate::domain::{PredictedPoint, SteinmetzModel};
use crate::models::predict_log;

/// Render a log-log plot of measured points and fitted per-frequency lines.
pub fn render_ascii_plot(
    points: &[PredictedPoint],
    model: &SteinmetzModel,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let curves = fitted_curves(points, model, width);

    let (x_min, x_max) = x_range(points).unwrap_or((-1.0, 0.0));
    let (y_min_raw, y_max_raw) = y_range(points, &curves).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min_raw, y_max_raw, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so points can overlay).
    for curve in &curves {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }

    for p in points {
        let x = map_x(p.measurement.bac.ln(), x_min, x_max, width);
        let y = map_y(p.measurement.coreloss.ln(), y_min, y_max, height);
        grid[y][x] = 'o';
    }

    // Build final string. We include a small header with (unpadded) ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: bac=[{:.4}, {:.4}] | loss=[{:.4}, {:.4}] (log-log)\n",
        x_min.exp(),
        x_max.exp(),
        y_min_raw.exp(),
        y_max_raw.exp()
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// One `(ln bac, ln loss)` polyline per distinct frequency, ascending by frequency.
fn fitted_curves(points: &[PredictedPoint], model: &SteinmetzModel, samples: usize) -> Vec<Vec<(f64, f64)>> {
    let mut freqs: Vec<f64> = points.iter().map(|p| p.measurement.fs).collect();
    freqs.sort_by(f64::total_cmp);
    freqs.dedup();

    freqs
        .into_iter()
        .filter_map(|fs| {
            let (lo, hi) = points
                .iter()
                .filter(|p| p.measurement.fs == fs)
                .map(|p| p.measurement.bac.ln())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
            if !(lo.is_finite() && hi.is_finite()) {
                return None;
            }

            let n = if hi > lo { samples.max(2) } else { 1 };
            let curve = (0..n)
                .map(|i| {
                    let u = if n == 1 { 0.0 } else { i as f64 / (n as f64 - 1.0) };
                    let lx = lo + u * (hi - lo);
                    (lx, predict_log(model, lx.exp(), fs))
                })
                .collect();
            Some(curve)
        })
        .collect()
}

fn x_range(points: &[PredictedPoint]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for p in points {
        let x = p.measurement.bac.ln();
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if !(min_x.is_finite() && max_x.is_finite()) {
        return None;
    }
    if max_x > min_x {
        Some((min_x, max_x))
    } else {
        Some((min_x - 0.5, max_x + 0.5))
    }
}

fn y_range(points: &[PredictedPoint], curves: &[Vec<(f64, f64)>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in points {
        let y = p.measurement.coreloss.ln();
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    for &(_, y) in curves.iter().flatten() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, '-');
        } else {
            grid[yy][xx] = '-';
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
