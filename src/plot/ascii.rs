//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks before rendering the GIF
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - weekly values: `o`
//! - connecting line: `-`

use chrono::{Datelike, NaiveDate};

/// Render dated values as a character grid with a one-line header.
pub fn render_ascii_plot(points: &[(NaiveDate, f64)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((first, last)) = points.first().zip(points.last()) else {
        return "Plot: (no points)\n".to_string();
    };

    let x_min = day_number(first.0);
    let x_max = day_number(last.0);
    let (y_min, y_max) = y_range(points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let cells: Vec<(usize, usize)> = points
        .iter()
        .map(|&(date, y)| {
            (
                map_x(day_number(date), x_min, x_max, width),
                map_y(y, y_min, y_max, height),
            )
        })
        .collect();

    // Line first so the markers overlay it.
    for pair in cells.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: weeks=[{}, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        first.0, last.0
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn y_range(points: &[(NaiveDate, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() && max_y.is_finite() {
        // Flat series: center it.
        Some((min_y - 0.5, max_y + 0.5))
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
    if x_max <= x_min {
        return 0;
    }
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
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

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let points = vec![(d(2020, 3, 9), 0.0), (d(2020, 3, 16), 10.0), (d(2020, 3, 23), 10.0)];

        let txt = render_ascii_plot(&points, 10, 5);
        let expected = concat!(
            "Plot: weeks=[2020-03-09, 2020-03-23] | y=[-0.50, 10.50]\n",
            "     o---o\n",
            "    -     \n",
            "  --      \n",
            " -        \n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_and_single_point_plots() {
        assert_eq!(render_ascii_plot(&[], 10, 5), "Plot: (no points)\n");

        let txt = render_ascii_plot(&[(d(2020, 3, 9), 4.0)], 10, 5);
        let rows: Vec<&str> = txt.lines().collect();
        assert_eq!(rows[0], "Plot: weeks=[2020-03-09, 2020-03-09] | y=[3.45, 4.55]");
        assert_eq!(rows[3], "o         ");
    }
}
