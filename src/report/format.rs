//! Formatted terminal output for fit runs.

use crate::domain::{FitResult, PredictedPoint, TYPICAL_EXPONENT_RANGE};
use crate::io::ingest::IngestedData;
use crate::report::Rankings;

/// Format the full run summary (dataset stats + coefficients + diagnostics).
pub fn format_run_summary(ingest: &IngestedData, fit: &FitResult) -> String {
    let mut out = String::new();
    let stats = &ingest.stats;

    out.push_str("=== corefit - Steinmetz Core-Loss Fit ===\n");
    out.push_str(&format!("Source: {}\n", ingest.source));
    out.push_str("Model: coreloss = k * bac^a * fs^b\n");
    out.push_str(&format!(
        "Points: n={} (rows read={}, skipped={})\n",
        stats.n_points,
        ingest.rows_read,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Ranges: bac=[{:.3}, {:.3}] | fs=[{}, {}] ({} freq) | loss=[{:.2}, {:.2}]\n",
        stats.bac_min,
        stats.bac_max,
        stats.fs_min,
        stats.fs_max,
        stats.distinct_frequencies,
        stats.coreloss_min,
        stats.coreloss_max
    ));

    out.push_str(&format_fit(fit));
    out
}

/// Coefficients and goodness-of-fit block.
pub fn format_fit(fit: &FitResult) -> String {
    let mut out = String::new();
    let model = &fit.model;
    let q = &fit.quality;
    let (lo, hi) = TYPICAL_EXPONENT_RANGE;
    let warn = |flag: bool| {
        if flag {
            format!("  ! outside typical ferrite range [{lo}, {hi}]")
        } else {
            String::new()
        }
    };

    out.push_str("\nModel parameters:\n");
    out.push_str(&format!("  k = {}\n", format_significant(model.k, 5)));
    out.push_str(&format!("  a = {:.4}{}\n", model.a, warn(model.a_out_of_range())));
    out.push_str(&format!("  b = {:.4}{}\n", model.b, warn(model.b_out_of_range())));

    out.push_str("\nGoodness of fit (RMSE/MAE on ln(loss) scale):\n");
    out.push_str(&format!("  R²          = {:.5}\n", q.r_squared));
    match q.adjusted_r_squared {
        Some(v) => out.push_str(&format!("  Adjusted R² = {v:.5}\n")),
        None => out.push_str(&format!("  Adjusted R² = n/a (n = {})\n", q.n)),
    }
    out.push_str(&format!("  RMSE        = {:.5}\n", q.rmse));
    out.push_str(&format!("  MAE         = {:.5}\n", q.mae));

    out
}

/// List skipped input rows.
pub fn format_row_errors(ingest: &IngestedData) -> String {
    let mut out = String::new();
    if ingest.row_errors.is_empty() {
        return out;
    }
    out.push_str(&format!("Skipped {} row(s):\n", ingest.row_errors.len()));
    for err in &ingest.row_errors {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    out
}

/// Format the under/over-predicted tables.
pub fn format_rankings(rankings: &Rankings) -> String {
    let mut out = String::new();

    out.push_str("Most under-predicted (measured above fit):\n");
    out.push_str(&format_table(&rankings.under_predicted));
    out.push('\n');

    out.push_str("Most over-predicted (measured below fit):\n");
    out.push_str(&format_table(&rankings.over_predicted));

    out
}

fn format_table(rows: &[PredictedPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>12} {:>10} {:>10} {:>12} {:>10}\n",
        "coreloss", "bac", "fs", "fitted", "ln_resid"
    ));
    out.push_str(&format!(
        "{:-<12} {:-<10} {:-<10} {:-<12} {:-<10}\n",
        "", "", "", "", ""
    ));

    for r in rows {
        let m = &r.measurement;
        out.push_str(&format!(
            "{:>12.4} {:>10.4} {:>10} {:>12.4} {:>10.5}\n",
            m.coreloss, m.bac, m.fs, r.predicted_coreloss, r.log_residual
        ));
    }

    out
}

/// Format with `sig` significant digits, without scientific notation.
pub fn format_significant(value: f64, sig: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let digits = value.abs().log10().floor() as i32 + 1;
    let decimals = sig as i32 - digits;
    if decimals >= 0 {
        format!("{value:.prec$}", prec = decimals as usize)
    } else {
        let scale = 10f64.powi(-decimals);
        format!("{:.0}", (value / scale).round() * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetStats, FitQuality, Measurement, SteinmetzModel};
    use crate::io::ingest::RowError;

    fn sample_fit(adjusted: Option<f64>) -> FitResult {
        FitResult {
            model: SteinmetzModel { k: 0.012345678, a: 2.5, b: 0.75 },
            quality: FitQuality {
                r_squared: 0.987654,
                adjusted_r_squared: adjusted,
                rmse: 0.0123,
                mae: 0.01,
                n: 3,
            },
        }
    }

    fn sample_ingest() -> IngestedData {
        let points = vec![
            Measurement::new(5.0, 0.02, 500.0),
            Measurement::new(18.0, 0.03, 500.0),
            Measurement::new(9.0, 0.02, 800.0),
        ];
        IngestedData {
            source: "data.csv".to_string(),
            stats: DatasetStats::from_measurements(&points).unwrap(),
            points,
            row_errors: vec![RowError { line: 3, message: "Invalid `bac` value '0'".to_string() }],
            rows_read: 4,
            rows_used: 3,
        }
    }

    #[test]
    fn significant_digits() {
        assert_eq!(format_significant(0.0123456, 5), "0.012346");
        assert_eq!(format_significant(1.5, 5), "1.5000");
        assert_eq!(format_significant(123456.7, 3), "123000");
        assert_eq!(format_significant(100.0, 5), "100.00");
        assert_eq!(format_significant(0.0, 5), "0");
    }

    #[test]
    fn summary_flags_exponents_and_undefined_adjusted() {
        let txt = format_run_summary(&sample_ingest(), &sample_fit(None));
        assert!(txt.contains("Source: data.csv"));
        assert!(txt.contains("Points: n=3 (rows read=4, skipped=1)"));
        assert!(txt.contains("fs=[500, 800] (2 freq)"));
        assert!(txt.contains("  k = 0.012346\n"));
        assert!(txt.contains("  a = 2.5000\n"));
        assert!(txt.contains("  b = 0.7500  ! outside typical ferrite range [1.1, 3.9]\n"));
        assert!(txt.contains("R²          = 0.98765"));
        assert!(txt.contains("Adjusted R² = n/a (n = 3)"));
    }

    #[test]
    fn adjusted_is_printed_when_defined() {
        let txt = format_fit(&sample_fit(Some(0.5)));
        assert!(txt.contains("Adjusted R² = 0.50000"));
    }

    #[test]
    fn row_errors_listed() {
        let txt = format_row_errors(&sample_ingest());
        assert_eq!(txt, "Skipped 1 row(s):\n  line 3: Invalid `bac` value '0'\n");
    }
}
