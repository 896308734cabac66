//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimator stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::Dataset;
use crate::domain::{NoticeLevel, SurvivalCurve};
use crate::io::ingest::{RawTable, RowError};

/// Row errors listed in the summary before collapsing into a count.
const MAX_ROW_ERRORS: usize = 5;

/// Format the run summary (provenance, notice, counts, median).
pub fn format_run_summary(dataset: &Dataset, curve: &SurvivalCurve) -> String {
    let mut out = String::new();

    out.push_str("=== km - Kaplan-Meier Survival Estimate ===\n");
    out.push_str(&format!("Source: {}\n", dataset.source));
    out.push_str(&format!(
        "Notice: [{}] {}\n",
        match dataset.notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
        },
        dataset.notice.message
    ));

    if let Some(ingest) = &dataset.ingest {
        out.push_str(&format!(
            "Rows: read={} | used={} | skipped={}\n",
            ingest.rows_read,
            ingest.rows_used,
            ingest.row_errors.len()
        ));
        out.push_str(&format_row_errors(&ingest.row_errors));
    }

    let (t_min, t_max) = dataset
        .observations
        .iter()
        .map(|o| o.duration)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)));
    out.push_str(&format!(
        "Observations: n={} | events={} | censored={} | follow-up=[{t_min:.3}, {t_max:.3}]\n",
        curve.n_observations, curve.n_events, curve.n_censored,
    ));

    match curve.median() {
        Some(m) => out.push_str(&format!("Median survival: {m:.3}\n")),
        None => out.push_str("Median survival: not reached\n"),
    }
    out.push('\n');

    out
}

fn format_row_errors(errors: &[RowError]) -> String {
    let mut out = String::new();
    for e in errors.iter().take(MAX_ROW_ERRORS) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if errors.len() > MAX_ROW_ERRORS {
        out.push_str(&format!("  ... {} more\n", errors.len() - MAX_ROW_ERRORS));
    }
    out
}

/// Format the product-limit table.
pub fn format_curve_table(curve: &SurvivalCurve) -> String {
    let mut out = String::new();
    out.push_str("Product-limit table:\n");

    if curve.points.is_empty() {
        out.push_str("(no events observed; survival stays at 1.0)\n");
        return out;
    }

    out.push_str(
        format!(
            "{:>10} {:>8} {:>7} {:>9} {:>9} {:>9} {:<17}",
            "time", "at_risk", "events", "censored", "survival", "std_err", "95% CI"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<10} {:-<8} {:-<7} {:-<9} {:-<9} {:-<9} {:-<17}\n",
        "", "", "", "", "", "", ""
    ));

    for p in &curve.points {
        out.push_str(
            format!(
                "{:>10.3} {:>8} {:>7} {:>9} {:>9.4} {:>9.4} [{:.4}, {:.4}]",
                p.time, p.at_risk, p.events, p.censored, p.survival, p.std_err, p.ci_lower, p.ci_upper,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format the first `n` raw rows of the uploaded table.
pub fn format_preview(table: &RawTable, n: usize) -> String {
    let mut out = String::new();
    out.push_str("Uploaded data preview:\n");

    let rows = table.preview(n);
    let cols = table
        .headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    if cols == 0 {
        out.push_str("(empty table)\n");
        return out;
    }

    let mut widths = vec![0usize; cols];
    for (i, h) in table.headers.iter().enumerate() {
        widths[i] = widths[i].max(h.chars().count());
    }
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(truncate(cell, 16).chars().count());
        }
    }

    let render = |cells: &[String]| -> String {
        let mut line = String::new();
        for (i, &w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(|c| truncate(c, 16)).unwrap_or_default();
            line.push_str(&format!("{cell:<w$} "));
        }
        line.trim_end().to_string()
    };

    out.push_str(&render(&table.headers));
    out.push('\n');
    for row in &rows {
        out.push_str(&render(row));
        out.push('\n');
    }
    if table.records.len() > rows.len() {
        out.push_str(&format!("... ({} rows total)\n", table.records.len()));
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
