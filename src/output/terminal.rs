//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::PermutationResult;
use crate::types::LabeledMatrix;

/// Format a PermutationResult for human-readable terminal output.
///
/// Prints the run summary, then the observed statistic and p-value tables.
/// Cells with `p < alpha` are highlighted and listed at the end.
pub fn format_result(result: &PermutationResult, alpha: f64) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let meta = &result.metadata;

    output.push_str("popconn\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  Statistic:    {}\n", meta.statistic.bold()));
    output.push_str(&format!("  Correlation:  {}\n", meta.method));
    output.push_str(&format!(
        "  Groups:       {} (n={}) vs {} (n={})\n",
        meta.groups[0], meta.group_sizes[0], meta.groups[1], meta.group_sizes[1]
    ));
    output.push_str(&format!(
        "  Permutations: {} (seed {})\n",
        meta.n_permutations, meta.seed
    ));
    output.push('\n');

    output.push_str("  Observed:\n");
    output.push_str(&format_matrix(&result.observed, |_, _, v| format!("{v:>10.4}")));
    output.push('\n');

    output.push_str("  p-values:\n");
    output.push_str(&format_matrix(&result.p_values, |i, j, p| {
        if result.observed.values()[(i, j)].is_nan() {
            return format!("{:>10}", "undefined").dimmed().to_string();
        }
        let cell = format!("{p:>10.4}");
        if p < alpha {
            cell.red().bold().to_string()
        } else {
            cell
        }
    }));
    output.push('\n');

    let significant = result.significant(alpha);
    if significant.is_empty() {
        output.push_str(&format!(
            "  {}\n",
            format!("\u{2713} No cells significant at alpha = {alpha}").green().bold()
        ));
    } else {
        output.push_str(&format!(
            "  {}\n",
            format!("\u{26A0} {} cell(s) significant at alpha = {alpha}", significant.len())
                .yellow()
                .bold()
        ));
        for cell in &significant {
            output.push_str(&format!(
                "    {} / {}: observed {:.4}, p = {:.4}\n",
                cell.row, cell.col, cell.observed, cell.p_value
            ));
        }
    }
    output.push('\n');

    output.push_str(&sep);
    output.push('\n');
    if result.observed.has_nan() {
        output.push_str("Note: undefined cells come from constant regions and are never significant.\n");
    }
    output.push_str(&format!(
        "Note: p-values are two-sided; resolution is 1/{}. Runtime {:.2}s.\n",
        meta.n_permutations, meta.runtime_secs
    ));

    output
}

/// Render a labeled matrix as an aligned table, one line per row.
fn format_matrix(m: &LabeledMatrix, cell: impl Fn(usize, usize, f64) -> String) -> String {
    let width = m.row_labels().iter().map(String::len).max().unwrap_or(0).max(4);
    let mut out = format!("    {:width$}", "");
    for col in m.col_labels() {
        out.push_str(&format!("{col:>10}"));
    }
    out.push('\n');

    for (i, row) in m.row_labels().iter().enumerate() {
        out.push_str(&format!("    {row:width$}"));
        for j in 0..m.shape().1 {
            out.push_str(&cell(i, j, m.values()[(i, j)]));
        }
        out.push('\n');
    }
    out
}
