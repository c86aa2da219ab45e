//! Plain-text exploratory summary of a cleaned dataset.

use textlens_core::Record;

const SAMPLE_COUNT: usize = 5;
const SAMPLE_CHARS: usize = 160;

/// Row count, length statistics and the first few samples.
///
/// Lengths are measured in characters.
pub fn eda_summary(records: &[Record]) -> String {
    let mut lengths: Vec<f64> = records
        .iter()
        .map(|r| r.text.chars().count() as f64)
        .collect();
    lengths.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = if lengths.is_empty() {
        f64::NAN
    } else {
        lengths.iter().sum::<f64>() / lengths.len() as f64
    };
    let nulls = records.iter().filter(|r| r.text.is_empty()).count();

    let mut lines = vec![
        format!("Rows: {}", records.len()),
        format!("Avg length: {:.1}", mean),
        format!("Median length: {:.1}", quantile(&lengths, 0.5)),
        format!("95th pct length: {:.1}", quantile(&lengths, 0.95)),
        format!("Nulls in text col: {}", nulls),
        "Top 5 samples:".to_string(),
    ];

    for (i, record) in records.iter().take(SAMPLE_COUNT).enumerate() {
        let sample: String = record
            .text
            .replace('\n', " ")
            .chars()
            .take(SAMPLE_CHARS)
            .collect();
        let suffix = if sample.chars().count() == SAMPLE_CHARS {
            "..."
        } else {
            ""
        };
        lines.push(format!("{}. {}{}", i + 1, sample, suffix));
    }
    lines.join("\n")
}

/// Linear-interpolated quantile of sorted values; NaN when empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}
