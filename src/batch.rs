use crate::extract;
use crate::models::{FieldValue, PageReport, ResultTable, SeoField};

/// Split a free-text block into URL lines: trimmed, blanks dropped.
pub fn parse_url_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

/// Run the extractor over every URL, strictly sequentially, one request in
/// flight at a time. `progress` is called with `(completed, total)` after
/// each URL. A failed URL produces a failure report and the batch goes on.
pub async fn run_batch<F>(
    client: &reqwest::Client,
    urls: &[String],
    mut progress: F,
) -> Vec<PageReport>
where
    F: FnMut(usize, usize),
{
    let total = urls.len();
    let mut reports = Vec::with_capacity(total);
    for (i, url) in urls.iter().enumerate() {
        reports.push(extract::extract(client, url).await);
        progress(i + 1, total);
    }
    reports
}

/// Project reports onto `URL` plus the selected fields, in selection order.
pub fn build_table(reports: &[PageReport], fields: &[SeoField]) -> ResultTable {
    let mut columns = Vec::with_capacity(fields.len() + 1);
    columns.push("URL".to_string());
    columns.extend(fields.iter().map(|f| f.label().to_string()));

    let rows = reports
        .iter()
        .map(|report| {
            let mut row = Vec::with_capacity(fields.len() + 1);
            row.push(FieldValue::Text(report.url.clone()));
            row.extend(fields.iter().map(|&f| report.value(f)));
            row
        })
        .collect();

    ResultTable { columns, rows }
}
