use serde::{Deserialize, Serialize};

/// Marker used for an element that is absent from the page.
pub const NOT_AVAILABLE: &str = "N/A";

/// Selectable extraction fields. The URL is deliberately not listed here:
/// it is always the first column of any result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoField {
    H1,
    H2,
    MetaTitle,
    MetaTitleLength,
    MetaDescription,
    MetaDescriptionLength,
    Canonical,
    MetaRobots,
}

impl SeoField {
    pub const ALL: [SeoField; 8] = [
        SeoField::H1,
        SeoField::H2,
        SeoField::MetaTitle,
        SeoField::MetaTitleLength,
        SeoField::MetaDescription,
        SeoField::MetaDescriptionLength,
        SeoField::Canonical,
        SeoField::MetaRobots,
    ];

    /// Human-readable column header.
    pub fn label(self) -> &'static str {
        match self {
            SeoField::H1 => "H1",
            SeoField::H2 => "H2",
            SeoField::MetaTitle => "Meta title",
            SeoField::MetaTitleLength => "Meta title length",
            SeoField::MetaDescription => "Meta description",
            SeoField::MetaDescriptionLength => "Meta description length",
            SeoField::Canonical => "Canonical",
            SeoField::MetaRobots => "Meta robots",
        }
    }
}

/// Attributes pulled out of one successfully fetched page.
/// Lengths are character counts, not byte counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoAttributes {
    pub h1: String,
    pub h2: String,
    pub meta_title: String,
    pub meta_title_length: usize,
    pub meta_description: String,
    pub meta_description_length: usize,
    pub canonical: String,
    pub meta_robots: String,
}

impl SeoAttributes {
    pub fn value(&self, field: SeoField) -> FieldValue {
        match field {
            SeoField::H1 => FieldValue::Text(self.h1.clone()),
            SeoField::H2 => FieldValue::Text(self.h2.clone()),
            SeoField::MetaTitle => FieldValue::Text(self.meta_title.clone()),
            SeoField::MetaTitleLength => FieldValue::Count(self.meta_title_length),
            SeoField::MetaDescription => FieldValue::Text(self.meta_description.clone()),
            SeoField::MetaDescriptionLength => {
                FieldValue::Count(self.meta_description_length)
            }
            SeoField::Canonical => FieldValue::Text(self.canonical.clone()),
            SeoField::MetaRobots => FieldValue::Text(self.meta_robots.clone()),
        }
    }
}

/// Which stage of the pipeline failed for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network-layer failure: timeout, connection error, non-2xx status.
    Request,
    /// The response arrived but could not be analyzed as an HTML page.
    Analysis,
}

impl FailureKind {
    pub fn marker(self) -> &'static str {
        match self {
            FailureKind::Request => "Request Error",
            FailureKind::Analysis => "Analysis Error",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageOutcome {
    Extracted(SeoAttributes),
    Failed(FailureKind),
}

/// One row of results for one input URL. Produced for every input line,
/// whether or not the fetch succeeded.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub url: String,
    pub outcome: PageOutcome,
}

impl PageReport {
    /// Value for any field, regardless of outcome. Failed pages yield the
    /// failure marker in every field, so the key set never varies.
    pub fn value(&self, field: SeoField) -> FieldValue {
        match &self.outcome {
            PageOutcome::Extracted(attrs) => attrs.value(field),
            PageOutcome::Failed(kind) => FieldValue::Text(kind.marker().to_string()),
        }
    }
}

/// A single cell: either text or a character count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Count(usize),
}

/// Column headers plus one row per input URL, in input order.
#[derive(Debug, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Free-text block, one URL per line.
    pub urls: String,
    #[serde(default)]
    pub fields: Vec<SeoField>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub analyzed: usize,
    pub table: ResultTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_serializes_untagged() {
        let text = serde_json::to_value(FieldValue::Text("Example".into())).unwrap();
        assert_eq!(text, serde_json::json!("Example"));
        let count = serde_json::to_value(FieldValue::Count(14)).unwrap();
        assert_eq!(count, serde_json::json!(14));
    }

    #[test]
    fn field_names_round_trip() {
        for field in SeoField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            let back: SeoField = serde_json::from_str(&json).unwrap();
            assert_eq!(back, field);
        }
        let parsed: SeoField = serde_json::from_str("\"meta_title_length\"").unwrap();
        assert_eq!(parsed, SeoField::MetaTitleLength);
    }

    #[test]
    fn failed_report_yields_marker_for_every_field() {
        let report = PageReport {
            url: "badhost.invalid".into(),
            outcome: PageOutcome::Failed(FailureKind::Request),
        };
        for field in SeoField::ALL {
            assert_eq!(
                report.value(field),
                FieldValue::Text("Request Error".into())
            );
        }
    }
}
