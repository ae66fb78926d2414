//! JSON and CSV encoders for shares reports
//!
//! CSV follows RFC 4180 quoting. Columns are the first record's keys in
//! order, followed by any key first seen in a later record; a record lacking
//! a column gets an empty cell.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ExError, ExErrorKind, Result, ShareListError};
use crate::model::FormattedRecord;

/// Output encoding of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

impl ReportFormat {
    /// `csv` selects CSV; anything else, including nothing, is JSON
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("csv") => ReportFormat::Csv,
            _ => ReportFormat::Json,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

/// Encode records in the requested format
///
/// # Errors
///
/// `Serialization` if a record cannot be encoded.
pub fn serialize(records: &[FormattedRecord], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => to_json(records),
        ReportFormat::Csv => {
            let rows = records
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<Value>, _>>()?;
            rows_to_csv(&rows)
        }
    }
}

/// Pretty-printed JSON (four-space indent), non-ASCII left unescaped
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| {
        ShareListError::Serialization {
            message: e.to_string(),
        }
        .into()
    })
}

/// CSV over arbitrary JSON objects
///
/// # Errors
///
/// `Serialization` if a row is not a JSON object.
pub fn rows_to_csv(rows: &[Value]) -> Result<String> {
    let objects = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            row.as_object().ok_or_else(|| {
                ExError::new(ExErrorKind::Serialization)
                    .with_op("rows_to_csv")
                    .with_message(format!("row {} is not an object", index))
            })
        })
        .collect::<Result<Vec<&Map<String, Value>>>>()?;

    let header = columns(&objects);
    if header.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().map(|c| escape_csv_field(c)));
    for object in &objects {
        push_line(
            &mut out,
            header
                .iter()
                .map(|column| escape_csv_field(&render_cell(object.get(*column)))),
        );
    }
    Ok(out)
}

fn columns<'r>(objects: &[&'r Map<String, Value>]) -> Vec<&'r str> {
    let mut header: Vec<&str> = Vec::new();
    for object in objects {
        for key in object.keys() {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }
    header
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>) {
    let cells: Vec<String> = cells.collect();
    out.push_str(&cells.join(","));
    out.push('\n');
}

/// Text of one CSV cell; absent and null are empty, nested values are compact JSON
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        // `true`/`false`, not the `1`/empty some CSV encoders emit
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => nested.to_string(),
    }
}

/// Escapes a field for CSV according to RFC 4180.
///
/// Fields containing commas, double quotes, or line breaks are quoted and
/// inner double quotes doubled.
fn escape_csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Decode CSV produced by [`rows_to_csv`] into header-keyed string rows
///
/// # Errors
///
/// `InvalidReport` on an unterminated quoted field or a row wider than the header.
pub fn decode_csv(text: &str) -> Result<Vec<Map<String, Value>>> {
    let mut lines = parse_csv(text)?.into_iter();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };

    lines
        .enumerate()
        .map(|(index, cells)| {
            if cells.len() > header.len() {
                return Err(ShareListError::InvalidReport {
                    reason: format!("CSV row {} has more cells than the header", index + 1),
                }
                .into());
            }
            let mut row = Map::new();
            let padded = cells.into_iter().chain(std::iter::repeat(String::new()));
            for (column, cell) in header.iter().zip(padded) {
                row.insert(column.clone(), Value::String(cell));
            }
            Ok(row)
        })
        .collect()
}

fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ShareListError::InvalidReport {
            reason: "unterminated quoted CSV field".to_string(),
        }
        .into());
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_parsing_defaults_to_json() {
        assert_eq!(ReportFormat::parse(Some("csv")), ReportFormat::Csv);
        assert_eq!(ReportFormat::parse(Some("xml")), ReportFormat::Json);
        assert_eq!(ReportFormat::parse(None), ReportFormat::Json);
        assert_eq!(ReportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_json_keeps_non_ascii_and_uses_four_space_indent() {
        let text = to_json(&json!([{"name": "Überblick – 報告"}])).unwrap();
        assert!(text.contains("Überblick – 報告"));
        assert!(text.contains("\n        \"name\""));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(serialize(&[], ReportFormat::Json).unwrap(), "[]");
        assert_eq!(serialize(&[], ReportFormat::Csv).unwrap(), "");
    }

    #[test]
    fn test_csv_pads_missing_and_appends_late_columns() {
        let rows = vec![
            json!({"id": "1", "path": "/a", "type": "link"}),
            json!({"id": "2", "type": "user", "recipient": "bob"}),
        ];
        let csv = rows_to_csv(&rows).unwrap();
        assert_eq!(csv, "id,path,type,recipient\n1,/a,link,\n2,,user,bob\n");
    }

    #[test]
    fn test_csv_quotes_special_characters() {
        let rows = vec![json!({"name": "a, \"b\"\nc", "n": 3, "dir": true, "none": null})];
        let csv = rows_to_csv(&rows).unwrap();
        assert_eq!(csv, "name,n,dir,none\n\"a, \"\"b\"\"\nc\",3,true,\n");
        let decoded = decode_csv(&csv).unwrap();
        assert_eq!(decoded[0]["name"], json!("a, \"b\"\nc"));
        assert_eq!(decoded[0]["none"], json!(""));
    }

    #[test]
    fn test_rows_must_be_objects() {
        let err = rows_to_csv(&[json!([1, 2])]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
    }

    #[test]
    fn test_decode_rejects_unterminated_quote() {
        let err = decode_csv("a,b\n\"x,y\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidReport);
    }
}
