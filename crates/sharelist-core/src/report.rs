//! Report runs: naming, target checks, diff artifacts, recipient validation
//!
//! Persisting reports and mailing them are left to the embedding layer; this
//! module produces the immutable values those layers write out.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::{compute_diff, DiffResult};
use crate::errors::{ExError, ExErrorKind, Result, ShareListError};
use crate::model::{FormattedRecord, Permissions};
use crate::ports::{FileTree, UserDirectory};
use crate::serialize::{serialize, to_json, ReportFormat};

/// Infix between the timestamp prefix and the format extension
pub const REPORT_NAME: &str = " - Shares report.";
/// Name suffix of every JSON report, used to find the previous one
pub const JSON_REPORT_SUFFIX: &str = " - Shares report.json";
pub const DIFF_REPORT_SUFFIX: &str = " - Shares report diff.json";
/// `YYYYMMDDHHmm`
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";
const PREFIX_LEN: usize = 12;

/// Report names carry the UTC minute of the run, not the server's local time.
pub fn report_timestamp(at: &DateTime<Utc>) -> String {
    at.format(REPORT_TIMESTAMP_FORMAT).to_string()
}

/// `202403010930 - Shares report.json`
pub fn report_name(at: &DateTime<Utc>, format: ReportFormat) -> String {
    format!("{}{}{}", report_timestamp(at), REPORT_NAME, format.extension())
}

/// `<previous prefix> - <new prefix> - Shares report diff.json`
pub fn diff_report_name(previous_prefix: &str, new_prefix: &str) -> String {
    format!("{} - {}{}", previous_prefix, new_prefix, DIFF_REPORT_SUFFIX)
}

/// Timestamp prefix of a report file name, if it has one
pub fn report_prefix(name: &str) -> Option<&str> {
    let prefix = name.get(..PREFIX_LEN)?;
    prefix.bytes().all(|b| b.is_ascii_digit()).then_some(prefix)
}

/// Run time encoded in a report file name
pub fn parse_report_timestamp(name: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(report_prefix(name)?, REPORT_TIMESTAMP_FORMAT).ok()
}

/// One serialized report of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub name: String,
    pub format: ReportFormat,
    pub generated_at: DateTime<Utc>,
    pub body: String,
}

/// Serialize the same records once per format.
///
/// Formats sharing a file name are produced once.
///
/// # Errors
///
/// `Serialization` if encoding fails.
pub fn build_reports(
    records: &[FormattedRecord],
    formats: &[ReportFormat],
    at: DateTime<Utc>,
) -> Result<Vec<Report>> {
    let mut reports: Vec<Report> = Vec::with_capacity(formats.len());
    for &format in formats {
        let name = report_name(&at, format);
        if reports.iter().any(|r| r.name == name) {
            continue;
        }
        reports.push(Report {
            body: serialize(records, format)?,
            name,
            format,
            generated_at: at,
        });
    }
    Ok(reports)
}

/// A report previously written to a target folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub name: String,
    pub body: String,
}

impl From<&Report> for StoredReport {
    fn from(report: &Report) -> Self {
        Self {
            name: report.name.clone(),
            body: report.body.clone(),
        }
    }
}

/// Lookup of previously stored reports
pub trait ReportArchive {
    /// Most recent JSON report in `folder` of `user`'s tree
    fn latest_json_report(&self, user: &str, folder: &str) -> Result<Option<StoredReport>>;
}

/// What the report target path currently points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Folder,
    NotAFolder,
    /// Nothing there yet; the persistence layer creates the folder
    Missing,
}

/// Behaviour when the target exists but is not a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPolicy {
    #[default]
    Reject,
    /// Log a warning and keep using the existing entry
    Warn,
}

/// Inspect `path` in `user`'s tree
///
/// # Errors
///
/// Propagates failures to open the user's root folder.
pub fn target_status(tree: &dyn FileTree, user: &str, path: &str) -> Result<TargetStatus> {
    let root = tree.user_folder(user)?;
    Ok(match tree.resolve(&root, path)? {
        Some(node) if node.is_folder() => TargetStatus::Folder,
        Some(_) => TargetStatus::NotAFolder,
        None => TargetStatus::Missing,
    })
}

/// Apply `policy` to a target about to receive new reports
///
/// # Errors
///
/// `InvalidTarget` for a non-folder target under [`TargetPolicy::Reject`].
pub fn check_report_target(status: TargetStatus, policy: TargetPolicy, path: &str) -> Result<()> {
    match (status, policy) {
        (TargetStatus::NotAFolder, TargetPolicy::Reject) => Err(ShareListError::InvalidTarget {
            path: path.to_string(),
        }
        .into()),
        (TargetStatus::NotAFolder, TargetPolicy::Warn) => {
            tracing::warn!(path = %path, "target path is not a folder");
            Ok(())
        }
        _ => Ok(()),
    }
}

/// A folder holding previous reports must exist and be a folder
///
/// # Errors
///
/// `InvalidTarget` when the folder is missing or not a folder.
pub fn check_diff_target(status: TargetStatus, path: &str) -> Result<()> {
    let path = path.to_string();
    match status {
        TargetStatus::Folder => Ok(()),
        TargetStatus::NotAFolder => Err(ShareListError::InvalidTarget { path }.into()),
        TargetStatus::Missing => Err(ShareListError::MissingTarget { path }.into()),
    }
}

/// Diff between the previous stored report and the current run
#[derive(Debug, Clone, PartialEq)]
pub struct DiffArtifact {
    pub name: String,
    pub previous_report: String,
    pub diff: DiffResult,
    /// Pretty JSON of `diff`
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    Diffed(DiffArtifact),
    NoPreviousReport,
}

impl DiffOutcome {
    pub fn artifact(&self) -> Option<&DiffArtifact> {
        match self {
            DiffOutcome::Diffed(artifact) => Some(artifact),
            DiffOutcome::NoPreviousReport => None,
        }
    }
}

/// Diff `current` (a JSON report) against `previous`
///
/// # Errors
///
/// - `InvalidInput`: `current` is not a JSON report
/// - `InvalidReport` / `MissingField`: either body cannot be decoded
pub fn diff_against(previous: Option<&StoredReport>, current: &Report) -> Result<DiffOutcome> {
    if current.format != ReportFormat::Json {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("diff_against")
            .with_message(format!(
                "cannot diff {} report {}",
                current.format.extension(),
                current.name
            )));
    }
    let Some(previous) = previous else {
        return Ok(DiffOutcome::NoPreviousReport);
    };

    let diff = compute_diff(previous.body.as_bytes(), current.body.as_bytes())?;
    let previous_prefix = report_prefix(&previous.name).unwrap_or(&previous.name);
    let new_prefix = report_timestamp(&current.generated_at);
    Ok(DiffOutcome::Diffed(DiffArtifact {
        name: diff_report_name(previous_prefix, &new_prefix),
        previous_report: previous.name.clone(),
        body: to_json(&diff)?,
        diff,
    }))
}

/// Check every recipient and the target path before sending anything.
///
/// # Errors
///
/// `ValidationFailed` listing every problem found.
pub fn validate_recipients(
    directory: &dyn UserDirectory,
    recipients: &[String],
    target_path: Option<&str>,
) -> Result<()> {
    let mut problems = Vec::new();

    if target_path.map_or(true, str::is_empty) {
        problems.push("The required option --target-path is not set or is empty.".to_string());
    }
    if recipients.is_empty() {
        problems.push("The required option --recipients is not set or is empty.".to_string());
    }
    for recipient in recipients {
        if !directory.user_exists(recipient) {
            problems.push(format!("The recipient user {} does not exist.", recipient));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ShareListError::RecipientValidation { problems }.into())
    }
}

/// `1 = read` … `31 = all`, one line per entry
pub fn permission_legend() -> Vec<String> {
    Permissions::LEGEND
        .iter()
        .map(|(bits, label)| format!("{} = {}", bits, label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryFileTree, InMemoryUserDirectory};
    use crate::model::Node;
    use chrono::{TimeZone, Timelike};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 42).unwrap()
    }

    #[test]
    fn test_names() {
        assert_eq!(report_name(&at(), ReportFormat::Json), "202403010930 - Shares report.json");
        assert_eq!(report_name(&at(), ReportFormat::Csv), "202403010930 - Shares report.csv");
        assert_eq!(
            diff_report_name("202402010000", "202403010930"),
            "202402010000 - 202403010930 - Shares report diff.json"
        );
    }

    #[test]
    fn test_prefix_parsing() {
        let name = "202403010930 - Shares report.json";
        assert_eq!(report_prefix(name), Some("202403010930"));
        assert_eq!(
            parse_report_timestamp(name),
            Some(at().naive_utc().with_second(0).unwrap())
        );
        assert_eq!(report_prefix("notes.json"), None);
        assert_eq!(report_prefix("short"), None);
    }

    #[test]
    fn test_build_reports_dedupes_formats() {
        let reports =
            build_reports(&[], &[ReportFormat::Json, ReportFormat::Csv, ReportFormat::Json], at())
                .unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["202403010930 - Shares report.json", "202403010930 - Shares report.csv"]
        );
        assert_eq!(reports[0].body, "[]");
    }

    #[test]
    fn test_target_status_and_policy() {
        let mut tree = InMemoryFileTree::new();
        tree.add_user("admin", 1);
        tree.add_node("admin", Node::folder(2, "/Reports"));
        tree.add_node("admin", Node::file(3, "/notes.txt"));

        assert_eq!(target_status(&tree, "admin", "Reports").unwrap(), TargetStatus::Folder);
        assert_eq!(target_status(&tree, "admin", "New").unwrap(), TargetStatus::Missing);
        let status = target_status(&tree, "admin", "notes.txt").unwrap();
        assert_eq!(status, TargetStatus::NotAFolder);

        let err = check_report_target(status, TargetPolicy::Reject, "notes.txt").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidTarget);
        assert!(check_report_target(status, TargetPolicy::Warn, "notes.txt").is_ok());
        assert!(check_report_target(TargetStatus::Missing, TargetPolicy::Reject, "New").is_ok());

        let err = check_diff_target(TargetStatus::Missing, "New").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidTarget);
    }

    #[test]
    fn test_diff_without_previous_report() {
        let current = &build_reports(&[], &[ReportFormat::Json], at()).unwrap()[0];
        assert_eq!(diff_against(None, current).unwrap(), DiffOutcome::NoPreviousReport);
    }

    #[test]
    fn test_diff_artifact_is_named_from_both_runs() {
        let previous = StoredReport {
            name: "202402010000 - Shares report.json".into(),
            body: r#"[{"id": "1"}]"#.into(),
        };
        let current = &build_reports(&[], &[ReportFormat::Json], at()).unwrap()[0];

        let outcome = diff_against(Some(&previous), current).unwrap();
        let artifact = outcome.artifact().unwrap();
        assert_eq!(artifact.name, "202402010000 - 202403010930 - Shares report diff.json");
        assert_eq!(artifact.diff.removed, vec!["1"]);
        assert!(artifact.body.contains("\"removed\""));
    }

    #[test]
    fn test_csv_reports_cannot_be_diffed() {
        let current = &build_reports(&[], &[ReportFormat::Csv], at()).unwrap()[0];
        let err = diff_against(None, current).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut directory = InMemoryUserDirectory::new();
        directory.add_user("admin");
        let recipients = vec!["admin".to_string(), "ghost".to_string(), "nobody".to_string()];

        let err = validate_recipients(&directory, &recipients, None).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ValidationFailed);
        assert_eq!(err.details().map(<[String]>::len), Some(3));

        assert!(validate_recipients(&directory, &recipients[..1], Some("Reports")).is_ok());
    }

    #[test]
    fn test_permission_legend() {
        let legend = permission_legend();
        assert_eq!(legend.first().map(String::as_str), Some("1 = read"));
        assert!(legend[5].starts_with("31 = all"));
    }
}
