//! Shares listing facade
//!
//! Binds the collaborators to the pipeline stages and owns lifecycle logging
//! for each exposed operation:
//! - `log_op_start!` at entry
//! - `log_op_end!` with `duration_ms` on success
//! - `log_op_error!` with `duration_ms` on failure

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::config::ReportConfig;
use crate::diff::{compute_diff, DiffResult};
use crate::enumerate::ShareEnumerator;
use crate::errors::{ExError, ExErrorKind, Result};
use crate::filter::{FilterOptions, FilterPipeline, FilteredShares, RoleFilter};
use crate::format::ShareFormatter;
use crate::model::{FormattedRecord, Share};
use crate::ports::{FileTree, ShareStore, UserDirectory};
use crate::report::{
    build_reports, check_diff_target, check_report_target, diff_against, target_status,
    validate_recipients, DiffOutcome, Report, ReportArchive, TargetStatus,
};
use crate::serialize::{serialize, ReportFormat};
use crate::{log_op_end, log_op_error, log_op_start};

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Entry point for listing, reporting and diffing shares
pub struct SharesList<'a> {
    store: &'a dyn ShareStore,
    tree: &'a dyn FileTree,
    directory: &'a dyn UserDirectory,
    config: ReportConfig,
}

impl<'a> SharesList<'a> {
    pub fn new(
        store: &'a dyn ShareStore,
        tree: &'a dyn FileTree,
        directory: &'a dyn UserDirectory,
    ) -> Self {
        Self {
            store,
            tree,
            directory,
            config: ReportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn pipeline(&self) -> FilterPipeline<'a> {
        let enumerator = ShareEnumerator::new(self.store, self.directory)
            .with_unscoped_source(self.config.unscoped_source);
        FilterPipeline::new(enumerator, self.store, self.tree)
    }

    /// Lazy filtered share stream
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a path is given without a user.
    pub fn enumerate_filtered(&self, options: &FilterOptions) -> Result<FilteredShares<'a>> {
        log_op_start!(
            "enumerate_filtered",
            user_id = options.user.as_deref().unwrap_or(""),
            path = options.path.as_deref().unwrap_or("")
        );
        let start = std::time::Instant::now();

        let shares = self.pipeline().run(options).map_err(|e| {
            log_op_error!("enumerate_filtered", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        log_op_end!(
            "enumerate_filtered",
            duration_ms = elapsed_ms(start),
            path_not_found = shares.is_path_not_found()
        );
        Ok(shares)
    }

    /// Filtered shares projected into records, collected
    ///
    /// A path that does not resolve yields no records.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a path without a user; the first store failure
    /// hit while enumerating.
    pub fn formatted_shares(&self, options: &FilterOptions) -> Result<Vec<FormattedRecord>> {
        log_op_start!("formatted_shares", user_id = options.user.as_deref().unwrap_or(""));
        let start = std::time::Instant::now();

        let result = self
            .pipeline()
            .run(options)
            .and_then(|shares| self.collect_formatted(shares));
        let records = result.map_err(|e| {
            log_op_error!("formatted_shares", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        log_op_end!(
            "formatted_shares",
            duration_ms = elapsed_ms(start),
            record_count = records.len()
        );
        Ok(records)
    }

    fn collect_formatted(&self, shares: FilteredShares<'a>) -> Result<Vec<FormattedRecord>> {
        let formatter = ShareFormatter::new(self.tree);
        shares
            .map(|share| share.map(|s| formatter.format(&s)))
            .collect()
    }

    /// Shares strictly below the folder at `path`, directories first
    ///
    /// Directories are ordered by path; files keep source order after them.
    ///
    /// # Errors
    ///
    /// The first store failure hit while enumerating.
    pub fn sub_shares(
        &self,
        user: &str,
        path: &str,
        role: RoleFilter,
    ) -> Result<Vec<FormattedRecord>> {
        log_op_start!("sub_shares", user_id = user, path = path);
        let start = std::time::Instant::now();

        let shares = self.pipeline().sub_shares(user, path, role);
        let records = self.collect_formatted(shares).map_err(|e| {
            log_op_error!("sub_shares", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        let queried = crate::model::node::normalize_path(path);
        let mut records: Vec<FormattedRecord> = records
            .into_iter()
            .filter(|r| r.path() != Some(queried.as_str()))
            .collect();
        records.sort_by(directories_first);

        log_op_end!(
            "sub_shares",
            duration_ms = elapsed_ms(start),
            record_count = records.len()
        );
        Ok(records)
    }

    pub fn format(&self, share: &Share) -> FormattedRecord {
        ShareFormatter::new(self.tree).format(share)
    }

    /// Encode records; `None` selects the configured default format
    ///
    /// # Errors
    ///
    /// `Serialization` if encoding fails.
    pub fn serialize(
        &self,
        records: &[FormattedRecord],
        format: Option<ReportFormat>,
    ) -> Result<String> {
        let format = format.unwrap_or(self.config.default_format);
        log_op_start!("serialize", format = format.extension(), record_count = records.len());
        let start = std::time::Instant::now();

        let text = serialize(records, format).map_err(|e| {
            log_op_error!("serialize", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        log_op_end!("serialize", duration_ms = elapsed_ms(start));
        Ok(text)
    }

    /// Collect the filtered records once and serialize them per format
    ///
    /// `None` selects the configured formats.
    ///
    /// # Errors
    ///
    /// Propagates enumeration and serialization failures.
    pub fn generate_reports(
        &self,
        options: &FilterOptions,
        formats: Option<&[ReportFormat]>,
        at: DateTime<Utc>,
    ) -> Result<Vec<Report>> {
        let formats = formats.unwrap_or(&self.config.formats);
        log_op_start!("generate_reports", format_count = formats.len());
        let start = std::time::Instant::now();

        let result = self
            .formatted_shares(options)
            .and_then(|records| build_reports(&records, formats, at));
        let reports = result.map_err(|e| {
            log_op_error!("generate_reports", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        log_op_end!(
            "generate_reports",
            duration_ms = elapsed_ms(start),
            report_count = reports.len()
        );
        Ok(reports)
    }

    /// Check the folder that will receive `recipient`'s reports
    ///
    /// # Errors
    ///
    /// `InvalidTarget` when the target is not a folder and the policy rejects
    /// it; failures opening the recipient's tree.
    pub fn prepare_target(&self, recipient: &str, target_path: &str) -> Result<TargetStatus> {
        let status = target_status(self.tree, recipient, target_path)
            .and_then(|status| {
                check_report_target(status, self.config.target_policy, target_path)?;
                Ok(status)
            })
            .map_err(|e| e.with_op("prepare_target").with_user_id(recipient))?;
        tracing::debug!(
            user_id = %recipient,
            path = %target_path,
            ?status,
            "report target checked"
        );
        Ok(status)
    }

    /// Diff this run's JSON report against the latest one stored in the target
    ///
    /// # Errors
    ///
    /// - `InvalidTarget`: the target is missing or not a folder
    /// - `InvalidInput`: `reports` holds no JSON report
    /// - `InvalidReport` / `MissingField`: a report body cannot be decoded
    pub fn diff_against_previous(
        &self,
        archive: &dyn ReportArchive,
        recipient: &str,
        target_path: &str,
        reports: &[Report],
    ) -> Result<DiffOutcome> {
        log_op_start!("diff_against_previous", user_id = recipient, path = target_path);
        let start = std::time::Instant::now();

        let result = self.diff_against_previous_impl(archive, recipient, target_path, reports);
        let outcome = result.map_err(|e| {
            log_op_error!("diff_against_previous", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        match &outcome {
            DiffOutcome::Diffed(artifact) => log_op_end!(
                "diff_against_previous",
                duration_ms = elapsed_ms(start),
                added_count = artifact.diff.added.len(),
                removed_count = artifact.diff.removed.len(),
                modified_count = artifact.diff.modified.len()
            ),
            DiffOutcome::NoPreviousReport => log_op_end!(
                "diff_against_previous",
                duration_ms = elapsed_ms(start),
                no_previous_report = true
            ),
        }
        Ok(outcome)
    }

    fn diff_against_previous_impl(
        &self,
        archive: &dyn ReportArchive,
        recipient: &str,
        target_path: &str,
        reports: &[Report],
    ) -> Result<DiffOutcome> {
        let status = target_status(self.tree, recipient, target_path)?;
        check_diff_target(status, target_path)?;

        let current = reports
            .iter()
            .find(|r| r.format == ReportFormat::Json)
            .ok_or_else(|| {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("diff_against_previous")
                    .with_message("no JSON report in this run")
            })?;
        let previous = archive.latest_json_report(recipient, target_path)?;
        diff_against(previous.as_ref(), current)
    }

    /// Keyed diff of two serialized JSON reports
    ///
    /// # Errors
    ///
    /// `InvalidReport` or `MissingField` if either report cannot be decoded.
    pub fn diff(&self, previous_json: &[u8], new_json: &[u8]) -> Result<DiffResult> {
        log_op_start!("diff");
        let start = std::time::Instant::now();

        let diff = compute_diff(previous_json, new_json).map_err(|e| {
            log_op_error!("diff", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        log_op_end!(
            "diff",
            duration_ms = elapsed_ms(start),
            added_count = diff.added.len(),
            removed_count = diff.removed.len(),
            modified_count = diff.modified.len()
        );
        Ok(diff)
    }

    /// # Errors
    ///
    /// `ValidationFailed` listing every unknown recipient and missing option.
    pub fn validate_recipients(
        &self,
        recipients: &[String],
        target_path: Option<&str>,
    ) -> Result<()> {
        validate_recipients(self.directory, recipients, target_path)
    }
}

fn directories_first(a: &FormattedRecord, b: &FormattedRecord) -> Ordering {
    match (a.is_directory(), b.is_directory()) {
        (true, true) => a.path().cmp(&b.path()),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}
