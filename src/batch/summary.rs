//! Per-record reports and the batch summary reduced from them.

use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::distribution::{Channel, ChannelStatus, DeliveryOutcome, DispatchReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Delivered,
    PartiallyDelivered,
    StorageFailed,
    RenderFailed,
    SkippedByPolicy,
}

/// Terminal state of one record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordReport {
    /// Zero-based position in the record set.
    pub row: usize,
    pub employee_id: String,
    pub status: RecordStatus,
    pub outcomes: Vec<DeliveryOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Local copy, when one is retained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_pay_words: Option<String>,
}

impl RecordReport {
    pub fn delivered(
        row: usize,
        employee_id: String,
        local_path: PathBuf,
        net_pay_words: String,
        dispatch: DispatchReport,
    ) -> Self {
        let status = if dispatch.storage_failed() {
            RecordStatus::StorageFailed
        } else if dispatch.any_failed() {
            RecordStatus::PartiallyDelivered
        } else {
            RecordStatus::Delivered
        };
        let document = dispatch.storage_key.is_none().then_some(local_path);

        Self {
            row,
            employee_id,
            status,
            outcomes: dispatch.outcomes,
            error: None,
            document,
            storage_key: dispatch.storage_key,
            net_pay_words: Some(net_pay_words),
        }
    }

    pub fn render_failed(row: usize, employee_id: String, error: impl ToString) -> Self {
        Self {
            row,
            employee_id,
            status: RecordStatus::RenderFailed,
            outcomes: Vec::new(),
            error: Some(error.to_string()),
            document: None,
            storage_key: None,
            net_pay_words: None,
        }
    }

    pub fn skipped_by_policy(row: usize, employee_id: String, reason: impl ToString) -> Self {
        Self {
            row,
            employee_id,
            status: RecordStatus::SkippedByPolicy,
            outcomes: Vec::new(),
            error: Some(reason.to_string()),
            document: None,
            storage_key: None,
            net_pay_words: None,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(
            self.status,
            RecordStatus::Delivered | RecordStatus::PartiallyDelivered | RecordStatus::StorageFailed
        )
    }

    pub fn status_of(&self, channel: Channel) -> Option<&ChannelStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.channel == channel)
            .map(|outcome| &outcome.status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelCounters {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ChannelCounters {
    fn record(&mut self, status: &ChannelStatus) {
        match status {
            ChannelStatus::Sent => self.sent += 1,
            ChannelStatus::Failed(_) => self.failed += 1,
            ChannelStatus::Skipped(_) => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_records: usize,
    /// Records that reached rendering: `generated + failed`.
    pub processed: usize,
    pub generated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub email: ChannelCounters,
    pub messaging: ChannelCounters,
    pub storage: ChannelCounters,
    pub not_rendered: Vec<String>,
    pub incomplete_delivery: Vec<String>,
    pub storage_failed: Vec<String>,
    pub records: Vec<RecordReport>,
}

impl BatchSummary {
    /// Fold per-record reports, in input order, into the summary.
    pub fn from_reports(total_records: usize, reports: Vec<RecordReport>, cancelled: bool) -> Self {
        let initial = Self {
            total_records,
            cancelled,
            ..Self::default()
        };

        reports.into_iter().fold(initial, |mut summary, report| {
            match report.status {
                RecordStatus::SkippedByPolicy => summary.skipped += 1,
                RecordStatus::RenderFailed => {
                    summary.failed += 1;
                    summary.not_rendered.push(report.employee_id.clone());
                }
                RecordStatus::Delivered => summary.generated += 1,
                RecordStatus::PartiallyDelivered => {
                    summary.generated += 1;
                    summary.incomplete_delivery.push(report.employee_id.clone());
                }
                RecordStatus::StorageFailed => {
                    summary.generated += 1;
                    summary.storage_failed.push(report.employee_id.clone());
                    if report
                        .outcomes
                        .iter()
                        .any(|o| o.channel != Channel::Storage && o.status.is_failed())
                    {
                        summary.incomplete_delivery.push(report.employee_id.clone());
                    }
                }
            }
            for outcome in &report.outcomes {
                summary.channel_mut(outcome.channel).record(&outcome.status);
            }
            summary.processed = summary.generated + summary.failed;
            summary.records.push(report);
            summary
        })
    }

    pub fn channel(&self, channel: Channel) -> &ChannelCounters {
        match channel {
            Channel::Email => &self.email,
            Channel::Messaging => &self.messaging,
            Channel::Storage => &self.storage,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut ChannelCounters {
        match channel {
            Channel::Email => &mut self.email,
            Channel::Messaging => &mut self.messaging,
            Channel::Storage => &mut self.storage,
        }
    }

    /// Paths of the documents still held locally.
    pub fn retained_documents(&self) -> impl Iterator<Item = &PathBuf> {
        self.records.iter().filter_map(|r| r.document.as_ref())
    }

    pub fn log(&self) {
        info!("{}", "=".repeat(50));
        info!("PAYSLIP GENERATION SUMMARY");
        info!("{}", "=".repeat(50));
        info!("Total Employees: {}", self.total_records);
        info!("Payslips Generated: {}", self.generated);
        info!("Payslips Failed: {}", self.failed);
        if self.skipped > 0 {
            info!("Skipped by policy: {}", self.skipped);
        }
        for channel in Channel::ALL {
            let counters = self.channel(channel);
            info!(
                "{}: {} sent, {} failed, {} skipped",
                channel, counters.sent, counters.failed, counters.skipped
            );
        }
        if !self.not_rendered.is_empty() {
            info!("Not rendered: {}", self.not_rendered.join(", "));
        }
        if !self.incomplete_delivery.is_empty() {
            info!("Incomplete delivery: {}", self.incomplete_delivery.join(", "));
        }
        if !self.storage_failed.is_empty() {
            info!("Storage failed: {}", self.storage_failed.join(", "));
        }
        if self.cancelled {
            info!(
                "Batch cancelled; {} records not started",
                self.total_records - self.processed - self.skipped
            );
        }
        info!("{}", "=".repeat(50));
    }
}
