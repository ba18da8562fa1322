//! Drives one batch: validate, then render and dispatch every record.

use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::summary::{BatchSummary, RecordReport};
use crate::config::{BatchConfiguration, ZeroNetPayPolicy};
use crate::distribution::Dispatcher;
use crate::generators::common::current_month_label;
use crate::generators::layout::resolve_net_pay;
use crate::generators::Renderer;
use crate::records::{
    fields, validate_record_set, EmployeeRecord, RecordSet, ValidationError, MANDATORY_FIELDS,
};

pub struct BatchOrchestrator {
    config: Arc<BatchConfiguration>,
    renderer: Arc<dyn Renderer>,
    dispatcher: Arc<Dispatcher>,
}

/// Identifier used for files and reports; rows without one get their position.
pub fn employee_id_for(record: &EmployeeRecord, row: usize) -> String {
    record
        .identifier()
        .unwrap_or_else(|| format!("EMP_{}", row + 1))
}

impl BatchOrchestrator {
    pub fn new(
        config: Arc<BatchConfiguration>,
        renderer: Arc<dyn Renderer>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            config,
            renderer,
            dispatcher,
        }
    }

    /// Run the batch. Only validation can fail the whole batch; every
    /// per-record failure ends up in the summary.
    ///
    /// `month` labels every document; when blank, a record's own `Month`
    /// column is used, then the current month.
    pub async fn run(
        &self,
        records: &RecordSet,
        month: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, ValidationError> {
        validate_record_set(records, &MANDATORY_FIELDS)?;

        let total = records.len();
        info!("Starting batch of {} records", total);

        let rows = records.rows().iter().cloned().enumerate();
        let reports: Vec<Option<RecordReport>> = stream::iter(rows)
            .map(|(row, record)| {
                let cancel = cancel.clone();
                let config = Arc::clone(&self.config);
                let renderer = Arc::clone(&self.renderer);
                let dispatcher = Arc::clone(&self.dispatcher);
                let month = month.to_string();
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let employee_id = employee_id_for(&record, row);
                    info!("Processing {}/{}: {}", row + 1, total, employee_id);

                    let task = tokio::spawn(process_record(
                        row,
                        employee_id.clone(),
                        record,
                        month,
                        config,
                        renderer,
                        dispatcher,
                    ));
                    let report = match task.await {
                        Ok(report) => report,
                        Err(join_error) => {
                            error!("Record {} aborted: {}", employee_id, join_error);
                            RecordReport::render_failed(row, employee_id, join_error)
                        }
                    };
                    Some(report)
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let cancelled = reports.iter().any(Option::is_none);
        if cancelled {
            warn!("Batch cancelled before every record started");
        }

        let finished = reports.into_iter().flatten().collect();
        let summary = BatchSummary::from_reports(total, finished, cancelled);
        summary.log();
        Ok(summary)
    }
}

async fn process_record(
    row: usize,
    employee_id: String,
    record: EmployeeRecord,
    month: String,
    config: Arc<BatchConfiguration>,
    renderer: Arc<dyn Renderer>,
    dispatcher: Arc<Dispatcher>,
) -> RecordReport {
    if config.policy.zero_net_pay == ZeroNetPayPolicy::Skip {
        if let Ok(net) = resolve_net_pay(&record) {
            if net.map_or(true, |amount| amount == Decimal::ZERO) {
                warn!("Skipping {}: net pay is zero or missing", employee_id);
                return RecordReport::skipped_by_policy(
                    row,
                    employee_id,
                    "net pay is zero or missing",
                );
            }
        }
    }

    let month = if month.trim().is_empty() {
        record
            .text(fields::MONTH)
            .unwrap_or_else(current_month_label)
    } else {
        month
    };

    let document = match renderer.render(&employee_id, &record, &month).await {
        Ok(document) => document,
        Err(err) => {
            error!("Error generating payslip for {}: {}", employee_id, err);
            return RecordReport::render_failed(row, employee_id, err);
        }
    };

    let dispatch = dispatcher.dispatch(&document, &record).await;
    RecordReport::delivered(
        row,
        employee_id,
        document.local_path,
        document.net_pay_words,
        dispatch,
    )
}
