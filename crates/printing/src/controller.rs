use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::capabilities::ConnectInfo;
use crate::job::{DocumentDescriptor, JobId, JobParameters, PrinterCapabilities, StackingOrientation};
use crate::order::{apply_smart_duplex, compose_job, transmit_plan, JobPlan, PreparedDocument, TransmitError};
use crate::platform::{JobController, StartRequest};
use crate::render::RenderFlags;
use crate::scaling::{apply_print_scaling, TransmissionFormat};

/// Errors raised while submitting a print job.
/// 送出列印作業時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("empty file list")]
    NoDocuments,
    #[error("printer {name:?} is not supported")]
    UnsupportedPrinter { name: String },
    #[error("failed to start job: {0}")]
    StartFailed(String),
    #[error("{job_id} aborted: {source}")]
    Transmission {
        job_id: JobId,
        #[source]
        source: TransmitError,
    },
}

/// A job whose parameters are final and whose transmissions are planned.
/// 參數已定稿且傳送順序已排定的作業。
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedJob {
    pub params: JobParameters,
    pub documents: Vec<PreparedDocument>,
    /// MIME type the job is announced with, taken from the first document.
    pub mime_type: String,
    pub format: TransmissionFormat,
    pub stacking: StackingOrientation,
    /// Whether duplex was turned off because the job fits on one sheet.
    pub smart_duplex: bool,
    pub plan: JobPlan,
}

/// Finalizes `params` for `documents` and plans the transmission.
///
/// Nothing is sent; the printer is only consulted through `capabilities`.
pub fn prepare_job(
    documents: &[DocumentDescriptor],
    params: &JobParameters,
    capabilities: &PrinterCapabilities,
) -> Result<PreparedJob, SubmitError> {
    let Some(first) = documents.first() else {
        error!("empty file list");
        return Err(SubmitError::NoDocuments);
    };
    if !capabilities.is_supported {
        error!(printer = %capabilities.name, "printer is not supported, refusing job");
        return Err(SubmitError::UnsupportedPrinter {
            name: capabilities.name.clone(),
        });
    }

    let mut params = params.clone();
    params.render_flags =
        RenderFlags::from_request(params.render_flags, &params.render, params.alignment);

    let prepared: Vec<PreparedDocument> = documents
        .iter()
        .cloned()
        .map(|descriptor| PreparedDocument::prepare(descriptor, params.page_range.as_deref()))
        .collect();

    let smart_duplex = apply_smart_duplex(&prepared, &mut params);

    let format = TransmissionFormat::detect(&first.mime_type, capabilities);
    apply_print_scaling(format, capabilities, &mut params);

    params.job_pages_per_set = prepared
        .iter()
        .filter(|document| document.range.is_some())
        .map(|document| document.descriptor.page_count)
        .sum();

    params.certificate = capabilities.certificate.clone();

    let stacking = capabilities.stacking();
    let plan = compose_job(&prepared, stacking);

    Ok(PreparedJob {
        params,
        documents: prepared,
        mime_type: first.mime_type.clone(),
        format,
        stacking,
        smart_duplex,
        plan,
    })
}

/// Inputs of a single submission.
#[derive(Debug, Clone, Copy)]
pub struct JobSubmission<'a> {
    pub connection: &'a ConnectInfo,
    pub documents: &'a [DocumentDescriptor],
    pub params: &'a JobParameters,
    pub capabilities: &'a PrinterCapabilities,
    pub debug_dir: Option<&'a Path>,
}

/// A job the controller accepted and received in full.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub prepared: PreparedJob,
}

/// Prepares, starts and transmits a job.
///
/// A transmission failure cancels and ends the job before the error is
/// returned, so the caller never holds a half-sent job.
/// 準備、啟動並傳送一份列印作業。
pub fn submit_job<C>(controller: &C, submission: JobSubmission<'_>) -> Result<SubmittedJob, SubmitError>
where
    C: JobController + ?Sized,
    C::Error: fmt::Display,
{
    let prepared = prepare_job(submission.documents, submission.params, submission.capabilities)?;

    let request = StartRequest {
        connection: submission.connection,
        mime_type: &prepared.mime_type,
        params: &prepared.params,
        capabilities: submission.capabilities,
        debug_dir: submission.debug_dir,
    };
    let job_id = controller.start_job(&request).map_err(|err| {
        error!(target_uri = %submission.connection, error = %err, "failed to start job");
        SubmitError::StartFailed(err.to_string())
    })?;
    info!(
        %job_id,
        documents = prepared.documents.len(),
        pages = prepared.plan.pages().len(),
        format = %prepared.format,
        "job started"
    );

    if let Err(source) = transmit_plan(controller, job_id, &prepared.plan) {
        error!(%job_id, error = %source, "failed to add some pages, aborting job");
        if let Err(err) = controller.cancel_job(job_id) {
            error!(%job_id, error = %err, "cancel failed");
        }
        if let Err(err) = controller.end_job(job_id) {
            error!(%job_id, error = %err, "end failed");
        }
        return Err(SubmitError::Transmission { job_id, source });
    }

    Ok(SubmittedJob { job_id, prepared })
}
