use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::job::{DocumentDescriptor, DuplexMode, JobId, JobParameters, StackingOrientation};
use crate::platform::{PageRequest, PageTransmitter};
use crate::range::{resolve_page_range, ResolvedRange};

/// A document paired with the pages that will be printed from it.
/// 文件與其實際要列印之頁面的組合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDocument {
    pub descriptor: DocumentDescriptor,
    /// Resolved pages; `None` for content that is not paginated.
    pub range: Option<ResolvedRange>,
}

impl PreparedDocument {
    pub fn prepare(descriptor: DocumentDescriptor, page_range: Option<&str>) -> Self {
        let range = descriptor
            .is_paginated()
            .then(|| resolve_page_range(page_range, descriptor.page_count));
        Self { descriptor, range }
    }
}

/// Order in which one document's pages are handed to the transmitter.
///
/// Face-down trays stack the first sheet at the bottom, so the list goes out
/// as given; face-up trays need it reversed.
pub fn transmission_order(pages: &[u32], stacking: StackingOrientation) -> Vec<u32> {
    match stacking {
        StackingOrientation::FaceDown => pages.to_vec(),
        StackingOrientation::FaceUp => pages.iter().rev().copied().collect(),
    }
}

/// Order in which the documents of a job are submitted, as indices.
pub fn document_order(count: usize, stacking: StackingOrientation) -> Vec<usize> {
    match stacking {
        StackingOrientation::FaceDown => (0..count).collect(),
        StackingOrientation::FaceUp => (0..count).rev().collect(),
    }
}

/// Turns duplex off for single-sheet jobs.
///
/// Only applies to jobs with exactly one document: duplex is disabled when it
/// is not paginated or when its resolved range holds exactly one page.
/// Returns true when duplex was forced off.
pub fn apply_smart_duplex(documents: &[PreparedDocument], params: &mut JobParameters) -> bool {
    let [document] = documents else {
        return false;
    };
    let single_sheet = match &document.range {
        None => true,
        Some(range) => range.len() == 1,
    };
    if single_sheet {
        info!(
            document = %document.descriptor.path.display(),
            "smart duplex, disabling duplex"
        );
        params.duplex = DuplexMode::Off;
    }
    single_sheet
}

/// Ordered transmissions for a whole job.
/// 整份作業依序送出的頁面請求。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPlan {
    pub requests: Vec<PageRequest>,
    pub end_marker: PageRequest,
}

impl JobPlan {
    /// Page transmissions, excluding the end-of-document marker.
    pub fn pages(&self) -> &[PageRequest] {
        &self.requests
    }

    /// Order in which documents appear in the plan.
    pub fn document_sequence(&self) -> Vec<usize> {
        let mut sequence: Vec<usize> = Vec::new();
        for document in self.requests.iter().filter_map(|request| request.document) {
            if sequence.last() != Some(&document) {
                sequence.push(document);
            }
        }
        sequence
    }
}

/// Builds the transmission plan for `documents`.
///
/// Paginated documents contribute their resolved pages in stacking order.
/// Other documents go out whole as a single request numbered by their
/// position in the submission loop. A final end-of-document marker closes
/// the stream.
pub fn compose_job(documents: &[PreparedDocument], stacking: StackingOrientation) -> JobPlan {
    let mut requests = Vec::new();
    let mut position: u32 = 1;

    for index in document_order(documents.len(), stacking) {
        let document = &documents[index];
        let path = document.descriptor.path.as_path();
        match &document.range {
            Some(range) => {
                for page in transmission_order(&range.pages, stacking) {
                    requests.push(PageRequest::page(index, page, path, true));
                }
            }
            None => requests.push(PageRequest::page(index, position, path, false)),
        }
        position += 1;
    }

    debug!(
        documents = documents.len(),
        pages = requests.len(),
        ?stacking,
        "composed job plan"
    );
    JobPlan {
        requests,
        end_marker: PageRequest::end_of_document(position),
    }
}

/// A page the transmitter refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to transmit page {page_number} of document {document}: {message}")]
pub struct TransmitError {
    pub document: usize,
    pub page_number: u32,
    pub message: String,
}

/// Sends `plan` to the transmitter, stopping at the first refused page.
///
/// The end-of-document marker is sent regardless of the outcome; its own
/// result is only logged.
pub fn transmit_plan<T>(transmitter: &T, job: JobId, plan: &JobPlan) -> Result<(), TransmitError>
where
    T: PageTransmitter + ?Sized,
    T::Error: fmt::Display,
{
    let mut outcome = Ok(());
    for request in plan.pages() {
        debug!(%job, page = request.page_number, document = ?request.document, "transmitting page");
        if let Err(err) = transmitter.transmit_page(job, request) {
            outcome = Err(TransmitError {
                document: request.document.unwrap_or_default(),
                page_number: request.page_number,
                message: err.to_string(),
            });
            break;
        }
    }

    if let Err(err) = transmitter.transmit_page(job, &plan.end_marker) {
        warn!(%job, error = %err, "end-of-document marker rejected");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::MIME_TYPE_PDF;
    use crate::platform::MockController;

    fn pdf(path: &str, pages: u32, range: Option<&str>) -> PreparedDocument {
        PreparedDocument::prepare(DocumentDescriptor::new(path, MIME_TYPE_PDF, pages), range)
    }

    fn photo(path: &str) -> PreparedDocument {
        PreparedDocument::prepare(DocumentDescriptor::new(path, "image/jpeg", 0), None)
    }

    #[test]
    fn face_down_keeps_order_face_up_reverses() {
        let pages = [3, 1, 2];
        assert_eq!(
            transmission_order(&pages, StackingOrientation::FaceDown),
            vec![3, 1, 2]
        );
        assert_eq!(
            transmission_order(&pages, StackingOrientation::FaceUp),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn face_up_submits_documents_last_first() {
        assert_eq!(
            document_order(3, StackingOrientation::FaceUp),
            vec![2, 1, 0]
        );
        assert_eq!(
            document_order(3, StackingOrientation::FaceDown),
            vec![0, 1, 2]
        );
        assert!(document_order(0, StackingOrientation::FaceUp).is_empty());
    }

    #[test]
    fn smart_duplex_rules() {
        let mut params = JobParameters {
            duplex: DuplexMode::LongEdge,
            ..Default::default()
        };
        assert!(apply_smart_duplex(&[photo("/tmp/p.jpg")], &mut params));
        assert_eq!(params.duplex, DuplexMode::Off);

        params.duplex = DuplexMode::LongEdge;
        assert!(apply_smart_duplex(&[pdf("/tmp/a.pdf", 9, Some("4"))], &mut params));
        assert_eq!(params.duplex, DuplexMode::Off);

        params.duplex = DuplexMode::LongEdge;
        assert!(!apply_smart_duplex(&[pdf("/tmp/a.pdf", 9, Some("4-5"))], &mut params));
        assert_eq!(params.duplex, DuplexMode::LongEdge);

        assert!(!apply_smart_duplex(
            &[photo("/tmp/p.jpg"), photo("/tmp/q.jpg")],
            &mut params
        ));
        assert_eq!(params.duplex, DuplexMode::LongEdge);
    }

    #[test]
    fn plan_for_face_up_job() {
        let documents = [pdf("/tmp/a.pdf", 3, Some("1-2")), photo("/tmp/b.jpg")];
        let plan = compose_job(&documents, StackingOrientation::FaceUp);

        let summary: Vec<(Option<usize>, u32, bool)> = plan
            .pages()
            .iter()
            .map(|request| (request.document, request.page_number, request.pdf_passthrough))
            .collect();
        assert_eq!(
            summary,
            vec![(Some(1), 1, false), (Some(0), 2, true), (Some(0), 1, true)]
        );
        assert_eq!(plan.document_sequence(), vec![1, 0]);
        assert!(plan.end_marker.is_end_of_document());
        assert_eq!(plan.end_marker.page_number, 3);
    }

    #[test]
    fn transmission_stops_at_first_failure_but_closes_stream() {
        let documents = [pdf("/tmp/a.pdf", 4, None)];
        let plan = compose_job(&documents, StackingOrientation::FaceDown);
        let controller = MockController::failing_on_page(1);

        let err = transmit_plan(&controller, JobId::from_raw(1), &plan).unwrap_err();
        assert_eq!(err.page_number, 2);
        assert_eq!(err.document, 0);

        let calls = controller.drain_calls();
        // Two pages attempted plus the end-of-document marker.
        assert_eq!(calls.len(), 3);
    }
}
