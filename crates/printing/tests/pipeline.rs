use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use printseq_printing::{
    submit_job, ConnectInfo, DocumentDescriptor, DuplexMode, InputFormats, JobController, JobId,
    JobParameters, JobSubmission, PageRequest, PageTransmitter, PrinterCapabilities,
    SequencerConfig, SourceInfo, StartRequest, SubmitError, MIME_TYPE_PDF,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Start { mime_type: String, params: JobParameters },
    Page(PageRequest),
    Cancel(JobId),
    End(JobId),
}

#[derive(Clone, Default)]
struct RecordingController {
    events: Arc<Mutex<Vec<Event>>>,
    source: Arc<Mutex<Option<SourceInfo>>>,
    reject_page: Option<u32>,
}

impl RecordingController {
    fn rejecting(page_number: u32) -> Self {
        Self {
            reject_page: Some(page_number),
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn pages(&self) -> Vec<PageRequest> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Page(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

impl PageTransmitter for RecordingController {
    type Error = String;

    fn transmit_page(&self, _job: JobId, request: &PageRequest) -> Result<(), Self::Error> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Page(request.clone()));
        if !request.is_end_of_document() && self.reject_page == Some(request.page_number) {
            return Err(format!("printer rejected page {}", request.page_number));
        }
        Ok(())
    }
}

impl JobController for RecordingController {
    fn init(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_source_info(&self, source: &SourceInfo) {
        *self.source.lock().unwrap() = Some(source.clone());
    }

    fn start_job(&self, request: &StartRequest<'_>) -> Result<JobId, Self::Error> {
        self.events.lock().unwrap().push(Event::Start {
            mime_type: request.mime_type.to_string(),
            params: request.params.clone(),
        });
        Ok(JobId::from_raw(42))
    }

    fn cancel_job(&self, job: JobId) -> Result<(), Self::Error> {
        self.events.lock().unwrap().push(Event::Cancel(job));
        Ok(())
    }

    fn end_job(&self, job: JobId) -> Result<(), Self::Error> {
        self.events.lock().unwrap().push(Event::End(job));
        Ok(())
    }
}

fn printer(face_down_tray: bool) -> PrinterCapabilities {
    PrinterCapabilities {
        name: "Lobby".into(),
        face_down_tray,
        supported_scalings: vec!["auto".into(), "fit".into(), "none".into()],
        supported_input_formats: InputFormats::PDF.union(InputFormats::PWG_RASTER),
        duplex: true,
        ..Default::default()
    }
}

fn summary(pages: &[PageRequest]) -> Vec<(Option<PathBuf>, u32, bool)> {
    pages
        .iter()
        .map(|request| (request.content.clone(), request.page_number, request.last_page))
        .collect()
}

#[test]
fn face_up_job_reverses_documents_and_pages() {
    let controller = RecordingController::default();
    controller.set_source_info(&SourceInfo::default());
    let connection = ConnectInfo::new("printer.local", 631, &SequencerConfig::default());
    let documents = [
        DocumentDescriptor::new("/spool/a.pdf", MIME_TYPE_PDF, 3),
        DocumentDescriptor::new("/spool/b.pdf", MIME_TYPE_PDF, 4),
    ];
    let params = JobParameters {
        job_name: "report".into(),
        duplex: DuplexMode::LongEdge,
        page_range: Some("2-3".into()),
        ..Default::default()
    };

    let submitted = submit_job(
        &controller,
        JobSubmission {
            connection: &connection,
            documents: &documents,
            params: &params,
            capabilities: &printer(false),
            debug_dir: None,
        },
    )
    .expect("job should be accepted");
    assert_eq!(submitted.job_id, JobId::from_raw(42));
    assert!(controller.source.lock().unwrap().is_some());

    let events = controller.events();
    match &events[0] {
        Event::Start { mime_type, params } => {
            assert_eq!(mime_type, MIME_TYPE_PDF);
            assert_eq!(params.duplex, DuplexMode::LongEdge);
            assert_eq!(params.print_scaling, "auto");
            assert_eq!(params.job_pages_per_set, 7);
        }
        other => panic!("expected start, got {other:?}"),
    }

    let b = Some(PathBuf::from("/spool/b.pdf"));
    let a = Some(PathBuf::from("/spool/a.pdf"));
    assert_eq!(
        summary(&controller.pages()),
        vec![
            (b.clone(), 3, false),
            (b, 2, false),
            (a.clone(), 3, false),
            (a, 2, false),
            (None, 3, true),
        ]
    );
}

#[test]
fn rejected_page_aborts_remaining_transmission() {
    let controller = RecordingController::rejecting(2);
    let connection = ConnectInfo::new("printer.local", 631, &SequencerConfig::default());
    let documents = [DocumentDescriptor::new("/spool/a.pdf", MIME_TYPE_PDF, 5)];

    let err = submit_job(
        &controller,
        JobSubmission {
            connection: &connection,
            documents: &documents,
            params: &JobParameters::default(),
            capabilities: &printer(true),
            debug_dir: None,
        },
    )
    .unwrap_err();

    let SubmitError::Transmission { job_id, source } = err else {
        panic!("expected transmission failure");
    };
    assert_eq!(job_id, JobId::from_raw(42));
    assert_eq!(source.page_number, 2);

    let pages = controller.pages();
    assert_eq!(
        pages.iter().map(|page| page.page_number).collect::<Vec<_>>(),
        vec![1, 2, 2]
    );
    assert!(pages[2].is_end_of_document());

    let events = controller.events();
    assert_eq!(
        &events[events.len() - 2..],
        &[Event::Cancel(job_id), Event::End(job_id)]
    );
}

#[test]
fn mixed_job_sends_whole_files_by_position() {
    let controller = RecordingController::default();
    let connection = ConnectInfo::new("printer.local", 631, &SequencerConfig::default());
    let documents = [
        DocumentDescriptor::new("/spool/cover.jpg", "image/jpeg", 0),
        DocumentDescriptor::new("/spool/body.pdf", MIME_TYPE_PDF, 2),
    ];

    submit_job(
        &controller,
        JobSubmission {
            connection: &connection,
            documents: &documents,
            params: &JobParameters::default(),
            capabilities: &printer(true),
            debug_dir: None,
        },
    )
    .expect("job should be accepted");

    let pages = controller.pages();
    assert_eq!(
        summary(&pages),
        vec![
            (Some(PathBuf::from("/spool/cover.jpg")), 1, false),
            (Some(PathBuf::from("/spool/body.pdf")), 1, false),
            (Some(PathBuf::from("/spool/body.pdf")), 2, false),
            (None, 3, true),
        ]
    );
    assert!(!pages[0].pdf_passthrough);
    assert!(pages[1].pdf_passthrough);
}
