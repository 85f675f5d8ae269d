use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capabilities::ConnectInfo;
use crate::config::SourceInfo;
use crate::job::{JobId, JobParameters, PrinterCapabilities};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Crop and offset applied to a page by the transmitter, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageCrop {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

/// One call to the page transmitter.
/// 送往頁面傳輸端的單一請求。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Index of the source document in the job, `None` for the end-of-document marker.
    pub document: Option<usize>,
    pub page_number: u32,
    /// Source content; `None` together with `last_page` closes the document stream.
    pub content: Option<PathBuf>,
    pub last_page: bool,
    pub pdf_passthrough: bool,
    pub crop: Option<PageCrop>,
}

impl PageRequest {
    pub fn page(document: usize, page_number: u32, content: &Path, pdf_passthrough: bool) -> Self {
        Self {
            document: Some(document),
            page_number,
            content: Some(content.to_path_buf()),
            last_page: false,
            pdf_passthrough,
            crop: None,
        }
    }

    pub fn end_of_document(page_number: u32) -> Self {
        Self {
            document: None,
            page_number,
            content: None,
            last_page: true,
            pdf_passthrough: false,
            crop: None,
        }
    }

    pub fn is_end_of_document(&self) -> bool {
        self.content.is_none() && self.last_page
    }
}

/// Everything the controller needs to open a job on the printer.
#[derive(Debug, Clone, Copy)]
pub struct StartRequest<'a> {
    pub connection: &'a ConnectInfo,
    pub mime_type: &'a str,
    pub params: &'a JobParameters,
    pub capabilities: &'a PrinterCapabilities,
    pub debug_dir: Option<&'a Path>,
}

/// Sends pages of a running job to the printer, one at a time.
/// 將執行中作業的頁面逐頁送往印表機。
pub trait PageTransmitter {
    type Error;

    fn transmit_page(&self, job: JobId, request: &PageRequest) -> Result<(), Self::Error>;
}

/// Lifecycle operations of the print transport.
/// 列印傳輸層的作業生命週期操作。
pub trait JobController: PageTransmitter + Send + Sync {
    fn init(&self) -> Result<(), Self::Error>;
    fn shutdown(&self) -> Result<(), Self::Error>;
    fn set_source_info(&self, source: &SourceInfo);
    fn start_job(&self, request: &StartRequest<'_>) -> Result<JobId, Self::Error>;
    fn cancel_job(&self, job: JobId) -> Result<(), Self::Error>;
    fn end_job(&self, job: JobId) -> Result<(), Self::Error>;
}

/// Queries a printer for its capabilities.
pub trait CapabilityProvider {
    type Error;

    fn fetch(&self, connection: &ConnectInfo) -> Result<PrinterCapabilities, Self::Error>;
}

/// Calls observed by the mock controller.
/// 模擬控制器所記錄的呼叫。
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Init,
    Shutdown,
    SourceInfo(SourceInfo),
    Start { params: JobParameters },
    Page(PageRequest),
    Cancel(JobId),
    End(JobId),
}

/// In-memory implementation of [`JobController`] used for tests.
/// 測試使用的記憶體內部作業控制器實作。
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockController {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    fail_on_page: Option<usize>,
    refuse_start: bool,
}

#[cfg(test)]
impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the n-th (0-based) page transmission of the job.
    pub fn failing_on_page(index: usize) -> Self {
        Self {
            fail_on_page: Some(index),
            ..Self::default()
        }
    }

    pub fn refusing_start() -> Self {
        Self {
            refuse_start: true,
            ..Self::default()
        }
    }

    pub fn drain_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock poisoned").drain(..).collect()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }

    fn pages_sent(&self) -> usize {
        self.calls
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|call| matches!(call, RecordedCall::Page(request) if !request.is_end_of_document()))
            .count()
    }
}

#[cfg(test)]
impl PageTransmitter for MockController {
    type Error = String;

    fn transmit_page(&self, _job: JobId, request: &PageRequest) -> Result<(), Self::Error> {
        let index = self.pages_sent();
        self.record(RecordedCall::Page(request.clone()));
        if !request.is_end_of_document() && self.fail_on_page == Some(index) {
            return Err(format!("page {} rejected", request.page_number));
        }
        Ok(())
    }
}

#[cfg(test)]
impl JobController for MockController {
    fn init(&self) -> Result<(), Self::Error> {
        self.record(RecordedCall::Init);
        Ok(())
    }

    fn shutdown(&self) -> Result<(), Self::Error> {
        self.record(RecordedCall::Shutdown);
        Ok(())
    }

    fn set_source_info(&self, source: &SourceInfo) {
        self.record(RecordedCall::SourceInfo(source.clone()));
    }

    fn start_job(&self, request: &StartRequest<'_>) -> Result<JobId, Self::Error> {
        if self.refuse_start {
            return Err("printer refused job".to_string());
        }
        self.record(RecordedCall::Start {
            params: request.params.clone(),
        });
        Ok(JobId::from_raw(7))
    }

    fn cancel_job(&self, job: JobId) -> Result<(), Self::Error> {
        self.record(RecordedCall::Cancel(job));
        Ok(())
    }

    fn end_job(&self, job: JobId) -> Result<(), Self::Error> {
        self.record(RecordedCall::End(job));
        Ok(())
    }
}
