use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::render::{Alignment, RenderFlags, RenderRequest};

/// MIME type of documents that can be sent to the printer without rasterizing.
pub const MIME_TYPE_PDF: &str = "application/pdf";

/// Opaque handle assigned by the job controller when a job starts.
/// 作業控制器在作業開始時配發的不透明識別碼。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u32);

impl JobId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "print-job-{}", self.0)
    }
}

/// How sheets land in the printer's output tray.
/// 紙張落入出紙匣的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StackingOrientation {
    /// Sheets land printed side down, so the first sheet out stays at the
    /// bottom and the last one ends up on top, face down. Pages go out in order.
    FaceDown,
    /// Sheets land printed side up, so the last sheet out ends up on top and
    /// faces the reader. Pages go out in reverse to put the first page on top.
    FaceUp,
}

impl StackingOrientation {
    pub const fn from_face_down(face_down: bool) -> Self {
        if face_down {
            Self::FaceDown
        } else {
            Self::FaceUp
        }
    }
}

/// Duplex (two-sided) printing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplexMode {
    #[default]
    Off,
    LongEdge,
    ShortEdge,
}

/// Margin values expressed in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margin {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margin {
    pub const fn zero() -> Self {
        Self {
            top: 0.0,
            bottom: 0.0,
            left: 0.0,
            right: 0.0,
        }
    }
}

/// Input formats a printer accepts, as advertised during capability discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputFormats(u32);

impl InputFormats {
    pub const PDF: Self = Self(1 << 0);
    pub const PCLM: Self = Self(1 << 1);
    pub const PWG_RASTER: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Number of formats advertised.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// One input file of a job.
/// 列印作業中的單一輸入檔案。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub path: PathBuf,
    pub mime_type: String,
    /// Pages in the document; 0 for content that is not paginated.
    #[serde(default)]
    pub page_count: u32,
}

impl DocumentDescriptor {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, page_count: u32) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            page_count,
        }
    }

    /// A document is paginated when it is a PDF with a usable path.
    pub fn is_paginated(&self) -> bool {
        self.mime_type == MIME_TYPE_PDF && !self.path.as_os_str().is_empty()
    }
}

/// Feature capabilities exposed by a printer. Read-only for the lifetime of a job.
/// 印表機公開的功能資訊，在作業期間不可變更。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterCapabilities {
    pub name: String,
    pub uuid: String,
    pub path: String,
    pub face_down_tray: bool,
    pub supported_scalings: Vec<String>,
    pub default_scaling: String,
    pub media_default: String,
    pub supported_media_types: Vec<u32>,
    pub supported_media_sizes: Vec<u32>,
    pub ipp_version_major: u32,
    pub ipp_version_minor: u32,
    pub supported_input_formats: InputFormats,
    pub duplex: bool,
    pub borderless: bool,
    pub color: bool,
    pub is_supported: bool,
    pub certificate: Option<Vec<u8>>,
}

impl Default for PrinterCapabilities {
    fn default() -> Self {
        Self {
            name: String::new(),
            uuid: String::new(),
            path: String::new(),
            face_down_tray: true,
            supported_scalings: Vec::new(),
            default_scaling: String::new(),
            media_default: String::new(),
            supported_media_types: Vec::new(),
            supported_media_sizes: Vec::new(),
            ipp_version_major: 1,
            ipp_version_minor: 1,
            supported_input_formats: InputFormats::empty(),
            duplex: false,
            borderless: false,
            color: false,
            is_supported: true,
            certificate: None,
        }
    }
}

impl PrinterCapabilities {
    pub fn stacking(&self) -> StackingOrientation {
        StackingOrientation::from_face_down(self.face_down_tray)
    }

    pub fn supports_scaling(&self, mode: &str) -> bool {
        self.supported_scalings.iter().any(|value| value == mode)
    }
}

/// Parameters of a job, refined by the caller and finalized before submission.
/// 作業參數：由呼叫端調整，送出前再由核心定稿。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobParameters {
    pub job_name: String,
    pub originating_user: String,
    pub num_copies: u32,
    pub duplex: DuplexMode,
    pub render: RenderRequest,
    pub alignment: Alignment,
    #[serde(skip)]
    pub render_flags: RenderFlags,
    pub page_margins: Margin,
    pub job_margins: Margin,
    pub document_category: String,
    pub page_range: Option<String>,
    pub shared_photo: bool,
    pub preserve_scaling: bool,
    pub print_scaling: String,
    pub job_pages_per_set: u32,
    pub certificate: Option<Vec<u8>>,
}

impl Default for JobParameters {
    fn default() -> Self {
        Self {
            job_name: String::new(),
            originating_user: String::new(),
            num_copies: 1,
            duplex: DuplexMode::Off,
            render: RenderRequest::default(),
            alignment: Alignment::default(),
            render_flags: RenderFlags::empty(),
            page_margins: Margin::zero(),
            job_margins: Margin::zero(),
            document_category: String::new(),
            page_range: None,
            shared_photo: false,
            preserve_scaling: false,
            print_scaling: String::new(),
            job_pages_per_set: 0,
            certificate: None,
        }
    }
}
