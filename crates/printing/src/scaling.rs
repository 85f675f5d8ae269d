use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::job::{InputFormats, JobParameters, PrinterCapabilities, MIME_TYPE_PDF};

pub const SCALING_NONE: &str = "none";
pub const SCALING_AUTO: &str = "auto";
pub const SCALING_FIT: &str = "fit";

/// Document category that asks for untouched photo output when shared.
pub const CATEGORY_PHOTO: &str = "Photo";

/// Format the job is transmitted in.
/// 作業實際傳送時所採用的格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransmissionFormat {
    /// Original PDF content sent as is.
    Pdf,
    Pclm,
    PwgRaster,
}

impl TransmissionFormat {
    /// Picks the format for a job of `mime_type` on a printer with `capabilities`.
    ///
    /// PDF content is passed through when the printer accepts PDF; everything
    /// else is rasterized, preferring PWG raster over PCLm.
    pub fn detect(mime_type: &str, capabilities: &PrinterCapabilities) -> Self {
        let formats = capabilities.supported_input_formats;
        if mime_type == MIME_TYPE_PDF && formats.contains(InputFormats::PDF) {
            Self::Pdf
        } else if formats.contains(InputFormats::PWG_RASTER) {
            Self::PwgRaster
        } else {
            Self::Pclm
        }
    }

    pub const fn is_passthrough(self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for TransmissionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdf => "application/pdf",
            Self::Pclm => "application/PCLm",
            Self::PwgRaster => "image/pwg-raster",
        };
        f.write_str(name)
    }
}

fn supported_or_unset(capabilities: &PrinterCapabilities, mode: &str) -> String {
    if capabilities.supports_scaling(mode) {
        mode.to_string()
    } else {
        String::new()
    }
}

/// Chooses the print-scaling directive for a job. An empty string means no
/// directive is sent.
pub fn select_print_scaling(
    format: TransmissionFormat,
    capabilities: &PrinterCapabilities,
    params: &JobParameters,
) -> String {
    if !format.is_passthrough() {
        return supported_or_unset(capabilities, SCALING_NONE);
    }

    let is_photo = params.document_category.eq_ignore_ascii_case(CATEGORY_PHOTO);
    if (is_photo && params.shared_photo) || params.preserve_scaling {
        return supported_or_unset(capabilities, SCALING_NONE);
    }

    if capabilities.supports_scaling(SCALING_AUTO) {
        SCALING_AUTO.to_string()
    } else if !capabilities.default_scaling.is_empty() {
        capabilities.default_scaling.clone()
    } else {
        SCALING_FIT.to_string()
    }
}

/// Selects the scaling for `params` and stores it there.
pub fn apply_print_scaling(
    format: TransmissionFormat,
    capabilities: &PrinterCapabilities,
    params: &mut JobParameters,
) {
    let scaling = select_print_scaling(format, capabilities, params);
    debug!(
        %format,
        shared_photo = params.shared_photo,
        preserve_scaling = params.preserve_scaling,
        scaling = %scaling,
        "setting print-scaling job param"
    );
    params.print_scaling = scaling;
}
