//! Job sequencing core for network printers: page ranges, transmission order,
//! scaling policy and status decoding shared by the CLI and transports.

pub mod callback;
pub mod capabilities;
pub mod config;
pub mod controller;
pub mod job;
pub mod order;
pub mod platform;
pub mod range;
pub mod reasons;
pub mod render;
pub mod scaling;

pub use callback::{
    build_event, clear_listener, dispatch_notification, install_listener, CallbackDispatcher,
    JobCallbackEvent, JobListener, JobOutcome, JobState, RawJobNotification,
};
pub use capabilities::{fetch_capabilities, finalize_capabilities, CapabilityError, ConnectInfo};
pub use config::{ConfigError, SequencerConfig, SourceInfo};
pub use controller::{
    prepare_job, submit_job, JobSubmission, PreparedJob, SubmitError, SubmittedJob,
};
pub use job::{
    DocumentDescriptor, DuplexMode, InputFormats, JobId, JobParameters, Margin,
    PrinterCapabilities, StackingOrientation, MIME_TYPE_PDF,
};
pub use order::{
    apply_smart_duplex, compose_job, document_order, transmission_order, transmit_plan, JobPlan,
    PreparedDocument, TransmitError,
};
pub use platform::{
    CapabilityProvider, JobController, PageCrop, PageRequest, PageTransmitter, StartRequest,
};
pub use range::{resolve_page_range, RangeError, ResolvedRange};
pub use reasons::{
    count_reason_bits, decode_kind, decode_reasons, BlockedReason, FailedReason, ReasonEntry,
    ReasonKind, ReasonSet, BLOCKED_REASON_TABLE, FAILED_REASON_TABLE,
};
pub use render::{Alignment, RenderFlags, RenderRequest};
pub use scaling::{apply_print_scaling, select_print_scaling, TransmissionFormat};
