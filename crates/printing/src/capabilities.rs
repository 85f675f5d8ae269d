use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::SequencerConfig;
use crate::job::PrinterCapabilities;
use crate::platform::CapabilityProvider;

/// Where and how to reach a printer.
/// 連線至印表機所需的位址與參數。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    pub address: String,
    pub port: u16,
    pub resource: String,
    pub scheme: String,
    pub timeout: Duration,
}

impl ConnectInfo {
    pub fn new(address: impl Into<String>, port: u16, config: &SequencerConfig) -> Self {
        Self {
            address: address.into(),
            port,
            resource: "/ipp/print".to_string(),
            scheme: "ipp".to_string(),
            timeout: config.capability_timeout(),
        }
    }
}

impl fmt::Display for ConnectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}{}",
            self.scheme, self.address, self.port, self.resource
        )
    }
}

/// Capability lookups that produced no answer at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("printer at {target} could not be queried: {message}")]
    Unreachable { target: String, message: String },
}

/// Applies the checks every capability answer goes through.
///
/// A printer that claims support but speaks IPP below 1.0 is marked unsupported.
pub fn finalize_capabilities(mut capabilities: PrinterCapabilities) -> PrinterCapabilities {
    if capabilities.is_supported && capabilities.ipp_version_major < 1 {
        warn!(
            printer = %capabilities.name,
            major = capabilities.ipp_version_major,
            minor = capabilities.ipp_version_minor,
            "IPP version too old, marking printer unsupported"
        );
        capabilities.is_supported = false;
    }
    capabilities
}

/// Queries `provider` and finalizes the answer.
///
/// An unreachable printer is an error; a reachable but unusable one comes back
/// as capabilities with `is_supported == false`.
pub fn fetch_capabilities<P>(
    provider: &P,
    connection: &ConnectInfo,
) -> Result<PrinterCapabilities, CapabilityError>
where
    P: CapabilityProvider + ?Sized,
    P::Error: fmt::Display,
{
    info!(target_uri = %connection, timeout_ms = connection.timeout.as_millis() as u64, "fetching printer capabilities");
    provider
        .fetch(connection)
        .map(finalize_capabilities)
        .map_err(|err| CapabilityError::Unreachable {
            target: connection.to_string(),
            message: err.to_string(),
        })
}
