//! Compute device selection

use candle_core::Device;
use paperclass_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device to run inference on.
///
/// Written in config files as `auto`, `cpu`, `cuda`, `cuda:N`, `metal` or
/// `metal:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSpec {
    /// Fastest available: CUDA, then Metal, then CPU
    #[default]
    Auto,
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference
    Cuda(usize),
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl FromStr for DeviceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let (kind, ordinal) = match s.split_once(':') {
            Some((kind, idx)) => {
                let idx = idx
                    .parse::<usize>()
                    .map_err(|_| Error::config(format!("invalid device ordinal in '{}'", s)))?;
                (kind.to_string(), Some(idx))
            }
            None => (s.clone(), None),
        };

        match (kind.as_str(), ordinal) {
            ("auto", None) => Ok(Self::Auto),
            ("cpu", None) => Ok(Self::Cpu),
            ("cuda" | "gpu", idx) => Ok(Self::Cuda(idx.unwrap_or(0))),
            ("metal" | "mps", idx) => Ok(Self::Metal(idx.unwrap_or(0))),
            _ => Err(Error::config(format!(
                "unknown device '{}' (expected auto, cpu, cuda[:N] or metal[:N])",
                s
            ))),
        }
    }
}

impl TryFrom<String> for DeviceSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceSpec> for String {
    fn from(spec: DeviceSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{}", idx),
            Self::Metal(idx) => write!(f, "metal:{}", idx),
        }
    }
}

/// Create the Candle device for a spec.
///
/// `Auto` never fails: it falls back to the CPU when no accelerator was
/// compiled in or none is present. An explicit accelerator that cannot be
/// opened is an error.
pub fn select_device(spec: DeviceSpec) -> Result<Device> {
    match spec {
        DeviceSpec::Auto => {
            if candle_core::utils::cuda_is_available() {
                match Device::new_cuda(0) {
                    Ok(device) => return Ok(device),
                    Err(e) => tracing::warn!("CUDA reported available but failed to open: {}", e),
                }
            }
            if candle_core::utils::metal_is_available() {
                match Device::new_metal(0) {
                    Ok(device) => return Ok(device),
                    Err(e) => tracing::warn!("Metal reported available but failed to open: {}", e),
                }
            }
            Ok(Device::Cpu)
        }
        DeviceSpec::Cpu => Ok(Device::Cpu),
        DeviceSpec::Cuda(idx) => Device::new_cuda(idx)
            .map_err(|e| Error::model_load(format!("Failed to create CUDA device {}: {}", idx, e))),
        DeviceSpec::Metal(idx) => Device::new_metal(idx)
            .map_err(|e| Error::model_load(format!("Failed to create Metal device {}: {}", idx, e))),
    }
}

/// Short name of a device for logs
pub fn device_name(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}
