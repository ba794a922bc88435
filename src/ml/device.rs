// ============================================================
// Layer 5 — Device Selection
// ============================================================
// Made once at process start and never revisited:
//
//   auto → WGPU if a non-CPU adapter answers, else NdArray (CPU)
//   gpu  → WGPU unconditionally
//   cpu  → NdArray unconditionally
//
// The chosen variant also fixes the Burn backend type the rest
// of the run is monomorphised over.

use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Gpu,
    Cpu,
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePreference::Auto => write!(f, "auto"),
            DevicePreference::Gpu  => write!(f, "gpu"),
            DevicePreference::Cpu  => write!(f, "cpu"),
        }
    }
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "gpu"  => Ok(DevicePreference::Gpu),
            "cpu"  => Ok(DevicePreference::Cpu),
            other  => Err(format!("unknown device '{other}' (expected auto, gpu or cpu)")),
        }
    }
}

/// The device every parameter and batch lives on for this process
#[derive(Debug, Clone)]
pub enum ComputeDevice {
    Accelerator(WgpuDevice),
    Cpu(NdArrayDevice),
}

impl ComputeDevice {
    pub fn select(preference: DevicePreference) -> Self {
        let use_accelerator = match preference {
            DevicePreference::Gpu  => true,
            DevicePreference::Cpu  => false,
            DevicePreference::Auto => accelerator_available(),
        };

        if use_accelerator {
            ComputeDevice::Accelerator(WgpuDevice::default())
        } else {
            ComputeDevice::Cpu(NdArrayDevice::Cpu)
        }
    }

    pub fn is_accelerator(&self) -> bool {
        matches!(self, ComputeDevice::Accelerator(_))
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Accelerator(d) => write!(f, "wgpu ({d:?})"),
            ComputeDevice::Cpu(_)         => write!(f, "cpu (ndarray)"),
        }
    }
}

/// Ask wgpu for a high-performance adapter; software (CPU)
/// adapters do not count.
pub fn accelerator_available() -> bool {
    let instance = wgpu::Instance::default();
    let adapter  = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference:       wgpu::PowerPreference::HighPerformance,
        force_fallback_adapter: false,
        compatible_surface:     None,
    }));

    match adapter {
        Some(adapter) => {
            let info = adapter.get_info();
            tracing::debug!("Found adapter '{}' ({:?}, {:?})", info.name, info.device_type, info.backend);
            info.device_type != wgpu::DeviceType::Cpu
        }
        None => {
            tracing::debug!("No wgpu adapter found");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_parsing() {
        assert_eq!("AUTO".parse::<DevicePreference>().unwrap(), DevicePreference::Auto);
        assert_eq!("cpu".parse::<DevicePreference>().unwrap(), DevicePreference::Cpu);
        assert!("tpu".parse::<DevicePreference>().is_err());
        assert_eq!(DevicePreference::Gpu.to_string(), "gpu");
    }

    #[test]
    fn test_forced_cpu_skips_adapter_lookup() {
        let device = ComputeDevice::select(DevicePreference::Cpu);
        assert!(!device.is_accelerator());
        assert_eq!(device.to_string(), "cpu (ndarray)");
    }
}
