use std::fmt;

use crate::Device;

/// Selects which registered kernel backs a schema for a device class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchKey {
    Cpu,
    Cuda,
    Hip,
}

impl DispatchKey {
    pub fn name(self) -> &'static str {
        match self {
            DispatchKey::Cpu => "CPU",
            DispatchKey::Cuda => "CUDA",
            DispatchKey::Hip => "HIP",
        }
    }
}

impl From<Device> for DispatchKey {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => DispatchKey::Cpu,
            Device::Cuda { .. } => DispatchKey::Cuda,
            Device::Hip { .. } => DispatchKey::Hip,
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
