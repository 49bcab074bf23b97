pub mod automation;
pub mod device;

pub use automation::{AutomationEngine, AutomationOutcome, AutomationRequest, SessionContext};
pub use device::DeviceProbe;
