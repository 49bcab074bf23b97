pub mod engines;
pub mod extractors;
pub mod traits;

pub use engines::{AdbDeviceProbe, CommandEngine};
pub use extractors::{PriceExtractor, ProductLabelExtractor};
pub use traits::{AutomationEngine, DeviceProbe};
