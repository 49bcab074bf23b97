// Concrete automation engine and device probe
pub mod adb;
pub mod command;

pub use adb::AdbDeviceProbe;
pub use command::CommandEngine;
