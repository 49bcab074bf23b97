use async_trait::async_trait;

/// Reports whether an authorized device is attached.
///
/// Implementations swallow their own failures: anything that goes wrong
/// while probing means "not connected".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceProbe: Send + Sync {
    async fn is_connected(&self) -> bool;
}
