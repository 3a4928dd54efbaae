//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::ReaderError;
use async_trait::async_trait;

/// The camera: reads one QR value per call.
#[async_trait]
pub trait QrReader: Send + Sync {
    /// Wait for the next decoded QR value.
    async fn read(&self) -> Result<String, ReaderError>;
}
