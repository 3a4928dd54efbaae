//! In-process QR readers.
//!
//! `ScriptedReader` plays back a fixed list of reads; `ChannelReader` yields
//! whatever a simulated device pushes through its [`QrFeed`].

use crate::domain::ReaderError;
use crate::ports::QrReader;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Reader returning pre-recorded results in order, then `Closed`.
pub struct ScriptedReader {
    reads: Mutex<VecDeque<Result<String, ReaderError>>>,
}

impl ScriptedReader {
    /// Reader that successfully reads each of `values`.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(values.into_iter().map(|v| Ok(v.into())))
    }

    /// Reader replaying arbitrary results.
    pub fn from_results<I>(reads: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ReaderError>>,
    {
        Self {
            reads: Mutex::new(reads.into_iter().collect()),
        }
    }

    /// Reads left before the reader reports `Closed`.
    pub fn remaining(&self) -> usize {
        self.reads.lock().len()
    }
}

#[async_trait]
impl QrReader for ScriptedReader {
    async fn read(&self) -> Result<String, ReaderError> {
        self.reads.lock().pop_front().unwrap_or(Err(ReaderError::Closed))
    }
}

/// Sending half of a [`ChannelReader`].
#[derive(Clone)]
pub struct QrFeed {
    sender: mpsc::UnboundedSender<Result<String, ReaderError>>,
}

impl QrFeed {
    /// Present `value` to the camera. Returns false once the reader is gone.
    pub fn show(&self, value: impl Into<String>) -> bool {
        self.sender.send(Ok(value.into())).is_ok()
    }

    /// Make the next read fail with `error`.
    pub fn fail(&self, error: ReaderError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }
}

/// Reader fed asynchronously through a [`QrFeed`].
pub struct ChannelReader {
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<String, ReaderError>>>,
}

impl ChannelReader {
    /// Create a connected feed and reader.
    pub fn channel() -> (QrFeed, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            QrFeed { sender },
            Self {
                receiver: tokio::sync::Mutex::new(receiver),
            },
        )
    }
}

#[async_trait]
impl QrReader for ChannelReader {
    async fn read(&self) -> Result<String, ReaderError> {
        self.receiver
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(Err(ReaderError::Closed))
    }
}
