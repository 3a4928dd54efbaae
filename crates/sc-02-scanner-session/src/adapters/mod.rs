//! Adapters for the scanner ports.

pub mod camera_bridge;
pub mod readers;

pub use camera_bridge::{CameraBridge, CameraBridgeHandle};
pub use readers::{ChannelReader, QrFeed, ScriptedReader};
