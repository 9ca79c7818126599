//! Outbound HTTP clients.

pub mod vision;

pub use vision::{ChatReply, ClassifierError, EncodedImage, VisionClient};
