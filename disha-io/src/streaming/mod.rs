//! Output streaming for DishaIO

pub mod messages;
pub mod sink;

pub use messages::{InertialEstimate, OutputSample, PoseEstimate};
pub use sink::{ChannelSink, LogSink, OutputSink};
