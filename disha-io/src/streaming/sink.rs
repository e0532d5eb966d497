//! Output sinks
//!
//! The session hands every [`OutputSample`] to an [`OutputSink`]. Sinks never
//! block the driver loop: a slow consumer loses samples, not sensor frames.

use super::messages::OutputSample;
use crate::config::OutputConfig;
use crate::error::Result;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Consumer of periodic integration output
pub trait OutputSink {
    fn publish(&mut self, sample: &OutputSample) -> Result<()>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn publish(&mut self, sample: &OutputSample) -> Result<()> {
        (**self).publish(sample)
    }
}

/// Writes each output as a log line
#[derive(Debug, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn publish(&mut self, sample: &OutputSample) -> Result<()> {
        let q = &sample.inertial.orientation;
        let p = &sample.pose.position;
        log::info!(
            "#{} t={}us yaw_q=[{:.6} {:.6} {:.6} {:.6}] pos=[{:.3} {:.3} {:.3}]",
            sample.sequence,
            sample.timestamp_us,
            q.w,
            q.x,
            q.y,
            q.z,
            p[0],
            p[1],
            p[2]
        );
        Ok(())
    }
}

/// Hands outputs to another thread over a bounded channel
pub struct ChannelSink {
    tx: Sender<OutputSample>,
    dropped: u64,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn bounded(capacity: usize) -> (Self, Receiver<OutputSample>) {
        let (tx, rx) = bounded(capacity.max(1));
        (Self { tx, dropped: 0 }, rx)
    }

    /// Create a sink sized by `output.channel_capacity`
    pub fn from_config(output: &OutputConfig) -> (Self, Receiver<OutputSample>) {
        Self::bounded(output.channel_capacity)
    }

    /// Outputs lost to a full or closed channel
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl OutputSink for ChannelSink {
    fn publish(&mut self, sample: &OutputSample) -> Result<()> {
        // Use try_send to avoid blocking the driver loop if the consumer lags
        match self.tx.try_send(sample.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::warn!("Output channel full, dropped sample #{}", sample.sequence);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                log::warn!("Output receiver gone, dropped sample #{}", sample.sequence);
            }
        }
        Ok(())
    }
}
