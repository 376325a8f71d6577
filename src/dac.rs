//! Contract with the DAC driver that carries frames to hardware.
//!
//! Device discovery, handle lifecycle and transport live outside this
//! crate. The pipeline only needs a device count, a polled readiness
//! signal and a frame write call.

use crate::error::Result;
use crate::types::Frame;

/// Readiness reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    /// The device accepts the next frame.
    Ready,
    /// The device is still playing the previous frame.
    Busy,
    /// The driver reported an error code (always negative).
    Error(i32),
}

impl DeviceStatus {
    /// Maps a raw SDK status code: `1` ready, `< 0` error, anything else busy.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => DeviceStatus::Ready,
            c if c < 0 => DeviceStatus::Error(c),
            _ => DeviceStatus::Busy,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceStatus::Ready)
    }
}

/// A set of opened DAC devices.
///
/// Implementations wrap a vendor driver. They are moved onto the output
/// thread and handed back when the pipeline is joined, so the caller can
/// stop and close the devices afterwards.
pub trait Dac: Send + 'static {
    /// Number of opened devices. Zero means the pipeline refuses to start.
    fn device_count(&self) -> usize;

    /// Polls the readiness of `device`.
    fn status(&mut self, device: usize) -> DeviceStatus;

    /// Writes one frame to `device`.
    ///
    /// The pipeline only calls this with a non-empty frame and `pps > 0`.
    fn write_frame(&mut self, device: usize, frame: &Frame) -> Result<()>;

    /// Stops output on `device` until a new frame is written.
    ///
    /// Never called by the pipeline itself.
    fn stop(&mut self, _device: usize) -> Result<()> {
        Ok(())
    }
}

impl<D: Dac + ?Sized> Dac for Box<D> {
    fn device_count(&self) -> usize {
        (**self).device_count()
    }

    fn status(&mut self, device: usize) -> DeviceStatus {
        (**self).status(device)
    }

    fn write_frame(&mut self, device: usize, frame: &Frame) -> Result<()> {
        (**self).write_frame(device, frame)
    }

    fn stop(&mut self, device: usize) -> Result<()> {
        (**self).stop(device)
    }
}
