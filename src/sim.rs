//! In-process DAC that plays frames against the wall clock.
//!
//! A simulated device reports busy until the previously written frame has
//! finished playing (`samples / pps`), then ready. Every write is marshalled
//! through [`layout`](crate::layout) exactly as a real driver would receive
//! it and recorded in a shared [`WriteLog`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::dac::{Dac, DeviceStatus};
use crate::error::{Error, Result};
use crate::layout::{encode_samples, PointFormat};
use crate::types::{Frame, Sample};

/// One frame accepted by a simulated device.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub device: usize,
    /// When the write call started.
    pub at: Instant,
    /// Number of samples in the frame.
    pub samples: usize,
    /// The frame as marshalled for the driver.
    pub bytes: Vec<u8>,
    /// First sample of the frame, handy for telling frames apart.
    pub first: Sample,
}

/// Shared, append-only record of simulated writes.
///
/// Clones observe the same log, so a test can keep one while the DAC is
/// moved onto the output thread.
#[derive(Debug, Clone, Default)]
pub struct WriteLog {
    records: Arc<Mutex<Vec<WriteRecord>>>,
}

impl WriteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<WriteRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Records written to `device`, in order.
    pub fn for_device(&self, device: usize) -> Vec<WriteRecord> {
        self.lock()
            .iter()
            .filter(|r| r.device == device)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, record: WriteRecord) {
        self.lock().push(record);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WriteRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Default)]
struct SimDevice {
    busy_until: Option<Instant>,
}

/// A set of simulated devices sharing one point format.
#[derive(Debug)]
pub struct SimulatedDac {
    devices: Vec<SimDevice>,
    format: PointFormat,
    always_ready: bool,
    log: WriteLog,
}

impl SimulatedDac {
    /// `devices` simulated devices expecting `format`.
    pub fn new(devices: usize, format: PointFormat) -> Self {
        Self {
            devices: (0..devices).map(|_| SimDevice::default()).collect(),
            format,
            always_ready: false,
            log: WriteLog::new(),
        }
    }

    /// A variant whose devices never report busy.
    pub fn always_ready(devices: usize, format: PointFormat) -> Self {
        Self {
            always_ready: true,
            ..Self::new(devices, format)
        }
    }

    pub fn format(&self) -> PointFormat {
        self.format
    }

    /// Handle to the write log.
    pub fn log(&self) -> WriteLog {
        self.log.clone()
    }

    fn device_mut(&mut self, device: usize) -> Result<&mut SimDevice> {
        let count = self.devices.len();
        self.devices.get_mut(device).ok_or_else(|| {
            Error::invalid_config(format!("device {} out of range ({} devices)", device, count))
        })
    }
}

impl Dac for SimulatedDac {
    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn status(&mut self, device: usize) -> DeviceStatus {
        let always_ready = self.always_ready;
        match self.devices.get(device) {
            None => DeviceStatus::Error(-1),
            Some(_) if always_ready => DeviceStatus::Ready,
            Some(d) => match d.busy_until {
                Some(until) if Instant::now() < until => DeviceStatus::Busy,
                _ => DeviceStatus::Ready,
            },
        }
    }

    fn write_frame(&mut self, device: usize, frame: &Frame) -> Result<()> {
        let at = Instant::now();
        let bytes = encode_samples(&frame.samples, self.format)?;
        let first = frame.samples.first().copied().unwrap_or_default();

        self.device_mut(device)?.busy_until = Some(at + frame.duration());
        log::debug!(
            "sim device {}: {} samples at {} pps ({} bytes)",
            device,
            frame.len(),
            frame.pps,
            bytes.len()
        );
        self.log.push(WriteRecord {
            device,
            at,
            samples: frame.len(),
            bytes,
            first,
        });
        Ok(())
    }

    fn stop(&mut self, device: usize) -> Result<()> {
        self.device_mut(device)?.busy_until = None;
        Ok(())
    }
}
