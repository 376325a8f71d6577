//! Byte layout of samples as consumed by the Helios SDK point structs.
//!
//! All fields are little-endian, packed in declaration order:
//!
//! | Format | Size | Fields |
//! | --- | --- | --- |
//! | `Standard` | 8 | `x u16, y u16, r u8, g u8, b u8, i u8` |
//! | `HighResolution` | 10 | `x u16, y u16, r u16, g u16, b u16` |
//! | `Extended` | 20 | `x, y, r, g, b, i, user1..user4` (all `u16`) |
//!
//! Output adapters must pass these bytes through unchanged.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::types::{Sample, GALVO_MAX};

/// Point struct flavor expected by the device driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointFormat {
    /// 12-bit XY, 8-bit color and intensity.
    #[default]
    Standard,
    /// 12-bit XY, 16-bit RGB, no intensity.
    HighResolution,
    /// 12-bit XY, 16-bit color, intensity and four user channels.
    Extended,
}

impl PointFormat {
    /// Encoded size of one sample in bytes.
    pub fn point_size(self) -> usize {
        match self {
            PointFormat::Standard => 8,
            PointFormat::HighResolution => 10,
            PointFormat::Extended => 20,
        }
    }
}

/// Writes `samples` to `writer` in the given format.
///
/// The whole slice is range-checked first; on error nothing is written.
pub fn write_samples<W: Write>(
    writer: &mut W,
    samples: &[Sample],
    format: PointFormat,
) -> Result<()> {
    if let Some(s) = samples.iter().find(|s| s.x > GALVO_MAX || s.y > GALVO_MAX) {
        return Err(Error::CoordinateOutOfRange {
            x: s.x as f64,
            y: s.y as f64,
        });
    }

    for s in samples {
        writer.write_u16::<LittleEndian>(s.x)?;
        writer.write_u16::<LittleEndian>(s.y)?;

        let c = s.color;
        match format {
            PointFormat::Standard => {
                let (r, g, b, i) = c.to_rgb8();
                writer.write_all(&[r, g, b, i])?;
            }
            PointFormat::HighResolution => {
                for ch in [c.r, c.g, c.b] {
                    writer.write_u16::<LittleEndian>(ch)?;
                }
            }
            PointFormat::Extended => {
                for ch in [c.r, c.g, c.b, c.intensity, 0, 0, 0, 0] {
                    writer.write_u16::<LittleEndian>(ch)?;
                }
            }
        }
    }
    Ok(())
}

/// Encodes `samples` into a freshly allocated buffer.
pub fn encode_samples(samples: &[Sample], format: PointFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(samples.len() * format.point_size());
    write_samples(&mut buf, samples, format)?;
    Ok(buf)
}
