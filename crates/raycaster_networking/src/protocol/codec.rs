//! Position payload encoding.

use bytemuck::{Pod, Zeroable};

/// One position update: where a peer stands, in map cells.
///
/// Carries no timestamp or sequence number. Whatever arrives last is applied.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PositionSample {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl PositionSample {
    /// Creates a sample.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of an encoded sample on the wire.
pub const PAYLOAD_SIZE: usize = std::mem::size_of::<PositionSample>();

/// Encoder/decoder for the fixed-size position payload.
pub struct PositionCodec;

impl PositionCodec {
    /// Encodes a sample as two native-endian doubles.
    #[inline]
    #[must_use]
    pub fn encode(sample: &PositionSample) -> [u8; PAYLOAD_SIZE] {
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(bytemuck::bytes_of(sample));
        payload
    }

    /// Decodes a payload.
    ///
    /// Returns `None` unless the payload is exactly [`PAYLOAD_SIZE`] bytes.
    #[inline]
    #[must_use]
    pub fn decode(payload: &[u8]) -> Option<PositionSample> {
        bytemuck::try_pod_read_unaligned(payload).ok()
    }
}
