//! # Position Protocol
//!
//! ```text
//! ┌──────────────────┬──────────────────┐
//! │  x : f64 native  │  y : f64 native  │   16 bytes, nothing else
//! └──────────────────┴──────────────────┘
//! ```
//!
//! No header, version, sequence number or checksum beyond the UDP one.
//! Native byte order: all peers are assumed to share an architecture. This
//! is not a portable interchange format.

mod codec;

pub use codec::{PositionCodec, PositionSample, PAYLOAD_SIZE};
