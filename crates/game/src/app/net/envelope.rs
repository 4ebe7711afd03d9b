//! Size-prefixed command envelopes sent to the remote authority.
//!
//! Frame layout: a little-endian `u32` payload length followed by the bincode
//! encoding of [`ClientPacket`]. The enum variant index is the packet tag.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const LENGTH_PREFIX_BYTES: usize = 4;
pub(crate) const MAX_PAYLOAD_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DropItem {
    pub(crate) item_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum ClientPacket {
    DropItem(DropItem),
}

impl ClientPacket {
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            Self::DropItem(_) => "DropItem",
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum EnvelopeError {
    #[error("failed to encode {tag} packet: {source}")]
    Encode {
        tag: &'static str,
        #[source]
        source: bincode::Error,
    },
    #[cfg(test)]
    #[error("failed to decode packet payload: {0}")]
    Decode(#[source] bincode::Error),
    #[error("packet payload of {len} bytes exceeds the {max} byte limit")]
    Oversized { len: usize, max: usize },
}

pub(crate) fn encode_size_prefixed(packet: &ClientPacket) -> Result<Vec<u8>, EnvelopeError> {
    let payload = bincode::serialize(packet).map_err(|source| EnvelopeError::Encode {
        tag: packet.tag(),
        source,
    })?;
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(EnvelopeError::Oversized {
            len: payload.len(),
            max: MAX_PAYLOAD_BYTES,
        });
    }

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes the first complete frame in `buffer`.
///
/// Returns `Ok(None)` while the frame is still incomplete, otherwise the packet
/// and the number of bytes consumed.
#[cfg(test)]
pub(crate) fn decode_size_prefixed(
    buffer: &[u8],
) -> Result<Option<(ClientPacket, usize)>, EnvelopeError> {
    let Some(prefix) = buffer.get(..LENGTH_PREFIX_BYTES) else {
        return Ok(None);
    };
    let mut len_bytes = [0u8; LENGTH_PREFIX_BYTES];
    len_bytes.copy_from_slice(prefix);
    let payload_len = u32::from_le_bytes(len_bytes) as usize;
    if payload_len > MAX_PAYLOAD_BYTES {
        return Err(EnvelopeError::Oversized {
            len: payload_len,
            max: MAX_PAYLOAD_BYTES,
        });
    }

    let frame_len = LENGTH_PREFIX_BYTES + payload_len;
    let Some(payload) = buffer.get(LENGTH_PREFIX_BYTES..frame_len) else {
        return Ok(None);
    };
    let packet = bincode::deserialize::<ClientPacket>(payload).map_err(EnvelopeError::Decode)?;
    Ok(Some((packet, frame_len)))
}
