//! Confluent wire format: a zero magic byte, the big-endian schema id, then the Avro datum.

use crate::error::{ErrorKind, RelayResult};
use crate::relay_error;

pub const MAGIC_BYTE: u8 = 0;

/// Length of the magic byte plus the schema id.
pub const HEADER_LEN: usize = 5;

/// Prefixes `datum` with the wire format header for `schema_id`.
pub fn encode(schema_id: u32, datum: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(HEADER_LEN + datum.len());
    payload.push(MAGIC_BYTE);
    payload.extend_from_slice(&schema_id.to_be_bytes());
    payload.extend_from_slice(datum);
    payload
}

/// Splits a payload into its schema id and Avro datum.
pub fn decode(payload: &[u8]) -> RelayResult<(u32, &[u8])> {
    if payload.len() < HEADER_LEN {
        return Err(relay_error!(
            ErrorKind::DeserializationError,
            "Payload is shorter than the wire format header",
            format!("{} bytes", payload.len())
        ));
    }

    let (header, datum) = payload.split_at(HEADER_LEN);
    if header[0] != MAGIC_BYTE {
        return Err(relay_error!(
            ErrorKind::DeserializationError,
            "Unknown magic byte",
            header[0]
        ));
    }

    let schema_id = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

    Ok((schema_id, datum))
}
