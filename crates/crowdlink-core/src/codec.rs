//! Identity payload codec
//!
//! Two payload encodings are in circulation and receivers accept both without
//! negotiation:
//!
//! - **Packed UUID**: exactly 16 bytes, two big-endian `u64` halves of a
//!   128-bit token, rendered back as `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
//! - **UTF-8**: the raw bytes of the identity string, at most
//!   `max_payload_len` bytes.
//!
//! Decoding tries packed UUID first for 16-byte payloads, then UTF-8, then the
//! transport address. A 16-byte payload only counts as a UUID when its variant
//! bits are not NCS (byte 8 at or above `0x80`). ASCII text always lands in the
//! NCS range, so a truncated 16-byte UTF-8 identity still decodes as text; the
//! price is that NCS-variant tokens, the nil UUID among them, travel as text.
//!
//! Encoding UTF-8 identities longer than the limit is lossy: the bytes are cut
//! at the last character boundary that fits. Receivers see the prefix.

use uuid::{Uuid, Variant};

use crate::config::CodecConfig;
use crate::types::DeviceIdentity;

/// Length of a packed 128-bit identity payload
pub const PACKED_UUID_LEN: usize = 16;

// ----------------------------------------------------------------------------
// Decode Outcome
// ----------------------------------------------------------------------------

/// How a payload was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadOutcome {
    /// 16-byte packed 128-bit token
    Uuid(DeviceIdentity),
    /// Raw UTF-8 identity string
    Utf8(DeviceIdentity),
    /// No decodable payload; the transport address stands in
    Address(DeviceIdentity),
    /// Neither payload nor address usable
    Unresolved,
}

impl PayloadOutcome {
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        match self {
            PayloadOutcome::Uuid(id) | PayloadOutcome::Utf8(id) | PayloadOutcome::Address(id) => {
                Some(id)
            }
            PayloadOutcome::Unresolved => None,
        }
    }

    pub fn into_identity(self) -> Option<DeviceIdentity> {
        match self {
            PayloadOutcome::Uuid(id) | PayloadOutcome::Utf8(id) | PayloadOutcome::Address(id) => {
                Some(id)
            }
            PayloadOutcome::Unresolved => None,
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            PayloadOutcome::Uuid(_) => "uuid",
            PayloadOutcome::Utf8(_) => "utf8",
            PayloadOutcome::Address(_) => "address",
            PayloadOutcome::Unresolved => "unresolved",
        }
    }
}

// ----------------------------------------------------------------------------
// Codec
// ----------------------------------------------------------------------------

/// Encodes identities into advertisement payloads and back
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec {
    config: CodecConfig,
}

impl IdentityCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn max_payload_len(&self) -> usize {
        self.config.max_payload_len
    }

    /// Encode an identity for broadcast
    ///
    /// Canonical UUID strings become the 16-byte packed form. Anything else is
    /// sent as UTF-8, truncated to `max_payload_len` bytes.
    pub fn encode(&self, identity: &str) -> Vec<u8> {
        if let Some(uuid) = parse_canonical_uuid(identity) {
            let (high, low) = uuid.as_u64_pair();
            let mut payload = Vec::with_capacity(PACKED_UUID_LEN);
            payload.extend_from_slice(&high.to_be_bytes());
            payload.extend_from_slice(&low.to_be_bytes());
            return payload;
        }

        let cut = truncation_point(identity, self.config.max_payload_len);
        identity.as_bytes()[..cut].to_vec()
    }

    /// Decode a payload to an identity, falling back to `fallback`
    ///
    /// Returns the fallback verbatim (possibly empty) when nothing decodes.
    pub fn decode(&self, payload: &[u8], fallback: &str) -> String {
        self.decode_outcome(Some(payload), fallback)
            .into_identity()
            .map(DeviceIdentity::into_inner)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Decode with the interpretation made explicit
    pub fn decode_outcome(&self, payload: Option<&[u8]>, fallback: &str) -> PayloadOutcome {
        if let Some(bytes) = payload {
            if let Some(uuid) = unpack_uuid(bytes) {
                return PayloadOutcome::Uuid(DeviceIdentity::new(uuid.hyphenated().to_string()));
            }
            if let Some(text) = decode_utf8(bytes) {
                return PayloadOutcome::Utf8(DeviceIdentity::new(text));
            }
        }

        if fallback.trim().is_empty() {
            PayloadOutcome::Unresolved
        } else {
            PayloadOutcome::Address(DeviceIdentity::new(fallback))
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Lowercase hyphenated non-NCS UUID, the only form that round-trips packed
fn parse_canonical_uuid(identity: &str) -> Option<Uuid> {
    let uuid = Uuid::try_parse(identity).ok()?;
    if uuid.get_variant() == Variant::NCS {
        return None;
    }
    let mut buf = Uuid::encode_buffer();
    if uuid.hyphenated().encode_lower(&mut buf) == identity {
        Some(uuid)
    } else {
        None
    }
}

fn unpack_uuid(bytes: &[u8]) -> Option<Uuid> {
    if bytes.len() != PACKED_UUID_LEN {
        return None;
    }
    let high = u64::from_be_bytes(bytes[..8].try_into().ok()?);
    let low = u64::from_be_bytes(bytes[8..].try_into().ok()?);
    let uuid = Uuid::from_u64_pair(high, low);
    (uuid.get_variant() != Variant::NCS).then_some(uuid)
}

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let text = core::str::from_utf8(bytes).ok()?;
    let text = text.trim_end_matches('\0');
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Largest char boundary at or below `max_len`
fn truncation_point(identity: &str, max_len: usize) -> usize {
    if identity.len() <= max_len {
        return identity.len();
    }
    let mut cut = max_len;
    while !identity.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
