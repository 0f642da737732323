//! Binary configuration decoders for fmtp values.
//!
//! - AAC `config=` is hex pairs (RFC 3640 §4.1), exactly two bytes for the
//!   AudioSpecificConfig forms we accept.
//! - H.264/H.265 `sprop-*` parameter sets are base64 (RFC 6184 §8.1,
//!   RFC 7798 §7.1).

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{Error, Result};

/// Standard alphabet; accepts both padded and unpadded input, which is
/// what cameras actually send.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode hex pairs into bytes.
pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(value.trim())?)
}

/// Decode a two-byte AAC AudioSpecificConfig from four hex characters.
///
/// ```
/// use media_factory::decode::decode_aac_config;
///
/// assert_eq!(decode_aac_config("1210").unwrap(), [0x12, 0x10]);
/// assert!(decode_aac_config("121").is_err());
/// ```
pub fn decode_aac_config(value: &str) -> Result<[u8; 2]> {
    let bytes = decode_hex(value)?;
    <[u8; 2]>::try_from(bytes.as_slice()).map_err(|_| Error::ConfigLength {
        expected: 2,
        actual: bytes.len(),
    })
}

/// Decode a base64 parameter set.
///
/// A single trailing `;` left over from attribute splitting is ignored.
pub fn decode_base64(value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    let value = value.strip_suffix(';').unwrap_or(value);
    Ok(LENIENT_BASE64.decode(value.trim_end())?)
}
