//! Field values and their canonical hex encodings.
//!
//! Circuits take every input as a field element. The host side keeps them as
//! 256-bit unsigned integers in big-endian byte order and renders them as
//! `0x`-prefixed hex at a width agreed with the circuit revision. Geometry
//! needs signed values, so coordinates travel in sign-magnitude form.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Size of a field value in bytes.
pub const FIELD_BYTES: usize = 32;

/// Hex digits of a fully padded field value.
pub const WORD_HEX_DIGITS: usize = FIELD_BYTES * 2;

const ADDRESS_BYTES: usize = 20;

// ============================================================================
// Errors
// ============================================================================

/// Malformed or oversized domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("`{0}` is not an integer literal")]
    InvalidLiteral(String),

    #[error("value needs {bits} bits, field values hold at most 256")]
    Overflow { bits: u64 },

    #[error("negative value `{0}` where an unsigned field value is required")]
    Negative(String),

    #[error("`{0}` is not a 20-byte hex address")]
    InvalidAddress(String),

    #[error("witness serialization failed: {0}")]
    Serialization(String),
}

// ============================================================================
// Hex width
// ============================================================================

/// Zero-padding applied when a value is rendered as hex.
///
/// Circuit revisions disagree on this, so it is always chosen explicitly per
/// circuit and never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HexWidth {
    /// At least two digits (`16` -> `0x10`, `876` -> `0x36c`).
    Narrow,
    /// Even number of digits, i.e. whole bytes (`876` -> `0x036c`).
    ByteAligned,
    /// Exactly 64 digits.
    Word,
}

impl HexWidth {
    fn pad(self, digits: &str) -> String {
        let width = match self {
            HexWidth::Narrow => 2,
            HexWidth::ByteAligned => digits.len().max(2).next_multiple_of(2),
            HexWidth::Word => WORD_HEX_DIGITS,
        };
        format!("0x{digits:0>width$}")
    }
}

// ============================================================================
// FieldValue
// ============================================================================

/// A 256-bit unsigned integer, stored big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldValue([u8; FIELD_BYTES]);

impl FieldValue {
    pub const ZERO: Self = Self([0; FIELD_BYTES]);

    pub const fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; FIELD_BYTES];
        let be = value.to_be_bytes();
        let mut i = 0;
        while i < be.len() {
            bytes[FIELD_BYTES - be.len() + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    pub const fn from_be_bytes(bytes: [u8; FIELD_BYTES]) -> Self {
        Self(bytes)
    }

    /// Build from a big-endian byte string of any length.
    ///
    /// Leading zero bytes are ignored; anything longer than 32 significant
    /// bytes overflows.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = &bytes[first..];
        if significant.len() > FIELD_BYTES {
            return Err(EncodingError::Overflow {
                bits: BigUint::from_bytes_be(significant).bits(),
            });
        }

        let mut out = [0u8; FIELD_BYTES];
        out[FIELD_BYTES - significant.len()..].copy_from_slice(significant);
        Ok(Self(out))
    }

    /// Parse hex digits, with or without a `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self, EncodingError> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EncodingError::InvalidLiteral(input.to_string()));
        }

        let value = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| EncodingError::InvalidLiteral(input.to_string()))?;
        Self::from_biguint(&value)
    }

    /// Parse a base-10 literal.
    pub fn from_decimal(input: &str) -> Result<Self, EncodingError> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EncodingError::InvalidLiteral(input.to_string()));
        }

        let value = BigUint::parse_bytes(input.as_bytes(), 10)
            .ok_or_else(|| EncodingError::InvalidLiteral(input.to_string()))?;
        Self::from_biguint(&value)
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self, EncodingError> {
        let bits = value.bits();
        if bits > (FIELD_BYTES * 8) as u64 {
            return Err(EncodingError::Overflow { bits });
        }
        Self::from_be_slice(&value.to_bytes_be())
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// The value as `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        let (high, low) = self.0.split_at(FIELD_BYTES - 8);
        if high.iter().any(|b| *b != 0) {
            return None;
        }
        low.try_into().ok().map(u64::from_be_bytes)
    }

    pub fn as_be_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// `0x`-prefixed big-endian hex, zero-padded to `width`.
    pub fn to_hex(&self, width: HexWidth) -> String {
        let encoded = hex::encode(self.0);
        let trimmed = encoded.trim_start_matches('0');
        width.pad(if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

/// Accepts `0x` hex or decimal.
impl FromStr for FieldValue {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(EncodingError::Negative(s.to_string()));
        }
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex(HexWidth::Word))
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldValue({})", self.to_hex(HexWidth::Narrow))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex(HexWidth::Word))
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl Visitor<'_> for FieldVisitor {
            type Value = FieldValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or an integer string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
                Ok(FieldValue::from_u64(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
                u64::try_from(v)
                    .map(FieldValue::from_u64)
                    .map_err(|_| E::custom(EncodingError::Negative(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FieldVisitor)
    }
}

// ============================================================================
// Signed values
// ============================================================================

/// Sign-magnitude field value.
///
/// The circuit works over an unsigned field, so a negative number is its
/// magnitude plus a flag. Zero is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedField {
    pub magnitude: FieldValue,
    pub is_negative: bool,
}

impl SignedField {
    pub fn new(magnitude: FieldValue, is_negative: bool) -> Self {
        Self {
            magnitude,
            is_negative: is_negative && !magnitude.is_zero(),
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(FieldValue::from_u64(value.unsigned_abs()), value < 0)
    }

    /// Recover the signed integer, if the magnitude fits in 64 bits.
    pub fn to_i128(&self) -> Option<i128> {
        let magnitude = i128::from(self.magnitude.to_u64()?);
        Some(if self.is_negative { -magnitude } else { magnitude })
    }

    /// The sign as a field value: 1 when negative, 0 otherwise.
    pub fn sign_flag(&self) -> FieldValue {
        FieldValue::from_u64(u64::from(self.is_negative))
    }
}

impl From<i64> for SignedField {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

/// A point on the game plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub x: i64,
    pub y: i64,
}

impl Coords {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn signed(&self) -> (SignedField, SignedField) {
        (SignedField::from_i64(self.x), SignedField::from_i64(self.y))
    }
}

// ============================================================================
// Address
// ============================================================================

/// 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const fn from_bytes(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    pub fn to_field(&self) -> FieldValue {
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[FIELD_BYTES - ADDRESS_BYTES..].copy_from_slice(&self.0);
        FieldValue::from_be_bytes(bytes)
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| EncodingError::InvalidAddress(s.to_string()))?;

        let mut bytes = [0u8; ADDRESS_BYTES];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| EncodingError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_pad_as_documented() {
        let perlin = FieldValue::from_u64(16);
        assert_eq!(perlin.to_hex(HexWidth::Narrow), "0x10");
        assert_eq!(perlin.to_hex(HexWidth::ByteAligned), "0x10");
        assert_eq!(
            perlin.to_hex(HexWidth::Word),
            "0x0000000000000000000000000000000000000000000000000000000000000010"
        );

        let x = FieldValue::from_u64(876);
        assert_eq!(x.to_hex(HexWidth::Narrow), "0x36c");
        assert_eq!(x.to_hex(HexWidth::ByteAligned), "0x036c");

        assert_eq!(FieldValue::ZERO.to_hex(HexWidth::Narrow), "0x00");
        assert_eq!(FieldValue::from_u64(5).to_hex(HexWidth::Narrow), "0x05");
    }

    #[test]
    fn word_encoded_coordinates_decode_back() {
        for value in [876u64, 949] {
            let encoded = FieldValue::from_u64(value).to_hex(HexWidth::Word);
            assert_eq!(encoded.len(), 2 + WORD_HEX_DIGITS);

            let decoded = FieldValue::from_hex(&encoded).unwrap();
            assert_eq!(decoded.to_u64(), Some(value));
        }
    }

    #[test]
    fn parses_hex_and_decimal() {
        let hex: FieldValue = "0x36c".parse().unwrap();
        let dec: FieldValue = "876".parse().unwrap();
        assert_eq!(hex, dec);

        let big: FieldValue = "0x0000802bc4d6d6db6e2c80c476949ab73fdf9a1100d9bed50d4c24ab1e31d003"
            .parse()
            .unwrap();
        assert_eq!(big.as_be_bytes()[2], 0x80);
        assert_eq!(big.to_u64(), None);
    }

    #[test]
    fn rejects_malformed_and_oversized_values() {
        assert!(matches!(
            "12a".parse::<FieldValue>(),
            Err(EncodingError::InvalidLiteral(_))
        ));
        assert!(matches!(
            "0x".parse::<FieldValue>(),
            Err(EncodingError::InvalidLiteral(_))
        ));
        assert!(matches!(
            "-4".parse::<FieldValue>(),
            Err(EncodingError::Negative(_))
        ));

        let too_wide = format!("0x1{}", "0".repeat(WORD_HEX_DIGITS));
        assert_eq!(
            FieldValue::from_hex(&too_wide),
            Err(EncodingError::Overflow { bits: 257 })
        );

        // Leading zeros beyond 64 digits are fine, only significant bits count.
        let padded = format!("0x{}1", "0".repeat(WORD_HEX_DIGITS));
        assert_eq!(FieldValue::from_hex(&padded).unwrap(), FieldValue::from_u64(1));
    }

    #[test]
    fn deserializes_integers_and_strings() {
        #[derive(Deserialize)]
        struct Doc {
            a: FieldValue,
            b: FieldValue,
        }

        let doc: Doc = toml::from_str("a = 7\nb = \"0x07\"").unwrap();
        assert_eq!(doc.a, doc.b);

        assert!(toml::from_str::<Doc>("a = -1\nb = 0").is_err());
    }

    #[test]
    fn signed_values_keep_sign_and_magnitude() {
        let neg = SignedField::from_i64(-42);
        assert!(neg.is_negative);
        assert_eq!(neg.magnitude.to_u64(), Some(42));
        assert_eq!(neg.to_i128(), Some(-42));
        assert_eq!(neg.sign_flag(), FieldValue::from_u64(1));

        let zero = SignedField::new(FieldValue::ZERO, true);
        assert!(!zero.is_negative);

        let min = SignedField::from_i64(i64::MIN);
        assert_eq!(min.to_i128(), Some(i128::from(i64::MIN)));
    }

    #[test]
    fn addresses_parse_and_widen() {
        let addr: Address = "0x8950bab77f29E8f81e6F78AEA0a79bADD88Eeb13".parse().unwrap();
        assert_eq!(addr.to_string(), "0x8950bab77f29e8f81e6f78aea0a79badd88eeb13");
        assert_eq!(addr.to_field().as_be_bytes()[12], 0x89);

        assert!("0x1234".parse::<Address>().is_err());
        assert!("8950bab77f29e8f81e6f78aea0a79badd88eeb13".parse::<Address>().is_err());
    }
}
