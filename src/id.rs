use std::{fmt, str};

use fstr::FStr;

/// Maximum value of 48-bit `timestamp` field.
pub const MAX_TIMESTAMP: u64 = 0xffff_ffff_ffff;

/// Maximum value of 24-bit `counter_hi` field.
pub const MAX_COUNTER_HI: u32 = 0xff_ffff;

/// Maximum value of 24-bit `counter_lo` field.
pub const MAX_COUNTER_LO: u32 = 0xff_ffff;

/// Digit characters used in the Base36 notation.
const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An O(1) map from ASCII code points to Base36 digit values.
const DECODE_MAP: [u8; 256] = {
    let mut map = [0xffu8; 256];
    let mut i = 0;
    while i < 36 {
        map[DIGITS[i] as usize] = i as u8;
        map[DIGITS[i].to_ascii_uppercase() as usize] = i as u8;
        i += 1;
    }
    map
};

/// Represents a SCRU128 ID and provides converters and comparison operators.
///
/// The byte array is the big-endian packing of the 48-bit `timestamp`, 24-bit `counter_hi`,
/// 24-bit `counter_lo`, and 32-bit `entropy` fields, so the derived byte-wise ordering agrees with
/// both the numeric ordering of the 128-bit value and the lexicographic ordering of the canonical
/// string.
///
/// # Examples
///
/// ```rust
/// use scru128::Scru128Id;
///
/// let x = "036z968fuj8fp95tsldrnqjke".parse::<Scru128Id>()?;
/// assert_eq!(x.to_string(), "036z968fuj8fp95tsldrnqjke");
///
/// let y = Scru128Id::from_u128(0x017fa1de51a80fd992f9e8cc2d5eb88e);
/// assert_eq!(y.to_string(), "036z968fuj8fp95tsldrnqjke");
/// # Ok::<(), scru128::ParseError>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Scru128Id([u8; 16]);

impl Scru128Id {
    /// The smallest possible value, encoded as `"0000000000000000000000000"`.
    pub const MIN: Self = Self([0x00; 16]);

    /// The largest possible value, encoded as `"f5lxx1zz5pnorynqglhzmsp33"`.
    pub const MAX: Self = Self([0xff; 16]);

    /// Creates an object from a 128-bit unsigned integer.
    pub const fn from_u128(int_value: u128) -> Self {
        Self(int_value.to_be_bytes())
    }

    /// Returns the 128-bit unsigned integer representation.
    pub const fn to_u128(self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Creates an object from field values.
    ///
    /// # Panics
    ///
    /// Panics if any argument is out of the value range of the field.
    pub const fn from_fields(
        timestamp: u64,
        counter_hi: u32,
        counter_lo: u32,
        entropy: u32,
    ) -> Self {
        if timestamp > MAX_TIMESTAMP
            || counter_hi > MAX_COUNTER_HI
            || counter_lo > MAX_COUNTER_LO
        {
            panic!("invalid field value");
        }

        Self::from_u128(
            ((timestamp as u128) << 80)
                | ((counter_hi as u128) << 56)
                | ((counter_lo as u128) << 32)
                | (entropy as u128),
        )
    }

    /// Returns the 48-bit `timestamp` field value.
    pub const fn timestamp(&self) -> u64 {
        (self.to_u128() >> 80) as u64
    }

    /// Returns the 24-bit `counter_hi` field value.
    pub const fn counter_hi(&self) -> u32 {
        (self.to_u128() >> 56) as u32 & MAX_COUNTER_HI
    }

    /// Returns the 24-bit `counter_lo` field value.
    pub const fn counter_lo(&self) -> u32 {
        (self.to_u128() >> 32) as u32 & MAX_COUNTER_LO
    }

    /// Returns the 32-bit `entropy` field value.
    pub const fn entropy(&self) -> u32 {
        self.to_u128() as u32
    }

    /// Returns a reference to the big-endian byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates an object from a 25-digit Base36 string representation, ignoring case.
    ///
    /// The digits are folded into the byte array in 10-digit (~52-bit) words, each word being
    /// multiplied into the running value with carries propagated byte by byte, so no general
    /// big-integer division is needed. A string whose value exceeds `2^128 - 1` is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if `src` is not 25 characters long, contains a non-Base36 character, or
    /// represents a number greater than the maximum 128-bit value.
    pub fn try_from_str(src: &str) -> Result<Self, ParseError> {
        Self::try_from_digits(src.as_bytes())
    }

    /// Decodes a 25-digit Base36 ASCII byte sequence.
    fn try_from_digits(src: &[u8]) -> Result<Self, ParseError> {
        // 36^10
        const WORD_BASE: u64 = 3_656_158_440_062_976;

        if src.len() != 25 {
            return Err(ParseError::InvalidLength { len: src.len() });
        }

        let mut digits = [0u8; 25];
        for (position, (d, &c)) in digits.iter_mut().zip(src).enumerate() {
            *d = DECODE_MAP[c as usize];
            if *d == 0xff {
                return Err(ParseError::InvalidDigit { digit: c, position });
            }
        }

        let mut dst = [0u8; 16];
        // index of the leftmost byte already written, or any value above dst.len()
        let mut min_index: isize = 99;

        // process the 5-digit head, then two 10-digit words
        for end in [5usize, 15, 25] {
            let start = end.saturating_sub(10);
            let mut carry = digits[start..end]
                .iter()
                .fold(0u64, |acc, &d| acc * 36 + d as u64);

            // iterate over output array from right to left while carry != 0 but at least up to
            // place already filled
            let mut j = dst.len() as isize - 1;
            while carry > 0 || j > min_index {
                if j < 0 {
                    return Err(ParseError::OutOfU128Range);
                }
                carry += dst[j as usize] as u64 * WORD_BASE;
                dst[j as usize] = carry as u8;
                carry >>= 8;
                j -= 1;
            }
            min_index = j;
        }
        Ok(Self(dst))
    }

    /// Returns the 25-digit canonical string representation stored in a stack-allocated string
    /// type that can be dereferenced as `str`.
    ///
    /// The 128-bit value is split into a 16-bit head and two 56-bit words, each of which is
    /// shifted into the Base36 digit array with carries propagated digit by digit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scru128::Scru128Id;
    ///
    /// let x = Scru128Id::from_fields(0, 0, 0, u32::MAX);
    /// let y = x.encode();
    /// assert_eq!(y.as_str(), "0000000000000000001z141z3");
    /// assert_eq!(format!("{}", y), "0000000000000000001z141z3");
    /// ```
    pub fn encode(&self) -> FStr<25> {
        let mut dst = [0u8; 25];
        let mut min_index: isize = 99;

        // byte ranges of the 16-bit head and two 56-bit words
        for (start, end) in [(0usize, 2usize), (2, 9), (9, 16)] {
            let mut carry = self.0[start..end]
                .iter()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64);

            // iterate over output array from right to left while carry != 0 but at least up to
            // place already filled
            let mut j = dst.len() as isize - 1;
            while carry > 0 || j > min_index {
                carry += (dst[j as usize] as u64) << 56;
                dst[j as usize] = (carry % 36) as u8;
                carry /= 36;
                j -= 1;
            }
            min_index = j;
        }

        for e in dst.iter_mut() {
            *e = DIGITS[*e as usize];
        }
        debug_assert!(dst.is_ascii());
        // SAFETY: every byte was taken from the ASCII digit table
        unsafe { FStr::from_inner_unchecked(dst) }
    }
}

impl fmt::Display for Scru128Id {
    /// Returns the 25-digit canonical string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.encode(), f)
    }
}

impl str::FromStr for Scru128Id {
    type Err = ParseError;

    /// Creates an object from a 25-digit string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::try_from_str(src)
    }
}

impl From<u128> for Scru128Id {
    fn from(src: u128) -> Self {
        Self::from_u128(src)
    }
}

impl From<Scru128Id> for u128 {
    fn from(src: Scru128Id) -> Self {
        src.to_u128()
    }
}

impl From<[u8; 16]> for Scru128Id {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl From<Scru128Id> for [u8; 16] {
    fn from(src: Scru128Id) -> Self {
        src.0
    }
}

impl TryFrom<&[u8]> for Scru128Id {
    type Error = ParseError;

    /// Creates an object from a 16-byte big-endian array, or from the 25-digit string
    /// representation encoded as ASCII bytes when the slice is not 16 bytes long.
    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        match <[u8; 16]>::try_from(src) {
            Ok(bytes) => Ok(Self(bytes)),
            Err(_) => Self::try_from_digits(src),
        }
    }
}

impl TryFrom<&str> for Scru128Id {
    type Error = ParseError;

    fn try_from(src: &str) -> Result<Self, Self::Error> {
        Self::try_from_str(src)
    }
}

impl TryFrom<String> for Scru128Id {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        Self::try_from_str(&src)
    }
}

impl From<Scru128Id> for String {
    fn from(src: Scru128Id) -> Self {
        src.encode().as_str().to_owned()
    }
}

impl AsRef<[u8]> for Scru128Id {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Error parsing an invalid string or byte representation of SCRU128 ID.
#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
pub enum ParseError {
    /// The input is neither 25 digits nor, where bytes are accepted, 16 bytes long.
    #[error("invalid length: {len} (expected 25 digits)")]
    InvalidLength {
        /// Length of the input in bytes.
        len: usize,
    },

    /// The input contains a byte outside `[0-9A-Za-z]`.
    #[error("invalid digit {digit:#04x} at {position}")]
    InvalidDigit {
        /// The offending byte.
        digit: u8,
        /// Byte offset of the offending byte.
        position: usize,
    },

    /// The input is well-formed Base36 but exceeds the 128-bit value range.
    #[error("out of 128-bit value range")]
    OutOfU128Range,
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Scru128Id};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Scru128Id {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Scru128Id {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Scru128Id;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a SCRU128 ID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Self::Value::try_from_str(value).map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Self::Value::try_from(value).map_err(de::Error::custom)
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> Result<Self::Value, E> {
            Ok(Self::Value::from_u128(value))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::Scru128Id;
        use serde_test::{assert_de_tokens, assert_tokens, Configure, Token};

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases: [(&str, &[u8; 16]); 3] = [
                ("0000000000000000000000000", &[0u8; 16]),
                (
                    "036z968fuj8fp95tsldrnqjke",
                    &[
                        1, 127, 161, 222, 81, 168, 15, 217, 146, 249, 232, 204, 45, 94, 184, 142,
                    ],
                ),
                ("f5lxx1zz5pnorynqglhzmsp33", &[0xffu8; 16]),
            ];

            for (text, bytes) in cases {
                let e = Scru128Id::try_from_str(text).unwrap();
                assert_eq!(e.as_bytes(), bytes);
                assert_tokens(&e.readable(), &[Token::Str(text)]);
                assert_tokens(&e.compact(), &[Token::Bytes(bytes)]);
                assert_de_tokens(&e.compact(), &[Token::Bytes(text.as_bytes())]);
            }
        }
    }
}
