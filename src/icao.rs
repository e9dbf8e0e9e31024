//! 24-bit ICAO aircraft address

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// ICAO address as three raw bytes, most significant first.
///
/// Ordering is byte-lexicographic, which equals numeric ordering of the
/// 24-bit value. The all-zero address means "no identity".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Icao(pub [u8; 3]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IcaoParseError {
    #[error("icao must be 6 hex chars, got {0}")]
    Length(usize),

    #[error("invalid hex digit {0:?} in icao")]
    InvalidHex(char),
}

impl Icao {
    pub const ZERO: Icao = Icao([0; 3]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The address as a 24-bit integer
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes([0, self.0[0], self.0[1], self.0[2]])
    }

    pub fn from_u32(addr: u32) -> Self {
        let [_, a, b, c] = addr.to_be_bytes();
        Icao([a, b, c])
    }
}

impl From<[u8; 3]> for Icao {
    fn from(b: [u8; 3]) -> Self {
        Icao(b)
    }
}

fn hex_digit_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for Icao {
    type Err = IcaoParseError;

    /// Parse six hex digits, optionally prefixed with `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if s.len() != 6 {
            return Err(IcaoParseError::Length(s.len()));
        }

        let mut out = [0u8; 3];
        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex_digit_val(pair[0]).ok_or(IcaoParseError::InvalidHex(pair[0] as char))?;
            let lo = hex_digit_val(pair[1]).ok_or(IcaoParseError::InvalidHex(pair[1] as char))?;
            out[i] = (hi << 4) | lo;
        }
        Ok(Icao(out))
    }
}

impl fmt::Display for Icao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl Serialize for Icao {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Icao {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_icao() {
        assert_eq!("ABC123".parse::<Icao>(), Ok(Icao([0xAB, 0xC1, 0x23])));
        assert_eq!(" 0xabc123 ".parse::<Icao>(), Ok(Icao([0xAB, 0xC1, 0x23])));
        assert_eq!("00abcd".parse::<Icao>(), Ok(Icao([0x00, 0xAB, 0xCD])));
        assert_eq!("ABC12".parse::<Icao>(), Err(IcaoParseError::Length(5)));
        assert_eq!("ABC12G".parse::<Icao>(), Err(IcaoParseError::InvalidHex('G')));
        // Multi-byte input must not panic on the byte-wise walk.
        assert!("ÄBC12".parse::<Icao>().is_err());
    }

    #[test]
    fn test_display_and_u32() {
        let icao = Icao([0x48, 0x40, 0xD6]);
        assert_eq!(icao.to_string(), "4840D6");
        assert_eq!(icao.as_u32(), 0x4840D6);
        assert_eq!(Icao::from_u32(0x4840D6), icao);
        assert!(Icao::ZERO.is_zero());
        assert!(!icao.is_zero());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let mut v = vec![Icao([0x01, 0x00, 0x00]), Icao([0x00, 0xFF, 0xFF]), Icao([0x00, 0x00, 0x01])];
        v.sort();
        assert_eq!(v, vec![Icao([0x00, 0x00, 0x01]), Icao([0x00, 0xFF, 0xFF]), Icao([0x01, 0x00, 0x00])]);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let icao = Icao([0x0A, 0x0B, 0x0C]);
        assert_eq!(serde_json::to_string(&icao).unwrap(), "\"0A0B0C\"");
        assert_eq!(serde_json::from_str::<Icao>("\"0a0b0c\"").unwrap(), icao);
        assert!(serde_json::from_str::<Icao>("\"xyz\"").is_err());
    }
}
