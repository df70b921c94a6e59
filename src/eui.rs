//! EUI-64 identifier type.
//!
//! LoRaWAN addresses devices by a 64-bit extended unique identifier. On the
//! API surface an EUI travels as a 16-character hex string; internally it is
//! a fixed 8-byte value that can be used as a map key and ordered.

use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors returned when constructing an [`EUI64`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("expected 8 bytes, got {0}")]
    Size(usize),
    #[error("expected 16 hex characters, got {0}")]
    Length(usize),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
}

/// A 64-bit extended unique identifier (DevEUI).
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EUI64([u8; 8]);

impl EUI64 {
    pub fn from_slice(b: &[u8]) -> Result<Self, Error> {
        if b.len() != 8 {
            return Err(Error::Size(b.len()));
        }

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(b);
        Ok(EUI64(bytes))
    }

    pub fn from_be_bytes(b: [u8; 8]) -> Self {
        EUI64(b)
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for EUI64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EUI64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for EUI64 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 {
            return Err(Error::Length(s.len()));
        }

        let mut bytes = [0u8; 8];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(EUI64(bytes))
    }
}

impl Serialize for EUI64 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EUI64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EUI64::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let eui = EUI64::from_str("0102030405060708").unwrap();
        assert_eq!([1, 2, 3, 4, 5, 6, 7, 8], eui.to_be_bytes());
        assert_eq!("0102030405060708", eui.to_string());
    }

    #[test]
    fn test_from_str_mixed_case() {
        let eui = EUI64::from_str("AABBccDDeeFF0011").unwrap();
        assert_eq!("aabbccddeeff0011", eui.to_string());
    }

    #[test]
    fn test_from_str_invalid_length() {
        assert_eq!(Err(Error::Length(15)), EUI64::from_str("010203040506070"));
        assert_eq!(
            Err(Error::Length(17)),
            EUI64::from_str("01020304050607080")
        );
        assert_eq!(Err(Error::Length(0)), EUI64::from_str(""));
    }

    #[test]
    fn test_from_str_invalid_hex() {
        assert!(matches!(
            EUI64::from_str("zz02030405060708"),
            Err(Error::Hex(_))
        ));
    }

    #[test]
    fn test_from_slice() {
        let eui = EUI64::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!("0102030405060708", eui.to_string());
        assert_eq!(vec![1, 2, 3, 4, 5, 6, 7, 8], eui.to_vec());
        assert_eq!(Err(Error::Size(3)), EUI64::from_slice(&[1, 2, 3]));
    }

    #[test]
    fn test_ordering_follows_byte_value() {
        let a = EUI64::from_be_bytes([1, 0, 0, 0, 0, 0, 0, 1]);
        let b = EUI64::from_be_bytes([1, 0, 0, 0, 0, 0, 0, 2]);
        let c = EUI64::from_be_bytes([2, 0, 0, 0, 0, 0, 0, 0]);
        assert!(a < b);
        assert!(b < c);
    }
}
