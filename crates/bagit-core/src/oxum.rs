//! Payload-Oxum: `<total bytes>.<total files>`.

use crate::error::BagError;
use serde::Serialize;
use std::str::FromStr;

/// Declared or observed payload totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PayloadOxum {
    pub bytes: u64,
    pub files: u64,
}

impl PayloadOxum {
    pub fn add_file(&mut self, size: u64) {
        self.bytes += size;
        self.files += 1;
    }
}

impl std::fmt::Display for PayloadOxum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.bytes, self.files)
    }
}

impl FromStr for PayloadOxum {
    type Err = BagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BagError::InvalidOxum {
            value: s.to_string(),
        };
        let (bytes, files) = s.trim().split_once('.').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(bytes) || !digits(files) {
            return Err(invalid());
        }
        Ok(Self {
            bytes: bytes.parse().map_err(|_| invalid())?,
            files: files.parse().map_err(|_| invalid())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats() {
        let oxum: PayloadOxum = "279164409.1198".parse().unwrap();
        assert_eq!(
            oxum,
            PayloadOxum {
                bytes: 279_164_409,
                files: 1198
            }
        );
        assert_eq!(oxum.to_string(), "279164409.1198");
        assert_eq!(
            "0.1".parse::<PayloadOxum>().unwrap(),
            PayloadOxum { bytes: 0, files: 1 }
        );
    }

    #[test]
    fn rejects_malformed_values() {
        for bad in ["", "12", "a.1", "1.", ".1", "1.2.3", "-1.2", "1.+2"] {
            assert!(
                matches!(bad.parse::<PayloadOxum>(), Err(BagError::InvalidOxum { .. })),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!("99999999999999999999999.1".parse::<PayloadOxum>().is_err());
    }

    #[test]
    fn add_file_accumulates() {
        let mut oxum = PayloadOxum::default();
        oxum.add_file(10);
        oxum.add_file(0);
        assert_eq!(oxum.to_string(), "10.2");
    }
}
