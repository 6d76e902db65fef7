//! Derived columns: decade, year category, VIN hash.

use super::UNKNOWN;
use crate::config::HashAlgorithm;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

/// Number of hex characters kept from the VIN digest.
pub const VIN_HASH_LEN: usize = 10;

/// Model-year bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YearCategory {
    /// Years 0 through 2015 inclusive.
    #[serde(rename = "Pre-2015")]
    Pre2015,
    /// Years 2016 through 2020.
    #[serde(rename = "2015-2020")]
    From2015To2020,
    /// Years 2021 through next year.
    #[serde(rename = "2021+")]
    From2021,
}

impl YearCategory {
    /// Buckets a model year with edges `[0, 2015]`, `(2015, 2020]`,
    /// `(2020, current_year + 1]`. Years outside that range have no bucket.
    #[must_use]
    pub fn from_year(year: i32, current_year: i32) -> Option<Self> {
        match year {
            y if y < 0 || y > current_year + 1 => None,
            y if y <= 2015 => Some(Self::Pre2015),
            y if y <= 2020 => Some(Self::From2015To2020),
            _ => Some(Self::From2021),
        }
    }

    /// Display label stored in the warehouse.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pre2015 => "Pre-2015",
            Self::From2015To2020 => "2015-2020",
            Self::From2021 => "2021+",
        }
    }
}

impl fmt::Display for YearCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Start year of the decade containing `year`.
#[must_use]
pub fn model_decade(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Pseudonymizes a VIN prefix: the first [`VIN_HASH_LEN`] hex characters of
/// its digest, or `"Unknown"` when the VIN is missing.
#[must_use]
pub fn vin_hash(vin: Option<&str>, algorithm: HashAlgorithm) -> String {
    let Some(vin) = vin else {
        return UNKNOWN.to_string();
    };
    let mut digest = match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(vin.as_bytes())),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(vin.as_bytes())),
    };
    digest.truncate(VIN_HASH_LEN);
    digest
}
