use crate::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryFrom;
use std::str::FromStr;

/// Number of decimal digits in a national identity number.
pub const NATIONAL_ID_DIGITS: usize = 13;

const NATIONAL_ID_LIMIT: u64 = 10_000_000_000_000;

/// A national identity number (CNIC)
///
/// Admins, voters and candidates are all keyed by the person's national id. It is
/// always exactly 13 decimal digits and is rendered zero-padded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NationalId(u64);

impl NationalId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl TryFrom<u64> for NationalId {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value >= NATIONAL_ID_LIMIT {
            return Err(Error::InvalidNationalId(value.to_string()));
        }
        Ok(NationalId(value))
    }
}

impl FromStr for NationalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != NATIONAL_ID_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidNationalId(s.to_owned()));
        }

        // Thirteen ascii digits always fit in a u64
        let value: u64 = s
            .parse()
            .map_err(|_| Error::InvalidNationalId(s.to_owned()))?;
        Ok(NationalId(value))
    }
}

impl std::fmt::Display for NationalId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:013}", self.0)
    }
}

impl<'de> Deserialize<'de> for NationalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

impl Serialize for NationalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Sequential candidate identifier
///
/// Ids are allocated from 1 upwards and never reused. The value 0 is reserved as the
/// draw / no-winner sentinel of a declared result.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CandidateId(pub u64);

impl CandidateId {
    /// Winner id of a constituency that ended in a tie or received no votes
    pub const DRAW: CandidateId = CandidateId(0);

    pub fn is_draw(&self) -> bool {
        *self == CandidateId::DRAW
    }
}

impl FromStr for CandidateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(CandidateId)
            .map_err(|_| Error::InvalidCandidateId(s.to_owned()))
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A constituency, addressed by its province
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seat {
    pub province: String,
    pub constituency: String,
}

impl Seat {
    pub fn new(province: &str, constituency: &str) -> Self {
        Seat {
            province: province.trim().to_owned(),
            constituency: constituency.trim().to_owned(),
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.province, self.constituency)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_national_id() {
        let id = NationalId::from_str("1234567890123").unwrap();
        assert_eq!(id.as_u64(), 1234567890123);
        assert_eq!(id.to_string(), "1234567890123");

        // Leading zeros survive the round trip through Display
        let padded = NationalId::from_str("0000000000042").unwrap();
        assert_eq!(padded.to_string(), "0000000000042");

        assert!(NationalId::from_str("123456789012").is_err());
        assert!(NationalId::from_str("12345678901234").is_err());
        assert!(NationalId::from_str("12345-7890123").is_err());
        assert!(NationalId::try_from(10_000_000_000_000).is_err());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1234567890123\"");
        let back: NationalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_candidate_id() {
        assert!(CandidateId::DRAW.is_draw());
        assert!(!CandidateId(1).is_draw());
        assert_eq!(CandidateId::from_str("17").unwrap(), CandidateId(17));
        assert!(CandidateId::from_str("x").is_err());
    }

    proptest! {
        #[test]
        fn national_id_accepts_exactly_thirteen_digits(s in "[0-9]{1,16}") {
            let parsed = NationalId::from_str(&s);
            prop_assert_eq!(parsed.is_ok(), s.len() == NATIONAL_ID_DIGITS);
        }

        #[test]
        fn national_id_display_is_stable(value in 0u64..10_000_000_000_000u64) {
            let id = NationalId::try_from(value).unwrap();
            let shown = id.to_string();
            prop_assert_eq!(shown.len(), NATIONAL_ID_DIGITS);
            prop_assert_eq!(NationalId::from_str(&shown).unwrap(), id);
        }
    }
}
