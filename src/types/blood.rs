//! Blood Type Domain Types
//!
//! The eight ABO/Rh groups plus an explicit `Unknown` for users who have
//! not recorded theirs. Requests carry a `NeededBloodType`, which widens
//! the same set with `Any`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// ABO/Rh blood group of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BloodType {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
    Unknown,
}

impl BloodType {
    /// The eight concrete groups, in conventional order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::AbPos,
        BloodType::AbNeg,
        BloodType::OPos,
        BloodType::ONeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APos => "A+",
            BloodType::ANeg => "A-",
            BloodType::BPos => "B+",
            BloodType::BNeg => "B-",
            BloodType::AbPos => "AB+",
            BloodType::AbNeg => "AB-",
            BloodType::OPos => "O+",
            BloodType::ONeg => "O-",
            BloodType::Unknown => "unknown",
        }
    }
}

impl Default for BloodType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BloodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A+" => Ok(Self::APos),
            "A-" => Ok(Self::ANeg),
            "B+" => Ok(Self::BPos),
            "B-" => Ok(Self::BNeg),
            "AB+" => Ok(Self::AbPos),
            "AB-" => Ok(Self::AbNeg),
            "O+" => Ok(Self::OPos),
            "O-" => Ok(Self::ONeg),
            "UNKNOWN" | "" => Ok(Self::Unknown),
            _ => Err(format!("unknown blood type: {}", s)),
        }
    }
}

impl Serialize for BloodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BloodType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Blood type requested by a donation request.
///
/// `Any` (and any unrecognized input) matches every donor group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeededBloodType {
    Specific(BloodType),
    Any,
}

impl NeededBloodType {
    /// Parse a requested type. Unrecognized input widens to `Any` rather
    /// than failing, matching the compatibility table's catch-all row.
    pub fn parse(s: &str) -> Self {
        match s.parse::<BloodType>() {
            Ok(BloodType::Unknown) | Err(_) => Self::Any,
            Ok(blood_type) => Self::Specific(blood_type),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Specific(blood_type) => blood_type.as_str(),
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for NeededBloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for NeededBloodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NeededBloodType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_type_round_trip() {
        for blood_type in BloodType::ALL {
            assert_eq!(blood_type.as_str().parse::<BloodType>(), Ok(blood_type));
        }
        assert_eq!("unknown".parse::<BloodType>(), Ok(BloodType::Unknown));
        assert!("C+".parse::<BloodType>().is_err());
    }

    #[test]
    fn test_case_insensitive_parse() {
        assert_eq!("ab+".parse::<BloodType>(), Ok(BloodType::AbPos));
        assert_eq!("o-".parse::<BloodType>(), Ok(BloodType::ONeg));
    }

    #[test]
    fn test_needed_widens_to_any() {
        assert_eq!(NeededBloodType::parse("O-"), NeededBloodType::Specific(BloodType::ONeg));
        assert_eq!(NeededBloodType::parse("any"), NeededBloodType::Any);
        assert_eq!(NeededBloodType::parse("whatever"), NeededBloodType::Any);
        assert_eq!(NeededBloodType::parse("unknown"), NeededBloodType::Any);
    }

    #[test]
    fn test_serde_as_display_string() {
        let json = serde_json::to_string(&BloodType::AbNeg).unwrap();
        assert_eq!(json, r#""AB-""#);
        let back: BloodType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BloodType::AbNeg);
    }
}
