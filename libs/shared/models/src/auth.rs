use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which side of an appointment the caller claims to be acting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterRole {
    Doctor,
    Patient,
}

impl fmt::Display for RequesterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequesterRole::Doctor => write!(f, "doctor"),
            RequesterRole::Patient => write!(f, "patient"),
        }
    }
}

impl FromStr for RequesterRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" | "1" => Ok(RequesterRole::Doctor),
            "patient" | "0" => Ok(RequesterRole::Patient),
            other => Err(format!("Unknown requester role '{}'", other)),
        }
    }
}

/// Caller-supplied identity. Not authenticated; it is only matched against
/// the parties recorded on an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    pub role: RequesterRole,
}

impl Requester {
    pub fn doctor(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: RequesterRole::Doctor }
    }

    pub fn patient(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: RequesterRole::Patient }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == RequesterRole::Doctor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Doctor".parse::<RequesterRole>(), Ok(RequesterRole::Doctor));
        assert_eq!(" patient ".parse::<RequesterRole>(), Ok(RequesterRole::Patient));
        assert_eq!("1".parse::<RequesterRole>(), Ok(RequesterRole::Doctor));
        assert!("nurse".parse::<RequesterRole>().is_err());
    }
}
