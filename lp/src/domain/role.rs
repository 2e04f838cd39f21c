//! The hat the user wears for a project or task

use serde::{Deserialize, Serialize};

/// Role a project or task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[serde(rename = "COO")]
    Coo,
    Founder,
    #[serde(rename = "PM")]
    Pm,
    #[default]
    Personal,
}

impl Role {
    /// Every role, in display order
    pub const ALL: [Role; 4] = [Role::Coo, Role::Founder, Role::Pm, Role::Personal];

    /// Wire name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coo => "COO",
            Self::Founder => "Founder",
            Self::Pm => "PM",
            Self::Personal => "Personal",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coo" => Ok(Self::Coo),
            "founder" => Ok(Self::Founder),
            "pm" => Ok(Self::Pm),
            "personal" => Ok(Self::Personal),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}
