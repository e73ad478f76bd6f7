use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform-wide 64-bit identifier (guilds, users, channels, messages...)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

impl Snowflake {
    /// Sentinel the gateway uses for "no such object"
    pub const NULL: Snowflake = Snowflake(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
