use super::Snowflake;
use std::fmt;

/// Represents a platform user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: impl Into<Snowflake>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            is_bot: false,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// A user seen through a guild membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: User,
    pub nick: Option<String>,
}

impl Member {
    pub fn new(user: User) -> Self {
        Self { user, nick: None }
    }

    #[cfg(test)]
    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    /// Guild nickname, falling back to the username when unset or blank
    pub fn display_name(&self) -> &str {
        match self.nick.as_deref() {
            Some(nick) if !nick.is_empty() => nick,
            _ => &self.user.username,
        }
    }
}
