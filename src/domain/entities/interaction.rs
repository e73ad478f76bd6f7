use super::{Member, Snowflake, User};

/// A single user-triggered interaction delivered by the gateway
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: Snowflake,
    pub app_id: Snowflake,
    /// Continuation token used to answer the interaction and look up its reply
    pub token: String,
    /// `None` when the interaction happened in a private conversation
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    /// Set for guild interactions only
    pub member: Option<Member>,
    /// Set for private interactions only
    pub user: Option<User>,
    pub data: InteractionData,
}

impl Interaction {
    /// The invoking user, wherever the interaction came from
    pub fn invoker(&self) -> Option<&User> {
        self.member.as_ref().map(|m| &m.user).or(self.user.as_ref())
    }

    pub fn command(&self) -> Option<&CommandInteraction> {
        match &self.data {
            InteractionData::Command(command) => Some(command),
            InteractionData::Other(_) => None,
        }
    }
}

/// Interaction payload
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionData {
    Command(CommandInteraction),
    /// Autocomplete, component, modal... identified by kind only
    Other(String),
}

/// An invoked application command with its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInteraction {
    pub name: String,
    pub options: Vec<CommandOption>,
}

impl CommandInteraction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.push(CommandOption {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// A named command argument
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub value: serde_json::Value,
}

impl CommandOption {
    /// Textual form of the value; strings are returned without quotes
    pub fn as_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(member: Option<Member>, user: Option<User>) -> Interaction {
        Interaction {
            id: Snowflake(1),
            app_id: Snowflake(2),
            token: "token".to_string(),
            guild_id: member.as_ref().map(|_| Snowflake(3)),
            channel_id: Snowflake(4),
            member,
            user,
            data: InteractionData::Command(CommandInteraction::new("version")),
        }
    }

    #[test]
    fn invoker_from_member_or_user() {
        let guild = interaction(Some(Member::new(User::new(Snowflake(10), "alice"))), None);
        assert_eq!(guild.invoker().map(|u| u.id), Some(Snowflake(10)));

        let private = interaction(None, Some(User::new(Snowflake(11), "bob")));
        assert_eq!(private.invoker().map(|u| u.id), Some(Snowflake(11)));
    }

    #[test]
    fn option_text_strips_quotes() {
        let command = CommandInteraction::new("openjourney")
            .with_option("prompt", "a red fox")
            .with_option("steps", 50);

        assert_eq!(command.option("prompt").map(|o| o.as_text()), Some("a red fox".to_string()));
        assert_eq!(command.option("steps").map(|o| o.as_text()), Some("50".to_string()));
        assert!(command.option("seed").is_none());
    }
}
