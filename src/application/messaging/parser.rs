//! Console line parser - turns typed lines into gateway events

use crate::domain::entities::{
    CommandInteraction, GatewayEvent, Interaction, InteractionData, Member, MessageDeletion, MessageEvent, Snowflake,
    User,
};

/// Where typed lines appear to come from
#[derive(Debug, Clone)]
pub struct Session {
    pub app_id: Snowflake,
    /// `None` simulates a private conversation
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    pub user: User,
}

impl Session {
    pub fn new(app_id: Snowflake) -> Self {
        Self {
            app_id,
            guild_id: Some(Snowflake(1)),
            channel_id: Snowflake(100),
            user: User::new(Snowflake(1000), "console"),
        }
    }
}

/// Result of parsing one line
#[derive(Debug)]
pub enum Parsed {
    Event(GatewayEvent),
    /// Session context changed; carries a description for the operator
    Context(String),
    Invalid(String),
    Empty,
}

/// Parses console input.
///
/// - `/name key=value ...` is a command interaction; a bare word continues the
///   previous option's value
/// - `:guild <id>`, `:dm`, `:channel <id>`, `:user <id> [name]` change the session
/// - `:join <id>` announces a guild
/// - `:delete <id>` reports a message deleted from the current channel
/// - anything else is a plain message
pub struct InteractionParser {
    command_prefix: String,
    session: Session,
    next_id: u64,
}

impl InteractionParser {
    pub fn new(prefix: impl Into<String>, session: Session) -> Self {
        Self {
            command_prefix: prefix.into(),
            session,
            next_id: 1,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn next_id(&mut self) -> Snowflake {
        let id = Snowflake(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn parse(&mut self, line: &str) -> Parsed {
        let line = line.trim();
        if line.is_empty() {
            return Parsed::Empty;
        }

        if let Some(directive) = line.strip_prefix(':') {
            return self.parse_directive(directive);
        }

        if let Some(command) = line.strip_prefix(self.command_prefix.as_str()) {
            return match parse_command(command) {
                Ok(command) => Parsed::Event(GatewayEvent::InteractionCreate(self.interaction(command))),
                Err(reason) => Parsed::Invalid(reason),
            };
        }

        let message = MessageEvent {
            id: self.next_id(),
            guild_id: self.session.guild_id,
            channel_id: self.session.channel_id,
            author: self.session.user.clone(),
            content: line.to_string(),
        };
        Parsed::Event(GatewayEvent::MessageCreate(message))
    }

    fn interaction(&mut self, command: CommandInteraction) -> Interaction {
        let user = self.session.user.clone();
        let private = self.session.guild_id.is_none();

        Interaction {
            id: self.next_id(),
            app_id: self.session.app_id,
            token: uuid::Uuid::new_v4().to_string(),
            guild_id: self.session.guild_id,
            channel_id: self.session.channel_id,
            member: (!private).then(|| Member::new(user.clone())),
            user: private.then_some(user),
            data: InteractionData::Command(command),
        }
    }

    fn parse_directive(&mut self, directive: &str) -> Parsed {
        let mut parts = directive.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let id = parts.next().map(str::parse::<Snowflake>);

        match (name, id) {
            ("dm", None) => {
                self.session.guild_id = None;
                Parsed::Context("now in a private conversation".to_string())
            }
            ("guild", Some(Ok(id))) => {
                self.session.guild_id = Some(id);
                Parsed::Context(format!("now in guild {id}"))
            }
            ("channel", Some(Ok(id))) => {
                self.session.channel_id = id;
                Parsed::Context(format!("now in channel {id}"))
            }
            ("user", Some(Ok(id))) => {
                let username = parts.next().map_or_else(|| format!("user-{id}"), str::to_string);
                self.session.user = User::new(id, username);
                Parsed::Context(format!("now acting as {} ({id})", self.session.user))
            }
            ("join", Some(Ok(id))) => Parsed::Event(GatewayEvent::GuildCreate(id)),
            ("delete", Some(Ok(id))) => Parsed::Event(GatewayEvent::MessageDelete(MessageDeletion {
                id,
                channel_id: self.session.channel_id,
                guild_id: self.session.guild_id,
            })),
            (_, Some(Err(e))) => Parsed::Invalid(format!("bad id: {e}")),
            _ => Parsed::Invalid(format!("unknown directive :{directive}")),
        }
    }
}

/// Parse `name key=value key2=multi word value`
fn parse_command(text: &str) -> Result<CommandInteraction, String> {
    let mut words = text.split_whitespace();
    let name = words.next().ok_or_else(|| "missing command name".to_string())?;

    let mut options: Vec<(String, String)> = Vec::new();
    for word in words {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => options.push((key.to_string(), value.to_string())),
            _ => match options.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(word);
                }
                None => return Err(format!("argument `{word}` has no name, use key=value")),
            },
        }
    }

    Ok(options
        .into_iter()
        .fold(CommandInteraction::new(name), |command, (key, value)| {
            command.with_option(key, option_value(value))
        }))
}

/// Numbers and booleans keep their type, everything else is a string
fn option_value(raw: String) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => value,
        _ => serde_json::Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> InteractionParser {
        InteractionParser::new("/", Session::new(Snowflake(9)))
    }

    fn interaction(parsed: Parsed) -> Interaction {
        match parsed {
            Parsed::Event(GatewayEvent::InteractionCreate(interaction)) => interaction,
            other => panic!("expected interaction, got {other:?}"),
        }
    }

    #[test]
    fn parses_command_with_multi_word_option() {
        let mut parser = parser();
        let interaction = interaction(parser.parse("/openjourney prompt=a red fox in snow steps=20"));
        let command = interaction.command().expect("command data");

        assert_eq!(command.name, "openjourney");
        assert_eq!(command.option("prompt").map(|o| o.as_text()), Some("a red fox in snow".to_string()));
        assert_eq!(command.option("steps").map(|o| o.value.clone()), Some(serde_json::json!(20)));
        assert_eq!(interaction.app_id, Snowflake(9));
        assert_eq!(interaction.guild_id, Some(Snowflake(1)));
        assert!(interaction.member.is_some());
    }

    #[test]
    fn unnamed_argument_is_invalid() {
        let mut parser = parser();
        assert!(matches!(parser.parse("/openjourney a red fox"), Parsed::Invalid(_)));
        assert!(matches!(parser.parse("/"), Parsed::Invalid(_)));
    }

    #[test]
    fn dm_directive_makes_private_interactions() {
        let mut parser = parser();
        assert!(matches!(parser.parse(":dm"), Parsed::Context(_)));

        let interaction = interaction(parser.parse("/version"));
        assert!(interaction.guild_id.is_none());
        assert!(interaction.member.is_none());
        assert_eq!(interaction.user.map(|u| u.id), Some(Snowflake(1000)));
    }

    #[test]
    fn directives_change_session() {
        let mut parser = parser();
        parser.parse(":guild 7");
        parser.parse(":channel 8");
        parser.parse(":user 42 carol");

        let session = parser.session();
        assert_eq!(session.guild_id, Some(Snowflake(7)));
        assert_eq!(session.channel_id, Snowflake(8));
        assert_eq!(session.user.username, "carol");

        assert!(matches!(parser.parse(":guild seven"), Parsed::Invalid(_)));
        assert!(matches!(parser.parse(":teleport"), Parsed::Invalid(_)));
    }

    #[test]
    fn join_emits_guild_create() {
        let mut parser = parser();
        assert!(matches!(
            parser.parse(":join 55"),
            Parsed::Event(GatewayEvent::GuildCreate(Snowflake(55)))
        ));
    }

    #[test]
    fn delete_reports_message_in_current_channel() {
        let mut parser = parser();
        parser.parse(":channel 8");

        match parser.parse(":delete 77") {
            Parsed::Event(GatewayEvent::MessageDelete(deletion)) => {
                assert_eq!(deletion.id, Snowflake(77));
                assert_eq!(deletion.channel_id, Snowflake(8));
                assert_eq!(deletion.guild_id, Some(Snowflake(1)));
            }
            other => panic!("expected deletion, got {other:?}"),
        }
        assert!(matches!(parser.parse(":delete"), Parsed::Invalid(_)));
    }

    #[test]
    fn plain_text_is_a_message() {
        let mut parser = parser();
        match parser.parse("  hello there ") {
            Parsed::Event(GatewayEvent::MessageCreate(message)) => {
                assert_eq!(message.content, "hello there");
                assert_eq!(message.channel_id, Snowflake(100));
            }
            other => panic!("expected message, got {other:?}"),
        }
        assert!(matches!(parser.parse("   "), Parsed::Empty));
    }

    #[test]
    fn interaction_ids_are_unique() {
        let mut parser = parser();
        let a = interaction(parser.parse("/version"));
        let b = interaction(parser.parse("/version"));
        assert_ne!(a.id, b.id);
        assert_ne!(a.token, b.token);
    }
}
