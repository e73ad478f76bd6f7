use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CommandInteraction, CommandResponse, Interaction};
use crate::domain::traits::Gateway;

/// Everything a handler gets to look at
pub struct CommandContext<'a> {
    pub gateway: &'a Arc<dyn Gateway>,
    pub interaction: &'a Interaction,
    pub command: &'a CommandInteraction,
}

/// Command handler function type
pub type HandlerFn = Arc<dyn Fn(&CommandContext<'_>) -> CommandResponse + Send + Sync>;

/// Kind of application command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    #[default]
    ChatInput,
}

/// Declared argument type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
}

/// Declared argument of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
}

impl OptionSpec {
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: OptionKind::String,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A registered command: metadata plus the code that runs it
#[derive(Clone)]
pub struct CommandHandler {
    pub description: String,
    pub kind: CommandKind,
    pub options: Vec<OptionSpec>,
    pub handler: HandlerFn,
}

impl CommandHandler {
    pub fn new<F>(description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CommandContext<'_>) -> CommandResponse + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            kind: CommandKind::default(),
            options: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn call(&self, ctx: &CommandContext<'_>) -> CommandResponse {
        (self.handler)(ctx)
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("description", &self.description)
            .field("kind", &self.kind)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// What gets declared to the remote platform for one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDeclaration {
    pub name: String,
    pub description: String,
    pub kind: CommandKind,
    pub options: Vec<OptionSpec>,
    pub default_member_permissions: u64,
}

/// Command registry, filled at startup and read-only afterwards
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration for a name wins
    pub fn register(&mut self, name: impl Into<String>, handler: CommandHandler) {
        self.commands.insert(name.into(), Arc::new(handler));
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<CommandHandler>> {
        self.commands.get(name).cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = (&str, &CommandHandler)> {
        self.commands.iter().map(|(name, handler)| (name.as_str(), handler.as_ref()))
    }

    /// Declarations for every command, sorted by name
    pub fn declarations(&self) -> Vec<CommandDeclaration> {
        let mut declarations: Vec<_> = self
            .all()
            .map(|(name, handler)| CommandDeclaration {
                name: name.to_string(),
                description: handler.description.clone(),
                kind: handler.kind,
                options: handler.options.clone(),
                default_member_permissions: 0,
            })
            .collect();
        declarations.sort_by(|a, b| a.name.cmp(&b.name));
        declarations
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
