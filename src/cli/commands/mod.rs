use std::collections::HashMap;

pub mod form;
pub mod lookup;
pub mod rows;
pub mod system;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    [
        (CommandGroup::Shell, system::definitions()),
        (CommandGroup::Rows, rows::definitions()),
        (CommandGroup::Form, form::definitions()),
        (CommandGroup::Catalog, lookup::definitions()),
    ]
    .into_iter()
    .flat_map(|(group, definitions)| {
        definitions
            .into_iter()
            .map(move |definition| CommandDefinition { group, ..definition })
    })
    .collect()
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Section a command is listed under in `help`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Shell,
    Rows,
    Form,
    Catalog,
}

impl CommandGroup {
    pub fn title(&self) -> &'static str {
        match self {
            CommandGroup::Shell => "Shell",
            CommandGroup::Rows => "Rows",
            CommandGroup::Form => "Form",
            CommandGroup::Catalog => "Catalog",
        }
    }
}

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub group: CommandGroup,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            description,
            usage,
            group: CommandGroup::Shell,
            handler,
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Commands in listing order, addressable by name or alias.
pub struct CommandRegistry {
    definitions: Vec<CommandDefinition>,
    lookup: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut lookup = HashMap::new();
        for (idx, definition) in definitions.iter().enumerate() {
            lookup.insert(definition.name, idx);
            for alias in definition.aliases {
                lookup.entry(*alias).or_insert(idx);
            }
        }
        Self {
            definitions,
            lookup,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.lookup.get(name).map(|idx| &self.definitions[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.definitions.iter()
    }

    /// Canonical names followed by aliases; the vocabulary for suggestions.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions
            .iter()
            .map(|definition| definition.name)
            .chain(
                self.definitions
                    .iter()
                    .flat_map(|definition| definition.aliases.iter().copied()),
            )
    }

    /// Definitions of one group, in listing order.
    pub fn group(&self, group: CommandGroup) -> impl Iterator<Item = &CommandDefinition> {
        self.definitions
            .iter()
            .filter(move |definition| definition.group == group)
    }
}
