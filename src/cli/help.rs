use crate::cli::commands::{CommandDefinition, CommandGroup, CommandRegistry};
use crate::cli::output;

const GROUPS: [CommandGroup; 4] = [
    CommandGroup::Rows,
    CommandGroup::Form,
    CommandGroup::Catalog,
    CommandGroup::Shell,
];

pub fn print_overview(registry: &CommandRegistry) {
    for group in GROUPS {
        output::section(group.title());
        for definition in registry.group(group) {
            output::plain(format!("  {:<10} {}", definition.name, definition.description));
        }
    }
    output::info("Use `help <command>` for details.");
}

pub fn print_command(definition: &CommandDefinition) {
    output::section(format!("Help: {}", definition.name));
    output::plain(format!("  Description: {}", definition.description));
    output::plain(format!("  Usage: {}", definition.usage));
    if !definition.aliases.is_empty() {
        output::plain(format!("  Aliases: {}", definition.aliases.join(", ")));
    }
}
