//! Form-level commands: header inputs, totals, submission and session setup.

use std::fs;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::derive::{HeaderField, Summary};
use crate::form::{FormKind, RowSeed};
use crate::view::summary_label;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "header",
            "Show or edit tax, discount, other cost, paid amount and payment date",
            "header [<field> <value>]",
            cmd_header,
        ),
        CommandDefinition::new("totals", "Show the derived totals", "totals", cmd_totals),
        CommandDefinition::new(
            "submit",
            "Flag empty rows and print the submission payload",
            "submit [--encoded]",
            cmd_submit,
        ),
        CommandDefinition::new(
            "load",
            "Start a session from a JSON array of rows",
            "load <path>",
            cmd_load,
        ),
        CommandDefinition::new(
            "new",
            "Start an empty session, optionally of another form kind",
            "new [line_items|bill_of_materials|journal_entry]",
            cmd_new,
        ),
        CommandDefinition::new(
            "config",
            "Show or change persisted settings",
            "config [show] | config set <key> <value>",
            cmd_config,
        ),
    ]
}

fn cmd_header(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            output::section("Header");
            for field in HeaderField::all() {
                output::plain(format!(
                    "  {:<22} {}",
                    field.as_str(),
                    context.session.header().get(field)
                ));
            }
            Ok(())
        }
        [field, value @ ..] => {
            let field: HeaderField = field.parse()?;
            let summary = context.session.on_header_edited(field, &value.join(" "))?;
            output::success(format!("{field} updated."));
            print_summary(&summary);
            Ok(())
        }
    }
}

fn cmd_totals(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = *context.session.summary();
    output::section("Totals");
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &Summary) {
    for (name, value) in summary.entries() {
        output::plain(format!("  {:<22} {}", summary_label(name), value));
    }
    if let Summary::JournalEntry(totals) = summary {
        if totals.balanced {
            output::success("Debits and credits balance.");
        } else {
            output::warning(format!("Out of balance by {:.2}.", totals.difference));
        }
    }
}

fn cmd_submit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let payload = context.session.prepare_submission();
    if args.contains(&"--encoded") {
        output::plain(payload.to_query_string());
    } else {
        output::section("Submission");
        for (name, value) in payload.pairs() {
            output::plain(format!("{name}={value}"));
        }
    }
    Ok(())
}

fn cmd_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(CommandError::InvalidArguments("usage: load <path>".into()));
    };
    let data = fs::read_to_string(path)?;
    let seeds: Vec<RowSeed> = serde_json::from_str(&data)?;
    let count = seeds.len();
    context.restart_session(seeds);
    output::success(format!("Loaded {count} row(s) from {path}."));
    Ok(())
}

fn cmd_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(kind) = args.first() {
        context.config.form_kind = kind.parse::<FormKind>()?;
    }
    context.restart_session(Vec::new());
    output::success(format!("New {} form started.", context.session.kind()));
    Ok(())
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => {
            let json = serde_json::to_string_pretty(&context.config)?;
            output::section(format!("Config ({})", context.config_manager.path().display()));
            output::plain(json);
            Ok(())
        }
        ["set", key, value] => {
            let mut config = context.config.clone();
            match *key {
                "api_base_url" => config.api_base_url = value.to_string(),
                "domain" => config.domain = value.to_string(),
                "prefix" => config.prefix = value.to_string(),
                "form_kind" => config.form_kind = value.parse()?,
                "strategy" => config.lookup.strategy = value.parse()?,
                "cache_expiry_minutes" => config.lookup.cache_expiry_minutes = parse_number(value)?,
                "debounce_ms" => config.lookup.debounce_ms = parse_number(value)?,
                "min_query_len" => config.lookup.min_query_len = parse_number(value)?,
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "unknown config key `{other}`"
                    )))
                }
            }
            context.apply_config(config)?;
            output::success(format!("{key} saved."));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: config [show] | config set <key> <value>".into(),
        )),
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str) -> Result<T, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a valid number")))
}
