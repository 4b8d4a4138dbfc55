//! Catalog commands: search, pick, refresh and BOM loading.

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::currency::parse_amount;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "search",
            "Search the item catalog by code or name",
            "search <query>",
            cmd_search,
        ),
        CommandDefinition::new(
            "pick",
            "Fill a row from a search result",
            "pick <result> <row>",
            cmd_pick,
        ),
        CommandDefinition::new(
            "refresh",
            "Refetch the cached catalog",
            "refresh",
            cmd_refresh,
        ),
        CommandDefinition::new(
            "bom",
            "Replace the rows with a bill of materials",
            "bom <bom_id> <planned_quantity>",
            cmd_bom,
        ),
    ]
}

fn cmd_search(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = args.join(" ");
    let outcome = context
        .runtime
        .block_on(context.lookup.search_debounced(&context.debouncer, &query));
    let Some(outcome) = outcome else {
        return Ok(());
    };
    if let Some(status) = outcome.status {
        if status.is_error() {
            output::warning(status);
        } else {
            output::info(status);
        }
    }
    if outcome.items.is_empty() {
        output::info("No items found.");
    }
    for (idx, item) in outcome.items.iter().enumerate() {
        output::plain(format!(
            "  [{idx}] {:<12} {:<28} {:>8} {:<6} {:>10}",
            item.code, item.name, item.stock, item.uom, item.unit_price
        ));
    }
    context.last_results = outcome.items;
    Ok(())
}

fn cmd_pick(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [result, row] = args else {
        return Err(CommandError::InvalidArguments("usage: pick <result> <row>".into()));
    };
    let item = result
        .parse::<usize>()
        .ok()
        .and_then(|idx| context.last_results.get(idx))
        .cloned()
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("no search result `{result}`; run `search` first"))
        })?;
    let key = context.row_key(row)?;
    context.session.apply_item(key, &item)?;
    output::success(format!("Row #{row} filled with {} {}.", item.code, item.name));
    Ok(())
}

fn cmd_refresh(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let status = context.runtime.block_on(context.lookup.refresh());
    if status.is_error() {
        output::warning(status);
    } else {
        output::success(status);
    }
    Ok(())
}

fn cmd_bom(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [bom_id, planned] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: bom <bom_id> <planned_quantity>".into(),
        ));
    };
    let planned = parse_amount(planned);
    let ShellContext {
        runtime,
        lookup,
        session,
        ..
    } = context;
    let keys = runtime.block_on(session.load_bom(lookup, bom_id, planned))?;
    output::success(format!("Loaded {} BOM component(s).", keys.len()));
    Ok(())
}
