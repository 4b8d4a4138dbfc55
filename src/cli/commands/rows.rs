//! Row editing: show, add, set, delete and the row menu.

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::form::Field;
use crate::session::{DeleteOutcome, InsertPosition, MenuOutcome};
use crate::view::{DismissReason, MenuAction, ViewKind};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "show",
            "Render the desktop table or mobile cards",
            "show [desktop|mobile]",
            cmd_show,
        ),
        CommandDefinition::new(
            "add",
            "Add a row at the end or next to a row",
            "add [above|below <row>]",
            cmd_add,
        ),
        CommandDefinition::new(
            "set",
            "Edit a row field as if typed into a view",
            "set <row> <field> <value> [--mobile]",
            cmd_set,
        ),
        CommandDefinition::new("delete", "Delete a row", "delete <row>", cmd_delete)
            .with_aliases(&["rm"]),
        CommandDefinition::new(
            "menu",
            "Open the row menu, act on it, or dismiss it",
            "menu open <row> | menu add-above|add-below|delete | menu dismiss [click|scroll|escape]",
            cmd_menu,
        ),
    ]
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = match args.first().map(|arg| arg.to_lowercase()).as_deref() {
        None | Some("desktop") => ViewKind::Desktop,
        Some("mobile") => ViewKind::Mobile,
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown view `{other}`; use desktop or mobile"
            )))
        }
    };
    match context.session.view(kind) {
        Some(view) => {
            output::section(format!("{kind} view"));
            output::plain(view.output());
        }
        None => output::warning(format!("{kind} view is not attached")),
    }
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (anchor, position) = match args {
        [] => (None, InsertPosition::Append),
        [side, row] => {
            let position = match side.to_lowercase().as_str() {
                "above" => InsertPosition::Above,
                "below" => InsertPosition::Below,
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "expected `above` or `below`, got `{other}`"
                    )))
                }
            };
            (Some(context.row_key(row)?), position)
        }
        _ => return Err(CommandError::InvalidArguments("usage: add [above|below <row>]".into())),
    };
    let key = context.session.on_add_requested(anchor, position);
    if let Some(row) = context.session.store().get(key) {
        output::success(format!("Row #{} added.", row.index()));
    }
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let origin = if args.contains(&"--mobile") {
        ViewKind::Mobile
    } else {
        ViewKind::Desktop
    };
    let args: Vec<&str> = args.iter().copied().filter(|arg| *arg != "--mobile").collect();
    let [row, field, value @ ..] = args.as_slice() else {
        return Err(CommandError::InvalidArguments(
            "usage: set <row> <field> <value>".into(),
        ));
    };
    let key = context.row_key(row)?;
    let field = Field::from_name(field);
    let value = value.join(" ");
    let ticket = context
        .session
        .on_field_edited(origin, key, field.clone(), &value)?;

    if ticket.is_some() {
        let ShellContext {
            runtime,
            lookup,
            session,
            ..
        } = &mut *context;
        let code = value.trim();
        if !runtime.block_on(session.resolve_item_code(lookup, key)) {
            output::warning(format!("Item lookup for `{code}` failed; row left as typed."));
        } else if session
            .store()
            .get(key)
            .is_some_and(|row| row.field(&Field::ItemName).is_empty())
        {
            output::warning(format!("Item `{code}` not found."));
        }
    }
    output::success(format!("Row #{row} {field} updated."));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [row] = args else {
        return Err(CommandError::InvalidArguments("usage: delete <row>".into()));
    };
    let key = context.row_key(row)?;
    report_delete(row, context.session.on_delete_requested(key));
    Ok(())
}

fn report_delete(row: &str, outcome: DeleteOutcome) {
    match outcome {
        DeleteOutcome::SoftDeleted => output::success(format!("Row #{row} marked for deletion.")),
        DeleteOutcome::Removed => output::success(format!("Row #{row} removed.")),
        DeleteOutcome::Refused => output::warning(format!(
            "Row #{row} was not deleted; at least one row must remain."
        )),
    }
}

fn cmd_menu(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        ["open", row] => {
            let key = context.row_key(row)?;
            if context.session.open_menu(key) {
                output::info(format!("Menu open on row #{row}: add-above, add-below, delete."));
            } else {
                output::warning(format!("Row #{row} is hidden."));
            }
        }
        ["dismiss"] => context.session.dismiss_menu(DismissReason::OutsideClick),
        ["dismiss", reason] => context.session.dismiss_menu(reason.parse()?),
        [action] => {
            let action: MenuAction = action.parse()?;
            match context.session.on_menu_action(action) {
                Some(MenuOutcome::Added(key)) => {
                    if let Some(row) = context.session.store().get(key) {
                        output::success(format!("Row #{} added.", row.index()));
                    }
                }
                Some(MenuOutcome::Deleted(outcome)) => report_delete("target", outcome),
                None => output::warning("The row menu is not open."),
            }
        }
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: menu open <row> | menu <action> | menu dismiss [reason]".into(),
            ))
        }
    }
    Ok(())
}
