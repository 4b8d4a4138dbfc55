use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, LoopControl};
use crate::cli::output::{self, OutputPreferences};
use crate::cli::shell_context::{CliMode, ShellContext};
use crate::derive::HeaderField;
use crate::form::Field;

/// Environment variable switching the shell to line-per-command stdin mode.
pub const SCRIPT_ENV: &str = "FORMSET_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    output::set_preferences(OutputPreferences {
        plain_mode: mode == CliMode::Script,
    });

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<FormHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(FormHelper::new(context.command_usages())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                if execute(context, line)? == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                output::info("Type `exit` or press Ctrl-D to leave.");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// One command per stdin line; blank lines and `#` comments are skipped.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if execute(context, line)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Tokenises and dispatches one line. Command failures are reported and the
/// shell carries on; only fatal errors propagate.
fn execute(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not read `{line}`: {err}"));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.to_string());

    match context.dispatch(&raw.to_lowercase(), raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        Ok(LoopControl::Continue) => Ok(LoopControl::Continue),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

/// Tab completion and usage hints for the form shell.
///
/// Completes command names, the field argument of `set`, header names after
/// `header` and the fixed choices of `show` and `menu`.
struct FormHelper {
    commands: Vec<(&'static str, &'static str)>,
}

impl FormHelper {
    fn new(commands: Vec<(&'static str, &'static str)>) -> Self {
        Self { commands }
    }

    fn candidates(&self, words: &[&str]) -> Vec<String> {
        match words {
            [] => self.commands.iter().map(|(name, _)| name.to_string()).collect(),
            ["set", _row] => Field::known().iter().map(|f| f.as_str().to_string()).collect(),
            ["header"] => HeaderField::all().iter().map(|f| f.as_str().to_string()).collect(),
            ["show"] => vec!["desktop".into(), "mobile".into()],
            ["menu"] => ["open", "add-above", "add-below", "delete", "dismiss"]
                .iter()
                .map(|word| word.to_string())
                .collect(),
            ["menu", "dismiss"] => vec!["click".into(), "scroll".into(), "escape".into()],
            _ => Vec::new(),
        }
    }

    /// After `<command> ` the rest of that command's usage line.
    fn usage_hint(&self, line: &str) -> Option<String> {
        let command = line.strip_suffix(' ')?.trim().to_lowercase();
        let (_, usage) = self.commands.iter().find(|(name, _)| *name == command)?;
        let rest = usage.strip_prefix(command.as_str())?.trim_start();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

impl Helper for FormHelper {}

impl Completer for FormHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let head = &line[..pos];
        let start = head.rfind(char::is_whitespace).map_or(0, |idx| idx + 1);
        let words: Vec<String> = head[..start]
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let needle = head[start..].to_lowercase();
        let pairs = self
            .candidates(&words)
            .into_iter()
            .filter(|candidate| candidate.starts_with(&needle))
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for FormHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos != line.len() {
            return None;
        }
        self.usage_hint(line)
    }
}

impl Highlighter for FormHelper {}

impl Validator for FormHelper {}
