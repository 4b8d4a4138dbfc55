use std::process::ExitCode;

fn main() -> ExitCode {
    formset_core::init();
    match formset_core::cli::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("formset_cli: {err}");
            ExitCode::FAILURE
        }
    }
}
