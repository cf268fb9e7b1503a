use std::process::ExitCode;

mod app;
mod content;

fn main() -> ExitCode {
    match app::bootstrap::build_app() {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(code) => code,
    }
}
