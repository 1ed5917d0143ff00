use std::process::ExitCode;

fn main() -> ExitCode {
    submission_check::app::startup::run()
}
