use std::process::ExitCode;

fn main() -> ExitCode {
    tbr_lib::run()
}
