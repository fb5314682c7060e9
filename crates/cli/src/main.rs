use std::process::ExitCode;

fn main() -> ExitCode {
    saleflow_cli::run()
}
