use bkit_lib::PromptCancelled;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match bkit_lib::main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<PromptCancelled>() => {
            eprintln!("cancelled");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
