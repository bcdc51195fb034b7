use hcp_cli::cli::CliCommand;
use hcp_cli::commands::Prepared;
use hcp_cli::{commands, init_subscriber, Context, Invocation};
use hcp_core::{cancel_pair, CancelSignal};
use std::process::ExitCode;
use tokio::task::JoinHandle;
use tracing::warn;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = hcp_cli::build_cli().get_matches();
    let invocation = match Invocation::from_matches(&matches) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_subscriber(invocation.global.verbosity, invocation.global.log_json) {
        eprintln!("Warning: {e:#}");
    }

    match run(invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: Invocation) -> anyhow::Result<()> {
    let ctx = Context::load(&invocation.global)?;

    let mut stdout = std::io::stdout().lock();
    match &invocation.command {
        CliCommand::Audit(args) => {
            commands::audit(&ctx, args, &mut stdout).await?;
        }
        CliCommand::Migrate(args) => {
            let prepared = {
                let mut stdin = std::io::stdin().lock();
                commands::prepare_migration(&ctx, args, &mut stdin, &mut stdout).await?
            };
            if let Prepared::Ready(plan) = prepared {
                let (cancel, listener) = cancel_on_interrupt();
                let outcome = commands::execute_migration(&ctx, plan, &mut stdout, &cancel).await;
                listener.abort();
                outcome?;
            }
        }
    }
    Ok(())
}

/// First Ctrl-C lets the current cluster finish and skips the rest; a second one exits
fn cancel_on_interrupt() -> (CancelSignal, JoinHandle<()>) {
    let (handle, cancel) = cancel_pair();
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, cancelling remaining clusters (Ctrl-C again to exit)");
        handle.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });
    (cancel, listener)
}
