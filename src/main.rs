use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pushgate=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let code = match cli::run() {
        cli::RunOutcome::Serve(config, addr) => match pushgate::serve(config, addr).await {
            Ok(()) => 0,
            Err(err) => {
                tracing::error!(error = %err, "server stopped");
                1
            }
        },
        cli::RunOutcome::Notify(config, request) => cli::run_notify(config, request).await,
        cli::RunOutcome::Exit(code) => code,
    };
    if code != 0 {
        std::process::exit(code);
    }
}
