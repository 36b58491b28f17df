mod config;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use config::{Effective, PlayArgs};
use logplay_engine::{
    ChannelFilter, EventLog, PlaybackSession, Provider, ReplayError, Speed, UdpPublisher,
};

#[derive(Parser)]
#[command(
    name = "logplay",
    about = "Reads packets from a log file and publishes them to the bus"
)]
struct Cli {
    #[command(flatten)]
    args: PlayArgs,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Help and usage errors both exit non-zero; no playback is attempted.
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            std::process::exit(2);
        }
    };

    let eff = match Effective::new(&cli.args) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&eff).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(eff: &Effective) -> Result<(), ReplayError> {
    let speed = Speed::new(eff.speed)?;
    let filter = ChannelFilter::new(&eff.regexp)?;
    let provider = Provider::parse(&eff.provider)?;
    let publisher = UdpPublisher::connect(&provider)?;
    let log = EventLog::open(&eff.file)?;

    tracing::info!(file = %eff.file, speed = eff.speed, provider = %provider, "starting playback");

    let token = CancellationToken::new();
    let abort = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.cancel();
        }
    });

    let session = PlaybackSession::new(log, filter, speed, eff.verbose, publisher);
    let report = session.run(token).await?;

    tracing::info!(
        published = report.published,
        skipped = report.skipped,
        cancelled = report.cancelled,
        "playback complete"
    );
    Ok(())
}
