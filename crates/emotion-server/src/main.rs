use anyhow::Result;
use clap::Parser;
use emotion_server::{AsyncServer, MockClassifier, DEFAULT_ADDR};
use futures::prelude::*;
use log::{info, warn};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
struct Opts {
    #[clap(long, help = "Server bind address.")]
    pub addr: Option<SocketAddr>,
    #[clap(long, help = "Model file. Accepted, the mock classifier is used regardless.")]
    pub model: Option<PathBuf>,
    #[clap(long, help = "Seed of the mock classifier.")]
    pub seed: Option<u64>,
    #[clap(long, default_value = "100", help = "Simulated processing time per request.")]
    pub delay_ms: u64,
}

#[async_std::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let addr = match opts.addr {
        Some(addr) => addr,
        None => DEFAULT_ADDR.parse()?,
    };
    info!("Starting emotion server on {}", addr);

    match &opts.model {
        Some(path) => warn!(
            "Model loading is not supported, ignoring {} and using the mock classifier",
            path.display()
        ),
        None => info!("No model provided, using the mock classifier"),
    }
    let classifier = match opts.seed {
        Some(seed) => MockClassifier::seeded(seed),
        None => MockClassifier::new(),
    };

    let server = AsyncServer::bind(addr, classifier)
        .await?
        .processing_delay(Duration::from_millis(opts.delay_ms));
    info!("Listening for connections");

    server.into_stream().try_for_each(|_| future::ok(())).await?;

    Ok(())
}
