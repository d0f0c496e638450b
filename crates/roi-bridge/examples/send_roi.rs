use anyhow::Result;
use clap::Parser;
use roi_bridge::{Config, Roi, RoiClient};
use std::path::PathBuf;

#[derive(Debug, Parser)]
struct Opts {
    #[clap(long, help = "JSON5 config file.")]
    pub config: Option<PathBuf>,
    #[clap(long, help = "Server IP address, overriding the config.")]
    pub host: Option<String>,
    #[clap(long, help = "Server port, overriding the config.")]
    pub port: Option<u16>,
    #[clap(long, default_value = "1", help = "Number of times to send the ROI.")]
    pub count: usize,
    #[clap(allow_negative_numbers = true)]
    pub x: i32,
    #[clap(allow_negative_numbers = true)]
    pub y: i32,
    #[clap(allow_negative_numbers = true)]
    pub w: i32,
    #[clap(allow_negative_numbers = true)]
    pub h: i32,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let mut config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(host) = opts.host {
        config.host = host;
    }
    if let Some(port) = opts.port {
        config.port = port;
    }

    let client = RoiClient::new(config);
    let roi = Roi::new(opts.x, opts.y, opts.w, opts.h);

    (0..opts.count).try_for_each(|idx| {
        let response = client.forward(roi)?;
        eprintln!("Result[{}] {} -> {}", idx, roi, response);
        anyhow::Ok(())
    })?;

    Ok(())
}
