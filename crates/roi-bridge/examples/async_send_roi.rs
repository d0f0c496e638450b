use anyhow::{Context as _, Result};
use clap::Parser;
use futures::prelude::*;
use roi_bridge::{AsyncRoiClient, Config, Roi};
use std::path::PathBuf;

#[derive(Debug, Parser)]
struct Opts {
    #[clap(long, help = "JSON5 config file.")]
    pub config: Option<PathBuf>,
    #[clap(long, default_value = "4", help = "Number of ROIs sent concurrently.")]
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

#[async_std::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let client = AsyncRoiClient::new(config);

    // Shift each ROI by its index so the requests are distinguishable.
    let count = i32::try_from(opts.count).context("--count is too large")?;
    let base = Roi::new(opts.x, opts.y, opts.w, opts.h);
    let rois: Vec<_> = (0..count).map(|idx| base.offset(idx)).collect();

    let results = future::join_all(rois.iter().map(|&roi| client.forward(roi))).await;

    rois.iter()
        .zip(results)
        .try_for_each(|(roi, result)| {
            eprintln!("{} -> {}", roi, result?);
            anyhow::Ok(())
        })?;

    Ok(())
}
