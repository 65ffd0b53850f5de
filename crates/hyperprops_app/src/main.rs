// SPDX-License-Identifier: MIT OR Apache-2.0
//! `hyperprops` command-line tool

use clap::Parser;
use hyperprops_app::cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::Args::parse();

    let default_directive = match args.verbosity {
        0 => "hyperprops_app=info",
        1 => "hyperprops_app=debug",
        _ => "hyperprops_app=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = cli::run(args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
