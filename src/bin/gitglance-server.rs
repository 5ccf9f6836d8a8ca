// ABOUTME: GitGlance server binary with environment configuration and startup banner
// ABOUTME: Parses CLI overrides, initializes logging, and runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # GitGlance Server Binary
//!
//! Starts the portal: loads environment configuration, initializes logging,
//! wires the container, and serves HTTP until interrupted.

use anyhow::Result;
use clap::Parser;
use gitglance::{config, logging, server};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "gitglance-server")]
#[command(about = "GitGlance - server-rendered GitLab OAuth portal")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = config::environment::ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        cfg.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting GitGlance");
    info!("{}", cfg.summary());

    config::set_runtime_config(cfg.clone());
    let state = Arc::new(server::AppState::new(cfg)?);

    info!("Routes ready: / /auth /auth/callback /home /profile /activities /groups /logout /health /ready");

    server::run(state).await
}
