// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mediator - operator CLI for a running mediatord.

mod client;
mod commands;

use clap::{Parser, Subcommand};

use crate::client::DaemonClient;
use crate::commands::{call, read, status, write};

#[derive(Parser)]
#[command(name = "mediator", version, about = "Operator CLI for mediatord")]
struct Cli {
    /// Base URL of the running mediatord, e.g. http://127.0.0.1:4840
    #[arg(long, global = true, default_value = "http://127.0.0.1:4840")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Health check plus a module summary
    Status(status::StatusArgs),
    /// Read one or more variables
    Read(read::ReadArgs),
    /// Write a single variable
    Write(write::WriteArgs),
    /// Send a raw JSON RPC request and print the response
    Call(call::CallArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = DaemonClient::new(cli.addr);

    match cli.command {
        Commands::Status(args) => status::handle(args, &client).await,
        Commands::Read(args) => read::handle(args, &client).await,
        Commands::Write(args) => write::handle(args, &client).await,
        Commands::Call(args) => call::handle(args, &client).await,
    }
}
