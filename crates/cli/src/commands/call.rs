// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;
use mediator_daemon::RpcRequest;

use crate::client::DaemonClient;

#[derive(Args)]
pub struct CallArgs {
    /// A JSON-encoded request, e.g. `{"method":"GetModules"}`.
    request_json: String,
}

pub async fn handle(args: CallArgs, client: &DaemonClient) -> anyhow::Result<()> {
    let req: RpcRequest = serde_json::from_str(&args.request_json)?;
    let resp = client.call(req).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}
