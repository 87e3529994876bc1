// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;
use mediator_daemon::RpcOk;

use crate::client::DaemonClient;

#[derive(Args)]
pub struct StatusArgs;

pub async fn handle(_args: StatusArgs, client: &DaemonClient) -> anyhow::Result<()> {
    if !client.healthy().await? {
        anyhow::bail!("mediatord did not report healthy");
    }
    match client.call(mediator_daemon::RpcRequest::GetModules).await? {
        RpcOk::Modules { modules } => {
            if modules.is_empty() {
                println!("mediatord is healthy (no modules configured)");
            } else {
                println!("mediatord is healthy, {} module(s):", modules.len());
                for module in modules {
                    println!("  {} — {}", module.id, module.state.as_deref().unwrap_or("unknown"));
                }
            }
        }
        other => anyhow::bail!("unexpected response from GetModules: {other:?}"),
    }
    Ok(())
}
