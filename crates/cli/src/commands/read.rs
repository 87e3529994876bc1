// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;
use mediator_daemon::{RpcOk, RpcRequest};

use crate::client::DaemonClient;
use crate::commands::parse_variable_ref;

#[derive(Args)]
pub struct ReadArgs {
    /// One or more `module:object.variable` references.
    #[arg(required = true)]
    variables: Vec<String>,
}

pub async fn handle(args: ReadArgs, client: &DaemonClient) -> anyhow::Result<()> {
    let variables = args
        .variables
        .iter()
        .map(|s| parse_variable_ref(s))
        .collect::<anyhow::Result<Vec<_>>>()?;

    match client
        .call(RpcRequest::ReadVariables {
            variables: variables.clone(),
        })
        .await?
    {
        RpcOk::Variables { values } => {
            for (var, value) in variables.iter().zip(values) {
                match value {
                    Some(vtq) => println!("{var} = {:?} ({:?})", vtq.value, vtq.quality),
                    None => println!("{var} = <not configured>"),
                }
            }
        }
        other => anyhow::bail!("unexpected response from ReadVariables: {other:?}"),
    }
    Ok(())
}
