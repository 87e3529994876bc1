// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;
use mediator_core::{Clock, SystemClock, Timestamp, VariableValue, Vtq};
use mediator_daemon::{RpcOk, RpcRequest};

use crate::client::DaemonClient;
use crate::commands::parse_variable_ref;

#[derive(Args)]
pub struct WriteArgs {
    /// `module:object.variable`
    variable: String,
    /// `bool:true`, `int:5`, `double:3.14`, or `string:hello`
    value: String,
}

fn parse_value(s: &str) -> anyhow::Result<VariableValue> {
    let (kind, raw) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected `<type>:<value>`, got `{s}`"))?;
    Ok(match kind {
        "bool" => VariableValue::Bool(raw.parse()?),
        "int" => VariableValue::Int(raw.parse()?),
        "double" => VariableValue::Double(raw.parse()?),
        "string" => VariableValue::String(raw.to_string()),
        other => anyhow::bail!("unknown value type `{other}` (expected bool, int, double, or string)"),
    })
}

pub async fn handle(args: WriteArgs, client: &DaemonClient) -> anyhow::Result<()> {
    let variable = parse_variable_ref(&args.variable)?;
    let value = parse_value(&args.value)?;

    let vtq = Vtq::good(value, Timestamp::from_millis(SystemClock.now_ms()));

    match client
        .call(RpcRequest::WriteVariables { writes: vec![(variable, vtq)] })
        .await?
    {
        RpcOk::Ack => println!("ok"),
        other => anyhow::bail!("unexpected response from WriteVariables: {other:?}"),
    }
    Ok(())
}
