// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for talking to a running `mediatord`.

use std::time::Duration;

use mediator_daemon::{RpcOk, RpcRequest};
use thiserror::Error;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for a single RPC round-trip.
pub fn timeout_rpc() -> Duration {
    parse_duration_ms("MEDIATOR_TIMEOUT_RPC_MS").unwrap_or(Duration::from_secs(10))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach mediatord at {0}: {1}")]
    Connect(String, reqwest::Error),

    #[error("mediatord rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response from mediatord: {0}")]
    MalformedResponse(reqwest::Error),
}

/// A thin HTTP client to one `mediatord` instance's transport.
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout_rpc())
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// `GET /healthz`. Returns `true` if the daemon answered 200.
    pub async fn healthy(&self) -> Result<bool, ClientError> {
        let url = format!("{}/healthz", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Connect(url, e))?;
        Ok(resp.status().is_success())
    }

    /// `POST /rpc` with a JSON-encoded [`RpcRequest`].
    pub async fn call(&self, req: RpcRequest) -> Result<RpcOk, ClientError> {
        let url = format!("{}/rpc", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ClientError::Connect(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp
                .json()
                .await
                .unwrap_or_else(|_| serde_json::json!({ "error": "malformed error response" }));
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("request failed")
                .to_string();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        resp.json().await.map_err(ClientError::MalformedResponse)
    }
}
