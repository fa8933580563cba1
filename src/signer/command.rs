//! Signer backed by an external interpreter process
//!
//! The configured command is started once per signing call. It receives
//! `{"uri": ..., "data": ..., "a1": ...}` on stdin and must print
//! `{"xs": ..., "xt": ..., "xs_common": ...}` on stdout.

use crate::config::SignerConfig;
use crate::signer::{SignedHeaders, Signer};
use crate::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Serialize)]
struct SignRequest<'a> {
    uri: &'a str,
    data: &'a str,
    a1: &'a str,
}

#[derive(Deserialize)]
struct SignResponse {
    xs: String,
    #[serde(deserialize_with = "string_or_number")]
    xt: String,
    xs_common: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

/// Runs the configured signing script for every call
#[derive(Debug, Clone)]
pub struct CommandSigner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSigner {
    pub fn new(config: &SignerConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn run(&self, input: Vec<u8>) -> Result<Vec<u8>, String> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start '{}': {}", self.command, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "signer stdin not captured".to_string())?;
        stdin
            .write_all(&input)
            .await
            .map_err(|e| format!("failed to write request: {}", e))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| format!("signer did not finish: {}", e))?;

        if !output.status.success() {
            return Err(format!(
                "signer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Signer for CommandSigner {
    async fn sign(
        &self,
        uri: &str,
        body: &str,
        session_key: &str,
    ) -> Result<SignedHeaders, GatewayError> {
        let input = serde_json::to_vec(&SignRequest {
            uri,
            data: body,
            a1: session_key,
        })
        .map_err(|e| GatewayError::SignerUnavailable(e.to_string()))?;

        let stdout = tokio::time::timeout(self.timeout, self.run(input))
            .await
            .map_err(|_| {
                GatewayError::SignerUnavailable(format!("timed out after {:?}", self.timeout))
            })?
            .map_err(GatewayError::SignerUnavailable)?;

        let response: SignResponse = serde_json::from_slice(&stdout).map_err(|e| {
            GatewayError::SignerUnavailable(format!("unreadable signer output: {}", e))
        })?;

        tracing::trace!("Signed {}", uri);

        Ok(SignedHeaders {
            xs: response.xs,
            xt: response.xt,
            xs_common: response.xs_common,
        })
    }
}
