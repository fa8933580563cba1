//! Signed request gateway
//!
//! This module turns one logical platform call into one HTTP request:
//! - Deriving the session key from the caller's cookie string
//! - Asking the injected signer for the signature headers
//! - Sending exactly one request (no internal retry)
//! - Classifying the reply into data or a `GatewayError`

use crate::config::PlatformConfig;
use crate::signer::Signer;
use crate::GatewayError;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::form_urlencoded;

/// Browser identity presented to the API
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0";

/// Cookie that doubles as the signing session key
const SESSION_KEY_COOKIE: &str = "a1";

/// Parsed cookie set of one caller
#[derive(Debug, Clone)]
pub struct Session {
    cookies: Vec<(String, String)>,
    session_key: String,
}

impl Session {
    /// Parses a `name=value; name2=value2` cookie string
    ///
    /// # Errors
    ///
    /// `GatewayError::MissingSessionKey` if there is no non-empty `a1` cookie.
    pub fn from_cookie_str(raw: &str) -> Result<Self, GatewayError> {
        let cookies: Vec<(String, String)> = raw
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();

        let session_key = cookies
            .iter()
            .find(|(name, _)| name == SESSION_KEY_COOKIE)
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
            .ok_or(GatewayError::MissingSessionKey)?;

        Ok(Self {
            cookies,
            session_key,
        })
    }

    /// The value handed to the signer
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Renders the cookie set as a `Cookie` header value
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// HTTP method of a platform call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// Builds an HTTP client for the platform API
///
/// # Arguments
///
/// * `config` - The platform configuration (timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &PlatformConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues signed calls against the platform API
pub struct Gateway {
    client: Client,
    signer: Arc<dyn Signer>,
    api_base_url: String,
    web_base_url: String,
}

impl Gateway {
    pub fn new(client: Client, signer: Arc<dyn Signer>, config: &PlatformConfig) -> Self {
        Self {
            client,
            signer,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            web_base_url: config.web_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL for shareable note links
    pub fn web_base_url(&self) -> &str {
        &self.web_base_url
    }

    /// Performs one signed call
    ///
    /// # Request Flow
    ///
    /// 1. GET: `params` (a JSON object) becomes the query string; the signer
    ///    sees `uri?query` and an empty body, and the identical query is sent
    /// 2. POST: `params` is sent as compact JSON; the signer sees `uri` and
    ///    that exact body
    /// 3. The response envelope is classified:
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Send or read failure | `Transport` |
    /// | Non-2xx status without an error envelope | `Transport` |
    /// | 2xx body is not a JSON object | `MalformedResponse` |
    /// | `code != 0` or `success == false` | `Platform` |
    /// | No `data` field | `MalformedResponse` |
    /// | Otherwise | `Ok(data)` |
    pub async fn call(
        &self,
        session: &Session,
        method: Method,
        uri: &str,
        params: &Value,
    ) -> Result<Value, GatewayError> {
        let (signed_uri, body) = match method {
            Method::Get => {
                let query = encode_query(params);
                let signed = if query.is_empty() {
                    uri.to_string()
                } else {
                    format!("{}?{}", uri, query)
                };
                (signed, String::new())
            }
            Method::Post => {
                let body = serde_json::to_string(params).map_err(|e| {
                    GatewayError::MalformedResponse {
                        uri: uri.to_string(),
                        reason: format!("request body not serializable: {}", e),
                    }
                })?;
                (uri.to_string(), body)
            }
        };

        let signature = self
            .signer
            .sign(&signed_uri, &body, session.session_key())
            .await?;

        let url = format!("{}{}", self.api_base_url, signed_uri);
        let request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self
                .client
                .post(&url)
                .header("content-type", "application/json;charset=UTF-8")
                .body(body),
        };

        let request = request
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "zh-CN,zh;q=0.9,en;q=0.8")
            .header("origin", self.web_base_url.as_str())
            .header("referer", format!("{}/", self.web_base_url))
            .header("x-s", signature.xs)
            .header("x-t", signature.xt)
            .header("x-s-common", signature.xs_common)
            .header("x-b3-traceid", self.signer.trace_id())
            .header("x-mns", "unload")
            .header("cookie", session.cookie_header());

        tracing::debug!("{} {}", method, signed_uri);

        let response = request.send().await.map_err(|e| GatewayError::Transport {
            uri: uri.to_string(),
            message: describe_transport_error(&e),
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport {
                uri: uri.to_string(),
                message: describe_transport_error(&e),
            })?;

        tracing::trace!("{} {} -> {}", method, uri, status);

        parse_envelope(uri, status, &text)
    }
}

/// Encodes a flat JSON object as a query string
///
/// Strings are used verbatim, `null` becomes an empty value, and any other
/// value is written as its JSON text.
fn encode_query(params: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Value::Object(map) = params {
        for (key, value) in map {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            serializer.append_pair(key, &rendered);
        }
    }
    serializer.finish()
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Classifies a raw response body
///
/// A non-2xx status is never a success: it is reported as `Platform` when the
/// body still carries an error envelope, as `Transport` otherwise.
fn parse_envelope(uri: &str, status: StatusCode, body: &str) -> Result<Value, GatewayError> {
    let malformed = |reason: String| GatewayError::MalformedResponse {
        uri: uri.to_string(),
        reason,
    };
    let transport = || GatewayError::Transport {
        uri: uri.to_string(),
        message: format!("HTTP {}", status),
    };

    let mut map = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) if !status.is_success() => return Err(transport()),
        Err(_) if !status.is_success() => return Err(transport()),
        Ok(_) => return Err(malformed("body is not an object".to_string())),
        Err(e) => return Err(malformed(format!("body is not JSON ({})", e))),
    };

    let code = map.get("code").and_then(Value::as_i64);
    let success = map.get("success").and_then(Value::as_bool);
    let message = map
        .get("msg")
        .or_else(|| map.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    if code.is_some_and(|c| c != 0) || success == Some(false) {
        return Err(GatewayError::Platform {
            uri: uri.to_string(),
            code: code.unwrap_or(-1),
            message,
        });
    }

    if !status.is_success() {
        return Err(transport());
    }

    match map.remove("data") {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(malformed("envelope has no data".to_string())),
    }
}
