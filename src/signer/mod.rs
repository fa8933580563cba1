//! Request signing capability
//!
//! Every platform call carries `x-s`/`x-t`/`x-s-common` headers computed by an
//! opaque, versioned algorithm owned by the platform. The crawler never
//! computes them itself; it asks a [`Signer`] built once at startup and shared
//! by every job.

mod command;

pub use command::CommandSigner;

use crate::GatewayError;
use async_trait::async_trait;
use rand::Rng;

/// Alphabet of platform trace ids
const TRACE_ID_ALPHABET: &[u8] = b"abcdef0123456789";

/// Length of the `x-b3-traceid` header value
pub const B3_TRACE_ID_LEN: usize = 16;

/// Header values produced for one `(uri, body)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub xs: String,
    pub xt: String,
    pub xs_common: String,
}

/// Computes signature headers for outbound calls
#[async_trait]
pub trait Signer: Send + Sync {
    /// Signs the exact `uri` (with query string for GET) and `body` sent
    ///
    /// Any failure surfaces as `GatewayError::SignerUnavailable`.
    async fn sign(
        &self,
        uri: &str,
        body: &str,
        session_key: &str,
    ) -> Result<SignedHeaders, GatewayError>;

    /// Correlation id attached to each request
    fn trace_id(&self) -> String {
        generate_trace_id(B3_TRACE_ID_LEN)
    }
}

/// Generates a random lowercase-hex token of `len` characters
///
/// Used for `x-b3-traceid` headers and search ids. The value carries no
/// pagination state.
pub fn generate_trace_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| TRACE_ID_ALPHABET[rng.gen_range(0..TRACE_ID_ALPHABET.len())] as char)
        .collect()
}
