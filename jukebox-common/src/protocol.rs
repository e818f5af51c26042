//! Token stream wire protocol
//!
//! Shared between the relay server and the client:
//! - A [`Token`] names one sound in the library.
//! - The [`Manifest`] maps every token to the URL of its audio clip and is
//!   served as a JSON object from [`MANIFEST_PATH`].
//! - Stream frames are UTF-8 text. Server → client frames carry one or more
//!   tokens joined by [`DELIMITER`]; client → server frames carry exactly one.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Separator between tokens inside one stream delivery
pub const DELIMITER: char = '\n';

/// Manifest endpoint, relative to the server base URL
pub const MANIFEST_PATH: &str = "play/";

/// Streaming endpoint, relative to the server base URL
pub const STREAM_PATH: &str = "ws";

/// Identifier of a requested sound
///
/// Opaque: tokens are compared byte-for-byte and carry no ordering
/// semantics beyond arrival order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Token → audio clip URL, as served by the manifest endpoint
///
/// URLs may be absolute or relative to the server base URL.
pub type Manifest = BTreeMap<Token, String>;

/// Parse a manifest body
pub fn parse_manifest(body: &[u8]) -> Result<Manifest> {
    Ok(serde_json::from_slice(body)?)
}

/// Split one stream delivery into its tokens, in order
///
/// Every piece is returned, including empty ones, so a delivery with `k`
/// delimited pieces always yields `k` tokens.
pub fn split_delivery(payload: &str) -> impl Iterator<Item = Token> + '_ {
    payload.split(DELIMITER).map(Token::from)
}

/// Join pending tokens into one delivery frame
pub fn join_batch<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    let mut frame = String::new();
    for (i, token) in tokens.into_iter().enumerate() {
        if i > 0 {
            frame.push(DELIMITER);
        }
        frame.push_str(token.as_str());
    }
    frame
}

/// Manifest URL for a server base URL
pub fn manifest_url(server: &Url) -> Result<Url> {
    Ok(with_trailing_slash(server).join(MANIFEST_PATH)?)
}

/// Derive the streaming URL from the server base URL
///
/// `http` maps to `ws` and `https` to `wss`; the path becomes [`STREAM_PATH`]
/// under the server base.
pub fn stream_url(server: &Url) -> Result<Url> {
    let mut url = with_trailing_slash(server).join(STREAM_PATH)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::InvalidInput(format!(
                "cannot derive a stream URL from scheme '{}'",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::InvalidInput(format!("cannot switch {} to {}", url, scheme)))?;
    Ok(url)
}

/// Whether a URL can carry the token stream
pub fn is_stream_url(url: &Url) -> bool {
    matches!(url.scheme(), "ws" | "wss")
}

fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
