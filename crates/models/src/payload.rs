//! Self-describing `data:` URIs carrying attachment content.

use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// File content encoded as `data:<mime>;base64,<content>`.
///
/// Owned exclusively by one record. Values read from caches or clipboards are
/// kept verbatim; they are only validated when decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUri(String);
impl DataUri {
    /// Encode raw bytes with the given MIME type.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("{SCHEME}{mime_type}{BASE64_MARKER},{}", STANDARD.encode(bytes)))
    }

    pub fn from_raw(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn split(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix(SCHEME)?.split_once(',')
    }

    /// The MIME type declared in the URI header, if any.
    pub fn mime_type(&self) -> Option<&str> {
        let (header, _) = self.split()?;
        let mime = header.strip_suffix(BASE64_MARKER).unwrap_or(header);
        let mime = mime.split(';').next().unwrap_or(mime);
        (!mime.is_empty()).then_some(mime)
    }

    /// Size of the decoded content, computed from the base64 length without
    /// decoding.
    pub fn decoded_len(&self) -> Option<u64> {
        let (header, content) = self.split()?;
        if !header.ends_with(BASE64_MARKER) {
            return None;
        }
        let content = content.trim_end_matches('=');
        u64::try_from(content.len() * 3 / 4).ok()
    }

    /// Decode the content back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (header, content) = self.split().ok_or_raise(|| ErrorKind::MalformedDataUri)?;
        if !header.ends_with(BASE64_MARKER) {
            exn::bail!(ErrorKind::MalformedDataUri);
        }
        STANDARD.decode(content.trim()).or_raise(|| ErrorKind::InvalidBase64)
    }
}
