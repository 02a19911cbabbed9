use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;

use super::probe::AspectRatio;

const ID_BYTES: usize = 32;

/// Object storage key of the form `<orientation>/<id><ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    pub aspect_ratio: AspectRatio,
    pub file_name: String,
}

impl StorageKey {
    pub fn as_path(&self) -> String {
        format!("{}/{}", self.aspect_ratio, self.file_name)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.aspect_ratio, self.file_name)
    }
}

/// 32 bytes from the OS random source, URL-safe base64 without padding.
///
/// Panics if the OS cannot supply entropy.
pub fn random_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// ".<subtype>" for a well-formed `type/subtype`, ".bin" otherwise
pub fn media_type_to_ext(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    if parts.len() != 2 {
        return ".bin".to_string();
    }
    format!(".{}", parts[1])
}

pub fn derive_key(media_type: &str, aspect_ratio: AspectRatio) -> StorageKey {
    StorageKey {
        aspect_ratio,
        file_name: format!("{}{}", random_id(), media_type_to_ext(media_type)),
    }
}
