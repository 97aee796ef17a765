pub mod cache;
pub mod dser;
pub mod headers;
pub mod perm;
pub mod time;

use std::path::Path;

use axum::extract::Multipart;
use base64::prelude::Engine;

pub use time::TIME;

use crate::Response;
/// base64 url safe encode
pub fn base64_encode(input: impl AsRef<[u8]>) -> String {
    base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(input)
}

/// base64 url safe decode
pub fn base64_decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    base64::prelude::BASE64_URL_SAFE_NO_PAD.decode(input)
}
/// Ternary expression.
#[macro_export]
macro_rules! do_if {
    ($pat:expr => $suc:expr, $e:expr) => {
        if $pat {
            $suc
        } else {
            $e
        }
    };
}

lazy_static::lazy_static! {
    static ref EMAIL: regex::Regex =
        regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
}

pub fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// New random record id.
pub fn gen_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug)]
pub struct FilePart {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

impl FilePart {
    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or_default()
    }
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub struct MessagePart {
    pub files: Vec<FilePart>,
    pub json: String,
}

impl MessagePart {
    /// The `data` field, or `{}` when the form carried none.
    pub fn json_or_empty(&self) -> &str {
        do_if!(self.json.trim().is_empty() => "{}", &self.json)
    }
}

/// Split a multipart form into its `file` parts and its `data` json field.
pub async fn parse_multipart(mut part: Multipart) -> Result<MessagePart, Response> {
    let mut files = Vec::new();
    let mut data = String::new();
    while let Some(field) = part.next_field().await? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().map(|s| s.to_owned());
                let bytes = field.bytes().await?.to_vec();
                files.push(FilePart { bytes, filename });
            }
            Some("data") => {
                data = field.text().await?;
            }
            _ => (),
        }
    }
    Ok(MessagePart { files, json: data })
}

/// Opaque storage name for an uploaded file: a digest of the upload time and
/// original name, keeping the original extension.
pub fn gen_file_link(time: &TIME, filename: &str) -> String {
    let digest = md5::compute(format!("{}{}", time.naos(), filename));
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()));
    match ext {
        Some(ext) => format!("{:x}.{}", digest, ext.to_ascii_lowercase()),
        None => format!("{:x}", digest),
    }
}

/// Store an upload under `dir` and return its link.
pub fn store_file(dir: &Path, file: &FilePart) -> Result<String, Response> {
    let link = gen_file_link(&TIME::now()?, file.filename());
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(&link), &file.bytes)?;
    Ok(link)
}

/// Read a stored upload. Links are generated by [`gen_file_link`], so anything
/// that could walk out of `dir` is refused.
pub fn read_file(dir: &Path, link: &str) -> Result<Vec<u8>, Response> {
    if link.is_empty() || !link.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') || link.contains("..") {
        return Err(Response::invalid_format("invalid file link"));
    }
    match std::fs::read(dir.join(link)) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Response::not_exist(format!("file {link}")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Best-effort removal of a replaced upload.
pub fn remove_file(dir: &Path, link: &str) {
    if let Err(e) = std::fs::remove_file(dir.join(link)) {
        tracing::warn!(link, error = %e, "failed to remove stale upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_link_keeps_extension_only() {
        let time = TIME::from_naos(1);
        let link = gen_file_link(&time, "Title Deed.PDF");
        assert!(link.ends_with(".pdf"));
        assert_eq!(link.len(), 32 + 4);
        assert_eq!(gen_file_link(&time, "noext").len(), 32);
        assert_ne!(gen_file_link(&TIME::from_naos(2), "noext"), gen_file_link(&time, "noext"));
    }

    #[test]
    fn stored_files_read_back_and_reject_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let part = FilePart {
            bytes: b"signed".to_vec(),
            filename: Some("report.txt".into()),
        };
        let link = store_file(dir.path(), &part).unwrap();
        assert_eq!(read_file(dir.path(), &link).unwrap(), b"signed");
        assert_eq!(read_file(dir.path(), "../secret").unwrap_err().status(), 1);
        assert_eq!(read_file(dir.path(), "missing.txt").unwrap_err().status(), 2);
    }

    #[test]
    fn base64_is_url_safe() {
        let encoded = base64_encode([0xfb, 0xff]);
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(base64_decode(encoded).unwrap(), vec![0xfb, 0xff]);
    }
}
