use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

/// An uploaded file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    pub url: String,
}

/// Capability set of the object storage service.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a file under `directory` and return its public URL.
    async fn upload(&self, directory: &str, file: &FileUpload) -> CoreResult<String>;

    /// Delete an object given the public URL returned by `upload`.
    async fn delete(&self, url: &str) -> CoreResult<()>;

    async fn list(&self, prefix: &str) -> CoreResult<Vec<StoredObject>>;

    /// Delete every object and return how many were removed.
    async fn delete_all(&self) -> CoreResult<usize>;
}

/// `{directory}/{millis}-{file_name}`, with path separators stripped from the name.
pub fn object_path(directory: &str, file_name: &str, timestamp_millis: i64) -> String {
    let clean_name: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}/{}-{}", directory.trim_matches('/'), timestamp_millis, clean_name)
}

/// Public URL of an object: `{base}/{bucket}/{path}`.
pub fn public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, path)
}

/// Recover the object path from a public URL produced by `public_url`.
pub fn object_name_from_url(base_url: &str, bucket: &str, url: &str) -> Option<String> {
    let prefix = format!("{}/{}/", base_url.trim_end_matches('/'), bucket);
    url.strip_prefix(&prefix)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
