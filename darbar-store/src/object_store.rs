use async_trait::async_trait;
use chrono::Utc;
use darbar_core::storage::{object_name_from_url, object_path, public_url, FileUpload, ObjectStore, StoredObject};
use darbar_core::{CoreError, CoreResult};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{error, info};

const SERVICE: &str = "Storage";

/// Public image storage in a Cloud Storage bucket (JSON API).
pub struct CloudObjectStore {
    bucket: String,
    access_token: String,
    api_url: String,
    public_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

fn transport_error(err: reqwest::Error) -> CoreError {
    error!("Storage request failed: {}", err);
    CoreError::gateway(SERVICE, "Storage service unavailable")
}

fn rejected(status: StatusCode, what: &str) -> CoreError {
    error!("Storage rejected {} ({})", what, status);
    CoreError::gateway(SERVICE, format!("{} failed with HTTP {}", what, status))
}

impl CloudObjectStore {
    pub fn new(bucket: String, access_token: String, api_url: String, public_url: String) -> Self {
        Self {
            bucket,
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            public_url,
            client: reqwest::Client::new(),
        }
    }

    /// `{api}/storage/v1/b/{bucket}/o[/{name}]` with the name as one encoded segment.
    fn object_url(&self, name: Option<&str>) -> CoreResult<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| CoreError::InternalError(format!("Invalid storage URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CoreError::InternalError("Storage URL cannot have a path".to_string()))?;
            segments.pop_if_empty().extend(["storage", "v1", "b", self.bucket.as_str(), "o"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    async fn delete_object(&self, name: &str) -> CoreResult<()> {
        let response = self
            .client
            .delete(self.object_url(Some(name))?)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(CoreError::NotFound(format!("Object {}", name))),
            status => Err(rejected(status, "delete")),
        }
    }
}

#[async_trait]
impl ObjectStore for CloudObjectStore {
    async fn upload(&self, directory: &str, file: &FileUpload) -> CoreResult<String> {
        let name = object_path(directory, &file.file_name, Utc::now().timestamp_millis());
        let response = self
            .client
            .post(format!("{}/upload/storage/v1/b/{}/o", self.api_url, self.bucket))
            .query(&[("uploadType", "media"), ("name", name.as_str())])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(rejected(response.status(), "upload"));
        }
        info!("Uploaded {} ({} bytes)", name, file.bytes.len());
        Ok(public_url(&self.public_url, &self.bucket, &name))
    }

    async fn delete(&self, url: &str) -> CoreResult<()> {
        let name = object_name_from_url(&self.public_url, &self.bucket, url)
            .ok_or_else(|| CoreError::ValidationError(format!("Not a storage URL: {}", url)))?;
        self.delete_object(&name).await?;
        info!("Deleted {}", name);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> CoreResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(self.object_url(None)?)
                .query(&[("prefix", prefix)])
                .bearer_auth(&self.access_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await.map_err(transport_error)?;
            if !response.status().is_success() {
                return Err(rejected(response.status(), "list"));
            }
            let page: ObjectList = response
                .json()
                .await
                .map_err(|e| CoreError::gateway(SERVICE, format!("Bad response format: {}", e)))?;

            objects.extend(page.items.into_iter().map(|item| StoredObject {
                url: public_url(&self.public_url, &self.bucket, &item.name),
                name: item.name,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(objects)
    }

    async fn delete_all(&self) -> CoreResult<usize> {
        let objects = self.list("").await?;
        for object in &objects {
            self.delete_object(&object.name).await?;
        }
        info!("Deleted {} objects from {}", objects.len(), self.bucket);
        Ok(objects.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_encodes_name() {
        let store = CloudObjectStore::new(
            "darbar".to_string(),
            String::new(),
            "https://storage.googleapis.com".to_string(),
            "https://storage.googleapis.com".to_string(),
        );
        let url = store.object_url(Some("dishes/1-naan.png")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/darbar/o/dishes%2F1-naan.png"
        );
    }
}
