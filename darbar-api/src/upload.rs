use axum::extract::Multipart;
use darbar_core::storage::FileUpload;
use darbar_store::app_config::BusinessRules;
use std::collections::HashMap;

use crate::error::AppError;

/// A fully read multipart form: text fields by name, files in arrival order.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<(String, FileUpload)>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart, rules: &BusinessRules) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let Some(file_name) = field.file_name().map(str::to_string) else {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            };

            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            if !rules.allowed_image_types.iter().any(|allowed| *allowed == content_type) {
                return Err(AppError::ValidationError(format!(
                    "Unsupported file type {}; allowed: {}",
                    content_type,
                    rules.allowed_image_types.join(", ")
                )));
            }
            if form.files.len() >= rules.max_upload_images {
                return Err(AppError::ValidationError(format!(
                    "At most {} images may be uploaded at once",
                    rules.max_upload_images
                )));
            }

            let bytes = field.bytes().await?;
            if bytes.len() > rules.max_upload_bytes {
                return Err(AppError::ValidationError(format!(
                    "{} exceeds the {} byte limit",
                    file_name, rules.max_upload_bytes
                )));
            }

            form.files.push((
                name,
                FileUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            ));
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// First file sent under `name`.
    pub fn file(&self, name: &str) -> Option<&FileUpload> {
        self.files
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, file)| file)
    }

    /// Every file, whatever field it came in.
    pub fn all_files(&self) -> impl Iterator<Item = &FileUpload> {
        self.files.iter().map(|(_, file)| file)
    }

    /// Parse a JSON-valued text field.
    pub fn json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| AppError::ValidationError(format!("Invalid {}: {}", name, e)))
            })
            .transpose()
    }
}
