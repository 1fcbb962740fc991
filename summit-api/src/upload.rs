use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::warn;

use summit_shared::UploadKind;
use summit_store::{LocalMedia, MediaError};

use crate::error::AppError;

#[derive(Debug)]
pub struct FilePart {
    pub filename: String,
    pub bytes: Bytes,
}

/// A multipart body read into memory: text fields plus file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: HashMap<String, FilePart>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input.
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(name, FilePart { filename, bytes });
                }
                None => {
                    let value = field.text().await?;
                    form.fields.push((name, value));
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn texts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        self.files.remove(name)
    }
}

/// Stores an optional upload, reporting rule violations against `field`.
pub async fn store_file(
    media: &LocalMedia,
    kind: UploadKind,
    field: &str,
    file: Option<FilePart>,
) -> Result<Option<String>, AppError> {
    let Some(file) = file else {
        return Ok(None);
    };
    match media.save_upload(kind, &file.filename, &file.bytes).await {
        Ok(path) => Ok(Some(path)),
        Err(MediaError::Rejected(e)) => Err(AppError::field(field, e.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Deletes files stored for a request that did not go through.
pub async fn discard(media: &LocalMedia, paths: &[Option<&str>]) {
    for path in paths.iter().flatten() {
        if let Err(e) = media.remove(path).await {
            warn!(path = %path, error = %e, "could not remove stored upload");
        }
    }
}

/// Checks an upload against its kind's rules without storing it.
pub fn check_file(kind: UploadKind, field: &str, file: Option<&FilePart>) -> Result<(), AppError> {
    match file {
        Some(file) => kind
            .validate(&file.filename, file.bytes.len())
            .map(|_| ())
            .map_err(|e| AppError::field(field, e.to_string())),
        None => Ok(()),
    }
}
