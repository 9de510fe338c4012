//! Multipart form reading.

use std::collections::HashMap;

use axum::extract::Multipart;
use cleanstreet_core::EvidenceUpload;

use crate::error::Result;

/// Text fields and file fields of one multipart form.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    files: HashMap<String, EvidenceUpload>,
}

impl Form {
    /// Read the whole body. Parts with a file name are files; the rest are text.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Form::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    form.files.insert(name, EvidenceUpload::new(file_name, bytes.to_vec()));
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Text value, trimmed, treating blank as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<EvidenceUpload> {
        self.files.remove(name)
    }
}
