use std::collections::BTreeMap;

use axum::extract::Multipart;

use crate::storage::Upload;
use crate::validation::ValidationErrors;

/// Text fields and files collected from a `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: BTreeMap<String, String>,
    pub files: BTreeMap<String, Upload>,
}

impl MultipartForm {
    /// Drain `multipart`; parts carrying a file name become uploads, the rest text fields.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ValidationErrors> {
        let mut form = Self::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(err) => {
                    return Err(ValidationErrors::single(
                        "form",
                        format!("malformed multipart body: {err}"),
                    ))
                }
            };

            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);

            match file_name {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(|err| {
                        ValidationErrors::single(&name, format!("unreadable upload: {err}"))
                    })?;
                    if !bytes.is_empty() {
                        form.files.insert(name, Upload::new(file_name, bytes.to_vec()));
                    }
                }
                None => {
                    let text = field.text().await.map_err(|err| {
                        ValidationErrors::single(&name, format!("unreadable field: {err}"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}
