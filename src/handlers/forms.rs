use std::collections::HashMap;

use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::services::uploads::UploadedImage;

/// A fully buffered multipart body: text fields plus any attached files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<UploadedImage>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;

                    // An empty file input is sent as a nameless, empty part.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    form.files.push(UploadedImage {
                        field: name,
                        file_name: Some(file_name),
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.text(name)
            .ok_or_else(|| ApiError::bad_request(format!("{} is required", name)))
    }

    pub fn number(&self, name: &str) -> Result<f64, ApiError> {
        parse_non_negative(name, self.required(name)?)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedImage> {
        let index = self.files.iter().position(|f| f.field == name)?;
        Some(self.files.remove(index))
    }

    #[cfg(test)]
    pub fn from_parts(fields: &[(&str, &str)], files: Vec<UploadedImage>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files,
        }
    }
}

pub fn parse_non_negative(name: &str, raw: &str) -> Result<f64, ApiError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ApiError::bad_request(format!(
            "{} must be a non-negative number",
            name
        ))),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    log::warn!("Multipart read error: {}", err);
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request("File too large")
    } else {
        ApiError::bad_request(format!("Failed to read multipart data: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(field: &str) -> UploadedImage {
        UploadedImage {
            field: field.to_string(),
            file_name: Some("a.jpg".to_string()),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_text_and_required() {
        let form = MultipartForm::from_parts(&[("foodName", "  Poha "), ("notes", "   ")], vec![]);

        assert_eq!(form.text("foodName"), Some("Poha"));
        assert_eq!(form.text("notes"), None);
        assert!(form.required("notes").is_err());
        assert!(form.required("missing").is_err());
    }

    #[test]
    fn test_number_fields() {
        let form = MultipartForm::from_parts(
            &[("weight", "150"), ("calories", "-1"), ("protein", "lots")],
            vec![],
        );

        assert_eq!(form.number("weight").unwrap(), 150.0);
        assert!(form.number("calories").is_err());
        assert!(form.number("protein").is_err());
        assert!(parse_non_negative("x", "NaN").is_err());
        assert_eq!(parse_non_negative("x", " 12.5 ").unwrap(), 12.5);
    }

    #[test]
    fn test_take_file_by_field_name() {
        let mut form = MultipartForm::from_parts(&[], vec![photo("profilePhoto"), photo("foodImage")]);

        assert_eq!(form.take_file("foodImage").unwrap().field, "foodImage");
        assert!(form.take_file("foodImage").is_none());
        assert!(form.take_file("profilePhoto").is_some());
    }
}
