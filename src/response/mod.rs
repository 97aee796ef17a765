use std::fmt::Display;

use axum::{
    body::Body,
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    Json,
};
use serde::{ser::SerializeStruct, Serialize};
use serde_json::{json, Value};

/// JSON envelope returned by every handler.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code
    code: StatusCode,
    status: i32,
    data: Value,
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (self.code, Json(self)).into_response()
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("Response", 3)?;
        s.serialize_field("status", &self.status)?;
        s.serialize_field("code", &self.code.as_u16())?;
        s.serialize_field("data", &self.data)?;
        s.end()
    }
}
impl Response {
    pub fn new(code: StatusCode, status: i32, data: Value) -> Response {
        Self { code, status, data }
    }
    pub fn ok(data: Value) -> Self {
        Self {
            code: StatusCode::OK,
            status: 0,
            data,
        }
    }
    pub fn empty() -> Self {
        Self {
            code: StatusCode::OK,
            status: 0,
            data: json!("OK"),
        }
    }
    pub fn token_error(e: impl Display) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, -1, json!(e.to_string()))
    }
    /// Internal failure, never the caller's fault.
    pub fn internal_server_error(e: impl Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, -1, json!(e.to_string()))
    }
    /// Malformed request body or field.
    pub fn invalid_format(e: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, 1, json!(e.to_string()))
    }
    /// The referenced record does not exist.
    pub fn not_exist(e: impl Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, 2, json!(e.to_string()))
    }
    /// The record to add already exists.
    pub fn already_exist(e: impl Display) -> Self {
        Self::new(StatusCode::CONFLICT, 3, json!(e.to_string()))
    }
    pub fn permission_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, 4, json!("permission denied"))
    }
    pub fn wrong_password() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, 5, json!("wrong username or password"))
    }
    /// Well-formed but rejected by a business rule.
    pub fn invalid_value(e: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, 7, json!(e.to_string()))
    }
    pub fn code(&self) -> StatusCode {
        self.code
    }
    pub fn status(&self) -> i32 {
        self.status
    }
    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// A raw file body, used for attachments and CSV exports.
pub struct BodyFile {
    body: Body,
    content_type: String,
    disposition: Option<String>,
}

impl BodyFile {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            body: Body::from(bytes),
            content_type: content_type.into(),
            disposition: None,
        }
    }
    /// Guess the content type from the file name.
    pub fn from_path(name: &str, bytes: Vec<u8>) -> Self {
        let mime = match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "png" => mime::IMAGE_PNG,
            Some(ext) if ext == "jpg" || ext == "jpeg" => mime::IMAGE_JPEG,
            Some(ext) if ext == "gif" => mime::IMAGE_GIF,
            Some(ext) if ext == "pdf" => mime::APPLICATION_PDF,
            Some(ext) if ext == "txt" => mime::TEXT_PLAIN_UTF_8,
            Some(ext) if ext == "csv" => mime::TEXT_CSV_UTF_8,
            _ => mime::APPLICATION_OCTET_STREAM,
        };
        Self::new(mime.to_string(), bytes)
    }
    pub fn attachment(body: Body, content_type: mime::Mime, filename: &str) -> Self {
        Self {
            body,
            content_type: content_type.to_string(),
            disposition: Some(format!("attachment; filename=\"{filename}\"")),
        }
    }
}

impl axum::response::IntoResponse for BodyFile {
    fn into_response(self) -> axum::response::Response {
        let mut builder = axum::response::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, self.content_type);
        if let Some(disposition) = self.disposition {
            builder = builder.header(header::CONTENT_DISPOSITION, disposition);
        }
        builder
            .body(self.body)
            .unwrap_or_else(|e| Response::internal_server_error(e).into_response())
    }
}

impl From<mysql::Error> for Response {
    fn from(value: mysql::Error) -> Self {
        tracing::error!(error = %value, "database error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            -1,
            json!(value.to_string()),
        )
    }
}
impl From<std::io::Error> for Response {
    fn from(value: std::io::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            -1,
            json!(value.to_string()),
        )
    }
}

impl From<serde_json::Error> for Response {
    fn from(value: serde_json::Error) -> Self {
        Response::invalid_format(value)
    }
}
impl From<MultipartError> for Response {
    fn from(value: MultipartError) -> Self {
        Response::invalid_format(value)
    }
}
impl From<csv::Error> for Response {
    fn from(value: csv::Error) -> Self {
        Response::invalid_format(value)
    }
}
impl From<std::time::SystemTimeError> for Response {
    fn from(value: std::time::SystemTimeError) -> Self {
        Response::internal_server_error(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn envelope_carries_status_code_and_data() {
        let value = serde_json::to_value(Response::not_exist("task 1 does not exist")).unwrap();
        assert_eq!(value["status"], 2);
        assert_eq!(value["code"], 404);
        assert_eq!(value["data"], "task 1 does not exist");
    }

    #[test]
    fn http_status_follows_error_kind() {
        assert_eq!(Response::permission_denied().into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(Response::invalid_value("x").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(Response::empty().into_response().status(), StatusCode::OK);
    }

    #[test]
    fn file_body_guesses_mime_from_extension() {
        let response = BodyFile::from_path("deed.PDF", vec![1, 2, 3]).into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    }
}
