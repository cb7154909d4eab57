use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

use super::response::ApiResponse;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("filename pattern compiles"));

pub const PDF_MIME: &str = "application/pdf";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PNG_MIME: &str = "image/png";

/// Replace characters that are illegal in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

/// A generated document, persisted at `path`. Images are sent inline,
/// everything else as an attachment.
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl IntoResponse for RenderedFile {
    fn into_response(self) -> Response {
        let kind = if self.content_type.starts_with("image/") {
            "inline"
        } else {
            "attachment"
        };
        let disposition = format!("{}; filename=\"{}\"", kind, self.file_name);
        let disposition = HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(self.content_type)),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// A generated file, or the message explaining why nothing was generated.
#[derive(Debug, Clone)]
pub enum Output {
    File(RenderedFile),
    Empty(String),
}

impl Output {
    pub fn empty(message: impl Into<String>) -> Self {
        Self::Empty(message.into())
    }
}

impl IntoResponse for Output {
    fn into_response(self) -> Response {
        match self {
            Output::File(file) => file.into_response(),
            Output::Empty(message) => Json(ApiResponse::message(message)).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("KK_1234.pdf"), "KK_1234.pdf");
        assert_eq!(sanitize_filename("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_filename("x\ny\u{7}"), "x_y_");
    }
}
