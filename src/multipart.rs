//! Minimal `multipart/form-data` encoder (RFC 7578) for trace uploads.

use rand::{distr::Alphanumeric, Rng};

enum Part {
    Text { name: String, value: String },
    File { name: String, file_name: String, content: Vec<u8> },
}

pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartForm {
    pub fn new() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        MultipartForm::with_boundary(format!("----osm-gateway-{}", suffix))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        MultipartForm {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// The file name is reduced to ASCII since the OSM server rejects
    /// anything else in the `filename` parameter.
    pub fn file(mut self, name: &str, file_name: &str, content: Vec<u8>) -> Self {
        self.parts.push(Part::File {
            name: name.to_string(),
            file_name: ascii_file_name(file_name),
            content,
        });
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn into_body(self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\
                             Content-Type: text/plain; charset=utf-8\r\n\r\n",
                            name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File { name, file_name, content } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, file_name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&content);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        MultipartForm::new()
    }
}

/// Non-ASCII characters become `?`, quotes and line breaks are dropped.
fn ascii_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| !matches!(c, '"' | '\r' | '\n'))
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_then_file() {
        let form = MultipartForm::with_boundary("XYZ")
            .text("description", "walk.gpx")
            .text("tags", "")
            .file("file", "walk.gpx", b"<gpx/>".to_vec());

        assert_eq!(form.content_type(), "multipart/form-data; boundary=XYZ");
        let body = String::from_utf8(form.into_body()).unwrap();
        assert!(body.starts_with("--XYZ\r\nContent-Disposition: form-data; name=\"description\"\r\n"));
        assert!(body.contains("\r\n\r\nwalk.gpx\r\n--XYZ\r\n"));
        assert!(body.contains("name=\"tags\"\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n\r\n"));
        assert!(body.contains("name=\"file\"; filename=\"walk.gpx\"\r\n"));
        assert!(body.ends_with("<gpx/>\r\n--XYZ--\r\n"));
    }

    #[test]
    fn file_name_is_ascii_only() {
        assert_eq!(ascii_file_name("מסלול.gpx"), "?????.gpx");
        assert_eq!(ascii_file_name("a\"b\r\n.kml"), "ab.kml");
    }
}
