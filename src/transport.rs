use std::time::Duration;

use log::debug;
use ureq::Agent;

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A fully built request. Signing happens before construction, so a request
/// never changes once it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Something that can carry one request to a server and bring back the
/// response. Any status code is a response; only failing to get one is an
/// error.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a pooled `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build();
        let agent: Agent = config.into();
        UreqTransport { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        UreqTransport::new(None)
    }
}

impl HttpTransport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = request.url.as_str(); "Sending request");

        let mut response = match request.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = match request.method {
                    HttpMethod::Get => self.agent.get(&request.url),
                    _ => self.agent.delete(&request.url),
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Put | HttpMethod::Post => {
                let mut builder = match request.method {
                    HttpMethod::Put => self.agent.put(&request.url),
                    _ => self.agent.post(&request.url),
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(&request.body[..])?
            }
        };

        let status = response.status().as_u16();
        // Complete ways and trace listings can exceed ureq's default read limit.
        let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;
        debug!(url = request.url.as_str(), status = status; "Received response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_headers_are_case_insensitive() {
        let request = HttpRequest::new(HttpMethod::Put, "https://osm.org/api/0.6/node/create")
            .with_header("Content-Type", "text/xml")
            .with_body("<osm/>");

        assert_eq!(request.header("content-type"), Some("text/xml"));
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.body, b"<osm/>".to_vec());
    }

    #[test]
    fn only_200_is_success() {
        let ok = HttpResponse { status: 200, body: b"12".to_vec() };
        let created = HttpResponse { status: 201, body: Vec::new() };
        assert!(ok.is_ok());
        assert!(!created.is_ok());
        assert_eq!(ok.text(), "12");
    }

    #[test]
    fn reads_bodies_larger_than_ten_megabytes() {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::thread;

        const SIZE: usize = 11 * 1024 * 1024;
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                SIZE
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&vec![b'a'; SIZE]).unwrap();
        });

        let transport = UreqTransport::default();
        let url = format!("http://{}/api/0.6/way/1/full", address);
        let response = transport.execute(&HttpRequest::new(HttpMethod::Get, url)).unwrap();
        server.join().unwrap();

        assert!(response.is_ok());
        assert_eq!(response.body.len(), SIZE);
    }
}
