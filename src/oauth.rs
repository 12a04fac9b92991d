//! OAuth 1.0 request signing for protected resources.
//!
//! Every call to the OSM API that acts on behalf of a user carries an
//! `Authorization: OAuth ...` header. The signature is an HMAC-SHA1 over the
//! signature base string of RFC 5849 section 3.4.1, keyed with the consumer
//! secret and the token secret.
//!
//! # Example
//!
//! ```
//! use osm_gateway::config::Credentials;
//! use osm_gateway::oauth::authorization_header;
//! use osm_gateway::transport::HttpMethod;
//!
//! let credentials = Credentials {
//!     consumer_key: "key".into(),
//!     consumer_secret: "secret".into(),
//!     token: "token".into(),
//!     token_secret: "token-secret".into(),
//! };
//! let header = authorization_header(
//!     HttpMethod::Get,
//!     "https://api.openstreetmap.org/api/0.6/user/details",
//!     &credentials,
//!     "abcdef",
//!     1_700_000_000,
//! );
//! assert!(header.starts_with("OAuth "));
//! assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
//! ```
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rand::{distr::Alphanumeric, Rng};
use sha1::Sha1;

use crate::config::Credentials;
use crate::transport::HttpMethod;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;

/// Sign a request with a fresh nonce and the current time.
pub fn sign(method: HttpMethod, url: &str, credentials: &Credentials) -> String {
    authorization_header(
        method,
        url,
        credentials,
        &generate_nonce(),
        chrono::Utc::now().timestamp(),
    )
}

/// Build the `Authorization` header value for a request.
///
/// Deterministic for a given nonce and timestamp.
pub fn authorization_header(
    method: HttpMethod,
    url: &str,
    credentials: &Credentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let timestamp = timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let signature = signature(method, url, credentials, &oauth_params);
    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort_by(|a, b| a.0.cmp(b.0));

    let fields = oauth_params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

/// Base64 HMAC-SHA1 signature over the request's signature base string.
pub fn signature(
    method: HttpMethod,
    url: &str,
    credentials: &Credentials,
    oauth_params: &[(&str, &str)],
) -> String {
    let base_string = signature_base_string(method, url, oauth_params);
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.token_secret)
    );
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn signature_base_string(method: HttpMethod, url: &str, oauth_params: &[(&str, &str)]) -> String {
    let (base_url, query) = normalize_url(url);

    let mut params: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    if let Some(query) = query {
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.push((
                percent_encode(&percent_decode(key)),
                percent_encode(&percent_decode(value)),
            ));
        }
    }
    params.sort();

    let normalized_params = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(&base_url),
        percent_encode(&normalized_params)
    )
}

/// Split a URL into its normalized base (lower-case scheme and host, no
/// default port, no query or fragment) and its raw query string.
fn normalize_url(url: &str) -> (String, Option<&str>) {
    let url = url.split('#').next().unwrap_or(url);
    let (url, query) = match url.split_once('?') {
        Some((url, query)) => (url, Some(query)),
        None => (url, None),
    };
    let (scheme, rest) = url.split_once("://").unwrap_or(("http", url));
    let scheme = scheme.to_ascii_lowercase();
    let (authority, path) = match rest.find('/') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, "/"),
    };
    let mut authority = authority.to_ascii_lowercase();
    let default_port = match scheme.as_str() {
        "https" => ":443",
        _ => ":80",
    };
    if authority.ends_with(default_port) {
        authority.truncate(authority.len() - default_port.len());
    }
    (format!("{}://{}{}", scheme, authority, path), query)
}

/// RFC 3986 percent-encoding, leaving only unreserved characters as-is.
pub(crate) fn percent_encode(value: &str) -> String {
    use std::fmt::Write;
    let mut result = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                let _ = write!(result, "%{:02X}", byte);
            }
        }
    }
    result
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'%' if index + 2 < bytes.len() => {
                let high = (bytes[index + 1] as char).to_digit(16);
                let low = (bytes[index + 2] as char).to_digit(16);
                match (high, low) {
                    (Some(high), Some(low)) => {
                        decoded.push((high * 16 + low) as u8);
                        index += 3;
                        continue;
                    }
                    _ => decoded.push(b'%'),
                }
            }
            b'+' => decoded.push(b' '),
            byte => decoded.push(byte),
        }
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_credentials() -> Credentials {
        Credentials {
            consumer_key: "dpf43f3p2l4k3l03".to_string(),
            consumer_secret: "kd94hf93k423kf44".to_string(),
            token: "nnch734d00sl2jdk".to_string(),
            token_secret: "pfkkdhi9sl3r4s00".to_string(),
        }
    }

    #[test]
    fn matches_oauth_core_reference_signature() {
        let header = authorization_header(
            HttpMethod::Get,
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
            &example_credentials(),
            "kllo9940pd9333jh",
            1191242096,
        );

        assert!(header.contains("oauth_signature=\"tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D\""));
        assert!(header.contains("oauth_token=\"nnch734d00sl2jdk\""));
        assert!(header.contains("oauth_version=\"1.0\""));
    }

    #[test]
    fn signature_depends_on_method_and_url() {
        let credentials = example_credentials();
        let get = authorization_header(HttpMethod::Get, "https://osm.org/api/0.6/gpx/1", &credentials, "n", 1);
        let delete = authorization_header(HttpMethod::Delete, "https://osm.org/api/0.6/gpx/1", &credentials, "n", 1);
        let other = authorization_header(HttpMethod::Get, "https://osm.org/api/0.6/gpx/2", &credentials, "n", 1);

        assert_ne!(get, delete);
        assert_ne!(get, other);
    }

    #[test]
    fn empty_credentials_still_produce_a_header() {
        let header = authorization_header(
            HttpMethod::Put,
            "https://osm.org/api/0.6/changeset/create",
            &Credentials::default(),
            "nonce",
            10,
        );

        assert!(header.contains("oauth_token=\"\""));
        assert!(header.contains("oauth_consumer_key=\"\""));
        assert!(header.contains("oauth_signature=\""));
    }

    #[test]
    fn fresh_nonce_per_call() {
        let credentials = example_credentials();
        let first = sign(HttpMethod::Get, "https://osm.org/api/0.6/user/details", &credentials);
        let second = sign(HttpMethod::Get, "https://osm.org/api/0.6/user/details", &credentials);
        assert_ne!(first, second);
        assert_eq!(generate_nonce().len(), NONCE_LENGTH);
    }

    #[test]
    fn normalizes_base_url() {
        assert_eq!(
            normalize_url("HTTPS://Example.ORG:443/api/0.6/way/1?x=1#frag"),
            ("https://example.org/api/0.6/way/1".to_string(), Some("x=1"))
        );
        assert_eq!(
            normalize_url("http://localhost:3000"),
            ("http://localhost:3000/".to_string(), None)
        );
    }

    #[test]
    fn percent_coding() {
        assert_eq!(percent_encode("a b&c=d~"), "a%20b%26c%3Dd~");
        assert_eq!(percent_encode("שביל"), "%D7%A9%D7%91%D7%99%D7%9C");
        assert_eq!(percent_decode("a%20b+c"), "a b c");
        assert_eq!(percent_decode("100%"), "100%");
    }
}
