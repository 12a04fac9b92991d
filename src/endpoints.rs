//! OSM API 0.6 endpoint templates.

const ID_PLACEHOLDER: &str = ":id";

/// Endpoint URLs derived once from the configured site address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_host: String,
    user_details: String,
    create_changeset: String,
    close_changeset: String,
    create_node: String,
    create_way: String,
    way: String,
    complete_way: String,
    trace: String,
    get_traces: String,
    create_trace: String,
}

impl Endpoints {
    pub fn new(base_address: &str) -> Self {
        let base = base_address.trim().trim_end_matches('/');
        let api = format!("{}/api/0.6/", base);
        let way = format!("{}way/{}", api, ID_PLACEHOLDER);
        Endpoints {
            api_host: host_key(base),
            user_details: format!("{}user/details", api),
            create_changeset: format!("{}changeset/create", api),
            close_changeset: format!("{}changeset/{}/close", api, ID_PLACEHOLDER),
            create_node: format!("{}node/create", api),
            create_way: format!("{}way/create", api),
            complete_way: format!("{}/full", way),
            way,
            trace: format!("{}gpx/{}", api, ID_PLACEHOLDER),
            get_traces: format!("{}user/gpx_files", api),
            create_trace: format!("{}gpx/create", api),
        }
    }

    /// Host of the API, without the protocol. A port is kept unless it is the
    /// protocol's default.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// True when `url` points at the configured API host, whatever its protocol.
    pub fn is_api_url(&self, url: &str) -> bool {
        host_key(url) == self.api_host
    }

    pub fn user_details(&self) -> &str {
        &self.user_details
    }

    pub fn create_changeset(&self) -> &str {
        &self.create_changeset
    }

    pub fn close_changeset(&self, changeset_id: &str) -> String {
        self.close_changeset.replace(ID_PLACEHOLDER, changeset_id)
    }

    pub fn create_node(&self) -> &str {
        &self.create_node
    }

    pub fn create_way(&self) -> &str {
        &self.create_way
    }

    pub fn way(&self, way_id: &str) -> String {
        self.way.replace(ID_PLACEHOLDER, way_id)
    }

    pub fn complete_way(&self, way_id: &str) -> String {
        self.complete_way.replace(ID_PLACEHOLDER, way_id)
    }

    pub fn trace(&self, trace_id: &str) -> String {
        self.trace.replace(ID_PLACEHOLDER, trace_id)
    }

    pub fn get_traces(&self) -> &str {
        &self.get_traces
    }

    pub fn create_trace(&self) -> &str {
        &self.create_trace
    }
}

/// `host[:port]` part of a URL or bare address.
pub(crate) fn authority(url: &str) -> &str {
    let without_scheme = match url.find("://") {
        Some(index) => &url[index + 3..],
        None => url,
    };
    let end = without_scheme
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(without_scheme.len());
    let authority = &without_scheme[..end];
    // Drop any userinfo.
    match authority.rfind('@') {
        Some(index) => &authority[index + 1..],
        None => authority,
    }
}

/// Lower-cased authority with the scheme's default port dropped.
fn host_key(url: &str) -> String {
    let mut host = authority(url).to_ascii_lowercase();
    let default_port = match url.split_once("://") {
        Some((scheme, _)) if scheme.eq_ignore_ascii_case("https") => ":443",
        Some((scheme, _)) if scheme.eq_ignore_ascii_case("http") => ":80",
        _ => return host,
    };
    if host.ends_with(default_port) {
        host.truncate(host.len() - default_port.len());
    }
    host
}
