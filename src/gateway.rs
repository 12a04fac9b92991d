use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::{Credentials, OsmConfiguration, TokenAndSecret};
use crate::data::osm::{Changeset, ChangesetId, CompleteWay, Node, OsmId, Tags, UserDetails, Way};
use crate::data::trace::Trace;
use crate::endpoints::Endpoints;
use crate::errors::{Error, Result};
use crate::multipart::MultipartForm;
use crate::oauth;
use crate::osm_xml;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, UreqTransport};

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Client for the OSM API 0.6 acting on behalf of one user.
///
/// Holds nothing but read-only configuration, so one client can serve
/// concurrent calls. Every call builds and signs its own request.
///
/// Failure policy: every operation returns `Result`. Transport failures are
/// always errors. A non-200 answer is an error for changeset, way update and
/// trace operations, and `Ok(None)` for the identity lookup, node and way
/// creation and the complete way read.
#[derive(Clone)]
pub struct OsmApiClient {
    endpoints: Endpoints,
    credentials: Credentials,
    created_by: String,
    transport: Arc<dyn HttpTransport>,
}

impl OsmApiClient {
    pub fn new(config: &OsmConfiguration, token: &TokenAndSecret) -> Self {
        let transport = UreqTransport::new(config.timeout_seconds.map(Duration::from_secs));
        OsmApiClient::with_transport(config, token, Arc::new(transport))
    }

    pub fn with_transport(
        config: &OsmConfiguration,
        token: &TokenAndSecret,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        OsmApiClient {
            endpoints: Endpoints::new(&config.base_address),
            credentials: Credentials::new(config, token),
            created_by: config.created_by.clone(),
            transport,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// A request to `url`, signed when `url` is on the API host.
    pub fn request(&self, method: HttpMethod, url: &str) -> HttpRequest {
        let request = HttpRequest::new(method, url);
        if !self.endpoints.is_api_url(url) {
            return request;
        }
        request.with_header("Authorization", oauth::sign(method, url, &self.credentials))
    }

    fn xml_request(&self, method: HttpMethod, url: &str, body: String) -> HttpRequest {
        self.request(method, url)
            .with_header("Content-Type", XML_CONTENT_TYPE)
            .with_body(body)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.transport.execute(request)
    }

    /// `None` when the API does not accept the session's credentials.
    pub fn get_user_details(&self) -> Result<Option<UserDetails>> {
        let url = self.endpoints.user_details();
        let response = self.send(&self.request(HttpMethod::Get, url))?;
        if !response.is_ok() {
            warn!(status = response.status; "User details rejected, treating user as not logged in");
            return Ok(None);
        }
        osm_xml::parse_user_details(response.body.as_slice())
    }

    pub fn get_user_id(&self) -> Result<Option<String>> {
        Ok(self.get_user_details()?.map(|details| details.id.to_string()))
    }

    pub fn create_changeset(&self, comment: &str) -> Result<ChangesetId> {
        info!(comment = comment; "Creating changeset");
        let mut tags = Tags::new();
        tags.insert("created_by", self.created_by.as_str());
        tags.insert("comment", comment);
        let body = osm_xml::changeset_document(&Changeset { id: None, tags })?;

        let url = self.endpoints.create_changeset();
        let response = self.send(&self.xml_request(HttpMethod::Put, url, body))?;
        if !response.is_ok() {
            let message = response.text();
            error!(status = response.status, body = message.as_str(); "Unable to create changeset");
            return Err(Error::osm_api(
                response.status,
                message.clone(),
                format!("Unable to create changeset: {}", message),
            ));
        }
        response.text().parse()
    }

    pub fn close_changeset(&self, changeset_id: ChangesetId) -> Result<()> {
        let id = changeset_id.to_string();
        info!(changeset_id = id.as_str(); "Closing changeset");
        let url = self.endpoints.close_changeset(&id);
        let response = self.send(&self.request(HttpMethod::Put, &url))?;
        if !response.is_ok() {
            let message = response.text();
            error!(status = response.status, changeset_id = id.as_str(); "Unable to close changeset");
            return Err(Error::osm_api(
                response.status,
                message.clone(),
                format!("Unable to close changeset with id: {} {}", id, message),
            ));
        }
        Ok(())
    }

    /// Creates `node` in `changeset_id`, overriding any changeset it carries.
    /// Returns the server's reply, which is the new node id.
    pub fn create_node(&self, changeset_id: ChangesetId, node: &Node) -> Result<Option<String>> {
        let mut node = node.clone();
        node.meta.changeset = Some(changeset_id);
        let body = osm_xml::node_document(&node)?;
        self.create_element("node", self.endpoints.create_node(), body)
    }

    /// Creates `way` in `changeset_id`, overriding any changeset it carries.
    /// Returns the server's reply, which is the new way id.
    pub fn create_way(&self, changeset_id: ChangesetId, way: &Way) -> Result<Option<String>> {
        let mut way = way.clone();
        way.meta.changeset = Some(changeset_id);
        let body = osm_xml::way_document(&way)?;
        self.create_element("way", self.endpoints.create_way(), body)
    }

    fn create_element(&self, kind: &str, url: &str, body: String) -> Result<Option<String>> {
        info!(element = kind; "Creating element");
        let response = self.send(&self.xml_request(HttpMethod::Put, url, body))?;
        if !response.is_ok() {
            warn!(element = kind, status = response.status, body = response.text().as_str(); "Element was not created");
            return Ok(None);
        }
        Ok(Some(response.text()))
    }

    pub fn update_way(&self, changeset_id: ChangesetId, way: &Way) -> Result<()> {
        let way_id = way
            .id
            .ok_or_else(|| Error::parse("Cannot update a way without an id"))?
            .to_string();
        info!(way_id = way_id.as_str(); "Updating way");

        let mut way = way.clone();
        way.meta.changeset = Some(changeset_id);
        let body = osm_xml::way_document(&way)?;

        let url = self.endpoints.way(&way_id);
        let response = self.send(&self.xml_request(HttpMethod::Put, &url, body))?;
        if !response.is_ok() {
            let message = response.text();
            error!(status = response.status, way_id = way_id.as_str(); "Unable to update way");
            return Err(Error::osm_api(
                response.status,
                message.clone(),
                format!("Unable to update way with id: {} {}", way_id, message),
            ));
        }
        Ok(())
    }

    /// Reads a way with all its nodes. The read is public and goes unsigned.
    pub fn get_complete_way(&self, way_id: OsmId) -> Result<Option<CompleteWay>> {
        let url = self.endpoints.complete_way(&way_id.to_string());
        let response = self.send(&HttpRequest::new(HttpMethod::Get, url))?;
        if !response.is_ok() {
            warn!(way_id = way_id, status = response.status; "Complete way not available");
            return Ok(None);
        }
        let primitives = osm_xml::OsmXmlReader::new(response.body.as_slice());
        let ways = osm_xml::complete_ways(primitives)?;
        Ok(ways.into_iter().next())
    }

    /// All traces of the authenticated user, in the order the API lists them.
    pub fn get_traces(&self) -> Result<Vec<Trace>> {
        let url = self.endpoints.get_traces();
        let response = self.send(&self.request(HttpMethod::Get, url))?;
        if !response.is_ok() {
            let message = response.text();
            error!(status = response.status; "Unable to list traces");
            return Err(Error::osm_api(
                response.status,
                message.clone(),
                format!("Unable to get traces: {}", message),
            ));
        }
        let traces = osm_xml::parse_traces(response.body.as_slice())?;
        info!(count = traces.len(); "Listed traces");
        Ok(traces)
    }

    /// Uploads a file as a private trace described by its own file name.
    pub fn create_trace(&self, file_name: &str, content: Vec<u8>) -> Result<()> {
        info!(file_name = file_name, size = content.len(); "Uploading trace");
        let form = MultipartForm::new()
            .text("description", file_name)
            .text("visibility", "private")
            .text("tags", "")
            .file("file", file_name, content);

        let url = self.endpoints.create_trace();
        let request = self
            .request(HttpMethod::Post, url)
            .with_header("Content-Type", form.content_type())
            .with_body(form.into_body());
        let response = self.send(&request)?;
        if !response.is_ok() {
            error!(status = response.status, file_name = file_name; "Unable to upload trace");
            return Err(Error::osm_api(
                response.status,
                String::new(),
                format!("Unable to upload the file: {}", file_name),
            ));
        }
        Ok(())
    }

    /// Overwrites the trace's name, description, position and visibility.
    /// Tags are not sent.
    pub fn update_trace(&self, trace: &Trace) -> Result<()> {
        info!(trace_id = trace.id.as_str(); "Updating trace");
        let url = self.endpoints.trace(&trace.id);
        let body = osm_xml::trace_update_document(trace);
        let response = self.send(&self.xml_request(HttpMethod::Put, &url, body))?;
        if !response.is_ok() {
            let message = response.text();
            error!(status = response.status, trace_id = trace.id.as_str(); "Unable to update trace");
            return Err(Error::osm_api(
                response.status,
                message,
                format!("Unable to update OSM trace with ID: {}", trace.id),
            ));
        }
        Ok(())
    }

    pub fn delete_trace(&self, trace_id: &str) -> Result<()> {
        info!(trace_id = trace_id; "Deleting trace");
        let url = self.endpoints.trace(trace_id);
        let response = self.send(&self.request(HttpMethod::Delete, &url))?;
        if !response.is_ok() {
            let message = response.text();
            error!(status = response.status, trace_id = trace_id; "Unable to delete trace");
            return Err(Error::osm_api(
                response.status,
                message,
                format!("Unable to delete OSM trace with ID: {}", trace_id),
            ));
        }
        Ok(())
    }
}
