use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use snafu::ResultExt;

use super::auth::Credential;
use super::inventory::Inventory;
use super::models::{
    AcquireParams, BootImage, Machine, Network, NodeFilter, NodeGroup, StartOptions, Zone,
};
use crate::common::{key_file_or_string, Error, RequestSnafu, ResponseSnafu, Result};

pub const SERVICE_NAME: &str = "MAAS";

const USER_AGENT: &str = concat!("graviton-rs/", env!("CARGO_PKG_VERSION"));

/// Status and raw body of one API call.
#[derive(Debug, Clone)]
pub struct Response {
    url: String,
    status: u16,
    body: String,
}

impl Response {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            ResponseSnafu {
                url: &self.url,
                message: format!("Failed to deserialize response: {err}"),
            }
            .build()
        })
    }
}

/// Blocking client for the MAAS 1.0 REST API.
///
/// Each call is a single attempt. Holds no mutable state, so one client may
/// serve any number of calls.
pub struct MaasClient {
    agent: ureq::Agent,
    api_url: String,
    credential: Credential,
}

impl MaasClient {
    pub fn new(config: &super::Config) -> Result<Self> {
        let api_key = key_file_or_string(&config.api_key, "maas.api_key")?;
        let credential: Credential = api_key.parse()?;

        let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);
        if let Some(secs) = config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            agent: builder.build(),
            api_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            credential,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = self.url(path);
        tracing::debug!(service = SERVICE_NAME, url = %url, method = "GET", "Sending request");

        let mut request = self
            .agent
            .get(&url)
            .set("Authorization", &self.credential.authorization());
        for (name, value) in query {
            request = request.query(name, value);
        }
        Self::finish("GET", url, request.call())
    }

    pub fn post(&self, path: &str, form: &[(&str, String)]) -> Result<Response> {
        let url = self.url(path);
        tracing::debug!(service = SERVICE_NAME, url = %url, method = "POST", "Sending request");

        let form: Vec<(&str, &str)> = form.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let result = self
            .agent
            .post(&url)
            .set("Authorization", &self.credential.authorization())
            .send_form(&form);
        Self::finish("POST", url, result)
    }

    pub fn delete(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        tracing::debug!(service = SERVICE_NAME, url = %url, method = "DELETE", "Sending request");

        let result = self
            .agent
            .delete(&url)
            .set("Authorization", &self.credential.authorization())
            .call();
        Self::finish("DELETE", url, result)
    }

    // ureq reports 4xx/5xx as errors; those are ordinary "not ok" responses here.
    fn finish(
        method: &str,
        url: String,
        result: std::result::Result<ureq::Response, ureq::Error>,
    ) -> Result<Response> {
        let (status, body) = match result {
            Ok(response) => {
                let status = response.status();
                // into_string caps bodies at 10 MB; full node lists grow past that.
                let mut body = String::new();
                response
                    .into_reader()
                    .read_to_string(&mut body)
                    .map_err(|err| {
                        ResponseSnafu {
                            url: &url,
                            message: format!("Failed to read body: {err}"),
                        }
                        .build()
                    })?;
                (status, body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let mut body = String::new();
                let _ = response.into_reader().read_to_string(&mut body);
                (status, body)
            }
            Err(err) => {
                return Err(err).context(RequestSnafu {
                    url: &url,
                    method,
                })
            }
        };

        tracing::debug!(service = SERVICE_NAME, url = %url, method, status, "Response received");
        Ok(Response { url, status, body })
    }

    fn list<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let response = self.get(path, query)?;
        if !response.ok() {
            tracing::warn!(
                service = SERVICE_NAME,
                path,
                status = response.status(),
                "List request was not successful"
            );
            return Ok(Vec::new());
        }
        response.json()
    }

    fn action(&self, system_id: &str, form: &[(&str, String)]) -> Result<bool> {
        let response = self.post(&format!("/nodes/{system_id}/"), form)?;
        if !response.ok() {
            tracing::warn!(
                service = SERVICE_NAME,
                system_id,
                op = form.first().map(|(_, op)| op.as_str()),
                status = response.status(),
                "Node operation was not successful"
            );
        }
        Ok(response.ok())
    }
}

impl TryFrom<super::Config> for MaasClient {
    type Error = Error;

    fn try_from(value: super::Config) -> Result<Self> {
        Self::new(&value)
    }
}

impl Inventory for MaasClient {
    fn boot_images(&self, nodegroup_uuid: &str) -> Result<Vec<BootImage>> {
        self.list(&format!("/nodegroups/{nodegroup_uuid}/boot-images/"), &[])
    }

    fn nodegroups(&self) -> Result<Vec<NodeGroup>> {
        self.list("/nodegroups/", &[("op", "list".to_string())])
    }

    fn zones(&self) -> Result<Vec<Zone>> {
        self.list("/zones/", &[])
    }

    fn networks(&self) -> Result<Vec<Network>> {
        self.list("/networks/", &[])
    }

    fn nodes(&self, filter: &NodeFilter) -> Result<Vec<Machine>> {
        let machines: Vec<Machine> = self.list("/nodes/", &filter.to_params())?;

        // The service does not apply the state filter itself.
        Ok(match filter.state {
            Some(state) => machines
                .into_iter()
                .filter(|m| m.status() == state.value())
                .collect(),
            None => machines,
        })
    }

    fn node_get(&self, system_id: &str) -> Result<Option<Machine>> {
        let response = self.get(&format!("/nodes/{system_id}"), &[])?;
        if !response.ok() {
            tracing::debug!(
                service = SERVICE_NAME,
                system_id,
                status = response.status(),
                "Node not found"
            );
            return Ok(None);
        }
        response.json().map(Some)
    }

    fn node_acquire(&self, params: &AcquireParams) -> Result<Option<Machine>> {
        let response = self.post("/nodes/", &params.to_params())?;
        if !response.ok() {
            tracing::warn!(
                service = SERVICE_NAME,
                status = response.status(),
                body = response.body(),
                "Acquire request was not successful"
            );
            return Ok(None);
        }
        response.json().map(Some)
    }

    fn node_release(&self, system_id: &str) -> Result<bool> {
        self.action(system_id, &[("op", "release".to_string())])
    }

    fn node_start(&self, system_id: &str, options: &StartOptions) -> Result<bool> {
        self.action(system_id, &options.to_params())
    }

    fn node_stop(&self, system_id: &str) -> Result<bool> {
        self.action(system_id, &[("op", "stop".to_string())])
    }
}
