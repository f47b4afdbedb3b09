//! MAAS 2.0 API client implementation.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use url::Url;

use super::auth::Credentials;
use super::models::{
    DeviceResource, FabricResource, FileResource, InterfaceResource, MachineResource,
    VersionResponse, ZoneResource,
};
use crate::controller::{
    AddFileArgs, AllocateMachineArgs, ConstraintMatches, Controller, ControllerError,
    CreateDeviceArgs, CreateMachineDeviceArgs, Device, DevicesArgs, Fabric, File, FileSource,
    Machine, MachinesArgs, ReleaseMachinesArgs, StartArgs, Zone,
};

/// API path below the controller base URL.
const API_PATH: &str = "api/2.0/";

/// Capability advertised by every controller that speaks the 2.0 API.
pub const REQUIRED_CAPABILITY: &str = "network-deployment-ubuntu";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Link mode used when attaching a child device interface to a subnet.
const LINK_MODE_STATIC: &str = "STATIC";

type Params<'a> = Vec<(&'a str, String)>;

/// Connection settings for [`MaasController`].
#[derive(Clone)]
pub struct ControllerArgs {
    /// Controller base URL (e.g. `http://192.168.100.2/MAAS`).
    pub base_url: String,
    /// MAAS API key; empty for anonymous access.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ControllerArgs {
    /// Connection settings with the default timeout.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for ControllerArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerArgs")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// MAAS 2.0 controller client.
#[derive(Clone)]
pub struct MaasController {
    /// HTTP client.
    client: Client,
    /// Base URL, always ending in `/`.
    base_url: Url,
    /// `{base_url}api/2.0/`.
    api_root: Url,
    /// Request signing credentials.
    credentials: Credentials,
    /// Capabilities reported by `version/`.
    capabilities: BTreeSet<String>,
}

impl MaasController {
    /// Connect to a controller and verify it speaks the 2.0 API.
    ///
    /// # Errors
    /// Returns an error if the API key or URL is malformed, the version
    /// request fails, or the controller lacks [`REQUIRED_CAPABILITY`].
    pub async fn connect(args: ControllerArgs) -> Result<Self, ControllerError> {
        let mut controller = Self::new(args)?;

        let version: VersionResponse = controller.get("version/", &[]).await?;
        info!(
            version = %version.version,
            capabilities = ?version.capabilities,
            "Connected to controller"
        );

        controller.capabilities = version.capabilities.into_iter().collect();
        if !controller.capabilities.contains(REQUIRED_CAPABILITY) {
            return Err(ControllerError::UnsupportedVersion(
                REQUIRED_CAPABILITY.to_string(),
            ));
        }
        Ok(controller)
    }

    fn new(args: ControllerArgs) -> Result<Self, ControllerError> {
        let client = Client::builder().timeout(args.timeout).build()?;

        let mut base_url = Url::parse(&args.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let api_root = base_url.join(API_PATH)?;

        Ok(Self {
            client,
            base_url,
            api_root,
            credentials: Credentials::parse(&args.api_key)?,
            capabilities: BTreeSet::new(),
        })
    }

    /// Capabilities the controller advertised on connect.
    #[must_use]
    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    fn url(&self, path: &str) -> Result<Url, ControllerError> {
        Ok(self.api_root.join(path)?)
    }

    /// `files/{filename}/`, with the filename escaped as one path segment.
    fn file_url(&self, filename: &str) -> Result<Url, ControllerError> {
        let mut url = self.url("files/")?;
        url.path_segments_mut()
            .map_err(|()| {
                ControllerError::Config(format!("base URL {} cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .push(filename)
            .push("");
        Ok(url)
    }

    /// Start a request carrying the OAuth signature.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.credentials.authorization() {
            Some(header) => builder.header(AUTHORIZATION, header),
            None => builder,
        }
    }

    /// Make an authenticated GET request.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ControllerError> {
        let url = self.url(path)?;
        debug!(url = %url, "GET request");

        let response = self.request(Method::GET, url).query(query).send().await?;
        Self::handle_response(response).await
    }

    /// Make an authenticated GET request for a raw body.
    async fn get_bytes(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>, ControllerError> {
        let url = self.url(path)?;
        debug!(url = %url, "GET request (raw body)");

        let response = self.request(Method::GET, url).query(query).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Make an authenticated form POST, optionally naming an `op`.
    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        op: Option<&str>,
        form: &[(&str, String)],
    ) -> Result<T, ControllerError> {
        let response = self.send_post(path, op, form).await?;
        Self::handle_response(response).await
    }

    /// Make an authenticated form POST whose response body is ignored.
    async fn post_empty(
        &self,
        path: &str,
        op: Option<&str>,
        form: &[(&str, String)],
    ) -> Result<(), ControllerError> {
        let response = self.send_post(path, op, form).await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn send_post(
        &self,
        path: &str,
        op: Option<&str>,
        form: &[(&str, String)],
    ) -> Result<Response, ControllerError> {
        let url = self.url(path)?;
        debug!(url = %url, op = ?op, "POST request");

        let mut builder = self.request(Method::POST, url);
        if let Some(op) = op {
            builder = builder.query(&[("op", op)]);
        }
        Ok(builder.form(form).send().await?)
    }

    /// Make an authenticated form PUT.
    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, ControllerError> {
        let url = self.url(path)?;
        debug!(url = %url, "PUT request");

        let response = self.request(Method::PUT, url).form(form).send().await?;
        Self::handle_response(response).await
    }

    /// Make an authenticated DELETE request.
    async fn delete(&self, url: Url) -> Result<(), ControllerError> {
        debug!(url = %url, "DELETE request");

        let response = self.request(Method::DELETE, url).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Map non-success statuses onto [`ControllerError`].
    async fn check_status(response: Response) -> Result<Response, ControllerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::BAD_REQUEST => ControllerError::BadRequest(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ControllerError::PermissionDenied(message)
            }
            StatusCode::NOT_FOUND => ControllerError::NoMatch(message),
            StatusCode::CONFLICT => ControllerError::CannotComplete(message),
            _ => ControllerError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Handle API response, parsing JSON or error.
    async fn handle_response<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, ControllerError> {
        let response = Self::check_status(response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            ControllerError::Serialization(e)
        })
    }

    /// Convert an API file resource to our File type.
    fn to_file(&self, resource: FileResource) -> Result<File, ControllerError> {
        let anonymous_url = if resource.anon_resource_uri.is_empty() {
            String::new()
        } else {
            self.base_url.join(&resource.anon_resource_uri)?.to_string()
        };

        let content = resource
            .content
            .map(|encoded| BASE64.decode(encoded.trim()))
            .transpose()
            .map_err(|e| {
                ControllerError::Unexpected(format!(
                    "content of file {:?} is not base64: {e}",
                    resource.filename
                ))
            })?;

        Ok(File {
            filename: resource.filename,
            anonymous_url,
            content,
        })
    }

    /// Rename and link the single interface of a freshly created device.
    async fn configure_device_interface(
        &self,
        device: &Device,
        args: &CreateMachineDeviceArgs,
    ) -> Result<Device, ControllerError> {
        let [iface] = device.interface_set.as_slice() else {
            return Err(ControllerError::Unexpected(format!(
                "unexpected interface count for device {}: {}",
                device.system_id,
                device.interface_set.len()
            )));
        };
        let path = format!("nodes/{}/interfaces/{}/", device.system_id, iface.id);

        if iface.name != args.interface_name {
            debug!(from = %iface.name, to = %args.interface_name, "Renaming device interface");
            let _: InterfaceResource = self
                .put(&path, &[("name", args.interface_name.clone())])
                .await?;
        }

        debug!(subnet = %args.subnet.name, "Linking device interface");
        let form = [
            ("mode", LINK_MODE_STATIC.to_string()),
            ("subnet", args.subnet.id.to_string()),
        ];
        let _: InterfaceResource = self.post(&path, Some("link_subnet"), &form).await?;

        let refreshed: DeviceResource = self
            .get(&format!("devices/{}/", device.system_id), &[])
            .await?;
        Ok(refreshed.into())
    }
}

#[async_trait]
impl Controller for MaasController {
    async fn zones(&self) -> Result<Vec<Zone>, ControllerError> {
        let zones: Vec<ZoneResource> = self.get("zones/", &[]).await?;
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    async fn fabrics(&self) -> Result<Vec<Fabric>, ControllerError> {
        let fabrics: Vec<FabricResource> = self.get("fabrics/", &[]).await?;
        Ok(fabrics.into_iter().map(Fabric::from).collect())
    }

    async fn machines(&self, args: MachinesArgs) -> Result<Vec<Machine>, ControllerError> {
        let mut query: Params = Vec::new();
        query.extend(args.system_ids.into_iter().map(|id| ("id", id)));
        query.extend(args.hostnames.into_iter().map(|h| ("hostname", h)));

        let machines: Vec<MachineResource> = self.get("machines/", &query).await?;
        Ok(machines.into_iter().map(Machine::from).collect())
    }

    async fn allocate_machine(
        &self,
        args: AllocateMachineArgs,
    ) -> Result<(Machine, ConstraintMatches), ControllerError> {
        info!(hostname = ?args.hostname, zone = ?args.zone, "Allocating machine");

        let mut form: Params = Vec::new();
        if let Some(hostname) = args.hostname {
            form.push(("name", hostname));
        }
        if let Some(zone) = args.zone {
            form.push(("zone", zone));
        }
        if !args.tags.is_empty() {
            form.push(("tags", args.tags.join(",")));
        }

        let mut resource: MachineResource = self.post("machines/", Some("allocate"), &form).await?;
        let matches = resource.constraints_by_type.take().unwrap_or_default();
        let machine = Machine::from(resource);

        info!(system_id = %machine.system_id, fqdn = %machine.fqdn, "Machine allocated");
        Ok((machine, matches.into()))
    }

    async fn release_machines(&self, args: ReleaseMachinesArgs) -> Result<(), ControllerError> {
        info!(count = args.system_ids.len(), "Releasing machines");

        let mut form: Params = args
            .system_ids
            .into_iter()
            .map(|id| ("machines", id))
            .collect();
        if let Some(comment) = args.comment {
            form.push(("comment", comment));
        }
        self.post_empty("machines/", Some("release"), &form).await
    }

    async fn start_machine(
        &self,
        system_id: &str,
        args: StartArgs,
    ) -> Result<(), ControllerError> {
        info!(system_id = %system_id, series = %args.distro_series, "Deploying machine");

        let mut form: Params = vec![("distro_series", args.distro_series)];
        if let Some(comment) = args.comment {
            form.push(("comment", comment));
        }
        self.post_empty(&format!("machines/{system_id}/"), Some("deploy"), &form)
            .await
    }

    async fn machine_devices(
        &self,
        system_id: &str,
        args: DevicesArgs,
    ) -> Result<Vec<Device>, ControllerError> {
        let devices = self.devices(args).await?;
        Ok(devices
            .into_iter()
            .filter(|d| d.parent.as_deref() == Some(system_id))
            .collect())
    }

    async fn create_machine_device(
        &self,
        system_id: &str,
        args: CreateMachineDeviceArgs,
    ) -> Result<Device, ControllerError> {
        let device = self
            .create_device(CreateDeviceArgs {
                hostname: args.hostname.clone(),
                mac_addresses: vec![args.mac_address.clone()],
                parent: Some(system_id.to_string()),
            })
            .await?;

        match self.configure_device_interface(&device, &args).await {
            Ok(device) => Ok(device),
            Err(err) => {
                warn!(
                    device = %device.system_id,
                    error = %err,
                    "Removing partially configured device"
                );
                if let Err(cleanup) = self.delete_device(&device.system_id).await {
                    warn!(device = %device.system_id, error = %cleanup, "Failed to remove device");
                }
                Err(err)
            }
        }
    }

    async fn devices(&self, args: DevicesArgs) -> Result<Vec<Device>, ControllerError> {
        let mut query: Params = Vec::new();
        query.extend(args.hostnames.into_iter().map(|h| ("hostname", h)));
        query.extend(args.mac_addresses.into_iter().map(|m| ("mac_address", m)));
        query.extend(args.system_ids.into_iter().map(|id| ("id", id)));

        let devices: Vec<DeviceResource> = self.get("devices/", &query).await?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    async fn create_device(&self, args: CreateDeviceArgs) -> Result<Device, ControllerError> {
        info!(hostname = ?args.hostname, parent = ?args.parent, "Creating device");

        let mut form: Params = Vec::new();
        if let Some(hostname) = args.hostname {
            form.push(("hostname", hostname));
        }
        form.extend(args.mac_addresses.into_iter().map(|m| ("mac_addresses", m)));
        if let Some(parent) = args.parent {
            form.push(("parent", parent));
        }

        let device: DeviceResource = self.post("devices/", None, &form).await?;
        info!(system_id = %device.system_id, "Device created");
        Ok(device.into())
    }

    async fn delete_device(&self, system_id: &str) -> Result<(), ControllerError> {
        info!(system_id = %system_id, "Deleting device");
        self.delete(self.url(&format!("devices/{system_id}/"))?)
            .await
    }

    async fn unlink_subnet(
        &self,
        system_id: &str,
        interface_id: i64,
        link_id: i64,
    ) -> Result<(), ControllerError> {
        info!(system_id = %system_id, interface_id, link_id, "Unlinking subnet");
        let path = format!("nodes/{system_id}/interfaces/{interface_id}/");
        let _: InterfaceResource = self
            .post(&path, Some("unlink_subnet"), &[("id", link_id.to_string())])
            .await?;
        Ok(())
    }

    async fn files(&self, prefix: &str) -> Result<Vec<File>, ControllerError> {
        let mut query: Params = vec![("op", "list".to_string())];
        if !prefix.is_empty() {
            query.push(("prefix", prefix.to_string()));
        }

        let files: Vec<FileResource> = self.get("files/", &query).await?;
        files.into_iter().map(|f| self.to_file(f)).collect()
    }

    async fn get_file(&self, filename: &str) -> Result<File, ControllerError> {
        let query = [
            ("op", "get_by_name".to_string()),
            ("filename", filename.to_string()),
        ];
        let file: FileResource = self.get("files/", &query).await?;
        self.to_file(file)
    }

    async fn add_file(&self, args: AddFileArgs) -> Result<(), ControllerError> {
        args.validate()?;

        let part = match args.source {
            FileSource::Bytes(content) => {
                debug!(filename = %args.filename, bytes = content.len(), "Uploading buffered file");
                Part::bytes(content)
            }
            FileSource::Reader { reader, length } => {
                debug!(filename = %args.filename, bytes = length, "Uploading streamed file");
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(reader)), length)
            }
        }
        .file_name(args.filename.clone());

        let form = Form::new()
            .text("filename", args.filename.clone())
            .part("file", part);

        let url = self.url("files/")?;
        debug!(url = %url, "POST request (multipart)");
        let response = self
            .request(Method::POST, url)
            .query(&[("op", "add")])
            .multipart(form)
            .send()
            .await?;
        Self::check_status(response).await?;

        info!(filename = %args.filename, "File added");
        Ok(())
    }

    async fn read_file(&self, file: &File) -> Result<Vec<u8>, ControllerError> {
        if let Some(content) = &file.content {
            return Ok(content.clone());
        }
        let query = [("op", "get".to_string()), ("filename", file.filename.clone())];
        self.get_bytes("files/", &query).await
    }

    async fn delete_file(&self, filename: &str) -> Result<(), ControllerError> {
        info!(filename = %filename, "Deleting file");
        self.delete(self.file_url(filename)?).await
    }
}
