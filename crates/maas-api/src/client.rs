//! Asynchronous MAAS client implementation.

use std::collections::HashMap;
use std::sync::Arc;

use maas_core::client::{ClientConfig, RetryPolicy};
use maas_core::{
    ControllerInterface, Error, HttpControllerBuilder, MaasClientConfig, QueryParams,
    StatusPolicy,
};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::args::{
    AddFileArgs, AllocateMachineArgs, CommissionMachineArgs, CreateInterfaceArgs,
    CreateMachineNodeArgs, CreateNodeArgs, DeployMachineArgs, DevicesArgs, LinkMode,
    LinkSubnetArgs, MachinesArgs, NodesArgs, ReleaseMachinesArgs, UpdateInterfaceArgs,
};
use crate::constraints::{parse_constraint_matches, ConstraintMatches};
use crate::models::{
    BootResource, Device, Fabric, File, InterfaceHost, Machine, NetworkInterface, Node, Space,
    StaticRoute, Subnet, Zone,
};
use crate::operations::{self, MachineOp, MachinesOp};
use crate::Result;

/// Builder for [`MaasClient`] over the reqwest transport.
#[derive(Debug, Clone)]
pub struct MaasClientBuilder {
    controller: HttpControllerBuilder,
}

impl MaasClientBuilder {
    /// Create a new builder for the region controller at `base_url`,
    /// e.g. `http://maas:5240/MAAS`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            controller: HttpControllerBuilder::new(base_url)?,
        })
    }

    /// Create a builder from a validated [`MaasClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the base URL cannot be parsed.
    pub fn from_config(config: &MaasClientConfig) -> Result<Self> {
        Ok(Self {
            controller: HttpControllerBuilder::from_config(config)?,
        })
    }

    /// Authenticate with a `consumer_key:token_key:token_secret` API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.controller = self.controller.with_api_key(api_key);
        self
    }

    /// Override the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.controller = self.controller.with_api_version(version);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.controller = self.controller.with_http_config(config);
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.controller = self.controller.with_retry_policy(retry);
        self
    }

    /// Build the client instance.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for a malformed API key or HTTP setup failure.
    pub fn build(self) -> Result<MaasClient> {
        Ok(MaasClient::with_controller(Arc::new(
            self.controller.build()?,
        )))
    }
}

/// Asynchronous client for the MAAS region API.
///
/// Every operation performs its round trips sequentially and translates
/// transport failures through that operation's [`StatusPolicy`].
#[derive(Clone)]
pub struct MaasClient {
    controller: Arc<dyn ControllerInterface>,
}

impl std::fmt::Debug for MaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaasClient").finish_non_exhaustive()
    }
}

impl MaasClient {
    /// Construct an anonymous client from a base URL.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        MaasClientBuilder::new(base_url)?.build()
    }

    /// Construct a client over any transport.
    #[must_use]
    pub fn with_controller(controller: Arc<dyn ControllerInterface>) -> Self {
        Self { controller }
    }

    /// The underlying transport.
    #[must_use]
    pub fn controller(&self) -> &Arc<dyn ControllerInterface> {
        &self.controller
    }

    /// Capabilities advertised by the server.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error.
    pub async fn capabilities(&self) -> Result<std::collections::BTreeSet<String>> {
        self.controller
            .api_version_info()
            .await
            .map_err(|err| operations::LIST.translate(err))
    }

    /// List machines, filtering on owner data client-side.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn machines(&self, args: &MachinesArgs) -> Result<Vec<Machine>> {
        let machines: Vec<Machine> = self
            .get_json("machines", "", &args.to_params(), &operations::LIST)
            .await?;
        if args.owner_data.is_empty() {
            return Ok(machines);
        }
        Ok(machines
            .into_iter()
            .filter(|machine| machine.owner_data_matches(&args.owner_data))
            .collect())
    }

    /// List nodes.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn nodes(&self, args: &NodesArgs) -> Result<Vec<Node>> {
        self.get_json("nodes", "", &args.to_params(), &operations::LIST)
            .await
    }

    /// List the nodes whose parent is `machine`.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn machine_nodes(&self, machine: &Machine, args: &NodesArgs) -> Result<Vec<Node>> {
        let nodes = self.nodes(args).await?;
        Ok(nodes
            .into_iter()
            .filter(|node| node.parent == machine.system_id)
            .collect())
    }

    /// List devices.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn devices(&self, args: &DevicesArgs) -> Result<Vec<Device>> {
        self.get_json("devices", "", &args.to_params(), &operations::LIST)
            .await
    }

    /// List fabrics.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn fabrics(&self) -> Result<Vec<Fabric>> {
        self.get_json("fabrics", "", &QueryParams::new(), &operations::LIST)
            .await
    }

    /// List spaces.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn spaces(&self) -> Result<Vec<Space>> {
        self.get_json("spaces", "", &QueryParams::new(), &operations::LIST)
            .await
    }

    /// List zones.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn zones(&self) -> Result<Vec<Zone>> {
        self.get_json("zones", "", &QueryParams::new(), &operations::LIST)
            .await
    }

    /// List static routes.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn static_routes(&self) -> Result<Vec<StaticRoute>> {
        self.get_json("static-routes", "", &QueryParams::new(), &operations::LIST)
            .await
    }

    /// List boot resources.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn boot_resources(&self) -> Result<Vec<BootResource>> {
        self.get_json("boot-resources", "", &QueryParams::new(), &operations::LIST)
            .await
    }

    /// List files whose name starts with `prefix`; an empty prefix lists all.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error or `Error::Decode`.
    pub async fn files(&self, prefix: &str) -> Result<Vec<File>> {
        let mut params = QueryParams::new();
        params.maybe_add("prefix", prefix);
        self.get_json("files", "", &params, &operations::LIST).await
    }

    /// Fetch a single file, including its base64 content.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for an empty name, `Error::NotFound` on 404.
    pub async fn get_file(&self, filename: &str) -> Result<File> {
        if filename.is_empty() {
            return Err(Error::NotValid("missing Filename".to_string()));
        }
        let path = format!("files/{}/", urlencoding::encode(filename));
        self.get_json(&path, "", &QueryParams::new(), &operations::GET_FILE)
            .await
    }

    /// Download the raw content of `file`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` on 404 or the translated transport error.
    pub async fn read_file_content(&self, file: &File) -> Result<Vec<u8>> {
        let mut params = QueryParams::new();
        params.add("filename", file.filename.as_str());
        self.controller
            .get("files", "get", &params)
            .await
            .map_err(|err| operations::GET_FILE.translate(err))
    }

    /// Upload a file from literal content or a reader.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for invalid arguments or a short reader, or
    /// the translated transport error.
    pub async fn add_file(&self, args: AddFileArgs<'_>) -> Result<()> {
        args.validate()?;
        let AddFileArgs {
            filename,
            content,
            reader,
            length,
        } = args;

        let content = match (content, reader) {
            (Some(content), _) => content,
            (None, Some(reader)) => read_content(reader, length).await?,
            (None, None) => return Err(Error::NotValid("missing Content or Reader".to_string())),
        };

        let mut params = QueryParams::new();
        params.add("filename", filename.as_str());
        debug!(filename = %filename, bytes = content.len(), "uploading file");
        self.controller
            .post_file("files", "", &params, content)
            .await
            .map_err(|err| operations::ADD_FILE.translate(err))?;
        Ok(())
    }

    /// Create a node.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` without any request when no MAC address is
    /// given, otherwise the translated transport error.
    pub async fn create_node(&self, args: &CreateNodeArgs) -> Result<Node> {
        if args.mac_addresses.iter().all(String::is_empty) {
            return Err(Error::NotValid("missing MACAddresses".to_string()));
        }
        self.post_json("nodes", "", &args.to_params(), &operations::CREATE_NODE)
            .await
    }

    /// Delete a node.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` on 404 or the translated transport error.
    pub async fn delete_node(&self, node: &Node) -> Result<()> {
        self.delete(&node.resource_uri, &operations::DELETE).await
    }

    /// Delete a device.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` on 404 or the translated transport error.
    pub async fn delete_device(&self, device: &Device) -> Result<()> {
        self.delete(&device.resource_uri, &operations::DELETE).await
    }

    /// Allocate a machine matching `args` and resolve its labelled matches.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for invalid constraints, `Error::NoMatch` when
    /// no machine satisfies them, or `Error::Decode` for a malformed response.
    pub async fn allocate_machine(
        &self,
        args: &AllocateMachineArgs,
    ) -> Result<(Machine, ConstraintMatches)> {
        args.validate()?;
        let source: serde_json::Value = self
            .post_json(
                "machines",
                MachinesOp::Allocate.as_str(),
                &args.to_params(),
                &operations::ALLOCATE_MACHINE,
            )
            .await?;
        let machine: Machine = serde_json::from_value(source.clone())
            .map_err(|err| Error::Decode(format!("allocated machine: {err}")))?;
        let matches = parse_constraint_matches(&source, &machine)?;
        debug!(system_id = %machine.system_id, "allocated machine");
        Ok((machine, matches))
    }

    /// Release machines in one batch.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` or `Error::CannotComplete` as mapped for
    /// release; the whole batch fails together.
    pub async fn release_machines(&self, args: &ReleaseMachinesArgs) -> Result<()> {
        self.controller
            .post(
                "machines",
                MachinesOp::Release.as_str(),
                &args.to_params(),
            )
            .await
            .map_err(|err| operations::RELEASE_MACHINES.translate(err))?;
        Ok(())
    }

    /// Deploy `machine` and merge the server's view back into it.
    ///
    /// # Errors
    ///
    /// Returns the error mapped for deploy.
    pub async fn deploy(&self, machine: &mut Machine, args: &DeployMachineArgs) -> Result<()> {
        self.machine_action(machine, MachineOp::Deploy, &args.to_params(), &operations::DEPLOY)
            .await
    }

    /// Commission `machine` and merge the server's view back into it.
    ///
    /// # Errors
    ///
    /// Returns the error mapped for commission.
    pub async fn commission(
        &self,
        machine: &mut Machine,
        args: &CommissionMachineArgs,
    ) -> Result<()> {
        self.machine_action(
            machine,
            MachineOp::Commission,
            &args.to_params(),
            &operations::COMMISSION,
        )
        .await
    }

    /// Set owner data on `machine`. Empty values clear the key.
    ///
    /// # Errors
    ///
    /// Returns the translated transport error.
    pub async fn set_owner_data(
        &self,
        machine: &mut Machine,
        owner_data: &HashMap<String, String>,
    ) -> Result<()> {
        let mut entries: Vec<_> = owner_data.iter().collect();
        entries.sort();
        let mut params = QueryParams::new();
        for (key, value) in entries {
            params.add(key, value.as_str());
        }
        self.machine_action(
            machine,
            MachineOp::SetOwnerData,
            &params,
            &operations::SET_OWNER_DATA,
        )
        .await
    }

    /// Create a physical interface on `host` and append it to the host's list.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for invalid arguments or the error mapped for
    /// interface creation.
    pub async fn create_interface<H>(
        &self,
        host: &mut H,
        args: &CreateInterfaceArgs,
    ) -> Result<NetworkInterface>
    where
        H: InterfaceHost + Send + ?Sized,
    {
        args.validate()?;
        let path = format!("{}interfaces/", host.resource_uri());
        let iface: NetworkInterface = self
            .post_json(
                &path,
                "create_physical",
                &args.to_params(),
                &operations::CREATE_INTERFACE,
            )
            .await?;
        host.interfaces_mut().push(iface.clone());
        Ok(iface)
    }

    /// Link `iface` to a subnet and merge the server's view back into it.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for invalid arguments or the error mapped for
    /// linking.
    pub async fn link_subnet(
        &self,
        iface: &mut NetworkInterface,
        args: &LinkSubnetArgs,
    ) -> Result<()> {
        args.validate()?;
        let fresh: NetworkInterface = self
            .post_json(
                &iface.resource_uri,
                "link_subnet",
                &args.to_params(),
                &operations::LINK_SUBNET,
            )
            .await?;
        iface.update_from(fresh);
        Ok(())
    }

    /// Remove the link between `iface` and `subnet`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` without any request when `iface` has no link
    /// on `subnet`, otherwise the error mapped for unlinking.
    pub async fn unlink_subnet(&self, iface: &mut NetworkInterface, subnet: &Subnet) -> Result<()> {
        let link = iface
            .link_for_subnet(subnet)
            .ok_or_else(|| Error::NotValid("unlinked Subnet".to_string()))?;
        let mut params = QueryParams::new();
        params.add("id", link.id.to_string());
        let fresh: NetworkInterface = self
            .post_json(
                &iface.resource_uri,
                "unlink_subnet",
                &params,
                &operations::UNLINK_SUBNET,
            )
            .await?;
        iface.update_from(fresh);
        Ok(())
    }

    /// Update `iface`. Arguments with nothing set make no request.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` on 404 or the translated transport error.
    pub async fn update_network_interface(
        &self,
        iface: &mut NetworkInterface,
        args: &UpdateInterfaceArgs,
    ) -> Result<()> {
        if args.is_empty() {
            return Ok(());
        }
        let bytes = self
            .controller
            .put(&iface.resource_uri, &args.to_params())
            .await
            .map_err(|err| operations::UPDATE_INTERFACE.translate(err))?;
        iface.update_from(decode(&iface.resource_uri, &bytes)?);
        Ok(())
    }

    /// Create a node under `machine` with a single configured interface.
    ///
    /// The node is created with one MAC address, its interface is renamed and
    /// moved to the requested VLAN, then statically linked to the subnet if one
    /// was given. If any step after creation fails the node is deleted and the
    /// step's error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotValid` for invalid arguments, `Error::Unexpected` if
    /// the node does not come back with exactly one interface, or the first
    /// failing step's error.
    pub async fn create_machine_node(
        &self,
        machine: &Machine,
        args: &CreateMachineNodeArgs,
    ) -> Result<Node> {
        args.validate()?;
        let mut node = self
            .create_node(&CreateNodeArgs {
                hostname: args.hostname.clone(),
                mac_addresses: vec![args.mac_address.clone()],
                parent: machine.system_id.clone(),
                ..CreateNodeArgs::default()
            })
            .await?;
        debug!(system_id = %node.system_id, parent = %machine.system_id, "created node");

        if let Err(err) = self.configure_machine_node(&mut node, args).await {
            debug!(system_id = %node.system_id, error = %err, "removing partially configured node");
            if let Err(cleanup) = self.delete_node(&node).await {
                warn!(
                    system_id = %node.system_id,
                    error = %cleanup,
                    "failed to delete node after partial failure"
                );
            }
            return Err(err);
        }
        Ok(node)
    }

    async fn configure_machine_node(
        &self,
        node: &mut Node,
        args: &CreateMachineNodeArgs,
    ) -> Result<()> {
        let vlan = args
            .vlan
            .clone()
            .or_else(|| args.subnet.as_ref().and_then(|subnet| subnet.vlan.clone()));

        let count = node.interface_set.len();
        let [iface] = node.interface_set.as_mut_slice() else {
            return Err(Error::Unexpected(format!(
                "unexpected interface count for node: {count}"
            )));
        };

        self.update_network_interface(
            iface,
            &UpdateInterfaceArgs {
                name: args.interface_name.clone(),
                vlan,
                ..UpdateInterfaceArgs::default()
            },
        )
        .await?;

        if let Some(subnet) = &args.subnet {
            self.link_subnet(
                iface,
                &LinkSubnetArgs {
                    mode: Some(LinkMode::Static),
                    subnet: Some(subnet.clone()),
                    ..LinkSubnetArgs::default()
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn machine_action(
        &self,
        machine: &mut Machine,
        op: MachineOp,
        params: &QueryParams,
        policy: &StatusPolicy,
    ) -> Result<()> {
        debug!(system_id = %machine.system_id, %op, "machine action");
        let fresh: Machine = self
            .post_json(&machine.resource_uri, op.as_str(), params, policy)
            .await?;
        machine.update_from(fresh);
        Ok(())
    }

    async fn get_json<T>(
        &self,
        path: &str,
        op: &str,
        params: &QueryParams,
        policy: &StatusPolicy,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self
            .controller
            .get(path, op, params)
            .await
            .map_err(|err| policy.translate(err))?;
        decode(path, &bytes)
    }

    async fn post_json<T>(
        &self,
        path: &str,
        op: &str,
        params: &QueryParams,
        policy: &StatusPolicy,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self
            .controller
            .post(path, op, params)
            .await
            .map_err(|err| policy.translate(err))?;
        decode(path, &bytes)
    }

    async fn delete(&self, path: &str, policy: &StatusPolicy) -> Result<()> {
        self.controller
            .delete(path)
            .await
            .map_err(|err| policy.translate(err))
    }
}

fn decode<T>(path: &str, bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(bytes)
        .map_err(|err| Error::Decode(format!("Failed to parse MAAS response for `{path}`: {err}")))
}

/// Read exactly `length` bytes from `reader`.
async fn read_content(reader: &mut (dyn AsyncRead + Unpin + Send), length: u64) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    reader
        .take(length)
        .read_to_end(&mut content)
        .await
        .map_err(|err| Error::NotValid(format!("cannot read File Content: {err}")))?;
    if content.len() as u64 != length {
        return Err(Error::NotValid(format!(
            "short Reader ({} of {length} bytes)",
            content.len()
        )));
    }
    Ok(content)
}
