// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Model Entities
//!
//! The declarative deployment document is a set of named lists. Each list is
//! read into an insertion-ordered map keyed by the entity's natural identifier
//! (`name`, or `id` for servers). Relationships are stored as identifiers:
//!
//! - forward references are [`Link`]s (or [`Route`]s for network-group routes),
//! - reverse references are [`BackRefs`], a set of referrer keys per [`RefKind`].
//!
//! The graph is cyclic in meaning only. Every edge is a key into one of the
//! maps on [`DeploymentModel`], so the model can be cloned, compared and
//! serialized without any cycle breaking.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::{TopologyError, TopologyResult};

/// Top-level sections a deployment document must carry
pub const REQUIRED_SECTIONS: [&str; 3] = ["control-planes", "server-roles", "servers"];

/// Route value that attaches a network to the external router
pub const DEFAULT_ROUTE: &str = "default";

// ============================================================================
// References
// ============================================================================

/// Forward reference to another entity
///
/// Deserializes from the bare identifier found in the document. Linking
/// turns it into [`Link::Resolved`] when the identifier names an existing
/// entity; anything else stays [`Link::Unresolved`] and is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Link {
    /// Identifier of an entity present in the target map
    Resolved(String),
    /// Declared identifier not (or no longer) present, or no identifier at all
    Unresolved(Option<String>),
}

impl Link {
    /// Key of the resolved target
    pub fn key(&self) -> Option<&str> {
        match self {
            Link::Resolved(key) => Some(key),
            Link::Unresolved(_) => None,
        }
    }

    /// Identifier as declared, resolved or not
    pub fn declared(&self) -> Option<&str> {
        match self {
            Link::Resolved(key) => Some(key),
            Link::Unresolved(key) => key.as_deref(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Link::Resolved(_))
    }
}

impl Default for Link {
    fn default() -> Self {
        Link::Unresolved(None)
    }
}

impl From<Option<String>> for Link {
    fn from(value: Option<String>) -> Self {
        Link::Unresolved(value)
    }
}

impl From<&str> for Link {
    fn from(value: &str) -> Self {
        Link::Unresolved(Some(value.to_string()))
    }
}

impl From<Link> for Option<String> {
    fn from(value: Link) -> Self {
        match value {
            Link::Resolved(key) => Some(key),
            Link::Unresolved(key) => key,
        }
    }
}

/// Network-group route target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Route {
    /// Route to the outside world through the external router
    Default,
    /// Route to every network of another network group
    NetworkGroup(String),
    /// Route to a neutron provider/external network
    NeutronNetwork(String),
    /// Target not found among network groups or neutron networks
    Unresolved(String),
}

impl Route {
    pub fn target(&self) -> &str {
        match self {
            Route::Default => DEFAULT_ROUTE,
            Route::NetworkGroup(name) | Route::NeutronNetwork(name) | Route::Unresolved(name) => {
                name
            }
        }
    }
}

impl From<String> for Route {
    fn from(value: String) -> Self {
        if value == DEFAULT_ROUTE {
            Route::Default
        } else {
            Route::Unresolved(value)
        }
    }
}

impl From<Route> for String {
    fn from(value: Route) -> Self {
        value.target().to_string()
    }
}

/// Kinds of reverse references recorded on a referenced entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    ControlPlanes,
    Clusters,
    Resources,
    ServerRoles,
    NetworkInterfaces,
    NetworkGroupRoutes,
    Networks,
    FirewallRules,
    Servers,
    ServerGroups,
    ServerGroupParents,
}

/// Reverse references, grouped by kind, in the order they were recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BackRefs(IndexMap<RefKind, IndexSet<String>>);

impl BackRefs {
    /// Record `referrer` under `kind`; recording twice is a no-op
    pub fn record(&mut self, kind: RefKind, referrer: impl Into<String>) {
        self.0.entry(kind).or_default().insert(referrer.into());
    }

    /// Drop `referrer` from `kind`
    pub fn forget(&mut self, kind: RefKind, referrer: &str) {
        if let Some(referrers) = self.0.get_mut(&kind) {
            referrers.shift_remove(referrer);
            if referrers.is_empty() {
                self.0.shift_remove(&kind);
            }
        }
    }

    /// Referrers recorded under `kind`
    pub fn get(&self, kind: RefKind) -> impl Iterator<Item = &str> {
        self.0.get(&kind).into_iter().flatten().map(String::as_str)
    }

    pub fn contains(&self, kind: RefKind, referrer: &str) -> bool {
        self.0
            .get(&kind)
            .is_some_and(|referrers| referrers.contains(referrer))
    }

    /// True when any of `kinds` has at least one referrer
    pub fn any_of(&self, kinds: &[RefKind]) -> bool {
        kinds
            .iter()
            .any(|kind| self.0.get(kind).is_some_and(|referrers| !referrers.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(IndexSet::is_empty)
    }
}

/// Entity that can be the target of a [`Link`]
pub trait Entity {
    fn back_refs(&self) -> &BackRefs;
    fn back_refs_mut(&mut self) -> &mut BackRefs;
}

/// Entity with a natural identifier
pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! entity {
    ($($ty:ty => $key:ident),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn back_refs(&self) -> &BackRefs {
                    &self.refs
                }

                fn back_refs_mut(&mut self) -> &mut BackRefs {
                    &mut self.refs
                }
            }

            impl Keyed for $ty {
                fn key(&self) -> &str {
                    &self.$key
                }
            }
        )*
    };
}

/// Read a list of entities into a map keyed by natural identifier
///
/// Later duplicates replace earlier ones but keep the earlier position.
fn keyed_map<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Keyed,
{
    let items = Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .map(|item| (item.key().to_string(), item))
        .collect())
}

// ============================================================================
// Entities
// ============================================================================

/// Cluster or resource group within a control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceGroupKind {
    Cluster,
    Resource,
}

impl ServiceGroupKind {
    pub fn ref_kind(self) -> RefKind {
        match self {
            ServiceGroupKind::Cluster => RefKind::Clusters,
            ServiceGroupKind::Resource => RefKind::Resources,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControlPlane {
    pub name: String,
    #[serde(default, deserialize_with = "keyed_map")]
    pub clusters: IndexMap<String, ServiceGroup>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub resources: IndexMap<String, ServiceGroup>,
    #[serde(default)]
    pub configuration_data: Vec<Link>,
}

impl ControlPlane {
    pub fn service_groups(&self, kind: ServiceGroupKind) -> &IndexMap<String, ServiceGroup> {
        match kind {
            ServiceGroupKind::Cluster => &self.clusters,
            ServiceGroupKind::Resource => &self.resources,
        }
    }

    pub fn service_groups_mut(
        &mut self,
        kind: ServiceGroupKind,
    ) -> &mut IndexMap<String, ServiceGroup> {
        match kind {
            ServiceGroupKind::Cluster => &mut self.clusters,
            ServiceGroupKind::Resource => &mut self.resources,
        }
    }
}

/// Cluster or resource: a set of service components hosted by one server role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceGroup {
    pub name: String,
    #[serde(default)]
    pub server_role: Link,
    #[serde(default)]
    pub configuration_data: Vec<Link>,
    #[serde(default)]
    pub service_components: Vec<String>,
    /// Owning control plane
    #[serde(skip_deserializing)]
    pub control_plane: String,
}

impl ServiceGroup {
    /// Back-reference key, unique across control planes
    pub fn ref_key(&self) -> String {
        service_group_key(&self.control_plane, &self.name)
    }

    pub fn hosts(&self, component: &str) -> bool {
        self.service_components.iter().any(|c| c == component)
    }
}

pub fn service_group_key(control_plane: &str, name: &str) -> String {
    format!("{control_plane}/{name}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationData {
    pub name: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub network_tags: Vec<NetworkTag>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

impl ConfigurationData {
    pub fn provides(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }
}

/// Tags declared for a network group by a configuration-data entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkTag {
    pub network_group: String,
    #[serde(default)]
    pub tags: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerRole {
    pub name: String,
    #[serde(default)]
    pub interface_model: Link,
    #[serde(default)]
    pub disk_model: Link,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceModel {
    pub name: String,
    #[serde(default, deserialize_with = "keyed_map")]
    pub network_interfaces: IndexMap<String, NetworkInterface>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkInterface {
    pub name: String,
    #[serde(default)]
    pub device: Device,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_data: Option<BondData>,
    #[serde(default)]
    pub network_groups: Vec<Link>,
    #[serde(default)]
    pub forced_network_groups: Vec<Link>,
    /// Owning interface model
    #[serde(skip_deserializing)]
    pub interface_model: String,
}

impl NetworkInterface {
    /// Back-reference key, unique across interface models
    pub fn ref_key(&self) -> String {
        format!("{}/{}", self.interface_model, self.name)
    }

    /// Network groups, regular first, then forced
    pub fn all_network_groups(&self) -> impl Iterator<Item = &Link> {
        self.network_groups
            .iter()
            .chain(self.forced_network_groups.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BondData {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub options: IndexMap<String, Value>,
}

impl BondData {
    /// Device designated as primary by the bond options
    pub fn primary(&self) -> Option<&str> {
        self.options.get("primary").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiskModel {
    pub name: String,
    #[serde(default)]
    pub volume_groups: Vec<VolumeGroup>,
    #[serde(default)]
    pub device_groups: Vec<DeviceGroup>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VolumeGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub physical_volumes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkGroup {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<Value>,
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Tags contributed by the neutron configuration-data entry, then the legacy group tags
    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub neutron_tags: Vec<Value>,
    /// Associated neutron networks, keyed by physical network
    #[serde(default, skip_deserializing, skip_serializing_if = "IndexMap::is_empty")]
    pub neutron_networks: IndexMap<String, String>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlanid: Option<u32>,
    #[serde(default)]
    pub tagged_vlan: bool,
    #[serde(default)]
    pub network_group: Link,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

/// Provider or external network declared by the neutron configuration data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeutronNetwork {
    pub name: String,
    #[serde(default, skip_deserializing)]
    pub external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default)]
    pub provider: Vec<Provider>,
    /// Network groups tagged with this network's physical network
    #[serde(default, skip_deserializing, skip_serializing_if = "IndexSet::is_empty")]
    pub network_groups: IndexSet<String>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

impl NeutronNetwork {
    pub fn provider(&self) -> Option<&Provider> {
        self.provider.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default)]
    pub network_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_network: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Server {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,
    #[serde(default)]
    pub role: Link,
    #[serde(default)]
    pub nic_mapping: Link,
    #[serde(default)]
    pub server_group: Link,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerGroup {
    pub name: String,
    #[serde(default)]
    pub networks: Vec<Link>,
    /// Child server groups
    #[serde(default)]
    pub server_groups: Vec<Link>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NicMapping {
    pub name: String,
    #[serde(default)]
    pub physical_ports: Vec<Value>,
    #[serde(default, skip_deserializing, skip_serializing_if = "BackRefs::is_empty")]
    pub refs: BackRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FirewallRule {
    pub name: String,
    #[serde(default)]
    pub network_groups: Vec<Link>,
}

impl Keyed for ControlPlane {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for ServiceGroup {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for NetworkInterface {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for FirewallRule {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Server {
    fn key(&self) -> &str {
        &self.id
    }
}

entity! {
    ConfigurationData => name,
    ServerRole => name,
    InterfaceModel => name,
    DiskModel => name,
    NetworkGroup => name,
    Network => name,
    NeutronNetwork => name,
    ServerGroup => name,
    NicMapping => name,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudSettings {
    pub name: String,
}

/// Bare-metal provisioning subnet, identifying the management network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaremetalSubnet {
    pub subnet: String,
    pub netmask: String,
}

// ============================================================================
// Deployment model
// ============================================================================

/// Deployment model graph
///
/// Built by [`DeploymentModel::from_document`] with every reference still
/// unresolved; [`crate::normalize::normalize_model`] links and prunes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeploymentModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<CloudSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baremetal: Option<BaremetalSubnet>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub control_planes: IndexMap<String, ControlPlane>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub configuration_data: IndexMap<String, ConfigurationData>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub server_roles: IndexMap<String, ServerRole>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub disk_models: IndexMap<String, DiskModel>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub interface_models: IndexMap<String, InterfaceModel>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub networks: IndexMap<String, Network>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub network_groups: IndexMap<String, NetworkGroup>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub nic_mappings: IndexMap<String, NicMapping>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub servers: IndexMap<String, Server>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub server_groups: IndexMap<String, ServerGroup>,
    #[serde(default, deserialize_with = "keyed_map")]
    pub firewall_rules: IndexMap<String, FirewallRule>,
    /// Provider and external networks from the neutron configuration data
    #[serde(default, skip_deserializing)]
    pub neutron_networks: IndexMap<String, NeutronNetwork>,
    /// Configuration-data entry providing the networking service
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub neutron_config_data: Option<String>,
}

impl DeploymentModel {
    /// Read a raw deployment document
    ///
    /// The document is copied; the caller's value is never touched.
    pub fn from_document(document: &Value) -> TopologyResult<Self> {
        let sections = document.as_object().ok_or_else(|| {
            TopologyError::InvalidDocument("input model must be a mapping".to_string())
        })?;

        for section in REQUIRED_SECTIONS {
            if !sections.contains_key(section) {
                return Err(TopologyError::MissingSection(section.to_string()));
            }
        }

        Ok(serde_json::from_value(document.clone())?)
    }

    /// Look up a cluster or resource by its back-reference key
    pub fn service_group(&self, kind: ServiceGroupKind, key: &str) -> Option<&ServiceGroup> {
        self.control_planes
            .values()
            .flat_map(|cp| cp.service_groups(kind).values())
            .find(|group| group.ref_key() == key)
    }

    /// Clusters then resources a server role participates in, in recorded order
    pub fn service_groups_of(&self, role: &ServerRole) -> Vec<&ServiceGroup> {
        [ServiceGroupKind::Cluster, ServiceGroupKind::Resource]
            .into_iter()
            .flat_map(|kind| {
                role.refs
                    .get(kind.ref_kind())
                    .filter_map(move |key| self.service_group(kind, key))
            })
            .collect()
    }
}
