//! Data Vault graph
//!
//! Arena storage for hubs, links and satellites. Entities are addressed by
//! index ids that stay valid for the lifetime of the graph.

use crate::core::{Column, ColumnRole, SystemKind};

use super::Dv2Feature;

/// Index of a hub in its [`VaultGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HubId(pub usize);

/// Index of a link in its [`VaultGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

/// Index of a satellite in its [`VaultGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SatelliteId(pub usize);

/// Entity a satellite can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Hub(HubId),
    Link(LinkId),
}

/// A core business concept with its business key
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Hub {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn business_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::BusinessKey)
    }

    pub fn system_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.role.is_system())
    }
}

/// One end of a link
#[derive(Debug, Clone, PartialEq)]
pub struct HubReference {
    pub hub: HubId,
    /// Connector label, if the connector had one
    pub role: Option<String>,
    /// Connector the reference was read from
    pub edge_id: Option<String>,
}

impl HubReference {
    pub fn new(hub: HubId) -> Self {
        Self {
            hub,
            role: None,
            edge_id: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }
}

/// A relationship between hubs
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    /// Referenced hubs, in connector order
    pub references: Vec<HubReference>,
    pub columns: Vec<Column>,
}

impl Link {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            references: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: HubReference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn system_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.role.is_system())
    }
}

/// Descriptive context of a hub or link
#[derive(Debug, Clone, PartialEq)]
pub struct Satellite {
    pub name: String,
    /// Parents as connected in the diagram; exactly one once validated
    pub parents: Vec<EntityRef>,
    pub columns: Vec<Column>,
}

impl Satellite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: EntityRef) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn descriptive_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::Descriptive)
    }

    pub fn system_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.role.is_system())
    }

    /// A satellite with a load timestamp keeps history
    pub fn is_historized(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.role == ColumnRole::System(SystemKind::LoadTimestamp))
    }
}

/// A connector between two classified shapes that is not Data Vault structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrayConnection {
    pub edge_id: String,
    pub source: String,
    pub target: String,
}

/// A shape recognized as a Data Vault 2.0 construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dv2Construct {
    pub name: String,
    pub feature: Dv2Feature,
}

/// Data Vault model read from one diagram page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultGraph {
    hubs: Vec<Hub>,
    links: Vec<Link>,
    satellites: Vec<Satellite>,
    stray_connections: Vec<StrayConnection>,
    dv2_constructs: Vec<Dv2Construct>,
}

impl VaultGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hub(&mut self, hub: Hub) -> HubId {
        self.hubs.push(hub);
        HubId(self.hubs.len() - 1)
    }

    pub fn add_link(&mut self, link: Link) -> LinkId {
        self.links.push(link);
        LinkId(self.links.len() - 1)
    }

    pub fn add_satellite(&mut self, satellite: Satellite) -> SatelliteId {
        self.satellites.push(satellite);
        SatelliteId(self.satellites.len() - 1)
    }

    pub fn add_stray_connection(&mut self, connection: StrayConnection) {
        self.stray_connections.push(connection);
    }

    pub fn add_dv2_construct(&mut self, construct: Dv2Construct) {
        self.dv2_constructs.push(construct);
    }

    pub fn hub(&self, id: HubId) -> &Hub {
        &self.hubs[id.0]
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn satellite(&self, id: SatelliteId) -> &Satellite {
        &self.satellites[id.0]
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.0]
    }

    pub fn satellite_mut(&mut self, id: SatelliteId) -> &mut Satellite {
        &mut self.satellites[id.0]
    }

    pub fn hubs(&self) -> impl Iterator<Item = (HubId, &Hub)> {
        self.hubs.iter().enumerate().map(|(i, h)| (HubId(i), h))
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter().enumerate().map(|(i, l)| (LinkId(i), l))
    }

    pub fn satellites(&self) -> impl Iterator<Item = (SatelliteId, &Satellite)> {
        self.satellites
            .iter()
            .enumerate()
            .map(|(i, s)| (SatelliteId(i), s))
    }

    pub fn stray_connections(&self) -> &[StrayConnection] {
        &self.stray_connections
    }

    pub fn dv2_constructs(&self) -> &[Dv2Construct] {
        &self.dv2_constructs
    }

    pub fn hub_count(&self) -> usize {
        self.hubs.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn satellite_count(&self) -> usize {
        self.satellites.len()
    }

    pub fn find_hub(&self, name: &str) -> Option<HubId> {
        self.hubs.iter().position(|h| h.name == name).map(HubId)
    }

    pub fn find_link(&self, name: &str) -> Option<LinkId> {
        self.links.iter().position(|l| l.name == name).map(LinkId)
    }

    pub fn entity_name(&self, entity: EntityRef) -> &str {
        match entity {
            EntityRef::Hub(id) => &self.hub(id).name,
            EntityRef::Link(id) => &self.link(id).name,
        }
    }

    /// Satellites whose parents include `entity`, in insertion order
    pub fn satellites_of(&self, entity: EntityRef) -> Vec<SatelliteId> {
        self.satellites()
            .filter(|(_, s)| s.parents.contains(&entity))
            .map(|(id, _)| id)
            .collect()
    }

    /// Column names a link may carry as hub keys
    ///
    /// For every reference this is each business key of the hub, both plain
    /// (`customer_id`) and qualified by the reference's role
    /// (`buyer_customer_id`).
    pub fn inherited_keys(&self, id: LinkId) -> Vec<String> {
        let mut keys = Vec::new();
        for reference in &self.link(id).references {
            for key in self.hub(reference.hub).business_keys() {
                if !keys.contains(&key.name) {
                    keys.push(key.name.clone());
                }
                if let Some(role) = &reference.role {
                    let qualified = format!("{}_{}", role, key.name);
                    if !keys.contains(&qualified) {
                        keys.push(qualified);
                    }
                }
            }
        }
        keys
    }

    /// Key column names of a satellite's parent
    pub fn parent_keys(&self, entity: EntityRef) -> Vec<String> {
        match entity {
            EntityRef::Hub(id) => self
                .hub(id)
                .business_keys()
                .map(|c| c.name.clone())
                .collect(),
            EntityRef::Link(id) => self.inherited_keys(id),
        }
    }
}
