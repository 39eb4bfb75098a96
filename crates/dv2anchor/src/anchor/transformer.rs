//! Data Vault to Anchor model transformation
//!
//! Hubs become anchors, links become ties, and every descriptive satellite
//! column becomes an attribute of the anchor or tie the satellite describes.
//! The transformation is total over validated graphs.

use std::collections::HashMap;

use tracing::{debug, info, span, trace, Level};

use super::graph::{
    Anchor, AnchorGraph, AnchorId, Attribute, Historization, Owner, Tie, TieEnd, TieId,
};
use crate::core::{Column, ColumnRole};
use crate::vault::{EntityRef, HubId, LinkId, ValidatedVault, VaultGraph};

/// Builds an [`AnchorGraph`] from a validated Data Vault graph
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorTransformer;

impl AnchorTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, vault: &ValidatedVault) -> AnchorGraph {
        let transform_span = span!(Level::INFO, "transform");
        let _enter = transform_span.enter();

        let vault = vault.graph();
        let mut graph = AnchorGraph::new();

        let mut anchors: HashMap<HubId, AnchorId> = HashMap::new();
        for (hub_id, hub) in vault.hubs() {
            let anchor = Anchor {
                name: strip(&hub.name, "h_"),
                key_columns: hub.business_keys().cloned().collect(),
                system_columns: hub.system_columns().cloned().collect(),
                source: hub.name.clone(),
            };
            debug!(hub = %hub.name, anchor = %anchor.name, "Hub to anchor");
            anchors.insert(hub_id, graph.add_anchor(anchor));
        }

        let mut ties: HashMap<LinkId, TieId> = HashMap::new();
        for (link_id, link) in vault.links() {
            let tie = self.tie(vault, link_id, &anchors);
            debug!(link = %link.name, tie = %tie.name, ends = tie.ends.len(), "Link to tie");
            ties.insert(link_id, graph.add_tie(tie));
        }

        for (_, satellite) in vault.satellites() {
            let owner = match satellite.parents.as_slice() {
                [EntityRef::Hub(hub)] => Owner::Anchor(anchors[hub]),
                [EntityRef::Link(link)] => Owner::Tie(ties[link]),
                parents => unreachable!(
                    "validated satellite '{}' has {} parents",
                    satellite.name,
                    parents.len()
                ),
            };
            let historization = if satellite.is_historized() {
                Historization::Historized
            } else {
                Historization::Static
            };
            let stem = strip(&satellite.name, "s_");
            let key_columns: Vec<Column> = satellite
                .columns
                .iter()
                .filter(|c| c.role == ColumnRole::BusinessKey)
                .cloned()
                .collect();
            let system_columns: Vec<Column> = satellite.system_columns().cloned().collect();

            for column in satellite.descriptive_columns() {
                let attribute = Attribute {
                    name: format!("{}_{}", stem, column.name),
                    owner,
                    column: column.clone(),
                    historization,
                    key_columns: key_columns.clone(),
                    system_columns: system_columns.clone(),
                    source: satellite.name.clone(),
                };
                trace!(
                    satellite = %satellite.name,
                    attribute = %attribute.name,
                    historization = ?historization,
                    "Column to attribute"
                );
                graph.add_attribute(attribute);
            }
        }

        info!(
            anchors = graph.anchor_count(),
            attributes = graph.attribute_count(),
            ties = graph.tie_count(),
            "Transformed to anchor model"
        );
        graph
    }

    fn tie(&self, vault: &VaultGraph, id: LinkId, anchors: &HashMap<HubId, AnchorId>) -> Tie {
        let link = vault.link(id);
        let key_columns: Vec<Column> = link
            .columns
            .iter()
            .filter(|c| c.role == ColumnRole::ForeignKey)
            .cloned()
            .collect();

        let mut taken = vec![false; key_columns.len()];
        let mut ends = Vec::new();
        for (position, reference) in link.references.iter().enumerate() {
            let role = reference
                .role
                .clone()
                .unwrap_or_else(|| format!("role-{}", position + 1));

            // Prefer the role-qualified column, then the plain hub key
            let mut candidates = Vec::new();
            for hub_key in vault.hub(reference.hub).business_keys() {
                if let Some(label) = &reference.role {
                    candidates.push(format!("{}_{}", label, hub_key.name));
                }
                candidates.push(hub_key.name.clone());
            }
            let key = candidates.iter().find_map(|candidate| {
                (0..key_columns.len())
                    .find(|&idx| !taken[idx] && key_columns[idx].name == *candidate)
            });
            if let Some(idx) = key {
                taken[idx] = true;
            }

            ends.push(TieEnd {
                anchor: anchors[&reference.hub],
                role,
                key,
            });
        }

        Tie {
            name: strip(&link.name, "l_"),
            ends,
            system_columns: link.system_columns().cloned().collect(),
            key_columns,
            source: link.name.clone(),
        }
    }
}

/// Drop the entity prefix from a validated name
fn strip(name: &str, prefix: &str) -> String {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.to_string(),
        None => unreachable!("validated name '{}' lacks prefix '{}'", name, prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SystemKind;
    use crate::vault::{Hub, HubReference, Link, Satellite, VaultValidator};

    fn end_key(tie: &Tie, end: usize) -> Option<&str> {
        tie.end_key(&tie.ends[end]).map(|c| c.name.as_str())
    }

    fn vault() -> ValidatedVault {
        let mut graph = VaultGraph::new();
        let customer = graph.add_hub(
            Hub::new("h_customer")
                .with_column(Column::business_key("customer_id"))
                .with_column(Column::system("load_dttm", SystemKind::LoadTimestamp)),
        );
        let order = graph.add_hub(Hub::new("h_order").with_column(Column::business_key("order_id")));
        let link = graph.add_link(
            Link::new("l_customer_order")
                .with_reference(HubReference::new(customer))
                .with_reference(HubReference::new(order).with_role("placed"))
                .with_column(Column::foreign_key("customer_id"))
                .with_column(Column::foreign_key("placed_order_id")),
        );
        graph.add_satellite(
            Satellite::new("s_customer_details")
                .with_parent(EntityRef::Hub(customer))
                .with_column(Column::business_key("customer_id"))
                .with_column(Column::descriptive("name"))
                .with_column(Column::descriptive("email"))
                .with_column(Column::system("load_dttm", SystemKind::LoadTimestamp)),
        );
        graph.add_satellite(
            Satellite::new("s_order_status")
                .with_parent(EntityRef::Link(link))
                .with_column(Column::descriptive("status")),
        );
        VaultValidator::new().validate(graph).unwrap()
    }

    #[test]
    fn test_one_anchor_per_hub() {
        let graph = AnchorTransformer::new().transform(&vault());
        assert_eq!(graph.anchor_count(), 2);
        let customer = graph.anchor(graph.find_anchor("customer").unwrap());
        assert_eq!(customer.source, "h_customer");
        assert_eq!(customer.key_columns.len(), 1);
        assert_eq!(customer.system_columns.len(), 1);
    }

    #[test]
    fn test_attributes_per_descriptive_column() {
        let graph = AnchorTransformer::new().transform(&vault());
        assert_eq!(graph.attribute_count(), 3);

        let name = graph.attribute(graph.find_attribute("customer_details_name").unwrap());
        assert_eq!(name.owner, Owner::Anchor(AnchorId(0)));
        assert_eq!(name.historization, Historization::Historized);
        assert_eq!(name.key_columns[0].name, "customer_id");

        let status = graph.attribute(graph.find_attribute("order_status_status").unwrap());
        assert_eq!(status.owner, Owner::Tie(TieId(0)));
        assert_eq!(status.historization, Historization::Static);
    }

    #[test]
    fn test_tie_ends_and_roles() {
        let graph = AnchorTransformer::new().transform(&vault());
        let tie = graph.tie(graph.find_tie("customer_order").unwrap());
        assert_eq!(tie.ends.len(), 2);
        assert_eq!(tie.ends[0].role, "role-1");
        assert_eq!(end_key(tie, 0), Some("customer_id"));
        assert_eq!(tie.ends[1].anchor, AnchorId(1));
        assert_eq!(tie.ends[1].role, "placed");
        assert_eq!(end_key(tie, 1), Some("placed_order_id"));
        assert_eq!(tie.key_columns.len(), 2);
    }

    #[test]
    fn test_same_hub_twice_gets_distinct_keys() {
        let mut graph = VaultGraph::new();
        let person = graph.add_hub(Hub::new("h_person").with_column(Column::business_key("person_id")));
        graph.add_link(
            Link::new("l_referral")
                .with_reference(HubReference::new(person).with_role("referrer"))
                .with_reference(HubReference::new(person).with_role("referee"))
                .with_column(Column::foreign_key("referrer_person_id"))
                .with_column(Column::foreign_key("referee_person_id")),
        );
        let validated = VaultValidator::new().validate(graph).unwrap();
        let anchors = AnchorTransformer::new().transform(&validated);
        let tie = anchors.tie(TieId(0));
        assert_eq!(end_key(tie, 0), Some("referrer_person_id"));
        assert_eq!(end_key(tie, 1), Some("referee_person_id"));
        assert_eq!(anchors.ties_of(AnchorId(0)), vec![TieId(0)]);
    }

    #[test]
    fn test_repeated_plain_key_serves_each_end() {
        let mut graph = VaultGraph::new();
        let person = graph.add_hub(Hub::new("h_person").with_column(Column::business_key("person_id")));
        graph.add_link(
            Link::new("l_referral")
                .with_reference(HubReference::new(person).with_role("referrer"))
                .with_reference(HubReference::new(person).with_role("referee"))
                .with_column(Column::foreign_key("person_id"))
                .with_column(Column::foreign_key("person_id")),
        );
        let validated = VaultValidator::new().validate(graph).unwrap();
        let anchors = AnchorTransformer::new().transform(&validated);
        let tie = anchors.tie(TieId(0));
        assert_eq!(tie.ends[0].key, Some(0));
        assert_eq!(tie.ends[1].key, Some(1));
        assert_eq!(end_key(tie, 1), Some("person_id"));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let vault = vault();
        let first = AnchorTransformer::new().transform(&vault);
        let second = AnchorTransformer::new().transform(&vault);
        assert_eq!(first, second);
    }
}
