//! Data Vault structural validation
//!
//! The validator never stops at the first problem: every rule runs over the
//! whole graph and all violations are reported together.

use std::collections::HashSet;
use std::ops::Deref;

use tracing::{debug, info, span, Level};

use super::graph::VaultGraph;
use super::{Dv2Feature, ShapeKind};
use crate::core::{Column, ColumnRole, ValidationError, Violation};

/// A graph that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedVault(VaultGraph);

impl ValidatedVault {
    pub fn graph(&self) -> &VaultGraph {
        &self.0
    }

    pub fn into_inner(self) -> VaultGraph {
        self.0
    }
}

impl Deref for ValidatedVault {
    type Target = VaultGraph;

    fn deref(&self) -> &VaultGraph {
        &self.0
    }
}

/// Checks a [`VaultGraph`] against the Data Vault rules this converter
/// supports
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultValidator;

impl VaultValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `graph`, returning every violation on failure
    pub fn validate(&self, graph: VaultGraph) -> Result<ValidatedVault, ValidationError> {
        let validate_span = span!(Level::INFO, "validate_vault");
        let _enter = validate_span.enter();

        let violations = self.violations(&graph);
        if violations.is_empty() {
            info!("Data Vault graph is valid");
            Ok(ValidatedVault(graph))
        } else {
            info!(violations = violations.len(), "Data Vault graph rejected");
            Err(ValidationError::new(violations))
        }
    }

    /// All violations of `graph`, grouped by rule
    pub fn violations(&self, graph: &VaultGraph) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_prefixes(graph, &mut violations);
        check_business_keys(graph, &mut violations);
        check_satellite_parents(graph, &mut violations);
        check_link_arity(graph, &mut violations);
        check_link_columns(graph, &mut violations);
        check_foreign_keys(graph, &mut violations);
        check_dv2_features(graph, &mut violations);
        for violation in &violations {
            debug!(%violation, "Violation");
        }
        violations
    }
}

fn check_prefixes(graph: &VaultGraph, out: &mut Vec<Violation>) {
    let names = graph
        .hubs()
        .map(|(_, h)| (ShapeKind::Hub, &h.name))
        .chain(graph.links().map(|(_, l)| (ShapeKind::Link, &l.name)))
        .chain(graph.satellites().map(|(_, s)| (ShapeKind::Satellite, &s.name)));
    for (kind, name) in names {
        if !kind.accepts(name) {
            out.push(Violation::PrefixViolation {
                kind,
                name: name.clone(),
                expected: kind.prefix(),
            });
        }
    }
}

fn check_business_keys(graph: &VaultGraph, out: &mut Vec<Violation>) {
    for (_, hub) in graph.hubs() {
        if hub.business_keys().next().is_none() {
            out.push(Violation::MissingBusinessKey {
                hub: hub.name.clone(),
            });
        }
    }
}

fn check_satellite_parents(graph: &VaultGraph, out: &mut Vec<Violation>) {
    for (_, satellite) in graph.satellites() {
        if satellite.parents.len() != 1 {
            out.push(Violation::SatelliteParent {
                satellite: satellite.name.clone(),
                parents: satellite.parents.len(),
            });
        }
    }
}

fn check_link_arity(graph: &VaultGraph, out: &mut Vec<Violation>) {
    for (_, link) in graph.links() {
        let distinct_hubs: HashSet<_> = link.references.iter().map(|r| r.hub).collect();
        let roles: Vec<Option<&str>> = link.references.iter().map(|r| r.role.as_deref()).collect();
        let distinct_roles: HashSet<_> = roles.iter().collect();

        let valid = match distinct_hubs.len() {
            0 | 1 => {
                // One hub twice is fine when every reference has its own role
                link.references.len() >= 2
                    && roles.iter().all(Option::is_some)
                    && distinct_roles.len() == roles.len()
            }
            _ => true,
        };
        if !valid {
            out.push(Violation::LinkArity {
                link: link.name.clone(),
                references: link.references.len(),
            });
        }
    }
}

fn check_link_columns(graph: &VaultGraph, out: &mut Vec<Violation>) {
    for (id, link) in graph.links() {
        let inherited = graph.inherited_keys(id);
        for column in &link.columns {
            if column.role.is_system() || column.role == ColumnRole::ForeignKey {
                continue;
            }
            if !inherited.contains(&column.name) {
                out.push(Violation::TransactionalLinkUnsupported {
                    link: link.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }
}

fn check_foreign_keys(graph: &VaultGraph, out: &mut Vec<Violation>) {
    let mut report = |entity: &str, column: &Column| {
        out.push(Violation::ForeignKeyUnsupported {
            entity: entity.to_string(),
            reference: format!("column {}", column.name),
        });
    };

    for (_, hub) in graph.hubs() {
        for column in hub.columns.iter().filter(|c| c.role == ColumnRole::ForeignKey) {
            report(&hub.name, column);
        }
    }
    for (id, link) in graph.links() {
        let inherited = graph.inherited_keys(id);
        for column in link.columns.iter().filter(|c| is_foreign_outside(c, &inherited)) {
            report(&link.name, column);
        }
    }
    for (_, satellite) in graph.satellites() {
        for column in satellite
            .columns
            .iter()
            .filter(|c| c.role == ColumnRole::ForeignKey)
        {
            report(&satellite.name, column);
        }
    }

    for connection in graph.stray_connections() {
        out.push(Violation::ForeignKeyUnsupported {
            entity: connection.source.clone(),
            reference: format!("connector {} to {}", connection.edge_id, connection.target),
        });
    }
}

fn is_foreign_outside(column: &Column, inherited: &[String]) -> bool {
    column.role == ColumnRole::ForeignKey && !inherited.contains(&column.name)
}

fn check_dv2_features(graph: &VaultGraph, out: &mut Vec<Violation>) {
    for construct in graph.dv2_constructs() {
        out.push(Violation::Dv2FeatureUnsupported {
            name: construct.name.clone(),
            feature: construct.feature,
        });
    }

    let tables = graph
        .hubs()
        .map(|(_, h)| (&h.name, &h.columns))
        .chain(graph.links().map(|(_, l)| (&l.name, &l.columns)))
        .chain(graph.satellites().map(|(_, s)| (&s.name, &s.columns)));
    for (name, columns) in tables {
        for column in columns {
            if let Some(feature) = Dv2Feature::detect_column(&column.name) {
                out.push(Violation::Dv2FeatureUnsupported {
                    name: format!("{}.{}", name, column.name),
                    feature,
                });
            }
        }
    }
}
