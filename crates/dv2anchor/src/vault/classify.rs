//! Shape classification by naming convention

use std::fmt;

/// Data Vault entity kind of a diagram shape, decided by its name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Hub,
    Link,
    Satellite,
    /// Decoration, notes, or anything else without a known prefix
    Unrecognized,
}

impl ShapeKind {
    /// Classify a shape by the prefix of its name
    pub fn classify(name: &str) -> Self {
        if name.starts_with("h_") {
            ShapeKind::Hub
        } else if name.starts_with("l_") {
            ShapeKind::Link
        } else if name.starts_with("s_") {
            ShapeKind::Satellite
        } else {
            ShapeKind::Unrecognized
        }
    }

    /// Required name prefix, empty for unrecognized shapes
    pub fn prefix(&self) -> &'static str {
        match self {
            ShapeKind::Hub => "h_",
            ShapeKind::Link => "l_",
            ShapeKind::Satellite => "s_",
            ShapeKind::Unrecognized => "",
        }
    }

    /// Check that `name` carries this kind's prefix followed by an identifier
    pub fn accepts(&self, name: &str) -> bool {
        let prefix = self.prefix();
        match name.strip_prefix(prefix) {
            Some(rest) => !prefix.is_empty() && !rest.is_empty(),
            None => false,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Hub => write!(f, "hub"),
            ShapeKind::Link => write!(f, "link"),
            ShapeKind::Satellite => write!(f, "satellite"),
            ShapeKind::Unrecognized => write!(f, "shape"),
        }
    }
}

/// Data Vault 2.0 construct the converter refuses to translate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dv2Feature {
    SameAsLink,
    HierarchicalLink,
    PointInTime,
    Bridge,
    EffectivitySatellite,
    MultiActiveSatellite,
    ReferenceTable,
    /// `sub_seq` style sequence column of a multi-active satellite
    MultiActiveSequence,
    /// `snapshot_dts` style column of a PIT or bridge table
    Snapshot,
}

const SHAPE_PREFIXES: &[(&str, Dv2Feature)] = &[
    ("sal_", Dv2Feature::SameAsLink),
    ("hal_", Dv2Feature::HierarchicalLink),
    ("pit_", Dv2Feature::PointInTime),
    ("bridge_", Dv2Feature::Bridge),
    ("br_", Dv2Feature::Bridge),
    ("esat_", Dv2Feature::EffectivitySatellite),
    ("msat_", Dv2Feature::MultiActiveSatellite),
    ("ref_", Dv2Feature::ReferenceTable),
];

const COLUMN_NAMES: &[(&str, Dv2Feature)] = &[
    ("sub_seq", Dv2Feature::MultiActiveSequence),
    ("sub_sequence", Dv2Feature::MultiActiveSequence),
    ("snapshot_dts", Dv2Feature::Snapshot),
    ("snapshot_date", Dv2Feature::Snapshot),
];

impl Dv2Feature {
    /// Recognize a DV 2.0 shape by its name prefix
    pub fn detect_shape(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        SHAPE_PREFIXES
            .iter()
            .find(|(prefix, _)| lower.starts_with(prefix))
            .map(|(_, feature)| *feature)
    }

    /// Recognize a DV 2.0 column by its name
    pub fn detect_column(name: &str) -> Option<Self> {
        COLUMN_NAMES
            .iter()
            .find(|(column, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, feature)| *feature)
    }
}

impl fmt::Display for Dv2Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Dv2Feature::SameAsLink => "same-as link",
            Dv2Feature::HierarchicalLink => "hierarchical link",
            Dv2Feature::PointInTime => "point-in-time table",
            Dv2Feature::Bridge => "bridge table",
            Dv2Feature::EffectivitySatellite => "effectivity satellite",
            Dv2Feature::MultiActiveSatellite => "multi-active satellite",
            Dv2Feature::ReferenceTable => "reference table",
            Dv2Feature::MultiActiveSequence => "multi-active sequence column",
            Dv2Feature::Snapshot => "snapshot column",
        };
        write!(f, "{}", text)
    }
}
