use std::fmt;

use serde::Serialize;

/// Closed toy-type vocabulary used by the type classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToyType {
    Figure,
    VehicleToy,
    TransformingRobot,
    BatteryToy,
    NonBatteryToy,
    Doll,
    Blocks,
    Ball,
    Book,
    PlasticPart,
    WoodenToy,
    Walker,
    RideOn,
    #[default]
    Other,
}

impl fmt::Display for ToyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Figure => "figure",
            Self::VehicleToy => "vehicle toy",
            Self::TransformingRobot => "transforming robot",
            Self::BatteryToy => "battery toy",
            Self::NonBatteryToy => "non-battery toy",
            Self::Doll => "doll",
            Self::Blocks => "blocks",
            Self::Ball => "ball",
            Self::Book => "children's book",
            Self::PlasticPart => "plastic part",
            Self::WoodenToy => "wooden toy",
            Self::Walker => "baby walker",
            Self::RideOn => "ride-on",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Battery {
    Battery,
    NonBattery,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeClass {
    Small,
    #[default]
    Medium,
    Large,
    Unknown,
}

/// Single material from the controlled vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialKind {
    Plastic,
    Metal,
    Wood,
    Fabric,
    Silicone,
    Glass,
    Rubber,
}

impl MaterialKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plastic => "plastic",
            Self::Metal => "metal",
            Self::Wood => "wood",
            Self::Fabric => "fabric",
            Self::Silicone => "silicone",
            Self::Glass => "glass",
            Self::Rubber => "rubber",
        }
    }
}

/// Material label: a single material or a comma-joined combination.
///
/// An empty kind list means the material is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterialLabel {
    kinds: Vec<MaterialKind>,
}

impl MaterialLabel {
    #[must_use]
    pub fn new(kinds: Vec<MaterialKind>) -> Self {
        Self { kinds }
    }

    #[must_use]
    pub fn single(kind: MaterialKind) -> Self {
        Self { kinds: vec![kind] }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.kinds.is_empty()
    }

    #[must_use]
    pub fn contains(&self, kind: MaterialKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// True when the label names exactly one material.
    #[must_use]
    pub fn is_single(&self, kind: MaterialKind) -> bool {
        self.kinds.len() == 1 && self.kinds[0] == kind
    }

    /// True when the label names more than one material.
    #[must_use]
    pub fn is_combination(&self) -> bool {
        self.kinds.len() > 1
    }

    #[must_use]
    pub fn kinds(&self) -> &[MaterialKind] {
        &self.kinds
    }
}

impl fmt::Display for MaterialLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kinds.is_empty() {
            return f.write_str("unknown");
        }
        let joined = self
            .kinds
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl Serialize for MaterialLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialDetail {
    Single,
    Mixed,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialConfidence {
    High,
    Medium,
    #[default]
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Damage {
    None,
    Minor,
    Moderate,
    MissingParts,
    Severe,
    #[default]
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingParts {
    None,
    Present,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Soil {
    #[default]
    Clean,
    Light,
    Moderate,
    Dirty,
}

/// Fragment produced by the type classifier.
///
/// `raw_label` keeps the classifier's literal toy-type string so the decision
/// engine can run its keyword predicates (ambiguous purpose, loose parts)
/// without re-touching untrusted text anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeFragment {
    pub toy_type: ToyType,
    pub raw_label: String,
    pub battery: Battery,
    pub size: SizeClass,
}

/// Fragment produced by the material classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterialFragment {
    pub material: MaterialLabel,
    pub detail: MaterialDetail,
    pub confidence: MaterialConfidence,
    pub notes: String,
}

/// Fragment produced by the damage classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DamageFragment {
    pub damage: Damage,
    pub detail: String,
    pub missing_parts: MissingParts,
}

/// Fragment produced by the soiling classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoilFragment {
    pub soil: Soil,
    pub detail: String,
}

/// Merged, read-only view of all four classifier outputs for one item.
///
/// Populated exactly once from the parsed fragments and never mutated after.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSet {
    pub toy_type: ToyType,
    pub raw_type_label: String,
    pub battery: Battery,
    pub size: SizeClass,
    pub material: MaterialLabel,
    pub material_detail: MaterialDetail,
    pub material_confidence: MaterialConfidence,
    pub material_notes: String,
    pub damage: Damage,
    pub damage_detail: String,
    pub missing_parts: MissingParts,
    pub soil: Soil,
    pub soil_detail: String,
}

/// Per-classifier token accounting. All zero when the call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}
