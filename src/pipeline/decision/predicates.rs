//! Named disqualifier and keyword predicates shared by both strategies.
//!
//! Field-matching policy: every predicate consults the typed enum field
//! first, then the matching free-text detail field through the keyword sets
//! below — the same order for damage (`damage`, then `damage_detail`) and
//! soiling (`soil`, then `soil_detail`). Keyword checks never touch any
//! other field.

use crate::schema::{Battery, Damage, LabelSet, MaterialKind, MissingParts, Soil, ToyType};

/// Keywords marking severe breakage in free-text damage detail.
const SEVERE_KEYWORDS: [&str; 2] = ["심각", "severe"];

/// Keywords marking explicit breakage in free-text damage detail.
const BREAKAGE_KEYWORDS: [&str; 3] = ["파손", "부서", "broken"];

/// Keywords marking minor damage in free-text damage detail.
const MINOR_KEYWORDS: [&str; 3] = ["미세", "경미", "minor"];

/// Keywords marking missing or partial parts in free-text damage detail.
const MISSING_PART_KEYWORDS: [&str; 3] = ["부품", "일부", "missing"];

/// Keywords marking heavy soiling in free-text soil detail.
const DIRTY_KEYWORDS: [&str; 3] = ["더러움", "재활용 불가", "dirty"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Wooden toys are disqualified outright for safety.
#[must_use]
pub(crate) fn is_wood(labels: &LabelSet) -> bool {
    labels.material.is_single(MaterialKind::Wood)
}

/// Fabric anywhere in the material, single or mixed, is a hygiene
/// disqualifier.
#[must_use]
pub(crate) fn bears_fabric(labels: &LabelSet) -> bool {
    labels.material.contains(MaterialKind::Fabric)
}

/// Silicone or rubber anywhere in the material cannot be recycled.
#[must_use]
pub(crate) fn bears_silicone_or_rubber(labels: &LabelSet) -> bool {
    labels.material.contains(MaterialKind::Silicone)
        || labels.material.contains(MaterialKind::Rubber)
}

/// Plastic+metal mixtures are explicitly allowed; metal hardware does not
/// hurt recyclability.
#[must_use]
pub(crate) fn is_plastic_metal_mix(labels: &LabelSet) -> bool {
    labels.material.contains(MaterialKind::Plastic)
        && labels.material.contains(MaterialKind::Metal)
}

#[must_use]
pub(crate) fn severe_damage(labels: &LabelSet) -> bool {
    labels.damage == Damage::Severe || contains_any(&labels.damage_detail, &SEVERE_KEYWORDS)
}

#[must_use]
pub(crate) fn minor_damage(labels: &LabelSet) -> bool {
    labels.damage == Damage::Minor || contains_any(&labels.damage_detail, &MINOR_KEYWORDS)
}

/// Explicit breakage language beyond the graded enum, used for the lowest
/// damage sub-score bucket.
#[must_use]
pub(crate) fn damage_mentions_breakage(labels: &LabelSet) -> bool {
    contains_any(&labels.damage_detail, &BREAKAGE_KEYWORDS)
}

/// Missing or partial parts, from the typed field or the damage detail text.
#[must_use]
pub(crate) fn parts_missing(labels: &LabelSet) -> bool {
    labels.missing_parts == MissingParts::Present
        || labels.damage == Damage::MissingParts
        || contains_any(&labels.damage_detail, &MISSING_PART_KEYWORDS)
}

#[must_use]
pub(crate) fn dirty_soil(labels: &LabelSet) -> bool {
    labels.soil == Soil::Dirty || contains_any(&labels.soil_detail, &DIRTY_KEYWORDS)
}

/// Categories that are never accepted regardless of condition.
#[must_use]
pub(crate) fn disqualified_category(toy_type: ToyType) -> bool {
    matches!(
        toy_type,
        ToyType::Doll | ToyType::Book | ToyType::Walker | ToyType::RideOn
    )
}

/// The classifier labeled the item with an unclear purpose.
#[must_use]
pub(crate) fn ambiguous_purpose(labels: &LabelSet) -> bool {
    labels.raw_type_label.contains("불분명") || labels.raw_type_label.contains("unclear")
}

/// The item is a loose part rather than a finished product.
#[must_use]
pub(crate) fn non_finished_product(labels: &LabelSet) -> bool {
    labels.toy_type == ToyType::PlasticPart || labels.raw_type_label.contains("부품")
}

/// Battery toys with part problems lose electronics reliability.
#[must_use]
pub(crate) fn battery_toy_with_part_issues(labels: &LabelSet) -> bool {
    labels.battery == Battery::Battery && parts_missing(labels)
}
