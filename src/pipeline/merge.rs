//! Fragment merge and observation-note generation.

use crate::schema::{
    Battery, Damage, DamageFragment, LabelSet, MaterialDetail, MaterialFragment, MaterialKind,
    MissingParts, Soil, SoilFragment, ToyType, TypeFragment,
};

/// Assemble the merged label view. Each field comes from exactly one
/// classifier's fragment; nothing is recomputed or overwritten afterwards.
#[must_use]
pub fn merge_fragments(
    toy_type: TypeFragment,
    material: MaterialFragment,
    damage: DamageFragment,
    soil: SoilFragment,
) -> LabelSet {
    LabelSet {
        toy_type: toy_type.toy_type,
        raw_type_label: toy_type.raw_label,
        battery: toy_type.battery,
        size: toy_type.size,
        material: material.material,
        material_detail: material.detail,
        material_confidence: material.confidence,
        material_notes: material.notes,
        damage: damage.damage,
        damage_detail: damage.detail,
        missing_parts: damage.missing_parts,
        soil: soil.soil,
        soil_detail: soil.detail,
    }
}

/// Build the human-readable observation string.
///
/// Independent rule fragments fire off toy type, battery, material, damage,
/// and soiling; matching fragments are joined with " | " in that fixed order.
/// When nothing fires a generic fallback sentence is returned. Material-agent
/// free-text notes are appended when they add something new.
#[must_use]
pub fn observation_notes(labels: &LabelSet) -> String {
    let mut notes: Vec<&str> = Vec::new();

    match labels.toy_type {
        ToyType::Figure => notes.push("figures need close inspection for fine breakage"),
        ToyType::VehicleToy => notes.push("check wheels and moving parts on vehicle toys"),
        ToyType::TransformingRobot => notes.push("check joint wear on transforming robots"),
        ToyType::Blocks => notes.push("check connector wear on building blocks"),
        ToyType::Ball => notes.push("check surface and air retention on balls"),
        _ => {}
    }

    match labels.battery {
        Battery::Battery => notes.push("battery toys need an electronics check"),
        Battery::NonBattery => notes.push("verify mechanical action on non-battery toys"),
        Battery::Unknown => {}
    }

    if labels.material.is_single(MaterialKind::Plastic) {
        notes.push("inspect plastic for cracks and warping");
    } else if labels.material.is_single(MaterialKind::Metal) {
        notes.push("inspect metal for rust and deformation");
    } else if labels.material.is_single(MaterialKind::Wood) {
        notes.push("inspect wood for splits and rot");
    } else if labels.material.is_combination() || labels.material_detail == MaterialDetail::Mixed {
        notes.push("mixed materials need a per-material condition check");
    }

    if labels.damage == Damage::None && labels.missing_parts == MissingParts::None {
        notes.push("no damage, parts complete");
    } else if labels.missing_parts == MissingParts::Present {
        notes.push("missing parts, donate only after replacement");
    } else if labels.missing_parts == MissingParts::Unknown {
        notes.push("parts status unclear, needs a second look");
    } else if labels.damage == Damage::Minor {
        notes.push("minor damage, donatable after repair");
    } else if labels.damage == Damage::Severe {
        notes.push("severe damage, extract parts for upcycling");
    }

    match labels.soil {
        Soil::Clean => notes.push("no soiling"),
        Soil::Light | Soil::Moderate => notes.push("light wear, donatable after cleaning"),
        Soil::Dirty => notes.push("heavy soiling, hygiene concern"),
    }

    let mut joined = if notes.is_empty() {
        "no notable observations".to_string()
    } else {
        notes.join(" | ")
    };

    if !labels.material_notes.is_empty() && !joined.contains(labels.material_notes.as_str()) {
        joined = format!("{joined} | material analysis: {}", labels.material_notes);
    }

    joined
}
