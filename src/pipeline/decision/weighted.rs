//! Weighted-scoring strategy, the richer lineage variant used for the
//! multi-angle pipeline.

use crate::schema::{Battery, Damage, Disposition, LabelSet, MaterialKind, Soil, Verdict};

use super::{DecisionStrategy, predicates};

/// Score at or above which an item is accepted as-is.
pub(crate) const ACCEPT_THRESHOLD: i32 = 75;
/// Score at or above which repair is worth recommending.
pub(crate) const REPAIR_THRESHOLD: i32 = 55;
/// Score at or above which disassembly is still phrased mildly.
pub(crate) const DISASSEMBLE_THRESHOLD: i32 = 35;

/// Hard disqualifiers short-circuit first; otherwise four capped sub-scores
/// (material 40, parts 40, damage 20, soiling 10) are summed, corrective
/// penalties applied, and the result thresholded.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScoreStrategy;

impl WeightedScoreStrategy {
    /// Pure score over the merged labels, clamped to 0..=100.
    #[must_use]
    pub(crate) fn score(labels: &LabelSet) -> i32 {
        let raw = material_sub_score(labels)
            + parts_sub_score(labels)
            + damage_sub_score(labels)
            + soil_sub_score(labels)
            - penalties(labels);
        raw.clamp(0, 100)
    }
}

impl DecisionStrategy for WeightedScoreStrategy {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn decide(&self, labels: &LabelSet) -> Verdict {
        if let Some(verdict) = hard_disqualifier(labels) {
            return verdict;
        }
        verdict_for_score(Self::score(labels), labels)
    }
}

/// Strategy A's disqualifiers extended with the mixed-material hygiene and
/// recyclability rules. Plastic+metal mixtures deliberately pass through.
fn hard_disqualifier(labels: &LabelSet) -> Option<Verdict> {
    if predicates::is_wood(labels) {
        return Some(Verdict::disqualified(
            "wooden material cannot be donated for safety reasons",
        ));
    }
    if predicates::bears_fabric(labels) {
        return Some(Verdict::disqualified(
            "fabric-bearing material cannot be donated for hygiene reasons",
        ));
    }
    if predicates::bears_silicone_or_rubber(labels) {
        return Some(Verdict::disqualified(
            "silicone or rubber material cannot be recycled",
        ));
    }
    if predicates::severe_damage(labels) {
        return Some(Verdict::disqualified(
            "severe damage rules out donating as a finished product",
        ));
    }
    if predicates::dirty_soil(labels) {
        return Some(Verdict::disqualified(
            "soiled condition cannot be donated for hygiene reasons",
        ));
    }
    if predicates::disqualified_category(labels.toy_type) {
        return Some(Verdict::disqualified(format!(
            "{} is a non-donatable category",
            labels.toy_type
        )));
    }
    None
}

/// Material sub-score, max 40.
fn material_sub_score(labels: &LabelSet) -> i32 {
    let material = &labels.material;
    if material.is_single(MaterialKind::Plastic) {
        return 40;
    }
    if material.is_single(MaterialKind::Metal) {
        return 35;
    }
    if predicates::is_plastic_metal_mix(labels) {
        return 35;
    }
    if material.contains(MaterialKind::Plastic) && material.contains(MaterialKind::Fabric) {
        return 0;
    }
    if material.contains(MaterialKind::Plastic) && material.contains(MaterialKind::Silicone) {
        return 25;
    }
    if material.is_combination() {
        return 20;
    }
    // Unknown baseline, and any remaining single material.
    20
}

/// Parts-completeness sub-score, max 40.
fn parts_sub_score(labels: &LabelSet) -> i32 {
    use crate::schema::MissingParts;

    if predicates::parts_missing(labels) {
        return 0;
    }
    if labels.missing_parts == MissingParts::Unknown || labels.damage == Damage::Indeterminate {
        return 5;
    }
    if labels.missing_parts == MissingParts::None && labels.damage == Damage::None {
        return 40;
    }
    if labels.missing_parts == MissingParts::None && predicates::minor_damage(labels) {
        return 25;
    }
    15
}

/// Damage sub-score, max 20.
fn damage_sub_score(labels: &LabelSet) -> i32 {
    if labels.damage == Damage::None {
        return 20;
    }
    if matches!(labels.damage, Damage::Minor | Damage::Moderate) || predicates::minor_damage(labels)
    {
        return 15;
    }
    if predicates::damage_mentions_breakage(labels) {
        return 5;
    }
    10
}

/// Soiling sub-score, max 10.
fn soil_sub_score(labels: &LabelSet) -> i32 {
    match labels.soil {
        Soil::Clean => 10,
        Soil::Moderate => 5,
        Soil::Light | Soil::Dirty => 0,
    }
}

/// Corrective penalties for labels the sub-scores cannot see.
fn penalties(labels: &LabelSet) -> i32 {
    let mut penalty = 0;
    if predicates::ambiguous_purpose(labels) {
        penalty += 30;
    }
    if predicates::non_finished_product(labels) {
        penalty += 25;
    }
    if predicates::battery_toy_with_part_issues(labels) {
        penalty += 20;
    }
    penalty
}

/// Threshold the final score. Boundary inclusivity: 75 accepts, 55 and 35
/// land in the milder bucket of each pair.
fn verdict_for_score(score: i32, labels: &LabelSet) -> Verdict {
    if score >= ACCEPT_THRESHOLD {
        let battery_class = match labels.battery {
            Battery::Battery => "battery",
            Battery::NonBattery | Battery::Unknown => "non-battery",
        };
        return Verdict::new(
            true,
            format!(
                "{} {battery_class} toy in good condition",
                labels.material
            ),
            Disposition::NoRepairNeeded,
        );
    }
    if score >= REPAIR_THRESHOLD {
        return Verdict::new(
            false,
            "minor issues require repair before donation",
            Disposition::MinorRepairRecommended,
        );
    }
    if score >= DISASSEMBLE_THRESHOLD {
        return Verdict::new(
            false,
            "multiple issues make donation difficult",
            Disposition::DisassembleForParts,
        );
    }
    Verdict::new(
        false,
        "serious issues prevent donation",
        Disposition::DisassembleForParts,
    )
}
