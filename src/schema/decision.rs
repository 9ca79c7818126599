use serde::Serialize;

use super::labels::{Battery, Damage, LabelSet, MaterialLabel, SizeClass, Soil, ToyType, UsageRecord};

/// Recommended handling outcome for a triaged toy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    NoRepairNeeded,
    MinorRepairRecommended,
    DisassembleForParts,
    NeedsFurtherReview,
}

/// Outcome of one decision-strategy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub eligible: bool,
    pub reason: String,
    pub disposition: Disposition,
}

impl Verdict {
    #[must_use]
    pub fn new(eligible: bool, reason: impl Into<String>, disposition: Disposition) -> Self {
        Self {
            eligible,
            reason: reason.into(),
            disposition,
        }
    }

    /// Ineligible verdict with the disassemble disposition, the common shape
    /// of every hard disqualifier.
    #[must_use]
    pub fn disqualified(reason: impl Into<String>) -> Self {
        Self::new(false, reason, Disposition::DisassembleForParts)
    }
}

/// Aggregated token usage across the four classifier roles.
///
/// `total` は常に各ロールの `total_tokens` の合計に一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageTotals {
    #[serde(rename = "type agent")]
    pub toy_type: u64,
    #[serde(rename = "material agent")]
    pub material: u64,
    #[serde(rename = "damage agent")]
    pub damage: u64,
    #[serde(rename = "soil agent")]
    pub soil: u64,
    pub total: u64,
}

impl UsageTotals {
    #[must_use]
    pub fn from_records(
        toy_type: UsageRecord,
        material: UsageRecord,
        damage: UsageRecord,
        soil: UsageRecord,
    ) -> Self {
        Self {
            toy_type: toy_type.total_tokens,
            material: material.total_tokens,
            damage: damage.total_tokens,
            soil: soil.total_tokens,
            total: toy_type.total_tokens
                + material.total_tokens
                + damage.total_tokens
                + soil.total_tokens,
        }
    }
}

/// Final caller-facing record for one triage invocation.
///
/// Field names serialize as human-language labels so the record can be shown
/// to donation staff without a translation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    #[serde(rename = "toy type")]
    pub toy_type: ToyType,
    pub battery: Battery,
    pub material: MaterialLabel,
    pub damage: Damage,
    pub soil: Soil,
    #[serde(rename = "observations")]
    pub notes: String,
    pub size: SizeClass,
    #[serde(rename = "donation eligible")]
    pub eligible: bool,
    pub reason: String,
    pub disposition: Disposition,
    #[serde(rename = "token usage")]
    pub usage: UsageTotals,
}

impl DecisionRecord {
    #[must_use]
    pub fn new(labels: &LabelSet, notes: String, verdict: Verdict, usage: UsageTotals) -> Self {
        Self {
            toy_type: labels.toy_type,
            battery: labels.battery,
            material: labels.material.clone(),
            damage: labels.damage,
            soil: labels.soil,
            notes,
            size: labels.size,
            eligible: verdict.eligible,
            reason: verdict.reason,
            disposition: verdict.disposition,
            usage,
        }
    }
}
