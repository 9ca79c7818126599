//! Typed data model shared across the triage pipeline.
//!
//! The parsers in `pipeline::parse` are the only place label fragments are
//! constructed from untrusted classifier text; everything downstream works on
//! these strict types. Every field has a total default, so a malformed response can never
//! leave a hole in the merged [`LabelSet`].

pub mod decision;
pub mod labels;

pub use decision::{DecisionRecord, Disposition, UsageTotals, Verdict};
pub use labels::{
    Battery, Damage, DamageFragment, LabelSet, MaterialConfidence, MaterialDetail,
    MaterialFragment, MaterialKind, MaterialLabel, MissingParts, SizeClass, Soil, SoilFragment,
    ToyType, TypeFragment, UsageRecord,
};
