//! Hard-rule short-circuit strategy, the simpler lineage variant.

use crate::schema::{Battery, Damage, Disposition, LabelSet, MaterialKind, Soil, Verdict};

use super::{DecisionStrategy, predicates};

/// Evaluates disqualifiers in fixed order and returns on the first match;
/// a single affirmative condition accepts, everything else falls through to
/// "needs further review".
#[derive(Debug, Clone, Copy, Default)]
pub struct HardRuleStrategy;

impl DecisionStrategy for HardRuleStrategy {
    fn name(&self) -> &'static str {
        "hard-rule"
    }

    fn decide(&self, labels: &LabelSet) -> Verdict {
        if predicates::is_wood(labels) {
            return Verdict::disqualified("wooden material cannot be donated for safety reasons");
        }
        if predicates::bears_fabric(labels) {
            return Verdict::disqualified(
                "cloth or fabric material cannot be donated for hygiene reasons",
            );
        }
        if predicates::severe_damage(labels) {
            return Verdict::disqualified("severe damage rules out donating as a finished product");
        }
        if predicates::dirty_soil(labels) {
            return Verdict::disqualified("soiled condition cannot be donated for hygiene reasons");
        }
        if predicates::disqualified_category(labels.toy_type) {
            return Verdict::disqualified(format!(
                "{} is a non-donatable category",
                labels.toy_type
            ));
        }

        if labels.material.is_single(MaterialKind::Plastic)
            && labels.damage == Damage::None
            && labels.soil == Soil::Clean
        {
            let battery_class = match labels.battery {
                Battery::Battery => "battery",
                Battery::NonBattery | Battery::Unknown => "non-battery",
            };
            return Verdict::new(
                true,
                format!("plastic {battery_class} toy in good condition"),
                Disposition::NoRepairNeeded,
            );
        }

        if predicates::minor_damage(labels) {
            return Verdict::new(
                false,
                "minor damage requires repair first",
                Disposition::MinorRepairRecommended,
            );
        }

        Verdict::new(
            false,
            "insufficient information, needs further review",
            Disposition::NeedsFurtherReview,
        )
    }
}
