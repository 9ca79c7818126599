//! Eligibility decision engine.
//!
//! Two rule variants exist in the product lineage: a hard-rule short-circuit
//! and a weighted-scoring engine. They share the same disqualifier predicates
//! but are deliberately not merged; configuration picks one per deployment.

pub mod hard_rule;
pub(crate) mod predicates;
pub mod weighted;

use std::sync::Arc;

use crate::config::StrategyKind;
use crate::schema::{LabelSet, Verdict};

pub use hard_rule::HardRuleStrategy;
pub use weighted::WeightedScoreStrategy;

/// A decision strategy is a pure function over the merged labels: no I/O, no
/// randomness, exhaustively unit-testable.
pub trait DecisionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(&self, labels: &LabelSet) -> Verdict;
}

/// Build the configured strategy.
#[must_use]
pub fn strategy_for(kind: StrategyKind) -> Arc<dyn DecisionStrategy> {
    match kind {
        StrategyKind::HardRule => Arc::new(HardRuleStrategy),
        StrategyKind::Weighted => Arc::new(WeightedScoreStrategy),
    }
}
