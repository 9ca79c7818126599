//! Per-invocation orchestration: preprocess, fan out the four classifiers,
//! merge, decide.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::clients::{ChatReply, ClassifierError, EncodedImage, VisionClient};
use crate::config::Config;
use crate::schema::{DecisionRecord, UsageRecord, UsageTotals};

use super::classify::{Classifier, ClassifierRole, VisionClassifier};
use super::decision::{DecisionStrategy, strategy_for};
use super::merge::{merge_fragments, observation_notes};
use super::parse::{
    parse_damage_fragment, parse_material_fragment, parse_soil_fragment, parse_type_fragment,
};
use super::preprocess::{ImagePreprocessStage, PreprocessStage};

/// One classifier per role. The production set points all four at the same
/// vision endpoint; tests substitute arbitrary [`Classifier`] impls.
pub struct ClassifierSet {
    pub toy_type: Arc<dyn Classifier>,
    pub material: Arc<dyn Classifier>,
    pub damage: Arc<dyn Classifier>,
    pub soil: Arc<dyn Classifier>,
}

impl ClassifierSet {
    #[must_use]
    pub fn shared_endpoint(client: &Arc<VisionClient>) -> Self {
        Self {
            toy_type: Arc::new(VisionClassifier::new(
                Arc::clone(client),
                ClassifierRole::ToyType,
            )),
            material: Arc::new(VisionClassifier::new(
                Arc::clone(client),
                ClassifierRole::Material,
            )),
            damage: Arc::new(VisionClassifier::new(
                Arc::clone(client),
                ClassifierRole::Damage,
            )),
            soil: Arc::new(VisionClassifier::new(
                Arc::clone(client),
                ClassifierRole::Soil,
            )),
        }
    }
}

/// Drives one triage invocation end to end. Stateless across invocations;
/// everything an invocation touches lives on its own stack.
pub struct TriageOrchestrator {
    preprocess: Arc<dyn PreprocessStage>,
    classifiers: ClassifierSet,
    strategy: Arc<dyn DecisionStrategy>,
    parallel_deadline: Duration,
    multi_image_deadline: Duration,
}

impl TriageOrchestrator {
    #[must_use]
    pub fn new(
        preprocess: Arc<dyn PreprocessStage>,
        classifiers: ClassifierSet,
        strategy: Arc<dyn DecisionStrategy>,
        parallel_deadline: Duration,
        multi_image_deadline: Duration,
    ) -> Self {
        Self {
            preprocess,
            classifiers,
            strategy,
            parallel_deadline,
            multi_image_deadline,
        }
    }

    /// Wire up the production pipeline from configuration.
    ///
    /// # Errors
    /// HTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(VisionClient::new(
            config.vision_api_base_url(),
            config.vision_api_key(),
            config.vision_model(),
            config.http_connect_timeout(),
        )?);

        Ok(Self::new(
            Arc::new(ImagePreprocessStage::new(
                config.image_max_edge(),
                config.image_jpeg_quality(),
            )),
            ClassifierSet::shared_endpoint(&client),
            strategy_for(config.decision_strategy()),
            config.parallel_deadline(),
            config.multi_image_deadline(),
        ))
    }

    /// Run one full triage invocation over the supplied photos.
    ///
    /// Total by construction: classifier failures degrade to default label
    /// fragments with zero usage, and a missed shared deadline demotes the
    /// whole batch to sequential calls before any result is used.
    pub async fn process(&self, raw_images: &[Vec<u8>]) -> DecisionRecord {
        let started = Instant::now();

        let encoded: Vec<EncodedImage> = raw_images
            .iter()
            .map(|bytes| EncodedImage::new(STANDARD.encode(self.preprocess.optimize(bytes))))
            .collect();

        let deadline = if encoded.len() > 1 {
            self.multi_image_deadline
        } else {
            self.parallel_deadline
        };
        info!(
            images = encoded.len(),
            deadline_secs = deadline.as_secs(),
            strategy = self.strategy.name(),
            "triage invocation started"
        );

        let (toy_type, material, damage, soil) = self.classify_batch(&encoded, deadline).await;

        let (type_fragment, type_usage) =
            fragment_or_default(ClassifierRole::ToyType, toy_type, parse_type_fragment);
        let (material_fragment, material_usage) =
            fragment_or_default(ClassifierRole::Material, material, parse_material_fragment);
        let (damage_fragment, damage_usage) =
            fragment_or_default(ClassifierRole::Damage, damage, parse_damage_fragment);
        let (soil_fragment, soil_usage) =
            fragment_or_default(ClassifierRole::Soil, soil, parse_soil_fragment);

        let labels = merge_fragments(
            type_fragment,
            material_fragment,
            damage_fragment,
            soil_fragment,
        );
        let notes = observation_notes(&labels);
        let verdict = self.strategy.decide(&labels);
        let usage = UsageTotals::from_records(type_usage, material_usage, damage_usage, soil_usage);

        info!(
            eligible = verdict.eligible,
            disposition = ?verdict.disposition,
            total_tokens = usage.total,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "triage invocation finished"
        );

        DecisionRecord::new(&labels, notes, verdict, usage)
    }

    /// Concurrent attempt under one shared deadline; on expiry the partial
    /// results are abandoned and all four roles rerun sequentially without a
    /// deadline, into fresh slots.
    async fn classify_batch(
        &self,
        images: &[EncodedImage],
        deadline: Duration,
    ) -> (RoleReply, RoleReply, RoleReply, RoleReply) {
        let attempt = timeout(
            deadline,
            async {
                tokio::join!(
                    self.classifiers.toy_type.classify(images),
                    self.classifiers.material.classify(images),
                    self.classifiers.damage.classify(images),
                    self.classifiers.soil.classify(images),
                )
            },
        )
        .await;

        match attempt {
            Ok(replies) => replies,
            Err(_) => {
                warn!(
                    deadline_secs = deadline.as_secs(),
                    "shared classification deadline expired, falling back to sequential calls"
                );
                let toy_type = self.classifiers.toy_type.classify(images).await;
                let material = self.classifiers.material.classify(images).await;
                let damage = self.classifiers.damage.classify(images).await;
                let soil = self.classifiers.soil.classify(images).await;
                (toy_type, material, damage, soil)
            }
        }
    }
}

type RoleReply = Result<ChatReply, ClassifierError>;

/// Parse a role's reply, or degrade to the role's default fragment with zero
/// usage when the call failed.
fn fragment_or_default<T: Default>(
    role: ClassifierRole,
    reply: RoleReply,
    parse: fn(&str) -> T,
) -> (T, UsageRecord) {
    match reply {
        Ok(reply) => (parse(&reply.raw_text), reply.usage),
        Err(error) => {
            warn!(
                role = role.name(),
                %error,
                "classifier failed, substituting default labels"
            );
            (T::default(), UsageRecord::default())
        }
    }
}
