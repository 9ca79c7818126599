//! End-to-end pipeline tests with scripted classifiers: fan-out, the shared
//! deadline with sequential fallback, failure degradation, and usage totals.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use toy_triage_worker::clients::{ChatReply, ClassifierError, EncodedImage};
use toy_triage_worker::config::StrategyKind;
use toy_triage_worker::pipeline::TriageOrchestrator;
use toy_triage_worker::pipeline::classify::{Classifier, ClassifierRole};
use toy_triage_worker::pipeline::decision::strategy_for;
use toy_triage_worker::pipeline::orchestrator::ClassifierSet;
use toy_triage_worker::pipeline::preprocess::ImagePreprocessStage;
use toy_triage_worker::schema::{Damage, Disposition, ToyType};

/// Scripted classifier: fixed reply text, a per-call delay, and a call
/// counter so tests can observe the parallel and sequential passes.
struct ScriptedClassifier {
    role: ClassifierRole,
    reply: Result<String, ()>,
    total_tokens: u64,
    first_call_delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClassifier {
    fn ok(role: ClassifierRole, reply: &str) -> Self {
        Self {
            role,
            reply: Ok(reply.to_string()),
            total_tokens: 10,
            first_call_delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing(role: ClassifierRole) -> Self {
        Self {
            role,
            reply: Err(()),
            total_tokens: 0,
            first_call_delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn slow_first_call(mut self, delay: Duration) -> Self {
        self.first_call_delay = delay;
        self
    }

    fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    fn role(&self) -> ClassifierRole {
        self.role
    }

    async fn classify(&self, _images: &[EncodedImage]) -> Result<ChatReply, ClassifierError> {
        let call_index = self.calls.fetch_add(1, Ordering::SeqCst);
        if call_index == 0 {
            sleep(self.first_call_delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(ChatReply {
                raw_text: text.clone(),
                usage: toy_triage_worker::schema::UsageRecord {
                    prompt_tokens: self.total_tokens / 2,
                    completion_tokens: self.total_tokens - self.total_tokens / 2,
                    total_tokens: self.total_tokens,
                },
            }),
            Err(()) => Err(ClassifierError::EmptyResponse),
        }
    }
}

const TYPE_REPLY: &str = r#"{"type": "블록", "battery": "비건전지", "size": "중간"}"#;
const MATERIAL_REPLY: &str =
    r#"{"material": "플라스틱", "material_detail": "단일", "confidence": "높음", "notes": ""}"#;
const DAMAGE_REPLY: &str = r#"{"damage": "없음", "damage_detail": "", "missing_parts": "없음"}"#;
const SOIL_REPLY: &str = r#"{"soil": "깨끗", "soil_detail": ""}"#;

fn healthy_set() -> ClassifierSet {
    ClassifierSet {
        toy_type: Arc::new(ScriptedClassifier::ok(ClassifierRole::ToyType, TYPE_REPLY)),
        material: Arc::new(ScriptedClassifier::ok(
            ClassifierRole::Material,
            MATERIAL_REPLY,
        )),
        damage: Arc::new(ScriptedClassifier::ok(ClassifierRole::Damage, DAMAGE_REPLY)),
        soil: Arc::new(ScriptedClassifier::ok(ClassifierRole::Soil, SOIL_REPLY)),
    }
}

fn orchestrator(classifiers: ClassifierSet) -> TriageOrchestrator {
    TriageOrchestrator::new(
        Arc::new(ImagePreprocessStage::default()),
        classifiers,
        strategy_for(StrategyKind::Weighted),
        Duration::from_secs(30),
        Duration::from_secs(90),
    )
}

// Undecodable bytes pass the preprocess stage through unchanged, which keeps
// these tests free of real image fixtures.
fn photo() -> Vec<u8> {
    vec![0xde, 0xad, 0xbe, 0xef]
}

#[tokio::test]
async fn clean_plastic_blocks_are_accepted_with_aggregated_usage() {
    let record = orchestrator(healthy_set()).process(&[photo()]).await;

    assert_eq!(record.toy_type, ToyType::Blocks);
    assert_eq!(record.damage, Damage::None);
    assert!(record.eligible);
    assert_eq!(record.disposition, Disposition::NoRepairNeeded);
    assert!(record.reason.contains("plastic non-battery toy"));

    assert_eq!(record.usage.toy_type, 10);
    assert_eq!(record.usage.material, 10);
    assert_eq!(record.usage.damage, 10);
    assert_eq!(record.usage.soil, 10);
    assert_eq!(record.usage.total, 40);
}

#[tokio::test(start_paused = true)]
async fn missed_deadline_demotes_the_whole_batch_to_sequential() {
    // Every first call sleeps past the 30-second single-image deadline; the
    // sequential rerun answers immediately and must supply every result.
    let slow = Duration::from_secs(3600);
    let classifiers = ClassifierSet {
        toy_type: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::ToyType, TYPE_REPLY).slow_first_call(slow),
        ),
        material: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::Material, MATERIAL_REPLY).slow_first_call(slow),
        ),
        damage: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::Damage, DAMAGE_REPLY).slow_first_call(slow),
        ),
        soil: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::Soil, SOIL_REPLY).slow_first_call(slow),
        ),
    };
    let record = orchestrator(classifiers).process(&[photo()]).await;

    // The abandoned parallel pass contributes nothing; the sequential pass
    // fills every slot, so the record is complete and usage counts once.
    assert_eq!(record.toy_type, ToyType::Blocks);
    assert!(record.eligible);
    assert_eq!(record.usage.total, 40);
}

#[tokio::test(start_paused = true)]
async fn sequential_fallback_calls_every_classifier_twice() {
    let slow = Duration::from_secs(3600);
    let toy_type =
        ScriptedClassifier::ok(ClassifierRole::ToyType, TYPE_REPLY).slow_first_call(slow);
    let material =
        ScriptedClassifier::ok(ClassifierRole::Material, MATERIAL_REPLY).slow_first_call(slow);
    let damage =
        ScriptedClassifier::ok(ClassifierRole::Damage, DAMAGE_REPLY).slow_first_call(slow);
    let soil = ScriptedClassifier::ok(ClassifierRole::Soil, SOIL_REPLY).slow_first_call(slow);
    let counters = [
        toy_type.call_counter(),
        material.call_counter(),
        damage.call_counter(),
        soil.call_counter(),
    ];

    let classifiers = ClassifierSet {
        toy_type: Arc::new(toy_type),
        material: Arc::new(material),
        damage: Arc::new(damage),
        soil: Arc::new(soil),
    };
    let record = orchestrator(classifiers).process(&[photo()]).await;

    assert!(record.eligible);
    for counter in &counters {
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn multi_image_invocations_get_the_longer_deadline() {
    // 60-second replies exceed the 30-second single-image deadline but fit
    // the 90-second multi-angle one, so the parallel pass must succeed.
    let slow = Duration::from_secs(60);
    let toy_type =
        ScriptedClassifier::ok(ClassifierRole::ToyType, TYPE_REPLY).slow_first_call(slow);
    let counter = toy_type.call_counter();
    let classifiers = ClassifierSet {
        toy_type: Arc::new(toy_type),
        material: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::Material, MATERIAL_REPLY).slow_first_call(slow),
        ),
        damage: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::Damage, DAMAGE_REPLY).slow_first_call(slow),
        ),
        soil: Arc::new(
            ScriptedClassifier::ok(ClassifierRole::Soil, SOIL_REPLY).slow_first_call(slow),
        ),
    };

    let record = orchestrator(classifiers)
        .process(&[photo(), photo()])
        .await;

    assert!(record.eligible);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_classifier_degrades_to_default_labels_and_zero_usage() {
    let classifiers = ClassifierSet {
        toy_type: Arc::new(ScriptedClassifier::ok(ClassifierRole::ToyType, TYPE_REPLY)),
        material: Arc::new(ScriptedClassifier::ok(
            ClassifierRole::Material,
            MATERIAL_REPLY,
        )),
        damage: Arc::new(ScriptedClassifier::failing(ClassifierRole::Damage)),
        soil: Arc::new(ScriptedClassifier::ok(ClassifierRole::Soil, SOIL_REPLY)),
    };

    let record = orchestrator(classifiers).process(&[photo()]).await;

    // The damage slot falls back to the indeterminate default and the other
    // three roles still contribute their labels and usage.
    assert_eq!(record.damage, Damage::Indeterminate);
    assert_eq!(record.toy_type, ToyType::Blocks);
    assert_eq!(record.usage.damage, 0);
    assert_eq!(record.usage.total, 30);
    assert!(!record.eligible);
}

#[tokio::test]
async fn all_failing_classifiers_still_produce_a_complete_record() {
    let classifiers = ClassifierSet {
        toy_type: Arc::new(ScriptedClassifier::failing(ClassifierRole::ToyType)),
        material: Arc::new(ScriptedClassifier::failing(ClassifierRole::Material)),
        damage: Arc::new(ScriptedClassifier::failing(ClassifierRole::Damage)),
        soil: Arc::new(ScriptedClassifier::failing(ClassifierRole::Soil)),
    };

    let record = orchestrator(classifiers).process(&[photo()]).await;

    assert_eq!(record.toy_type, ToyType::Other);
    assert_eq!(record.damage, Damage::Indeterminate);
    assert_eq!(record.usage.total, 0);
    assert!(!record.eligible);
    assert!(!record.notes.is_empty());
}

#[tokio::test]
async fn fenced_reply_text_is_parsed_like_bare_json() {
    let fenced = "```json\n{\"damage\": \"없음\", \"damage_detail\": \"\", \
                  \"missing_parts\": \"없음\"}\n```";
    let classifiers = ClassifierSet {
        damage: Arc::new(ScriptedClassifier::ok(ClassifierRole::Damage, fenced)),
        ..healthy_set()
    };

    let record = orchestrator(classifiers).process(&[photo()]).await;
    assert_eq!(record.damage, Damage::None);
    assert!(record.eligible);
}

#[tokio::test]
async fn wood_material_is_disqualified_end_to_end() {
    let wood = r#"{"material": "나무", "material_detail": "단일", "confidence": "높음", "notes": ""}"#;
    let classifiers = ClassifierSet {
        material: Arc::new(ScriptedClassifier::ok(ClassifierRole::Material, wood)),
        ..healthy_set()
    };

    let record = orchestrator(classifiers).process(&[photo()]).await;
    assert!(!record.eligible);
    assert!(record.reason.contains("wooden"));
    assert_eq!(record.disposition, Disposition::DisassembleForParts);
}

#[tokio::test]
async fn fabric_mixed_material_is_disqualified_end_to_end() {
    let mixed = r#"{"material": "플라스틱,섬유", "material_detail": "혼합", "confidence": "중간", "notes": ""}"#;
    let classifiers = ClassifierSet {
        material: Arc::new(ScriptedClassifier::ok(ClassifierRole::Material, mixed)),
        ..healthy_set()
    };

    let record = orchestrator(classifiers).process(&[photo()]).await;
    assert!(!record.eligible);
    assert!(record.reason.contains("fabric"));
}

#[tokio::test]
async fn doll_category_is_disqualified_end_to_end() {
    let doll = r#"{"type": "인형", "battery": "비건전지", "size": "중간"}"#;
    let classifiers = ClassifierSet {
        toy_type: Arc::new(ScriptedClassifier::ok(ClassifierRole::ToyType, doll)),
        ..healthy_set()
    };

    let record = orchestrator(classifiers).process(&[photo()]).await;
    assert!(!record.eligible);
    assert_eq!(record.toy_type, ToyType::Doll);
    assert!(record.reason.contains("doll"));
}

#[tokio::test]
async fn hard_rule_strategy_is_selectable() {
    let pipeline = TriageOrchestrator::new(
        Arc::new(ImagePreprocessStage::default()),
        healthy_set(),
        strategy_for(StrategyKind::HardRule),
        Duration::from_secs(30),
        Duration::from_secs(90),
    );

    let record = pipeline.process(&[photo()]).await;
    assert!(record.eligible);
    assert_eq!(record.disposition, Disposition::NoRepairNeeded);
}
