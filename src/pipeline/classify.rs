use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::{ChatReply, ClassifierError, EncodedImage, VisionClient};

/// The four classification roles fanned out per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierRole {
    ToyType,
    Material,
    Damage,
    Soil,
}

impl ClassifierRole {
    pub const ALL: [Self; 4] = [Self::ToyType, Self::Material, Self::Damage, Self::Soil];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ToyType => "type",
            Self::Material => "material",
            Self::Damage => "damage",
            Self::Soil => "soil",
        }
    }

    /// Fixed instruction prompt for the role. Prompts ask for a flat JSON
    /// object; the model is still free to ignore that, which is why the
    /// result parser is defensive.
    #[must_use]
    pub(crate) fn prompt(self) -> &'static str {
        match self {
            Self::ToyType => {
                "당신은 장난감 종류 및 특성 분석 전문가입니다. \
                 제공된 모든 이미지를 분석하여 종합적인 판단을 내려주세요.\n\
                 분석해야 할 항목:\n\
                 1. type: {피규어, 모형(=피규어로 매핑), 자동차 장난감, 변신 로봇, 건전지 장난감, \
                 비건전지 장난감, 인형, 블록, 공, 아동 도서, 플라스틱 부품, 나무 장난감, 보행기, 탈것, 기타}\n\
                 2. battery: {건전지, 비건전지, 불명}\n\
                 3. size: {작음, 중간, 큼, 불명}\n\n\
                 반드시 순수 JSON 형식으로만 답변하세요. 마크다운 코드 블록(```)을 사용하지 마세요:\n\
                 {\"type\": \"종류\", \"battery\": \"건전지여부\", \"size\": \"크기\"}"
            }
            Self::Material => {
                "당신은 장난감 재료 분석 전문가입니다. \
                 제공된 모든 이미지를 보고 장난감의 주요 재료를 판별하세요.\n\
                 가능한 재료: 플라스틱, 금속, 나무, 섬유, 실리콘, 유리, 고무\n\
                 혼합 소재인 경우 쉼표로 연결하세요 (예: \"플라스틱,금속\").\n\n\
                 반드시 순수 JSON 형식으로만 답변하세요. 마크다운 코드 블록(```)을 사용하지 마세요:\n\
                 {\"material\": \"재료\", \"material_detail\": \"단일|혼합\", \
                 \"confidence\": \"높음|중간|낮음\", \"notes\": \"특이사항\"}"
            }
            Self::Damage => {
                "당신은 장난감 파손 여부 판별 전문가입니다. \
                 제공된 모든 이미지를 분석하여 파손 상태를 판별하세요.\n\
                 가능한 상태: 없음, 미세한 파손, 보통 파손, 심각한 파손, 판단 불가\n\n\
                 반드시 순수 JSON 형식으로만 답변하세요. 마크다운 코드 블록(```)을 사용하지 마세요:\n\
                 {\"damage\": \"상태\", \"damage_detail\": \"상세\", \"missing_parts\": \"있음|없음|불명\"}"
            }
            Self::Soil => {
                "당신은 장난감 오염 상태 분석 전문가입니다. \
                 제공된 모든 이미지의 오염 상태를 분석하세요.\n\
                 상태 값: 깨끗, 약간 더러움, 보통, 더러움\n\n\
                 반드시 순수 JSON 형식으로만 답변하세요. 마크다운 코드 블록(```)을 사용하지 마세요:\n\
                 {\"soil\": \"상태\", \"soil_detail\": \"상세\"}"
            }
        }
    }

    /// Output-token budget per role. The type role reports three fields and
    /// gets a little more room.
    #[must_use]
    pub(crate) fn max_completion_tokens(self) -> u32 {
        match self {
            Self::ToyType => 150,
            Self::Material | Self::Damage | Self::Soil => 100,
        }
    }
}

/// One classification capability: images in, free text plus usage out.
///
/// The contract is arity-agnostic; multi-angle invocations attach every image
/// to a single request and expect one consolidated judgment.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn role(&self) -> ClassifierRole;

    /// # Errors
    /// Returns [`ClassifierError`] when the underlying call fails; callers
    /// degrade to the role's default fragment.
    async fn classify(&self, images: &[EncodedImage]) -> Result<ChatReply, ClassifierError>;
}

/// Production classifier backed by the shared vision endpoint client.
#[derive(Debug, Clone)]
pub struct VisionClassifier {
    client: Arc<VisionClient>,
    role: ClassifierRole,
}

impl VisionClassifier {
    #[must_use]
    pub fn new(client: Arc<VisionClient>, role: ClassifierRole) -> Self {
        Self { client, role }
    }
}

#[async_trait]
impl Classifier for VisionClassifier {
    fn role(&self) -> ClassifierRole {
        self.role
    }

    async fn classify(&self, images: &[EncodedImage]) -> Result<ChatReply, ClassifierError> {
        self.client
            .classify(self.role.prompt(), images, self.role.max_completion_tokens())
            .await
    }
}
