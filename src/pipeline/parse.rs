//! Defensive conversion of raw classifier text into typed label fragments.
//!
//! Classifier responses are untrusted: models wrap JSON in code fences, emit
//! surrounding prose, return `null`, or truncate mid-object. Parsing here is
//! total — every failure path lands on the role's documented safe default,
//! and this module is the only boundary where loose text becomes typed data.

use serde_json::Value;

use crate::schema::{
    Battery, Damage, DamageFragment, MaterialConfidence, MaterialDetail, MaterialFragment,
    MaterialKind, MaterialLabel, MissingParts, SizeClass, Soil, SoilFragment, ToyType,
    TypeFragment,
};

/// Strip an enclosing markdown code fence, if present.
///
/// Drops the opening fence line (with optional language tag) and the closing
/// fence line; everything else is returned untouched.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Opening fence line may carry a language tag ("```json").
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").map_or(body, str::trim_end)
}

/// Locate the first `{` and the last `}` and parse the span between them
/// (inclusive) as a JSON object. Returns `None` for anything else, including
/// top-level `null` or arrays.
fn extract_json_object(raw: &str) -> Option<Value> {
    let text = strip_code_fence(raw);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    value.is_object().then_some(value)
}

fn str_field<'a>(object: &'a Value, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str).map(str::trim)
}

fn text_field(object: &Value, key: &str) -> String {
    str_field(object, key).unwrap_or_default().to_string()
}

/// Parse the type classifier's output. Safe default: other / unknown / medium.
#[must_use]
pub fn parse_type_fragment(raw: &str) -> TypeFragment {
    let Some(object) = extract_json_object(raw) else {
        return TypeFragment::default();
    };
    // 旧バージョンは "toy_type"、現行プロンプトは "type" キーを使う。
    let label = str_field(&object, "type")
        .or_else(|| str_field(&object, "toy_type"))
        .unwrap_or_default();

    TypeFragment {
        toy_type: map_toy_type(label),
        raw_label: label.to_string(),
        battery: str_field(&object, "battery").map_or_else(Battery::default, map_battery),
        size: str_field(&object, "size").map_or_else(SizeClass::default, map_size),
    }
}

/// Parse the material classifier's output. Safe default: unknown everywhere.
#[must_use]
pub fn parse_material_fragment(raw: &str) -> MaterialFragment {
    let Some(object) = extract_json_object(raw) else {
        return MaterialFragment::default();
    };

    MaterialFragment {
        material: str_field(&object, "material")
            .map_or_else(MaterialLabel::unknown, map_material),
        detail: str_field(&object, "material_detail")
            .map_or_else(MaterialDetail::default, map_material_detail),
        confidence: str_field(&object, "confidence")
            .map_or_else(MaterialConfidence::default, map_confidence),
        notes: text_field(&object, "notes"),
    }
}

/// Parse the damage classifier's output. Safe default: indeterminate.
#[must_use]
pub fn parse_damage_fragment(raw: &str) -> DamageFragment {
    let Some(object) = extract_json_object(raw) else {
        return DamageFragment::default();
    };

    DamageFragment {
        damage: str_field(&object, "damage").map_or_else(Damage::default, map_damage),
        detail: text_field(&object, "damage_detail"),
        missing_parts: str_field(&object, "missing_parts")
            .map_or_else(MissingParts::default, map_missing_parts),
    }
}

/// Parse the soiling classifier's output. Safe default: clean.
#[must_use]
pub fn parse_soil_fragment(raw: &str) -> SoilFragment {
    let Some(object) = extract_json_object(raw) else {
        return SoilFragment::default();
    };

    SoilFragment {
        soil: str_field(&object, "soil").map_or_else(Soil::default, map_soil),
        detail: text_field(&object, "soil_detail"),
    }
}

fn map_toy_type(label: &str) -> ToyType {
    match label {
        // 모형 is mapped onto figure per the type prompt.
        "피규어" | "모형" | "figure" => ToyType::Figure,
        "자동차 장난감" | "vehicle-toy" => ToyType::VehicleToy,
        "변신 로봇" | "transforming-robot" => ToyType::TransformingRobot,
        "건전지 장난감" | "battery-toy" => ToyType::BatteryToy,
        "비건전지 장난감" | "non-battery-toy" => ToyType::NonBatteryToy,
        "인형" | "doll" => ToyType::Doll,
        "블록" | "blocks" => ToyType::Blocks,
        "공" | "ball" => ToyType::Ball,
        "아동 도서" | "book" => ToyType::Book,
        "플라스틱 부품" | "plastic-part" => ToyType::PlasticPart,
        "나무 장난감" | "wooden-toy" => ToyType::WoodenToy,
        "보행기" | "walker" => ToyType::Walker,
        "탈것" | "ride-on" => ToyType::RideOn,
        _ => ToyType::Other,
    }
}

fn map_battery(label: &str) -> Battery {
    match label {
        "건전지" | "battery" => Battery::Battery,
        "비건전지" | "non-battery" => Battery::NonBattery,
        _ => Battery::Unknown,
    }
}

fn map_size(label: &str) -> SizeClass {
    match label {
        "작음" | "small" => SizeClass::Small,
        "중간" | "medium" => SizeClass::Medium,
        "큼" | "large" => SizeClass::Large,
        "불명" | "unknown" => SizeClass::Unknown,
        _ => SizeClass::default(),
    }
}

fn map_material_kind(token: &str) -> Option<MaterialKind> {
    match token.trim() {
        "플라스틱" | "plastic" => Some(MaterialKind::Plastic),
        "금속" | "metal" => Some(MaterialKind::Metal),
        "나무" | "wood" => Some(MaterialKind::Wood),
        "섬유" | "천" | "fabric" => Some(MaterialKind::Fabric),
        "실리콘" | "silicone" => Some(MaterialKind::Silicone),
        "유리" | "glass" => Some(MaterialKind::Glass),
        "고무" | "rubber" => Some(MaterialKind::Rubber),
        _ => None,
    }
}

/// Single labels or comma-joined combinations; unknown tokens are dropped,
/// repeated tokens are kept once, and an all-unknown label collapses to the
/// unknown default.
fn map_material(label: &str) -> MaterialLabel {
    let mut kinds: Vec<MaterialKind> = Vec::new();
    for kind in label.split(',').filter_map(map_material_kind) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    MaterialLabel::new(kinds)
}

fn map_material_detail(label: &str) -> MaterialDetail {
    match label {
        "단일" | "single" => MaterialDetail::Single,
        "혼합" | "mixed" => MaterialDetail::Mixed,
        _ => MaterialDetail::Unknown,
    }
}

fn map_confidence(label: &str) -> MaterialConfidence {
    match label {
        "높음" | "high" => MaterialConfidence::High,
        "중간" | "medium" => MaterialConfidence::Medium,
        _ => MaterialConfidence::Low,
    }
}

fn map_damage(label: &str) -> Damage {
    if label == "없음" || label == "none" {
        return Damage::None;
    }
    if label.contains("심각") || label == "severe" {
        return Damage::Severe;
    }
    if label.contains("미세") || label.contains("경미") || label == "minor" {
        return Damage::Minor;
    }
    if label.contains("부품 누락") || label.contains("일부 누락") || label == "missing-parts" {
        return Damage::MissingParts;
    }
    if label.contains("보통") || label.contains("중간") || label == "moderate" {
        return Damage::Moderate;
    }
    Damage::Indeterminate
}

fn map_missing_parts(label: &str) -> MissingParts {
    match label {
        "없음" | "none" => MissingParts::None,
        "있음" | "present" => MissingParts::Present,
        _ => MissingParts::Unknown,
    }
}

fn map_soil(label: &str) -> Soil {
    // 「약간 더러움」が「더러움」を含むため、先に弱い方をマッチさせる。
    if label.contains("약간 더러움") || label == "light" {
        return Soil::Light;
    }
    if label.contains("더러움") || label == "dirty" {
        return Soil::Dirty;
    }
    if label.contains("보통") || label == "moderate" {
        return Soil::Moderate;
    }
    if label.contains("깨끗") || label == "clean" {
        return Soil::Clean;
    }
    Soil::default()
}
