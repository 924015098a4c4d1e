// [libs/infra/congress-client/src/types.rs]
/*!
 * APARATO: CONGRESS.GOV WIRE TYPES (ESTRATO L3)
 * RESPONSABILIDAD: Formas de respuesta fuertemente tipadas, con
 * decodificación permisiva: campos desconocidos se ignoran, campos
 * opcionales se modelan explícitamente y su ausencia se trata como "este
 * sub-endpoint no aportó nada", nunca como error duro.
 */

use serde::Deserialize;

// --- /bill/{congress}/{billType} ---

#[derive(Debug, Clone, Deserialize)]
pub struct BillListResponse {
    #[serde(default)]
    pub bills: Vec<BillListItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillListItem {
    pub number: String,
    #[serde(default)]
    pub update_date: Option<String>,
}

// --- /bill/{congress}/{billType}/{n} ---

#[derive(Debug, Clone, Deserialize)]
pub struct BillDetailResponse {
    pub bill: BillDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDetail {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub introduced_date: Option<String>,
    #[serde(default)]
    pub sponsors: Vec<SponsorDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorDto {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

// --- /bill/{congress}/{billType}/{n}/actions ---

#[derive(Debug, Clone, Deserialize)]
pub struct ActionsResponse {
    #[serde(default)]
    pub actions: Vec<ActionDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDto {
    #[serde(default)]
    pub action_code: Option<String>,
    pub action_date: String,
    #[serde(default)]
    pub source_system: Option<SourceSystemDto>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub action_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSystemDto {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
}

// --- /bill/{congress}/{billType}/{n}/subjects ---

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectsResponse {
    #[serde(default)]
    pub subjects: SubjectsDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectsDto {
    #[serde(rename = "policyArea", default)]
    pub policy_area: Option<PolicyAreaDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAreaDto {
    pub name: String,
    #[serde(default)]
    pub update_date: Option<String>,
}

// --- /bill/{congress}/{billType}/{n}/summaries ---

#[derive(Debug, Clone, Deserialize)]
pub struct SummariesResponse {
    #[serde(default)]
    pub summaries: Vec<SummaryDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub action_date: String,
    #[serde(default)]
    pub action_desc: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub update_date: String,
    pub version_code: String,
}

// --- /bill/{congress}/{billType}/{n}/text ---

#[derive(Debug, Clone, Deserialize)]
pub struct TextResponse {
    #[serde(default)]
    pub text_versions: Vec<TextVersionDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextVersionDto {
    pub date: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatDto {
    #[serde(rename = "type")]
    pub format_type: String,
    pub url: String,
}
