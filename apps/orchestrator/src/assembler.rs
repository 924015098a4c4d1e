// [apps/orchestrator/src/assembler.rs]
/*!
 * APARATO: BILL ASSEMBLER (ESTRATO L1-APP)
 * RESPONSABILIDAD: Para un único proyecto de ley, orquesta hasta cinco
 * obtenciones de sub-endpoint en orden fijo, transforma cada respuesta
 * y persiste a través del Store Writer, acumulando una máscara de
 * completitud de 5 bits a medida que avanza.
 */

use capitol_domain_models::action::BillAction;
use capitol_domain_models::bill::{bill_id, Bill, BillType, SponsorSnapshot, TITLE_DESIGNATOR_PATTERN};
use capitol_domain_models::endpoint_bits;
use capitol_domain_models::subject::BillSubject;
use capitol_domain_models::summary::BillSummary;
use capitol_domain_models::text::BillText;
use capitol_domain_stage_classifier::{classify, ActionSignal};
use capitol_infra_congress_client::FetchOutcome;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{instrument, warn};

use crate::state::AppState;

static TITLE_DESIGNATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TITLE_DESIGNATOR_PATTERN).expect("title designator pattern is valid"));

/// Resultado de un paso de ensamblaje, suficiente para que el Batch
/// Worker lleve sus contadores de éxito/fallo sin inspeccionar el bit
/// a bit de la máscara él mismo.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyOutcome {
    pub success: bool,
    pub synced_endpoints: i32,
}

pub struct BillAssembler<'a> {
    state: &'a AppState,
}

impl<'a> BillAssembler<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    #[instrument(skip(self), fields(bill_id = %bill_id(congress, bill_type, bill_number)))]
    pub async fn assemble(&self, congress: i32, bill_type: BillType, bill_number: i32) -> AssemblyOutcome {
        let id = bill_id(congress, bill_type, bill_number);
        let now = Utc::now().to_rfc3339();
        let type_str = bill_type.as_str();

        let detail = match self
            .state
            .congress_client
            .bill_detail(congress, type_str, bill_number)
            .await
        {
            Ok(FetchOutcome::Ok(response)) => response.bill,
            Ok(FetchOutcome::NotFound) => {
                warn!(bill_id = %id, "detail endpoint reports this bill does not exist upstream");
                return AssemblyOutcome {
                    success: false,
                    synced_endpoints: 0,
                };
            }
            Ok(FetchOutcome::Failed) | Err(_) => {
                warn!(bill_id = %id, "detail fetch exhausted, assembly aborted for this bill");
                return AssemblyOutcome {
                    success: false,
                    synced_endpoints: 0,
                };
            }
        };

        let mut mask = endpoint_bits::DETAIL;

        let (actions_fetched, action_dtos) =
            match self.state.congress_client.actions(congress, type_str, bill_number).await {
                Ok(FetchOutcome::Ok(response)) => (true, response.actions),
                _ => (false, Vec::new()),
            };

        let filtered_actions: Vec<BillAction> = action_dtos
            .into_iter()
            .filter_map(|dto| {
                let code = dto.action_code?;
                if code.is_empty() {
                    return None;
                }
                Some(BillAction {
                    bill_id: id.clone(),
                    action_code: code,
                    action_date: dto.action_date,
                    source_system_code: dto.source_system.as_ref().and_then(|s| s.code),
                    source_system_name: dto.source_system.and_then(|s| s.name),
                    text: dto.text.unwrap_or_default(),
                    action_type: dto.action_type,
                })
            })
            .collect();

        let signals: Vec<ActionSignal<'_>> = filtered_actions
            .iter()
            .map(|action| ActionSignal {
                action_code: &action.action_code,
                action_date: &action.action_date,
                text: &action.text,
                action_type: action.action_type.as_deref().unwrap_or(""),
            })
            .collect();
        let (stage, stage_description) = classify(&signals);

        let title = detail.title.unwrap_or_default();
        let title_without_number = TITLE_DESIGNATOR_RE.replace(&title, "").into_owned();

        let sponsor = detail.sponsors.into_iter().next().map(|sponsor| SponsorSnapshot {
            first_name: sponsor.first_name.unwrap_or_default(),
            last_name: sponsor.last_name.unwrap_or_default(),
            party: sponsor.party.unwrap_or_default(),
            state: sponsor.state.unwrap_or_default(),
        });

        let bill = Bill {
            bill_id: id.clone(),
            congress,
            bill_type,
            bill_number,
            title,
            title_without_number,
            introduced_date: detail.introduced_date.unwrap_or_default(),
            sponsor,
            stage,
            stage_description: stage_description.to_string(),
            synced_endpoints: None,
            last_sync_attempt: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let bill_and_actions_persisted = match self.write_bill_and_actions(&bill, &filtered_actions).await {
            Ok(()) => true,
            Err(error) => {
                warn!(bill_id = %id, %error, "failed to persist bill/actions, continuing with remaining sub-endpoints");
                false
            }
        };
        if actions_fetched && bill_and_actions_persisted {
            mask |= endpoint_bits::ACTIONS;
        }

        if self.sync_subjects(&id, congress, type_str, bill_number).await {
            mask |= endpoint_bits::SUBJECTS;
        }
        if self.sync_summaries(&id, congress, type_str, bill_number).await {
            mask |= endpoint_bits::SUMMARIES;
        }
        if self.sync_text(&id, congress, type_str, bill_number).await {
            mask |= endpoint_bits::TEXT;
        }

        if let Ok(bills) = self.state.bills() {
            if let Err(error) = bills.update_synced_endpoints(&id, mask, &now).await {
                warn!(bill_id = %id, %error, "failed to persist final endpoint mask");
            }
        }

        AssemblyOutcome {
            success: true,
            synced_endpoints: mask,
        }
    }

    async fn write_bill_and_actions(
        &self,
        bill: &Bill,
        actions: &[BillAction],
    ) -> Result<(), capitol_infra_db::DbError> {
        self.state.bills()?.upsert(bill).await?;
        self.state.actions()?.replace_all(&bill.bill_id, actions).await?;
        Ok(())
    }

    /// Un área de política ausente es un resultado legítimo de una
    /// obtención exitosa, no una falla: el bit se otorga igual siempre
    /// que la escritura (cuando hay algo que escribir) no falle.
    async fn sync_subjects(&self, bill_id: &str, congress: i32, type_str: &str, bill_number: i32) -> bool {
        let response = match self.state.congress_client.subjects(congress, type_str, bill_number).await {
            Ok(FetchOutcome::Ok(response)) => response,
            _ => return false,
        };
        let Some(policy_area) = response.subjects.policy_area else {
            return true;
        };

        let subject = BillSubject {
            bill_id: bill_id.to_string(),
            policy_area_name: policy_area.name,
            policy_area_update_date: policy_area.update_date,
        };

        let repo = match self.state.subjects() {
            Ok(repo) => repo,
            Err(_) => return false,
        };
        match repo.upsert(&subject).await {
            Ok(()) => true,
            Err(error) => {
                warn!(bill_id = %bill_id, %error, "failed to persist bill subject, not marking subjects endpoint synced");
                false
            }
        }
    }

    /// Cero resúmenes publicados es un resultado legítimo de una
    /// obtención exitosa. Cada escritura individual se registra y
    /// continúa si falla, pero una sola falla de almacenamiento retira
    /// el bit entero: no hay forma de distinguir "synced parcial" en la
    /// máscara de 5 bits.
    async fn sync_summaries(&self, bill_id: &str, congress: i32, type_str: &str, bill_number: i32) -> bool {
        let response = match self.state.congress_client.summaries(congress, type_str, bill_number).await {
            Ok(FetchOutcome::Ok(response)) => response,
            _ => return false,
        };

        let repo = match self.state.summaries() {
            Ok(repo) => repo,
            Err(_) => return false,
        };

        let mut all_persisted = true;
        for dto in response.summaries {
            let summary = BillSummary {
                bill_id: bill_id.to_string(),
                version_code: dto.version_code,
                action_date: dto.action_date,
                action_desc: dto.action_desc.unwrap_or_default(),
                text: dto.text.unwrap_or_default(),
                update_date: dto.update_date,
            };
            if let Err(error) = repo.upsert_if_newer(&summary).await {
                warn!(bill_id = %bill_id, %error, "failed to persist bill summary, not marking summaries endpoint synced");
                all_persisted = false;
            }
        }
        all_persisted
    }

    /// Ninguna versión de texto publicada todavía es legítimo en una
    /// obtención exitosa.
    async fn sync_text(&self, bill_id: &str, congress: i32, type_str: &str, bill_number: i32) -> bool {
        let response = match self.state.congress_client.text(congress, type_str, bill_number).await {
            Ok(FetchOutcome::Ok(response)) => response,
            _ => return false,
        };
        let Some(latest) = response.text_versions.into_iter().last() else {
            return true;
        };

        let text_url = latest
            .formats
            .iter()
            .find(|format| format.format_type == "Formatted Text")
            .map(|format| format.url.clone());
        let pdf_url = latest
            .formats
            .iter()
            .find(|format| format.format_type == "PDF")
            .map(|format| format.url.clone());

        let text = BillText {
            bill_id: bill_id.to_string(),
            date: latest.date,
            version_type: latest.version_type.unwrap_or_default(),
            text_url,
            pdf_url,
        };

        let repo = match self.state.texts() {
            Ok(repo) => repo,
            Err(_) => return false,
        };
        match repo.insert_if_absent(&text).await {
            Ok(()) => true,
            Err(error) => {
                warn!(bill_id = %bill_id, %error, "failed to persist bill text, not marking text endpoint synced");
                false
            }
        }
    }
}
