// [libs/infra/db/src/repositories/bill.rs]
/*!
 * APARATO: BILL REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Persistencia de la entidad primaria y de su máscara
 * de completitud de sub-endpoints.
 */

use capitol_domain_models::bill::{Bill, BillType, SponsorSnapshot, Stage};
use capitol_domain_models::stats::CompletenessSummary;
use libsql::{params, Connection, Row};
use tracing::instrument;

use crate::errors::DbError;

pub struct BillRepository {
    connection: Connection,
}

impl BillRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Inserta o reemplaza la fila completa de un Bill. El Ensamblador
    /// siempre construye el `Bill` entero antes de escribir, así que un
    /// reemplazo total es seguro: no existe escritura parcial de campos.
    #[instrument(skip(self, bill))]
    pub async fn upsert(&self, bill: &Bill) -> Result<(), DbError> {
        let sponsor = bill.sponsor.as_ref();
        self.connection
            .execute(
                r#"
                INSERT INTO bills (
                    bill_id, congress, bill_type, bill_number,
                    title, title_without_number, introduced_date,
                    sponsor_first_name, sponsor_last_name, sponsor_party, sponsor_state,
                    stage, stage_description,
                    synced_endpoints, last_sync_attempt,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, CURRENT_TIMESTAMP)
                ON CONFLICT(bill_id) DO UPDATE SET
                    title = excluded.title,
                    title_without_number = excluded.title_without_number,
                    introduced_date = excluded.introduced_date,
                    sponsor_first_name = excluded.sponsor_first_name,
                    sponsor_last_name = excluded.sponsor_last_name,
                    sponsor_party = excluded.sponsor_party,
                    sponsor_state = excluded.sponsor_state,
                    stage = excluded.stage,
                    stage_description = excluded.stage_description,
                    synced_endpoints = excluded.synced_endpoints,
                    last_sync_attempt = excluded.last_sync_attempt,
                    updated_at = CURRENT_TIMESTAMP
                "#,
                params![
                    bill.bill_id.clone(),
                    bill.congress,
                    bill.bill_type.as_str(),
                    bill.bill_number,
                    bill.title.clone(),
                    bill.title_without_number.clone(),
                    bill.introduced_date.clone(),
                    sponsor.map(|s| s.first_name.clone()),
                    sponsor.map(|s| s.last_name.clone()),
                    sponsor.map(|s| s.party.clone()),
                    sponsor.map(|s| s.state.clone()),
                    bill.stage,
                    bill.stage_description.clone(),
                    bill.synced_endpoints,
                    bill.last_sync_attempt.clone(),
                    bill.created_at.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, bill_id: &str) -> Result<Option<Bill>, DbError> {
        let mut rows = self
            .connection
            .query("SELECT * FROM bills WHERE bill_id = ?1", params![bill_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_bill(&row)?)),
            None => Ok(None),
        }
    }

    /// Actualiza únicamente la máscara de completitud y la marca de
    /// tiempo del último intento, sin tocar los campos de contenido.
    pub async fn update_synced_endpoints(
        &self,
        bill_id: &str,
        mask: i32,
        last_sync_attempt: &str,
    ) -> Result<(), DbError> {
        self.connection
            .execute(
                r#"
                UPDATE bills
                SET synced_endpoints = ?2, last_sync_attempt = ?3, updated_at = CURRENT_TIMESTAMP
                WHERE bill_id = ?1
                "#,
                params![bill_id, mask, last_sync_attempt],
            )
            .await?;
        Ok(())
    }

    /// Bills cuya máscara es `NULL` (legado, nunca calculado) o distinta
    /// de 31 (incompleta); candidatos para el Repair Worker. `congress`
    /// restringe opcionalmente la búsqueda a un único congreso.
    pub async fn list_incomplete(&self, congress: Option<i32>, limit: u32) -> Result<Vec<Bill>, DbError> {
        let mut rows = match congress {
            Some(congress) => {
                self.connection
                    .query(
                        r#"
                        SELECT * FROM bills
                        WHERE (synced_endpoints IS NULL OR synced_endpoints <> 31) AND congress = ?1
                        ORDER BY updated_at ASC
                        LIMIT ?2
                        "#,
                        params![congress, limit],
                    )
                    .await?
            }
            None => {
                self.connection
                    .query(
                        r#"
                        SELECT * FROM bills
                        WHERE synced_endpoints IS NULL OR synced_endpoints <> 31
                        ORDER BY updated_at ASC
                        LIMIT ?1
                        "#,
                        params![limit],
                    )
                    .await?
            }
        };

        let mut bills = Vec::new();
        while let Some(row) = rows.next().await? {
            bills.push(map_row_to_bill(&row)?);
        }
        Ok(bills)
    }

    /// Resumen `{total, complete, partial, legacy}` sobre
    /// `synced_endpoints`, opcionalmente restringido a un congreso;
    /// la única ventana de observabilidad que este núcleo expone
    /// directamente, per spec.md §7.
    pub async fn completeness(&self, congress: Option<i32>) -> Result<CompletenessSummary, DbError> {
        let mut rows = match congress {
            Some(congress) => {
                self.connection
                    .query(
                        r#"
                        SELECT
                            COUNT(*),
                            SUM(CASE WHEN synced_endpoints = 31 THEN 1 ELSE 0 END),
                            SUM(CASE WHEN synced_endpoints IS NOT NULL AND synced_endpoints <> 31 THEN 1 ELSE 0 END),
                            SUM(CASE WHEN synced_endpoints IS NULL THEN 1 ELSE 0 END)
                        FROM bills WHERE congress = ?1
                        "#,
                        params![congress],
                    )
                    .await?
            }
            None => {
                self.connection
                    .query(
                        r#"
                        SELECT
                            COUNT(*),
                            SUM(CASE WHEN synced_endpoints = 31 THEN 1 ELSE 0 END),
                            SUM(CASE WHEN synced_endpoints IS NOT NULL AND synced_endpoints <> 31 THEN 1 ELSE 0 END),
                            SUM(CASE WHEN synced_endpoints IS NULL THEN 1 ELSE 0 END)
                        FROM bills
                        "#,
                        params![],
                    )
                    .await?
            }
        };

        match rows.next().await? {
            Some(row) => Ok(CompletenessSummary {
                total: row.get(0)?,
                complete: row.get::<Option<i64>>(1)?.unwrap_or(0),
                partial: row.get::<Option<i64>>(2)?.unwrap_or(0),
                legacy: row.get::<Option<i64>>(3)?.unwrap_or(0),
            }),
            None => Ok(CompletenessSummary::default()),
        }
    }

    /// Todos los congresos con al menos un Bill almacenado, usado por el
    /// recómputo diario de agregados para saber qué congresos visitar.
    pub async fn distinct_congresses(&self) -> Result<Vec<i32>, DbError> {
        let mut rows = self
            .connection
            .query("SELECT DISTINCT congress FROM bills ORDER BY congress ASC", params![])
            .await?;
        let mut congresses = Vec::new();
        while let Some(row) = rows.next().await? {
            congresses.push(row.get(0)?);
        }
        Ok(congresses)
    }
}

fn map_row_to_bill(row: &Row) -> Result<Bill, DbError> {
    let bill_type_str: String = row.get(2)?;
    let bill_type: BillType = bill_type_str
        .parse()
        .map_err(|e: capitol_domain_models::bill::ParseBillTypeError| DbError::MappingError(e.to_string()))?;

    let sponsor_first_name: Option<String> = row.get(7)?;
    let sponsor_last_name: Option<String> = row.get(8)?;
    let sponsor_party: Option<String> = row.get(9)?;
    let sponsor_state: Option<String> = row.get(10)?;
    let sponsor = match (sponsor_first_name, sponsor_last_name, sponsor_party, sponsor_state) {
        (Some(first_name), Some(last_name), Some(party), Some(state)) => Some(SponsorSnapshot {
            first_name,
            last_name,
            party,
            state,
        }),
        _ => None,
    };

    let stage: i32 = row.get(11)?;

    Ok(Bill {
        bill_id: row.get(0)?,
        congress: row.get(1)?,
        bill_type,
        bill_number: row.get(3)?,
        title: row.get(4)?,
        title_without_number: row.get(5)?,
        introduced_date: row.get(6)?,
        sponsor,
        stage,
        stage_description: row.get(12)?,
        synced_endpoints: row.get(13)?,
        last_sync_attempt: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}
