// [libs/infra/db/src/repositories/summary.rs]
/*!
 * APARATO: BILL SUMMARY REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Un resumen entrante solo reemplaza al almacenado para
 * la misma `(bill_id, version_code)` si su `update_date` es
 * estrictamente posterior; de lo contrario la escritura se descarta en
 * silencio, ya que congress.gov puede reenviar la misma versión sin
 * cambios en ráfagas de reparación.
 */

use capitol_domain_models::summary::BillSummary;
use libsql::{params, Connection};

use crate::errors::DbError;

pub struct SummaryRepository {
    connection: Connection,
}

impl SummaryRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn upsert_if_newer(&self, summary: &BillSummary) -> Result<bool, DbError> {
        let affected = self
            .connection
            .execute(
                r#"
                INSERT INTO bill_summaries (bill_id, version_code, action_date, action_desc, text, update_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(bill_id, version_code) DO UPDATE SET
                    action_date = excluded.action_date,
                    action_desc = excluded.action_desc,
                    text = excluded.text,
                    update_date = excluded.update_date
                WHERE excluded.update_date > bill_summaries.update_date
                "#,
                params![
                    summary.bill_id.clone(),
                    summary.version_code.clone(),
                    summary.action_date.clone(),
                    summary.action_desc.clone(),
                    summary.text.clone(),
                    summary.update_date.clone(),
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn list_for_bill(&self, bill_id: &str) -> Result<Vec<BillSummary>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT bill_id, version_code, action_date, action_desc, text, update_date \
                 FROM bill_summaries WHERE bill_id = ?1 ORDER BY update_date ASC",
                params![bill_id],
            )
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            summaries.push(BillSummary {
                bill_id: row.get(0)?,
                version_code: row.get(1)?,
                action_date: row.get(2)?,
                action_desc: row.get(3)?,
                text: row.get(4)?,
                update_date: row.get(5)?,
            });
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn test_connection() -> Connection {
        let db = Builder::new_local("file::memory:?cache=shared").build().await.unwrap();
        let conn = db.connect().unwrap();
        crate::schema::apply_full_schema(&conn).await.unwrap();
        conn
    }

    fn summary(update_date: &str, text: &str) -> BillSummary {
        BillSummary {
            bill_id: "1hr119".into(),
            version_code: "00".into(),
            action_date: "2025-01-01".into(),
            action_desc: "Introduced in House".into(),
            text: text.into(),
            update_date: update_date.into(),
        }
    }

    #[tokio::test]
    async fn newer_update_date_overwrites_text() {
        let repo = SummaryRepository::new(test_connection().await);
        repo.upsert_if_newer(&summary("2025-01-01", "first draft"))
            .await
            .unwrap();
        repo.upsert_if_newer(&summary("2025-02-01", "revised draft"))
            .await
            .unwrap();

        let stored = repo.list_for_bill("1hr119").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].text, "revised draft");
    }

    #[tokio::test]
    async fn stale_or_equal_update_date_is_discarded() {
        let repo = SummaryRepository::new(test_connection().await);
        repo.upsert_if_newer(&summary("2025-02-01", "revised draft"))
            .await
            .unwrap();
        let changed = repo
            .upsert_if_newer(&summary("2025-01-01", "stale draft"))
            .await
            .unwrap();

        assert!(!changed);
        let stored = repo.list_for_bill("1hr119").await.unwrap();
        assert_eq!(stored[0].text, "revised draft");
    }
}
