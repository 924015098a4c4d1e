// [libs/infra/db/src/repositories/action.rs]
/*!
 * APARATO: BILL ACTION REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: El historial de acciones de un Bill se trata como un
 * conjunto reemplazable en cada sincronización: se vacía y se reinserta
 * completo dentro de una transacción, evitando acumular duplicados
 * cuando congress.gov reordena o corrige entradas pasadas.
 */

use capitol_domain_models::action::BillAction;
use libsql::{params, Connection};
use tracing::instrument;

use crate::errors::DbError;

pub struct ActionRepository {
    connection: Connection,
}

impl ActionRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, actions))]
    pub async fn replace_all(&self, bill_id: &str, actions: &[BillAction]) -> Result<(), DbError> {
        let tx = self
            .connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        tx.execute("DELETE FROM bill_actions WHERE bill_id = ?1", params![bill_id])
            .await?;

        for action in actions {
            tx.execute(
                r#"
                INSERT INTO bill_actions (
                    bill_id, action_code, action_date,
                    source_system_code, source_system_name, text, action_type
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    action.bill_id.clone(),
                    action.action_code.clone(),
                    action.action_date.clone(),
                    action.source_system_code,
                    action.source_system_name.clone(),
                    action.text.clone(),
                    action.action_type.clone(),
                ],
            )
            .await?;
        }

        tx.commit().await.map_err(|_| DbError::TransactionError)?;
        Ok(())
    }

    pub async fn list_for_bill(&self, bill_id: &str) -> Result<Vec<BillAction>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT bill_id, action_code, action_date, source_system_code, source_system_name, text, action_type \
                 FROM bill_actions WHERE bill_id = ?1 ORDER BY action_date ASC",
                params![bill_id],
            )
            .await?;

        let mut actions = Vec::new();
        while let Some(row) = rows.next().await? {
            actions.push(BillAction {
                bill_id: row.get(0)?,
                action_code: row.get(1)?,
                action_date: row.get(2)?,
                source_system_code: row.get(3)?,
                source_system_name: row.get(4)?,
                text: row.get(5)?,
                action_type: row.get(6)?,
            });
        }
        Ok(actions)
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

    fn action(code: &str, date: &str) -> BillAction {
        BillAction {
            bill_id: "1hr119".into(),
            action_code: code.into(),
            action_date: date.into(),
            source_system_code: Some(9),
            source_system_name: Some("House".into()),
            text: "Referred to committee".into(),
            action_type: None,
        }
    }

    #[tokio::test]
    async fn replace_all_clears_previous_rows() {
        let repo = ActionRepository::new(test_connection().await);
        repo.replace_all("1hr119", &[action("5000", "2025-01-03")])
            .await
            .unwrap();
        repo.replace_all(
            "1hr119",
            &[action("5000", "2025-01-03"), action("14000", "2025-02-01")],
        )
        .await
        .unwrap();

        let stored = repo.list_for_bill("1hr119").await.unwrap();
        assert_eq!(stored.len(), 2);
    }
}
