// [libs/infra/db/src/repositories/subject.rs]
/*!
 * APARATO: BILL SUBJECT REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: A lo sumo un área de política por Bill; cada
 * sincronización reemplaza el valor anterior sin acumulación.
 */

use capitol_domain_models::subject::BillSubject;
use libsql::{params, Connection};

use crate::errors::DbError;

pub struct SubjectRepository {
    connection: Connection,
}

impl SubjectRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn upsert(&self, subject: &BillSubject) -> Result<(), DbError> {
        self.connection
            .execute(
                r#"
                INSERT INTO bill_subjects (bill_id, policy_area_name, policy_area_update_date)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(bill_id) DO UPDATE SET
                    policy_area_name = excluded.policy_area_name,
                    policy_area_update_date = excluded.policy_area_update_date
                "#,
                params![
                    subject.bill_id.clone(),
                    subject.policy_area_name.clone(),
                    subject.policy_area_update_date.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, bill_id: &str) -> Result<Option<BillSubject>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT bill_id, policy_area_name, policy_area_update_date FROM bill_subjects WHERE bill_id = ?1",
                params![bill_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(BillSubject {
                bill_id: row.get(0)?,
                policy_area_name: row.get(1)?,
                policy_area_update_date: row.get(2)?,
            })),
            None => Ok(None),
        }
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

    #[tokio::test]
    async fn upsert_replaces_previous_policy_area() {
        let repo = SubjectRepository::new(test_connection().await);
        repo.upsert(&BillSubject {
            bill_id: "1hr119".into(),
            policy_area_name: "Agriculture".into(),
            policy_area_update_date: Some("2025-01-01".into()),
        })
        .await
        .unwrap();

        repo.upsert(&BillSubject {
            bill_id: "1hr119".into(),
            policy_area_name: "Commerce".into(),
            policy_area_update_date: Some("2025-02-01".into()),
        })
        .await
        .unwrap();

        let fetched = repo.get("1hr119").await.unwrap().unwrap();
        assert_eq!(fetched.policy_area_name, "Commerce");
    }
}
