// [libs/infra/db/src/repositories/text.rs]
/*!
 * APARATO: BILL TEXT REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Las versiones de texto son inmutables una vez
 * almacenadas; una fila con la misma `(bill_id, date, version_type)`
 * nunca se sobrescribe, solo se ignora.
 */

use capitol_domain_models::text::BillText;
use libsql::{params, Connection};

use crate::errors::DbError;

pub struct TextRepository {
    connection: Connection,
}

impl TextRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn insert_if_absent(&self, text: &BillText) -> Result<(), DbError> {
        self.connection
            .execute(
                r#"
                INSERT OR IGNORE INTO bill_texts (bill_id, date, version_type, text_url, pdf_url)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    text.bill_id.clone(),
                    text.date.clone(),
                    text.version_type.clone(),
                    text.text_url.clone(),
                    text.pdf_url.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_for_bill(&self, bill_id: &str) -> Result<Vec<BillText>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT bill_id, date, version_type, text_url, pdf_url \
                 FROM bill_texts WHERE bill_id = ?1 ORDER BY date ASC",
                params![bill_id],
            )
            .await?;

        let mut texts = Vec::new();
        while let Some(row) = rows.next().await? {
            texts.push(BillText {
                bill_id: row.get(0)?,
                date: row.get(1)?,
                version_type: row.get(2)?,
                text_url: row.get(3)?,
                pdf_url: row.get(4)?,
            });
        }
        Ok(texts)
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

    fn text(pdf_url: &str) -> BillText {
        BillText {
            bill_id: "1hr119".into(),
            date: "2025-01-01".into(),
            version_type: "Introduced in House".into(),
            text_url: Some("https://example.test/text".into()),
            pdf_url: Some(pdf_url.into()),
        }
    }

    #[tokio::test]
    async fn second_insert_with_same_key_is_ignored() {
        let repo = TextRepository::new(test_connection().await);
        repo.insert_if_absent(&text("https://example.test/v1.pdf"))
            .await
            .unwrap();
        repo.insert_if_absent(&text("https://example.test/v2-should-not-land.pdf"))
            .await
            .unwrap();

        let stored = repo.list_for_bill("1hr119").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].pdf_url.as_deref(), Some("https://example.test/v1.pdf"));
    }
}
