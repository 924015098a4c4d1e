// [libs/infra/db/src/repositories/stats.rs]
/*!
 * APARATO: CONGRESS STATS REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: Recómputo atómico de los agregados por congreso a
 * partir de `bills`/`bill_subjects`, y su persistencia en una única
 * fila por congreso. No es un libro de contabilidad incremental: cada
 * corrida recalcula desde cero y reemplaza la fila anterior.
 */

use capitol_domain_models::stats::{CongressStats, PolicyAreaCount, SponsorCount, StageCounts, TimelineMetric};
use libsql::{params, Connection};

use crate::errors::DbError;

const TOP_N: i64 = 10;

pub struct StatsRepository {
    connection: Connection,
}

impl StatsRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Recalcula todos los agregados para un congreso y los persiste
    /// atómicamente en `congress_stats`, reemplazando la fila anterior.
    pub async fn recompute(&self, congress: i32) -> Result<CongressStats, DbError> {
        let (total_count, house_count, senate_count) = self.chamber_counts(congress).await?;
        let stage_counts = self.stage_counts(congress).await?;
        let top_policy_areas = self.top_policy_areas(congress).await?;
        let top_sponsors = self.top_sponsors(congress).await?;
        let timeline_metrics = self.timeline_metrics(congress).await?;

        let stats = CongressStats {
            congress,
            total_count,
            house_count,
            senate_count,
            stage_counts,
            top_policy_areas,
            top_sponsors,
            timeline_metrics,
            updated_at: String::new(),
        };

        self.connection
            .execute(
                r#"
                INSERT INTO congress_stats (
                    congress, total_count, house_count, senate_count,
                    stage_counts_json, top_policy_areas_json, top_sponsors_json, timeline_metrics_json,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, CURRENT_TIMESTAMP)
                ON CONFLICT(congress) DO UPDATE SET
                    total_count = excluded.total_count,
                    house_count = excluded.house_count,
                    senate_count = excluded.senate_count,
                    stage_counts_json = excluded.stage_counts_json,
                    top_policy_areas_json = excluded.top_policy_areas_json,
                    top_sponsors_json = excluded.top_sponsors_json,
                    timeline_metrics_json = excluded.timeline_metrics_json,
                    updated_at = CURRENT_TIMESTAMP
                "#,
                params![
                    stats.congress,
                    stats.total_count,
                    stats.house_count,
                    stats.senate_count,
                    serde_json::to_string(&stats.stage_counts)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    serde_json::to_string(&stats.top_policy_areas)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    serde_json::to_string(&stats.top_sponsors)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    serde_json::to_string(&stats.timeline_metrics)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                ],
            )
            .await?;

        self.get(congress)
            .await?
            .ok_or_else(|| DbError::MappingError("stats row vanished after write".into()))
    }

    pub async fn get(&self, congress: i32) -> Result<Option<CongressStats>, DbError> {
        let mut rows = self
            .connection
            .query("SELECT * FROM congress_stats WHERE congress = ?1", params![congress])
            .await?;

        match rows.next().await? {
            Some(row) => {
                let stage_counts_json: String = row.get(4)?;
                let top_policy_areas_json: String = row.get(5)?;
                let top_sponsors_json: String = row.get(6)?;
                let timeline_metrics_json: String = row.get(7)?;

                Ok(Some(CongressStats {
                    congress: row.get(0)?,
                    total_count: row.get(1)?,
                    house_count: row.get(2)?,
                    senate_count: row.get(3)?,
                    stage_counts: serde_json::from_str(&stage_counts_json)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    top_policy_areas: serde_json::from_str(&top_policy_areas_json)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    top_sponsors: serde_json::from_str(&top_sponsors_json)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    timeline_metrics: serde_json::from_str(&timeline_metrics_json)
                        .map_err(|e| DbError::MappingError(e.to_string()))?,
                    updated_at: row.get(8)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn chamber_counts(&self, congress: i32) -> Result<(i64, i64, i64), DbError> {
        let mut rows = self
            .connection
            .query(
                r#"
                SELECT
                    COUNT(*),
                    SUM(CASE WHEN bill_type IN ('hr', 'hjres', 'hconres', 'hres') THEN 1 ELSE 0 END),
                    SUM(CASE WHEN bill_type IN ('s', 'sjres', 'sconres', 'sres') THEN 1 ELSE 0 END)
                FROM bills WHERE congress = ?1
                "#,
                params![congress],
            )
            .await?;
        let row = rows.next().await?;
        match row {
            Some(row) => Ok((
                row.get(0)?,
                row.get::<Option<i64>>(1)?.unwrap_or(0),
                row.get::<Option<i64>>(2)?.unwrap_or(0),
            )),
            None => Ok((0, 0, 0)),
        }
    }

    async fn stage_counts(&self, congress: i32) -> Result<StageCounts, DbError> {
        let mut counts = StageCounts::default();
        let mut rows = self
            .connection
            .query(
                "SELECT stage, COUNT(*) FROM bills WHERE congress = ?1 GROUP BY stage",
                params![congress],
            )
            .await?;

        while let Some(row) = rows.next().await? {
            let stage: i32 = row.get(0)?;
            let count: i64 = row.get(1)?;
            match stage {
                20 => counts.introduced = count,
                40 => counts.in_committee = count,
                60 => counts.passed_one_chamber = count,
                80 => counts.passed_both_chambers = count,
                85 => counts.vetoed = count,
                90 => counts.to_president = count,
                95 => counts.signed = count,
                100 => counts.became_law = count,
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn top_policy_areas(&self, congress: i32) -> Result<Vec<PolicyAreaCount>, DbError> {
        let mut rows = self
            .connection
            .query(
                r#"
                SELECT s.policy_area_name, COUNT(*) AS n
                FROM bill_subjects s
                JOIN bills b ON b.bill_id = s.bill_id
                WHERE b.congress = ?1
                GROUP BY s.policy_area_name
                ORDER BY n DESC, s.policy_area_name ASC
                LIMIT ?2
                "#,
                params![congress, TOP_N],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(PolicyAreaCount {
                name: row.get(0)?,
                count: row.get(1)?,
            });
        }
        Ok(out)
    }

    async fn top_sponsors(&self, congress: i32) -> Result<Vec<SponsorCount>, DbError> {
        let mut rows = self
            .connection
            .query(
                r#"
                SELECT sponsor_first_name, sponsor_last_name, sponsor_party, sponsor_state, COUNT(*) AS n
                FROM bills
                WHERE congress = ?1 AND sponsor_last_name IS NOT NULL
                GROUP BY sponsor_first_name, sponsor_last_name, sponsor_party, sponsor_state
                ORDER BY n DESC
                LIMIT ?2
                "#,
                params![congress, TOP_N],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let first_name: String = row.get(0)?;
            let last_name: String = row.get(1)?;
            out.push(SponsorCount {
                name: format!("{first_name} {last_name}"),
                party: row.get(2)?,
                state: row.get(3)?,
                count: row.get(4)?,
            });
        }
        Ok(out)
    }

    /// Para cada etapa ocupada por al menos un Bill del congreso,
    /// promedio de días transcurridos entre `introduced_date` y la
    /// última actualización del Bill (la mejor aproximación disponible
    /// al tiempo hasta esa etapa, sin una tabla de historial de etapas).
    async fn timeline_metrics(&self, congress: i32) -> Result<Vec<TimelineMetric>, DbError> {
        let mut rows = self
            .connection
            .query(
                r#"
                SELECT stage, AVG(julianday(updated_at) - julianday(introduced_date)) AS avg_days
                FROM bills
                WHERE congress = ?1 AND introduced_date <> ''
                GROUP BY stage
                ORDER BY stage ASC
                "#,
                params![congress],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(TimelineMetric {
                stage: row.get(0)?,
                average_days_from_introduction: row.get::<Option<f64>>(1)?.unwrap_or(0.0),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::bill::BillRepository;
    use capitol_domain_models::bill::{Bill, BillType, SponsorSnapshot, Stage};
    use libsql::Builder;

    async fn test_database() -> libsql::Database {
        let db = Builder::new_local("file::memory:?cache=shared").build().await.unwrap();
        let conn = db.connect().unwrap();
        crate::schema::apply_full_schema(&conn).await.unwrap();
        db
    }

    fn bill(id: &str, bill_type: BillType, stage: i32, party: &str) -> Bill {
        Bill {
            bill_id: id.into(),
            congress: 119,
            bill_type,
            bill_number: 1,
            title: "Sample".into(),
            title_without_number: "Sample".into(),
            introduced_date: "2025-01-01".into(),
            sponsor: Some(SponsorSnapshot {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                party: party.into(),
                state: "CA".into(),
            }),
            stage,
            stage_description: Stage(stage).description().to_string(),
            synced_endpoints: Some(31),
            last_sync_attempt: None,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-10T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn recompute_splits_house_and_senate_counts() {
        let db = test_database().await;
        let bills = BillRepository::new(db.connect().unwrap());
        bills.upsert(&bill("1hr119", BillType::Hr, 20, "D")).await.unwrap();
        bills.upsert(&bill("2s119", BillType::S, 40, "R")).await.unwrap();

        let stats = StatsRepository::new(db.connect().unwrap()).recompute(119).await.unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.house_count, 1);
        assert_eq!(stats.senate_count, 1);
        assert_eq!(stats.stage_counts.introduced, 1);
        assert_eq!(stats.stage_counts.in_committee, 1);
    }

    #[tokio::test]
    async fn recompute_is_idempotent_and_overwrites_prior_row() {
        let db = test_database().await;
        let bills = BillRepository::new(db.connect().unwrap());
        bills.upsert(&bill("1hr119", BillType::Hr, 20, "D")).await.unwrap();

        let repo = StatsRepository::new(db.connect().unwrap());
        repo.recompute(119).await.unwrap();
        bills.upsert(&bill("2hr119", BillType::Hr, 20, "D")).await.unwrap();
        let second = repo.recompute(119).await.unwrap();

        assert_eq!(second.total_count, 2);
        let fetched = repo.get(119).await.unwrap().unwrap();
        assert_eq!(fetched.total_count, 2);
    }
}
