use crate::errors::{PiletasError, PiletasResult};
use crate::models::{CategoryCount, Timer};
use crate::repositories::TimerRepository;
use crate::services::DatabaseClient;
use async_trait::async_trait;
use sqlx_oldapi::Mssql;

/// A repository responsible for the active-timer table in the database.
pub struct MssqlTimerRepository {
    /// The database client used to interact with the database.
    client: DatabaseClient,
}

impl MssqlTimerRepository {
    /// Creates a new `MssqlTimerRepository`.
    ///
    /// # Arguments
    /// * `client`: The `DatabaseClient` to use for database operations.
    pub fn new(client: DatabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TimerRepository for MssqlTimerRepository {
    /// Upserts a timer row keyed by its identifier.
    ///
    /// An existing row has its start instant overwritten; that last-write-wins
    /// semantics is the documented re-arm contract, not a conflict.
    async fn upsert(&self, timer: &Timer) -> PiletasResult<()> {
        let mut tx = self
            .client
            .pool
            .begin()
            .await
            .map_err(PiletasError::DatabaseError)?;

        let update = r#"
            UPDATE PILETA_TIMERS
            SET CODE_GEN = @p2, SHIPMENT_ID = @p3, TIMER_CATEGORY = @p4, UNIT_TYPE = @p5,
                STARTED_AT_UTC = @p6, UTC_OFFSET_MINUTES = @p7
            WHERE TIMER_ID = @p1
        "#;

        let updated = sqlx_oldapi::query::<Mssql>(update)
            .bind(&timer.timer_id)
            .bind(&timer.code_gen)
            .bind(timer.shipment_id)
            .bind(&timer.timer_category)
            .bind(&timer.unit_type)
            .bind(timer.started_at_utc)
            .bind(timer.utc_offset_minutes)
            .execute(&mut tx)
            .await
            .map_err(PiletasError::DatabaseError)?;

        if updated.rows_affected() == 0 {
            let insert = r#"
                INSERT INTO PILETA_TIMERS
                (TIMER_ID, CODE_GEN, SHIPMENT_ID, TIMER_CATEGORY, UNIT_TYPE, STARTED_AT_UTC, UTC_OFFSET_MINUTES)
                VALUES
                (@p1, @p2, @p3, @p4, @p5, @p6, @p7)
            "#;

            sqlx_oldapi::query::<Mssql>(insert)
                .bind(&timer.timer_id)
                .bind(&timer.code_gen)
                .bind(timer.shipment_id)
                .bind(&timer.timer_category)
                .bind(&timer.unit_type)
                .bind(timer.started_at_utc)
                .bind(timer.utc_offset_minutes)
                .execute(&mut tx)
                .await
                .map_err(PiletasError::DatabaseError)?;
        }

        tx.commit().await.map_err(PiletasError::DatabaseError)?;
        Ok(())
    }

    async fn delete(&self, timer_id: &str) -> PiletasResult<bool> {
        let result = sqlx_oldapi::query::<Mssql>("DELETE FROM PILETA_TIMERS WHERE TIMER_ID = @p1")
            .bind(timer_id)
            .execute(&*self.client.pool)
            .await
            .map_err(PiletasError::DatabaseError)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, timer_id: &str) -> PiletasResult<Option<Timer>> {
        sqlx_oldapi::query_as::<_, Timer>(
            r#"
            SELECT TIMER_ID, CODE_GEN, SHIPMENT_ID, TIMER_CATEGORY, UNIT_TYPE, STARTED_AT_UTC, UTC_OFFSET_MINUTES
            FROM PILETA_TIMERS
            WHERE TIMER_ID = @p1
            "#,
        )
        .bind(timer_id)
        .fetch_optional(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)
    }

    async fn find_by_category(&self, timer_category: &str) -> PiletasResult<Vec<Timer>> {
        sqlx_oldapi::query_as::<_, Timer>(
            r#"
            SELECT TIMER_ID, CODE_GEN, SHIPMENT_ID, TIMER_CATEGORY, UNIT_TYPE, STARTED_AT_UTC, UTC_OFFSET_MINUTES
            FROM PILETA_TIMERS
            WHERE TIMER_CATEGORY = @p1
            "#,
        )
        .bind(timer_category)
        .fetch_all(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> PiletasResult<u64> {
        let result =
            sqlx_oldapi::query::<Mssql>("DELETE FROM PILETA_TIMERS WHERE SHIPMENT_ID = @p1")
                .bind(shipment_id)
                .execute(&*self.client.pool)
                .await
                .map_err(PiletasError::DatabaseError)?;
        Ok(result.rows_affected())
    }

    async fn count_by_category(&self) -> PiletasResult<Vec<CategoryCount>> {
        sqlx_oldapi::query_as::<_, CategoryCount>(
            r#"
            SELECT TIMER_CATEGORY, COUNT_BIG(*) AS ACTIVE
            FROM PILETA_TIMERS
            GROUP BY TIMER_CATEGORY
            "#,
        )
        .fetch_all(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)
    }
}
