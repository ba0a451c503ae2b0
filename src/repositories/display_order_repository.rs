use crate::errors::{PiletasError, PiletasResult};
use crate::models::{utc_now, DisplayOrderEntry, DisplayOrderRow};
use crate::repositories::DisplayOrderRepository;
use crate::services::DatabaseClient;
use async_trait::async_trait;
use sqlx_oldapi::Mssql;

/// A repository responsible for the display-order table in the database.
pub struct MssqlDisplayOrderRepository {
    /// The database client used to interact with the database.
    client: DatabaseClient,
}

impl MssqlDisplayOrderRepository {
    /// Creates a new `MssqlDisplayOrderRepository`.
    ///
    /// # Arguments
    /// * `client`: The `DatabaseClient` to use for database operations.
    pub fn new(client: DatabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DisplayOrderRepository for MssqlDisplayOrderRepository {
    /// Upserts the shipment's position within its timer category.
    async fn upsert(&self, entry: &DisplayOrderEntry) -> PiletasResult<()> {
        let now = utc_now();
        let mut tx = self
            .client
            .pool
            .begin()
            .await
            .map_err(PiletasError::DatabaseError)?;

        let update = r#"
            UPDATE PILETA_DISPLAY_ORDER
            SET CODE_GEN = @p3, DISPLAY_ORDER = @p4, LIFECYCLE_STATUS = @p5, UPDATED_AT = @p6
            WHERE SHIPMENT_ID = @p1 AND TIMER_CATEGORY = @p2
        "#;

        let updated = sqlx_oldapi::query::<Mssql>(update)
            .bind(entry.shipment_id)
            .bind(&entry.timer_category)
            .bind(&entry.code_gen)
            .bind(entry.display_order)
            .bind(entry.lifecycle_status)
            .bind(now)
            .execute(&mut tx)
            .await
            .map_err(PiletasError::DatabaseError)?;

        if updated.rows_affected() == 0 {
            let insert = r#"
                INSERT INTO PILETA_DISPLAY_ORDER
                (SHIPMENT_ID, CODE_GEN, TIMER_CATEGORY, DISPLAY_ORDER, LIFECYCLE_STATUS, CREATED_AT, UPDATED_AT)
                VALUES
                (@p1, @p2, @p3, @p4, @p5, @p6, @p6)
            "#;

            sqlx_oldapi::query::<Mssql>(insert)
                .bind(entry.shipment_id)
                .bind(&entry.code_gen)
                .bind(&entry.timer_category)
                .bind(entry.display_order)
                .bind(entry.lifecycle_status)
                .bind(now)
                .execute(&mut tx)
                .await
                .map_err(PiletasError::DatabaseError)?;
        }

        tx.commit().await.map_err(PiletasError::DatabaseError)?;
        Ok(())
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> PiletasResult<u64> {
        let result =
            sqlx_oldapi::query::<Mssql>("DELETE FROM PILETA_DISPLAY_ORDER WHERE SHIPMENT_ID = @p1")
                .bind(shipment_id)
                .execute(&*self.client.pool)
                .await
                .map_err(PiletasError::DatabaseError)?;
        Ok(result.rows_affected())
    }

    /// Deletes rows in the category for shipments that left the candidate set.
    ///
    /// Row ids are resolved first so the delete list can be bound one id at a
    /// time instead of splicing a dynamic `IN` clause into the statement.
    async fn retain_shipments(
        &self,
        timer_category: &str,
        shipment_ids: &[i64],
    ) -> PiletasResult<u64> {
        let rows = self.fetch_by_category(timer_category).await?;
        let mut removed = 0u64;
        for row in rows {
            if shipment_ids.contains(&row.shipment_id) {
                continue;
            }
            let result =
                sqlx_oldapi::query::<Mssql>("DELETE FROM PILETA_DISPLAY_ORDER WHERE ID = @p1")
                    .bind(row.id)
                    .execute(&*self.client.pool)
                    .await
                    .map_err(PiletasError::DatabaseError)?;
            removed += result.rows_affected();
        }
        Ok(removed)
    }

    async fn fetch_by_category(&self, timer_category: &str) -> PiletasResult<Vec<DisplayOrderRow>> {
        sqlx_oldapi::query_as::<_, DisplayOrderRow>(
            r#"
            SELECT ID, SHIPMENT_ID, CODE_GEN, TIMER_CATEGORY, DISPLAY_ORDER, LIFECYCLE_STATUS, CREATED_AT, UPDATED_AT
            FROM PILETA_DISPLAY_ORDER
            WHERE TIMER_CATEGORY = @p1
            ORDER BY DISPLAY_ORDER ASC
            "#,
        )
        .bind(timer_category)
        .fetch_all(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)
    }
}
