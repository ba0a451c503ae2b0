use crate::errors::{PiletasError, PiletasResult};
use crate::models::{utc_now, BayAssignment, ShipmentSnapshot};
use crate::repositories::BayRepository;
use crate::services::DatabaseClient;
use async_trait::async_trait;
use sqlx_oldapi::Mssql;

/// A repository responsible for the fixed cooling-bay table in the database.
pub struct MssqlBayRepository {
    /// The database client used to interact with the database.
    client: DatabaseClient,
}

impl MssqlBayRepository {
    /// Creates a new `MssqlBayRepository`.
    ///
    /// # Arguments
    /// * `client`: The `DatabaseClient` to use for database operations.
    pub fn new(client: DatabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BayRepository for MssqlBayRepository {
    async fn fetch_all(&self) -> PiletasResult<Vec<BayAssignment>> {
        sqlx_oldapi::query_as::<_, BayAssignment>(
            r#"
            SELECT BAY_NUMBER, SHIPMENT_ID, CODE_GEN, ASSIGNED_AT, SHIPMENT_SNAPSHOT, UPDATED_AT
            FROM PILETAS
            ORDER BY BAY_NUMBER ASC
            "#,
        )
        .fetch_all(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)
    }

    /// Provisions the configured bay-number domain, inserting missing rows as free.
    async fn ensure_bays(&self, bay_numbers: &[i32]) -> PiletasResult<()> {
        let now = utc_now();
        for bay_number in bay_numbers {
            sqlx_oldapi::query::<Mssql>(
                r#"
                IF NOT EXISTS (SELECT 1 FROM PILETAS WHERE BAY_NUMBER = @p1)
                    INSERT INTO PILETAS (BAY_NUMBER, SHIPMENT_ID, CODE_GEN, ASSIGNED_AT, SHIPMENT_SNAPSHOT, UPDATED_AT)
                    VALUES (@p1, NULL, NULL, NULL, NULL, @p2)
                "#,
            )
            .bind(*bay_number)
            .bind(now)
            .execute(&*self.client.pool)
            .await
            .map_err(PiletasError::DatabaseError)?;
        }
        Ok(())
    }

    async fn release(&self, bay_number: i32) -> PiletasResult<()> {
        sqlx_oldapi::query::<Mssql>(
            r#"
            UPDATE PILETAS
            SET SHIPMENT_ID = NULL, CODE_GEN = NULL, ASSIGNED_AT = NULL, SHIPMENT_SNAPSHOT = NULL, UPDATED_AT = @p2
            WHERE BAY_NUMBER = @p1
            "#,
        )
        .bind(bay_number)
        .bind(utc_now())
        .execute(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)?;
        Ok(())
    }

    /// Grants the bay to the shipment with a conditional update.
    ///
    /// The `SHIPMENT_ID IS NULL` predicate makes the grant atomic at the row
    /// level: if another caller occupied the bay first, zero rows change and
    /// the grant fails with `BayConflict` instead of double-assigning.
    async fn assign(&self, bay_number: i32, snapshot: &ShipmentSnapshot) -> PiletasResult<()> {
        let now = utc_now();
        let snapshot_json = serde_json::to_string(snapshot)?;
        let result = sqlx_oldapi::query::<Mssql>(
            r#"
            UPDATE PILETAS
            SET SHIPMENT_ID = @p2, CODE_GEN = @p3, ASSIGNED_AT = @p4, SHIPMENT_SNAPSHOT = @p5, UPDATED_AT = @p4
            WHERE BAY_NUMBER = @p1 AND SHIPMENT_ID IS NULL
            "#,
        )
        .bind(bay_number)
        .bind(snapshot.shipment_id)
        .bind(&snapshot.code_gen)
        .bind(now)
        .bind(&snapshot_json)
        .execute(&*self.client.pool)
        .await
        .map_err(PiletasError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(PiletasError::BayConflict(format!(
                "bay {} is no longer free; shipment {} was not assigned",
                bay_number, snapshot.shipment_id
            )));
        }
        Ok(())
    }
}
