use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::tours::dto::{CreateTourRequest, UpdateTourRequest};
use crate::tours::query::QueryFeatures;
use crate::tours::repo_types::Tour;

const TOUR_COLUMNS: &str = "id, name, duration, max_group_size, difficulty, price, \
     ratings_average, ratings_quantity, summary, description, created_at, row_version";

impl Tour {
    pub async fn list(db: &PgPool, features: &QueryFeatures) -> Result<Vec<Tour>, sqlx::Error> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {TOUR_COLUMNS} FROM tours"));
        features.apply(&mut qb);
        qb.build_query_as::<Tour>().fetch_all(db).await
    }

    pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Tour>, sqlx::Error> {
        sqlx::query_as::<_, Tour>(&format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &PgPool, req: &CreateTourRequest) -> Result<Tour, sqlx::Error> {
        sqlx::query_as::<_, Tour>(&format!(
            "INSERT INTO tours (name, duration, max_group_size, difficulty, price, summary, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TOUR_COLUMNS}"
        ))
        .bind(req.name.trim())
        .bind(req.duration)
        .bind(req.max_group_size)
        .bind(&req.difficulty)
        .bind(req.price)
        .bind(&req.summary)
        .bind(&req.description)
        .fetch_one(db)
        .await
    }

    /// Partial update; absent fields keep their stored value. Bumps
    /// `row_version` on every write.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        req: &UpdateTourRequest,
    ) -> Result<Option<Tour>, sqlx::Error> {
        sqlx::query_as::<_, Tour>(&format!(
            "UPDATE tours SET \
                 name = COALESCE($2, name), \
                 duration = COALESCE($3, duration), \
                 max_group_size = COALESCE($4, max_group_size), \
                 difficulty = COALESCE($5, difficulty), \
                 price = COALESCE($6, price), \
                 summary = COALESCE($7, summary), \
                 description = COALESCE($8, description), \
                 row_version = row_version + 1 \
             WHERE id = $1 \
             RETURNING {TOUR_COLUMNS}"
        ))
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.duration)
        .bind(req.max_group_size)
        .bind(&req.difficulty)
        .bind(req.price)
        .bind(&req.summary)
        .bind(&req.description)
        .fetch_optional(db)
        .await
    }

    /// Returns false when no row matched.
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
