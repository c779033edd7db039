//! Postgres-backed resource store.

use crate::db::{
    errors::{DbError, Result},
    handlers::store::ResourceStore,
    models::resources::{Image, ResourceCreateDBRequest, ResourceDBResponse, ResourceUpdateDBRequest, Review},
};
use crate::query::ResourceQuery;
use crate::reviews::ReviewSummary;
use crate::types::{ResourceId, ResourceKind, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, types::Json};
use tracing::instrument;

const COLUMNS: &str =
    "id, name, description, phone_no, address, ratings, images, category, num_of_reviews, reviews, user_id, created_at, version";

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub phone_no: i64,
    pub address: String,
    pub ratings: f64,
    pub images: Json<Vec<Image>>,
    pub category: String,
    pub num_of_reviews: i32,
    pub reviews: Json<Vec<Review>>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl From<Resource> for ResourceDBResponse {
    fn from(row: Resource) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            phone_no: row.phone_no,
            address: row.address,
            ratings: row.ratings,
            images: row.images.0,
            category: row.category,
            num_of_reviews: row.num_of_reviews,
            reviews: row.reviews.0,
            created_by: row.user_id,
            created_at: row.created_at,
            version: row.version,
        }
    }
}

/// One table per [`ResourceKind`], named after [`ResourceKind::collection`].
#[derive(Debug, Clone)]
pub struct PgResourceStore {
    pool: PgPool,
}

impl PgResourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select(kind: ResourceKind) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM {}", kind.collection()))
    }
}

#[async_trait::async_trait]
impl ResourceStore for PgResourceStore {
    #[instrument(skip(self, request), fields(kind = %kind, name = %request.name), err)]
    async fn create(&self, kind: ResourceKind, request: &ResourceCreateDBRequest) -> Result<ResourceDBResponse> {
        let sql = format!(
            r#"
            INSERT INTO {} (name, description, phone_no, address, images, category, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#,
            kind.collection()
        );

        let row = sqlx::query_as::<_, Resource>(&sql)
            .bind(&request.name)
            .bind(&request.description)
            .bind(request.phone_no)
            .bind(&request.address)
            .bind(Json(&request.images))
            .bind(&request.category)
            .bind(request.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(kind = %kind, resource_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, kind: ResourceKind, id: ResourceId) -> Result<Option<ResourceDBResponse>> {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", kind.collection());

        let row = sqlx::query_as::<_, Resource>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, query), fields(kind = %kind), err)]
    async fn list(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<Vec<ResourceDBResponse>> {
        let mut builder = Self::select(kind);
        query.push_where(&mut builder);
        builder.push(" ORDER BY created_at ASC, id ASC");
        query.push_window(&mut builder);

        let rows = builder.build_query_as::<Resource>().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, query), fields(kind = %kind), err)]
    async fn count(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<i64> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", kind.collection()));
        query.push_where(&mut builder);

        let count = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(count)
    }

    #[instrument(skip(self, request), fields(kind = %kind, resource_id = %abbrev_uuid(&id)), err)]
    async fn update(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        expected_version: Option<i64>,
        request: &ResourceUpdateDBRequest,
    ) -> Result<ResourceDBResponse> {
        // COALESCE keeps the stored value for every field left as None
        let sql = format!(
            r#"
            UPDATE {} SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                phone_no = COALESCE($4, phone_no),
                address = COALESCE($5, address),
                category = COALESCE($6, category),
                images = COALESCE($7, images),
                version = version + 1
            WHERE id = $1 AND ($8::BIGINT IS NULL OR version = $8)
            RETURNING {COLUMNS}
            "#,
            kind.collection()
        );

        let row = sqlx::query_as::<_, Resource>(&sql)
            .bind(id)
            .bind(request.name.as_ref())
            .bind(request.description.as_ref())
            .bind(request.phone_no)
            .bind(request.address.as_ref())
            .bind(request.category.as_ref())
            .bind(request.images.as_ref().map(Json))
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                let exists_sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", kind.collection());
                let exists = sqlx::query_scalar::<_, bool>(&exists_sql)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
                Err(if exists { DbError::StaleVersion } else { DbError::NotFound })
            }
        }
    }

    #[instrument(skip(self, summary), fields(kind = %kind, resource_id = %abbrev_uuid(&id), reviews = summary.num_of_reviews), err)]
    async fn save_reviews(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        expected_version: i64,
        summary: &ReviewSummary,
    ) -> Result<bool> {
        let sql = format!(
            r#"
            UPDATE {} SET
                reviews = $3,
                ratings = $4,
                num_of_reviews = $5,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
            kind.collection()
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(Json(&summary.reviews))
            .bind(summary.ratings)
            .bind(summary.num_of_reviews)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(kind = %kind, resource_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, kind: ResourceKind, id: ResourceId) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.collection());

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }
}
