//! Listing Repository
//!
//! Handles all database operations related to listings.

use async_trait::async_trait;
use sqlx::PgPool;
use voluntar_core::domain::listing::Listing;

use super::{
    ListingChanges, ListingFilter, ListingRepository, NewListing, RepoError, RepoResult,
};

pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn create(&self, listing: NewListing) -> RepoResult<Listing> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            INSERT INTO listings (id, title, owner_email, date, description, kind, created_at)
            VALUES ((SELECT COALESCE(MAX(id), 0) + 1 FROM listings), $1, $2, $3, $4, $5, $6)
            RETURNING id, title, owner_email, date, description, kind, created_at
            "#,
        )
        .bind(&listing.title)
        .bind(&listing.owner_email)
        .bind(&listing.date)
        .bind(&listing.description)
        .bind(listing.kind.as_str())
        .bind(listing.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, title, owner_email, date, description, kind, created_at
            FROM listings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: &ListingFilter) -> RepoResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, title, owner_email, date, description, kind, created_at
            FROM listings
            WHERE ($1::TEXT IS NULL OR owner_email = $1)
              AND ($2::TEXT IS NULL OR kind = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.owner_email.as_deref())
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: i64, changes: ListingChanges) -> RepoResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            UPDATE listings
            SET title = COALESCE($1, title),
                owner_email = COALESCE($2, owner_email),
                date = COALESCE($3, date),
                description = COALESCE($4, description),
                kind = COALESCE($5, kind)
            WHERE id = $6
            RETURNING id, title, owner_email, date, description, kind, created_at
            "#,
        )
        .bind(changes.title)
        .bind(changes.owner_email)
        .bind(changes.date)
        .bind(changes.description)
        .bind(changes.kind.map(|k| k.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: i64,
    title: String,
    owner_email: String,
    date: String,
    description: String,
    kind: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = RepoError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse().map_err(RepoError::Corrupt)?;

        Ok(Listing {
            id: row.id,
            title: row.title,
            owner_email: row.owner_email,
            date: row.date,
            description: row.description,
            kind,
            created_at: row.created_at,
        })
    }
}
