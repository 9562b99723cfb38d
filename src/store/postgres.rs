use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};

use crate::error::{RegistryError, Result};
use crate::model::{
    normalize_tag_name, Capability, Id, NewRelease, Release, ReleaseId, Repository, UserContext,
};
use crate::store::traits::{
    effective_capability, PermissionProvider, ReleaseStore, RepositoryStore, Store,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS repositories (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        default_branch TEXT NOT NULL,
        is_private BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS repositories_owner_name ON repositories (lower(owner), lower(name))",
    r#"
    CREATE TABLE IF NOT EXISTS repository_collaborators (
        repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        capability TEXT NOT NULL,
        PRIMARY KEY (repository_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS releases (
        id BIGSERIAL PRIMARY KEY,
        repository_id TEXT NOT NULL,
        tag_name TEXT NOT NULL,
        lower_tag_name TEXT NOT NULL,
        target_commitish TEXT NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        is_draft BOOLEAN NOT NULL,
        is_prerelease BOOLEAN NOT NULL,
        has_tag BOOLEAN NOT NULL,
        publisher_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    // Uniqueness only binds releases that own a version-control tag
    "CREATE UNIQUE INDEX IF NOT EXISTS releases_repository_tag ON releases (repository_id, lower_tag_name) WHERE has_tag",
    "CREATE INDEX IF NOT EXISTS releases_listing ON releases (repository_id, created_at DESC, id DESC)",
];

const RELEASE_COLUMNS: &str = "id, repository_id, tag_name, target_commitish, title, body, \
     is_draft, is_prerelease, has_tag, publisher_id, created_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they are missing
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to apply release registry schema")?;
        }
        log::info!("Release registry schema is up to date");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn set_collaborator(
        &self,
        repository_id: &Id,
        user_id: &Id,
        capability: Capability,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO repository_collaborators (repository_id, user_id, capability)
            VALUES ($1, $2, $3)
            ON CONFLICT (repository_id, user_id) DO UPDATE SET capability = EXCLUDED.capability
            "#,
        )
        .bind(repository_id)
        .bind(user_id)
        .bind(capability.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to set collaborator")?;

        Ok(())
    }
}

fn repository_from_row(row: &PgRow) -> Repository {
    Repository {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        owner: row.get("owner"),
        name: row.get("name"),
        default_branch: row.get("default_branch"),
        is_private: row.get("is_private"),
    }
}

fn release_from_row(row: &PgRow) -> Release {
    Release {
        id: row.get("id"),
        repository_id: row.get("repository_id"),
        tag_name: row.get("tag_name"),
        target_commitish: row.get("target_commitish"),
        title: row.get("title"),
        body: row.get("body"),
        is_draft: row.get("is_draft"),
        is_prerelease: row.get("is_prerelease"),
        has_tag: row.get("has_tag"),
        publisher_id: row.get("publisher_id"),
        created_at: row.get("created_at"),
    }
}

/// Unique index violations on `releases_repository_tag` surface as `DuplicateTag`.
fn release_write_error(err: sqlx::Error, tag_name: &str, context: &'static str) -> RegistryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RegistryError::DuplicateTag(tag_name.to_string())
        }
        _ => RegistryError::Storage(anyhow::Error::new(err).context(context)),
    }
}

#[async_trait::async_trait]
impl RepositoryStore for PostgresStore {
    async fn get_repository(&self, id: &Id) -> Result<Option<Repository>> {
        let row = sqlx::query(
            "SELECT id, owner_id, owner, name, default_branch, is_private FROM repositories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch repository")?;

        Ok(row.as_ref().map(repository_from_row))
    }

    async fn get_repository_by_name(&self, owner: &str, name: &str) -> Result<Option<Repository>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, owner, name, default_branch, is_private
            FROM repositories
            WHERE lower(owner) = lower($1) AND lower(name) = lower($2)
            "#,
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch repository by name")?;

        Ok(row.as_ref().map(repository_from_row))
    }

    async fn upsert_repository(&self, repository: Repository) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO repositories (id, owner_id, owner, name, default_branch, is_private)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                owner_id = EXCLUDED.owner_id,
                owner = EXCLUDED.owner,
                name = EXCLUDED.name,
                default_branch = EXCLUDED.default_branch,
                is_private = EXCLUDED.is_private
            "#,
        )
        .bind(&repository.id)
        .bind(&repository.owner_id)
        .bind(&repository.owner)
        .bind(&repository.name)
        .bind(&repository.default_branch)
        .bind(repository.is_private)
        .execute(&self.pool)
        .await
        .context("Failed to upsert repository")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ReleaseStore for PostgresStore {
    async fn insert_release(&self, release: NewRelease) -> Result<Release> {
        let query = format!(
            r#"
            INSERT INTO releases (repository_id, tag_name, lower_tag_name, target_commitish, title, body,
                                  is_draft, is_prerelease, has_tag, publisher_id, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
            WHERE $3 = '' OR NOT EXISTS (
                SELECT 1 FROM releases WHERE repository_id = $1 AND lower_tag_name = $3 AND has_tag
            )
            RETURNING {}
            "#,
            RELEASE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&release.repository_id)
            .bind(&release.tag_name)
            .bind(normalize_tag_name(&release.tag_name))
            .bind(&release.target_commitish)
            .bind(&release.title)
            .bind(&release.body)
            .bind(!release.publish)
            .bind(release.is_prerelease)
            .bind(release.publish)
            .bind(&release.publisher_id)
            .bind(release.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| release_write_error(e, &release.tag_name, "Failed to insert release"))?;

        // No row means a tagged release already owns the name
        match row {
            Some(row) => Ok(release_from_row(&row)),
            None => Err(RegistryError::DuplicateTag(release.tag_name)),
        }
    }

    async fn list_releases(&self, repository_id: &Id) -> Result<Vec<Release>> {
        let query = format!(
            "SELECT {} FROM releases WHERE repository_id = $1 ORDER BY created_at DESC, id DESC",
            RELEASE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(repository_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list releases")?;

        Ok(rows.iter().map(release_from_row).collect())
    }

    async fn get_release(&self, repository_id: &Id, id: ReleaseId) -> Result<Option<Release>> {
        let query = format!(
            "SELECT {} FROM releases WHERE repository_id = $1 AND id = $2",
            RELEASE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(repository_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch release")?;

        Ok(row.as_ref().map(release_from_row))
    }

    async fn find_release_by_tag(&self, repository_id: &Id, tag_name: &str) -> Result<Option<Release>> {
        let query = format!(
            r#"
            SELECT {} FROM releases
            WHERE repository_id = $1 AND lower_tag_name = $2
            ORDER BY has_tag DESC, created_at DESC, id DESC
            LIMIT 1
            "#,
            RELEASE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(repository_id)
            .bind(normalize_tag_name(tag_name))
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch release by tag")?;

        Ok(row.as_ref().map(release_from_row))
    }

    async fn update_release(&self, release: Release) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE releases SET
                tag_name = $3,
                lower_tag_name = $4,
                target_commitish = $5,
                title = $6,
                body = $7,
                is_draft = $8,
                is_prerelease = $9,
                has_tag = $10
            WHERE repository_id = $1 AND id = $2
            "#,
        )
        .bind(&release.repository_id)
        .bind(release.id)
        .bind(&release.tag_name)
        .bind(release.lower_tag_name())
        .bind(&release.target_commitish)
        .bind(&release.title)
        .bind(&release.body)
        .bind(release.is_draft)
        .bind(release.is_prerelease)
        .bind(release.has_tag)
        .execute(&self.pool)
        .await
        .map_err(|e| release_write_error(e, &release.tag_name, "Failed to update release"))?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::not_found(format!("release {}", release.id)));
        }
        Ok(())
    }

    async fn delete_release(&self, repository_id: &Id, id: ReleaseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM releases WHERE repository_id = $1 AND id = $2")
            .bind(repository_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete release")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl PermissionProvider for PostgresStore {
    async fn capability(&self, viewer: &UserContext, repository: &Repository) -> Result<Capability> {
        let granted = match &viewer.user_id {
            Some(user_id) => {
                let capability: Option<String> = sqlx::query_scalar(
                    "SELECT capability FROM repository_collaborators WHERE repository_id = $1 AND user_id = $2",
                )
                .bind(&repository.id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch collaborator capability")?;

                match capability {
                    Some(value) => Some(value.parse::<Capability>().map_err(|e| {
                        anyhow::anyhow!("Stored collaborator capability is invalid: {}", e)
                    })?),
                    None => None,
                }
            }
            None => None,
        };

        Ok(effective_capability(viewer, repository, granted))
    }
}

impl Store for PostgresStore {}
