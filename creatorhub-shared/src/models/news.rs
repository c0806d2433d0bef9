/// News articles
///
/// Admin-authored. Only `published` articles are visible to the public;
/// `published_at` is stamped the first time an article is published and kept
/// across later archive/re-publish cycles.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE news_status AS ENUM ('draft', 'published', 'archived');
///
/// CREATE TABLE news (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     author_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(200) NOT NULL,
///     summary TEXT,
///     body TEXT NOT NULL,
///     image_url VARCHAR(1024),
///     status news_status NOT NULL DEFAULT 'draft',
///     featured BOOLEAN NOT NULL DEFAULT FALSE,
///     view_count BIGINT NOT NULL DEFAULT 0,
///     published_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::Page;

const NEWS_COLUMNS: &str = "id, author_id, title, summary, body, image_url, status, featured, \
     view_count, published_at, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "news_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    Draft,
    Published,
    Archived,
}

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsStatus::Draft => "draft",
            NewsStatus::Published => "published",
            NewsStatus::Archived => "archived",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, NewsStatus::Published)
    }

    pub fn can_transition_to(&self, target: NewsStatus) -> bool {
        use NewsStatus::*;

        matches!(
            (self, target),
            (Draft, Published) | (Draft, Archived) | (Published, Archived) | (Archived, Published) | (Archived, Draft)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct News {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub status: NewsStatus,
    pub featured: bool,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNews {
    pub author_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub status: NewsStatus,
    pub featured: bool,
}

/// Partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateNews {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub body: Option<String>,
    pub image_url: Option<Option<String>>,
    pub status: Option<NewsStatus>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    /// `None` means published only
    pub status: Option<NewsStatus>,
    pub featured: Option<bool>,
    pub page: Page,
}

impl News {
    pub async fn create(pool: &PgPool, data: CreateNews) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, News>(&format!(
            r#"
            INSERT INTO news (author_id, title, summary, body, image_url, status, featured, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    CASE WHEN $6 = 'published'::news_status THEN NOW() ELSE NULL END)
            RETURNING {NEWS_COLUMNS}
            "#
        ))
        .bind(data.author_id)
        .bind(data.title.trim())
        .bind(data.summary)
        .bind(data.body)
        .bind(data.image_url)
        .bind(data.status)
        .bind(data.featured)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, News>(&format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest publication first
    pub async fn list(pool: &PgPool, filter: &NewsFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {NEWS_COLUMNS} FROM news WHERE status = "));
        query.push_bind(filter.status.unwrap_or(NewsStatus::Published));

        if let Some(featured) = filter.featured {
            query.push(" AND featured = ").push_bind(featured);
        }

        query
            .push(" ORDER BY COALESCE(published_at, created_at) DESC LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset);

        query.build_query_as::<News>().fetch_all(pool).await
    }

    /// Featured, published articles for the home page
    pub async fn list_featured(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, News>(&format!(
            r#"
            SELECT {NEWS_COLUMNS} FROM news
            WHERE status = 'published' AND featured = TRUE
            ORDER BY COALESCE(published_at, created_at) DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateNews) -> Result<Option<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE news SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(summary) = data.summary {
            query.push(", summary = ").push_bind(summary);
        }
        if let Some(body) = data.body {
            query.push(", body = ").push_bind(body);
        }
        if let Some(image_url) = data.image_url {
            query.push(", image_url = ").push_bind(image_url);
        }
        if let Some(featured) = data.featured {
            query.push(", featured = ").push_bind(featured);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
            if status == NewsStatus::Published {
                query.push(", published_at = COALESCE(published_at, NOW())");
            }
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(NEWS_COLUMNS);

        query.build_query_as::<News>().fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomic view increment
    pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE news SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_transitions() {
        use NewsStatus::*;

        assert!(Draft.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Published));
        assert!(!Published.can_transition_to(Published));
        assert!(!Published.can_transition_to(Draft));
    }

    #[test]
    fn test_only_published_is_public() {
        assert!(NewsStatus::Published.is_public());
        assert!(!NewsStatus::Draft.is_public());
        assert!(!NewsStatus::Archived.is_public());
    }
}
