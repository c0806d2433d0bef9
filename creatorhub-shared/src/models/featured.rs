/// Featured home-page content
///
/// Merges featured, published news and events into one feed. Each item is
/// tagged with its `kind` and dated by publication (news, falling back to
/// creation) or start time (events); the feed is sorted newest first and
/// capped at [`FEATURED_LIMIT`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::event::Event;
use super::news::News;

/// Maximum items in the featured feed
pub const FEATURED_LIMIT: usize = 5;

/// One entry of the featured feed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeaturedItem {
    News(FeaturedEntry),
    Event(FeaturedEntry),
}

/// Fields shared by both kinds of featured entry
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedEntry {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,

    /// Sort key
    pub date: DateTime<Utc>,
}

impl FeaturedItem {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            FeaturedItem::News(entry) | FeaturedItem::Event(entry) => entry.date,
        }
    }
}

impl From<News> for FeaturedItem {
    fn from(news: News) -> Self {
        FeaturedItem::News(FeaturedEntry {
            id: news.id,
            date: news.published_at.unwrap_or(news.created_at),
            title: news.title,
            summary: news.summary,
            image_url: news.image_url,
        })
    }
}

impl From<Event> for FeaturedItem {
    fn from(event: Event) -> Self {
        FeaturedItem::Event(FeaturedEntry {
            id: event.id,
            date: event.starts_at,
            title: event.title,
            summary: Some(event.description),
            image_url: event.image_url,
        })
    }
}

/// Merges news and events, newest first, keeping at most `limit` items
pub fn merge_featured(news: Vec<News>, events: Vec<Event>, limit: usize) -> Vec<FeaturedItem> {
    let mut items: Vec<FeaturedItem> = news
        .into_iter()
        .map(FeaturedItem::from)
        .chain(events.into_iter().map(FeaturedItem::from))
        .collect();

    items.sort_by(|a, b| b.date().cmp(&a.date()));
    items.truncate(limit);
    items
}

/// Loads and merges the featured feed
///
/// Each source is capped at the feed size, which is enough for the merged
/// top-N to be exact.
pub async fn load_featured(pool: &PgPool) -> Result<Vec<FeaturedItem>, sqlx::Error> {
    let limit = FEATURED_LIMIT as i64;
    let (news, events) = tokio::try_join!(
        News::list_featured(pool, limit),
        Event::list_featured(pool, limit),
    )?;

    Ok(merge_featured(news, events, FEATURED_LIMIT))
}
