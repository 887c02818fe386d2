//! Content models - blog posts and travel packages.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Blog post lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<PostStatus> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

/// Blog post entity.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub post_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub author_id: Uuid,
    pub published_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Post {
    pub fn new(title: String, slug: String, content: String, author_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            post_id: Uuid::new_v4(),
            title,
            slug,
            content,
            excerpt: None,
            featured_image: None,
            status: PostStatus::Draft.as_str().to_string(),
            is_featured: false,
            author_id,
            published_utc: None,
            created_utc: now,
            updated_utc: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub author_id: Uuid,
    pub published_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            post_id: p.post_id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            excerpt: p.excerpt,
            featured_image: p.featured_image,
            status: p.status,
            is_featured: p.is_featured,
            author_id: p.author_id,
            published_utc: p.published_utc,
            created_utc: p.created_utc,
            updated_utc: p.updated_utc,
        }
    }
}

/// Travel package entity.
#[derive(Debug, Clone, FromRow)]
pub struct TravelPackage {
    pub package_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub destination: String,
    pub duration_days: i32,
    pub duration_nights: i32,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub currency: String,
    pub max_participants: Option<i32>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePackageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub description: String,
    pub short_description: Option<String>,
    #[validate(length(min = 1))]
    pub destination: String,
    #[validate(range(min = 1))]
    pub duration_days: i32,
    #[validate(range(min = 0))]
    pub duration_nights: i32,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub currency: Option<String>,
    pub max_participants: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePackageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub destination: Option<String>,
    #[validate(range(min = 1))]
    pub duration_days: Option<i32>,
    #[validate(range(min = 0))]
    pub duration_nights: Option<i32>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub currency: Option<String>,
    pub max_participants: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub package_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub destination: String,
    pub duration_days: i32,
    pub duration_nights: i32,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub currency: String,
    pub max_participants: Option<i32>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<TravelPackage> for PackageResponse {
    fn from(p: TravelPackage) -> Self {
        Self {
            package_id: p.package_id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            short_description: p.short_description,
            destination: p.destination,
            duration_days: p.duration_days,
            duration_nights: p.duration_nights,
            price: p.price,
            original_price: p.original_price,
            currency: p.currency,
            max_participants: p.max_participants,
            is_active: p.is_active,
            is_featured: p.is_featured,
            created_utc: p.created_utc,
            updated_utc: p.updated_utc,
        }
    }
}
