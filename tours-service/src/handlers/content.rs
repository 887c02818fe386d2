//! Content handlers: blog posts and travel packages, with public read
//! endpoints for the published/active subset.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::{PageQuery, Pagination};
use crate::middleware::AuthUser;
use crate::models::{
    Action, AuditLog, Capability, CreatePackageRequest, CreatePostRequest, Module,
    PackageResponse, Post, PostResponse, PostStatus, TravelPackage, UpdatePackageRequest,
    UpdatePostRequest,
};
use crate::utils::{client_ip, slugify, ValidatedJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostsListResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct PackagesListResponse {
    pub packages: Vec<PackageResponse>,
    pub pagination: Pagination,
}

// ============================================================================
// Public read endpoints
// ============================================================================

/// Published posts only.
pub async fn list_published_posts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page.limit_offset();
    let (posts, total) = state
        .db
        .list_posts(Some(PostStatus::Published.as_str()), limit, offset)
        .await?;

    Ok(Json(PostsListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn get_published_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .db
        .find_post_by_slug(&slug)
        .await?
        .filter(|p| p.status == PostStatus::Published.as_str())
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;

    Ok(Json(PostResponse::from(post)))
}

/// Active packages only.
pub async fn list_active_packages(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page.limit_offset();
    let (packages, total) = state.db.list_packages(true, limit, offset).await?;

    Ok(Json(PackagesListResponse {
        packages: packages.into_iter().map(PackageResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn get_active_package(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let package = state
        .db
        .find_package_by_slug(&slug)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Package not found")))?;

    Ok(Json(PackageResponse::from(package)))
}

// ============================================================================
// Admin post handlers
// ============================================================================

pub async fn list_posts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (posts, total) = state
        .db
        .list_posts(query.status.as_deref(), limit, offset)
        .await?;

    Ok(Json(PostsListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::Create))?;

    let status = match req.status.as_deref() {
        None => PostStatus::Draft,
        Some(s) => PostStatus::parse(s)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown post status: {}", s)))?,
    };

    let slug = req.slug.unwrap_or_else(|| slugify(&req.title));
    if slug.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Title does not produce a usable slug"
        )));
    }

    let mut post = Post::new(req.title, slug, req.content, user.user_id()?);
    post.excerpt = req.excerpt;
    post.featured_image = req.featured_image;
    post.is_featured = req.is_featured.unwrap_or(false);
    post.status = status.as_str().to_string();
    if status == PostStatus::Published {
        post.published_utc = Some(Utc::now());
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "create_post",
        "post",
        Some(post.post_id.to_string()),
        client_ip(&headers),
    );
    state.db.insert_post(&post, &audit).await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::Edit))?;

    let mut post = state
        .db
        .find_post_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;

    if let Some(title) = req.title {
        post.title = title;
    }
    if let Some(slug) = req.slug {
        post.slug = slug;
    }
    if let Some(content) = req.content {
        post.content = content;
    }
    if let Some(excerpt) = req.excerpt {
        post.excerpt = Some(excerpt);
    }
    if let Some(image) = req.featured_image {
        post.featured_image = Some(image);
    }
    if let Some(is_featured) = req.is_featured {
        post.is_featured = is_featured;
    }
    if let Some(status) = req.status {
        let status = PostStatus::parse(&status).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Unknown post status: {}", status))
        })?;
        // First publish stamps the timestamp; it survives archive/republish.
        if status == PostStatus::Published && post.published_utc.is_none() {
            post.published_utc = Some(Utc::now());
        }
        post.status = status.as_str().to_string();
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_post",
        "post",
        Some(post.post_id.to_string()),
        client_ip(&headers),
    );
    state.db.update_post(&post, &audit).await?;

    Ok(Json(PostResponse::from(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::Delete))?;

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "delete_post",
        "post",
        Some(post_id.to_string()),
        client_ip(&headers),
    );
    state.db.delete_post(post_id, &audit).await?;

    Ok(Json(serde_json::json!({
        "message": "Post deleted successfully"
    })))
}

// ============================================================================
// Admin package handlers
// ============================================================================

pub async fn list_packages(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (packages, total) = state.db.list_packages(false, limit, offset).await?;

    Ok(Json(PackagesListResponse {
        packages: packages.into_iter().map(PackageResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn create_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::Create))?;

    let slug = req.slug.unwrap_or_else(|| slugify(&req.title));
    if slug.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Title does not produce a usable slug"
        )));
    }

    let now = Utc::now();
    let package = TravelPackage {
        package_id: Uuid::new_v4(),
        title: req.title,
        slug,
        description: req.description,
        short_description: req.short_description,
        destination: req.destination,
        duration_days: req.duration_days,
        duration_nights: req.duration_nights,
        price: req.price,
        original_price: req.original_price,
        currency: req.currency.unwrap_or_else(|| "USD".to_string()),
        max_participants: req.max_participants,
        is_active: req.is_active.unwrap_or(true),
        is_featured: req.is_featured.unwrap_or(false),
        created_utc: now,
        updated_utc: now,
    };

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "create_package",
        "travel_package",
        Some(package.package_id.to_string()),
        client_ip(&headers),
    );
    state.db.insert_package(&package, &audit).await?;

    Ok((StatusCode::CREATED, Json(PackageResponse::from(package))))
}

pub async fn update_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(package_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::Edit))?;

    let mut package = state
        .db
        .find_package_by_id(package_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Package not found")))?;

    if let Some(v) = req.title {
        package.title = v;
    }
    if let Some(v) = req.slug {
        package.slug = v;
    }
    if let Some(v) = req.description {
        package.description = v;
    }
    if let Some(v) = req.short_description {
        package.short_description = Some(v);
    }
    if let Some(v) = req.destination {
        package.destination = v;
    }
    if let Some(v) = req.duration_days {
        package.duration_days = v;
    }
    if let Some(v) = req.duration_nights {
        package.duration_nights = v;
    }
    if let Some(v) = req.price {
        package.price = v;
    }
    if let Some(v) = req.original_price {
        package.original_price = Some(v);
    }
    if let Some(v) = req.currency {
        package.currency = v;
    }
    if let Some(v) = req.max_participants {
        package.max_participants = Some(v);
    }
    if let Some(v) = req.is_active {
        package.is_active = v;
    }
    if let Some(v) = req.is_featured {
        package.is_featured = v;
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_package",
        "travel_package",
        Some(package.package_id.to_string()),
        client_ip(&headers),
    );
    state.db.update_package(&package, &audit).await?;

    Ok(Json(PackageResponse::from(package)))
}

pub async fn delete_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(package_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Content, Action::Delete))?;

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "delete_package",
        "travel_package",
        Some(package_id.to_string()),
        client_ip(&headers),
    );
    state.db.delete_package(package_id, &audit).await?;

    Ok(Json(serde_json::json!({
        "message": "Package deleted successfully"
    })))
}
