use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::db::models::Book;
use crate::db::{with_scope, BookStore, LockMode, TxScope};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub headline: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
    pub headline: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub keyword: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: Uuid,
    pub title: String,
    pub headline: Option<String>,
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            headline: book.headline,
            tag: book.tag,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

pub async fn create_book(
    user: AuthUser,
    req: web::Json<CreateBookRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let author_id = author_id(&user)?;
    if req.title.trim().is_empty() {
        return Err(AppError::ValidationError("title is required".into()));
    }

    let book = Book::new(
        author_id,
        req.title.clone(),
        req.headline.clone(),
        req.tag.clone(),
    );
    let created = with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move { BookStore::insert(scope, &book).await }.boxed()
    })
    .await?;

    info!("book {} created by {}", created.id, author_id);
    Ok(HttpResponse::Created().json(ApiResponse::success(BookDto::from(created))))
}

pub async fn list_books(
    user: AuthUser,
    query: web::Query<ListBooksQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let author_id = author_id(&user)?;
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let keyword = query.keyword.clone();

    let (books, total) = with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move { BookStore::list(scope, author_id, keyword.as_deref(), page, limit).await }
            .boxed()
    })
    .await?;

    let rows: Vec<BookDto> = books.into_iter().map(BookDto::from).collect();
    let count = rows.len() as i64;
    Ok(HttpResponse::Ok().json(ApiResponse::paginated(rows, page, limit, count, total)))
}

pub async fn get_book(
    user: AuthUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let author_id = author_id(&user)?;
    let id = path.into_inner();

    let book = with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move { BookStore::find_by_id(scope, id, author_id).await }.boxed()
    })
    .await?
    .ok_or(DatabaseError::NotFound)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(BookDto::from(book))))
}

pub async fn update_book(
    user: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateBookRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let author_id = author_id(&user)?;
    let id = path.into_inner();
    if req.title.trim().is_empty() {
        return Err(AppError::ValidationError("title is required".into()));
    }
    let req = req.into_inner();

    let updated = with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move {
            // Read-modify-write: hold the row lock for the whole scope.
            scope.set_lock_mode(LockMode::Update);
            let mut book = BookStore::find_by_id(scope, id, author_id)
                .await?
                .ok_or(DatabaseError::NotFound)?;

            book.title = req.title;
            book.headline = req.headline;
            book.tag = req.tag;
            BookStore::update(scope, &book).await
        }
        .boxed()
    })
    .await?;

    info!("book {} updated by {}", updated.id, author_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(BookDto::from(updated))))
}

pub async fn delete_book(
    user: AuthUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let author_id = author_id(&user)?;
    let id = path.into_inner();

    with_scope(state.db_pool.clone(), |scope: &mut TxScope| {
        async move { BookStore::delete(scope, id, author_id).await }.boxed()
    })
    .await?;

    info!("book {} deleted by {}", id, author_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "id": id }))))
}

fn author_id(user: &AuthUser) -> Result<Uuid, AppError> {
    user.user_id()
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| AuthError::InvalidToken.into())
}
