//! Repository-style data access. All statements run against the scope's
//! transaction; reads append the scope's row-lock clause when one is set.

use sqlx::Row;
use uuid::Uuid;

use crate::db::models::{Book, User};
use crate::db::scope::TxScope;
use crate::error::{AppError, DatabaseError};

pub struct UserStore;

impl UserStore {
    pub async fn find_by_username(
        scope: &mut TxScope,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT id, username, password, created_at FROM users WHERE username = $1{}",
            scope.lock_suffix()
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&mut **scope.tx().await?)
            .await
            .map_err(DatabaseError::from)?;

        Ok(user)
    }

    pub async fn find_by_id(scope: &mut TxScope, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT id, username, password, created_at FROM users WHERE id = $1{}",
            scope.lock_suffix()
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut **scope.tx().await?)
            .await
            .map_err(DatabaseError::from)?;

        Ok(user)
    }

    pub async fn insert(scope: &mut TxScope, user: &User) -> Result<User, AppError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.created_at)
        .fetch_one(&mut **scope.tx().await?)
        .await
        .map_err(DatabaseError::from)?;

        Ok(inserted)
    }
}

pub struct BookStore;

const BOOK_COLUMNS: &str = "id, title, headline, tag, author_id, created_at, updated_at";

impl BookStore {
    pub async fn insert(scope: &mut TxScope, book: &Book) -> Result<Book, AppError> {
        let sql = format!(
            r#"
            INSERT INTO books (id, title, headline, tag, author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Book>(&sql)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.headline)
            .bind(&book.tag)
            .bind(book.author_id)
            .bind(book.created_at)
            .bind(book.updated_at)
            .fetch_one(&mut **scope.tx().await?)
            .await
            .map_err(DatabaseError::from)?;

        Ok(inserted)
    }

    /// Fetches one of the author's books; a foreign book is indistinguishable
    /// from a missing one.
    pub async fn find_by_id(
        scope: &mut TxScope,
        id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Book>, AppError> {
        let sql = format!(
            "SELECT {} FROM books WHERE id = $1 AND author_id = $2{}",
            BOOK_COLUMNS,
            scope.lock_suffix()
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(author_id)
            .fetch_optional(&mut **scope.tx().await?)
            .await
            .map_err(DatabaseError::from)?;

        Ok(book)
    }

    /// Paginated listing of the author's books, optionally filtered by a
    /// keyword matched against title, headline and tag.
    pub async fn list(
        scope: &mut TxScope,
        author_id: Uuid,
        keyword: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Book>, i64), AppError> {
        let offset = (page.max(1) - 1) * limit;
        let pattern = keyword.map(|k| format!("%{}%", k));

        let (rows, total) = match &pattern {
            Some(pattern) => {
                let sql = format!(
                    "SELECT {} FROM books WHERE author_id = $1 \
                     AND (title ILIKE $2 OR headline ILIKE $2 OR tag ILIKE $2) \
                     ORDER BY created_at DESC LIMIT $3 OFFSET $4",
                    BOOK_COLUMNS
                );
                let rows = sqlx::query_as::<_, Book>(&sql)
                    .bind(author_id)
                    .bind(pattern)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut **scope.tx().await?)
                    .await
                    .map_err(DatabaseError::from)?;

                let total = sqlx::query(
                    "SELECT COUNT(*) AS total FROM books WHERE author_id = $1 \
                     AND (title ILIKE $2 OR headline ILIKE $2 OR tag ILIKE $2)",
                )
                .bind(author_id)
                .bind(pattern)
                .fetch_one(&mut **scope.tx().await?)
                .await
                .map_err(DatabaseError::from)?
                .try_get::<i64, _>("total")
                .map_err(DatabaseError::from)?;

                (rows, total)
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM books WHERE author_id = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                    BOOK_COLUMNS
                );
                let rows = sqlx::query_as::<_, Book>(&sql)
                    .bind(author_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut **scope.tx().await?)
                    .await
                    .map_err(DatabaseError::from)?;

                let total = sqlx::query("SELECT COUNT(*) AS total FROM books WHERE author_id = $1")
                    .bind(author_id)
                    .fetch_one(&mut **scope.tx().await?)
                    .await
                    .map_err(DatabaseError::from)?
                    .try_get::<i64, _>("total")
                    .map_err(DatabaseError::from)?;

                (rows, total)
            }
        };

        Ok((rows, total))
    }

    pub async fn update(scope: &mut TxScope, book: &Book) -> Result<Book, AppError> {
        let sql = format!(
            r#"
            UPDATE books
            SET title = $1, headline = $2, tag = $3, updated_at = NOW()
            WHERE id = $4 AND author_id = $5
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let updated = sqlx::query_as::<_, Book>(&sql)
            .bind(&book.title)
            .bind(&book.headline)
            .bind(&book.tag)
            .bind(book.id)
            .bind(book.author_id)
            .fetch_optional(&mut **scope.tx().await?)
            .await
            .map_err(DatabaseError::from)?;

        updated.ok_or_else(|| DatabaseError::NotFound.into())
    }

    pub async fn delete(scope: &mut TxScope, id: Uuid, author_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&mut **scope.tx().await?)
            .await
            .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound.into());
        }
        Ok(())
    }
}
