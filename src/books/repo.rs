use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use super::dto::BookFilter;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub created_at: OffsetDateTime,
}

impl Book {
    pub async fn list(db: &PgPool, filter: &BookFilter) -> Result<Vec<Book>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, title, author, year, created_at FROM books WHERE 1=1");
        if let Some(title) = &filter.title {
            qb.push(" AND title LIKE ");
            qb.push_bind(format!("%{title}%"));
        }
        if let Some(author) = &filter.author {
            qb.push(" AND author LIKE ");
            qb.push_bind(format!("%{author}%"));
        }
        if let Some(year) = filter.year {
            qb.push(" AND year = ");
            qb.push_bind(year);
        }
        qb.push(" ORDER BY created_at ASC");
        qb.build_query_as::<Book>().fetch_all(db).await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, year, created_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        author: &str,
        year: i32,
    ) -> Result<Book, sqlx::Error> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, year)
            VALUES ($1, $2, $3)
            RETURNING id, title, author, year, created_at
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(year)
        .fetch_one(db)
        .await
    }

    /// Updates the given fields, keeping stored values where the caller
    /// passed nothing. Returns None if the row does not exist.
    pub async fn update(
        db: &PgPool,
        id: i64,
        title: Option<&str>,
        author: Option<&str>,
        year: Option<i32>,
    ) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title  = COALESCE($2, title),
                author = COALESCE($3, author),
                year   = COALESCE($4, year)
            WHERE id = $1
            RETURNING id, title, author, year, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(author)
        .bind(year)
        .fetch_optional(db)
        .await
    }

    /// Returns true if a row was deleted.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
