use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool, Row};

use crate::{Batch, ChosenDB, ChosenRow, ListingParams, author::AuthorShort, genre::Genre, error::Result};

const SORT_FIELDS: &[&str] = &["id", "title", "isbn"];

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateBook {
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(range(min = 1))]
    pub author_id: Option<i64>,
    #[garde(length(min = 1, max = 5000))]
    pub summary: Option<String>,
    #[garde(length(min = 10, max = 13))]
    pub isbn: String,
    #[garde(inner(inner(range(min = 1))))]
    pub genres: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<AuthorShort>,
    pub summary: Option<String>,
    pub isbn: String,
    /// Loaded on single-record fetch, not on listings.
    pub genres: Option<Vec<Genre>>,
}

impl sqlx::FromRow<'_, ChosenRow> for Book {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let author = if row.try_get::<Option<i64>, _>("author_id")?.is_some() {
            Some(AuthorShort {
                id: row.try_get("author_id")?,
                first_name: row.try_get("author_first_name")?,
                last_name: row.try_get("author_last_name")?,
            })
        } else {
            None
        };
        Ok(Book {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author,
            summary: row.try_get("summary")?,
            isbn: row.try_get("isbn")?,
            genres: None,
        })
    }
}

const SELECT_BOOK: &str = r#"
SELECT b.id, b.title, b.summary, b.isbn, b.author_id,
a.first_name as author_first_name, a.last_name as author_last_name
FROM book b
LEFT JOIN author a ON b.author_id = a.id
"#;

pub type BookRepository = BookRepositoryImpl<Pool<ChosenDB>>;

pub struct BookRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateBook) -> Result<Book> {
        let mut tx = self.executor.begin().await?;

        let result = sqlx::query("INSERT INTO book (title, author_id, summary, isbn) VALUES (?, ?, ?, ?)")
            .bind(&payload.title)
            .bind(payload.author_id)
            .bind(&payload.summary)
            .bind(&payload.isbn)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();

        for genre_id in payload.genres.iter().flatten() {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateBook) -> Result<Book> {
        let mut tx = self.executor.begin().await?;

        let result = sqlx::query("UPDATE book SET title = ?, author_id = ?, summary = ?, isbn = ? WHERE id = ?")
            .bind(&payload.title)
            .bind(payload.author_id)
            .bind(&payload.summary)
            .bind(&payload.isbn)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(crate::Error::RecordNotFound("Book".to_string()));
        }

        // Genre links are replaced wholesale on each update
        sqlx::query("DELETE FROM book_genres WHERE book_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for genre_id in payload.genres.iter().flatten() {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<Book>> {
        let ordering = params.ordering(SORT_FIELDS)?;
        let order_clause = if ordering.is_empty() {
            "b.id".to_string()
        } else {
            ordering
        };
        let sql = format!("{} ORDER BY {} LIMIT ? OFFSET ?", SELECT_BOOK, order_clause);
        let rows = sqlx::query_as::<_, Book>(&sql)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.executor)
            .await?;
        let total = self.count().await?;
        Ok(Batch {
            offset: params.offset,
            total,
            rows,
        })
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(crate::Error::RecordNotFound("Book".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Book> {
        let sql = format!("{} WHERE b.id = ?", SELECT_BOOK);
        let mut book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| crate::Error::RecordNotFound("Book".to_string()))?;

        let genres = sqlx::query_as::<_, Genre>(
            "SELECT g.id, g.name FROM genre g JOIN book_genres bg ON g.id = bg.genre_id \
             WHERE bg.book_id = ? ORDER BY g.name",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;
        book.genres = Some(genres);
        Ok(book)
    }

    pub async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(&self.executor)
            .await?;
        Ok(total as u64)
    }
}
