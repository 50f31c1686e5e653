use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row};
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::{Batch, ChosenDB, ChosenRow, ListingParams, error::Result};

const SORT_FIELDS: &[&str] = &["id", "due_back", "status"];

/// Loan status of one copy, stored as a single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Available,
    OnLoan,
    Maintenance,
    Reserved,
}

impl Status {
    pub fn code(&self) -> &'static str {
        match self {
            Status::Available => "a",
            Status::OnLoan => "o",
            Status::Maintenance => "m",
            Status::Reserved => "r",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status code: {0}")]
pub struct UnknownStatus(String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(Status::Available),
            "o" => Ok(Status::OnLoan),
            "m" => Ok(Status::Maintenance),
            "r" => Ok(Status::Reserved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateBookInstance {
    #[garde(range(min = 1))]
    pub book_id: i64,
    #[garde(skip)]
    pub due_back: Option<Date>,
    #[garde(skip)]
    pub status: Option<Status>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct BookShort {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BorrowerShort {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookInstance {
    pub id: Uuid,
    pub book: BookShort,
    pub due_back: Option<Date>,
    pub status: Status,
    pub borrower: Option<BorrowerShort>,
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl sqlx::FromRow<'_, ChosenRow> for BookInstance {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id).map_err(|e| decode_error("id", e))?;
        let status: String = row.try_get("status")?;
        let status = status.parse().map_err(|e| decode_error("status", e))?;
        let borrower = if row.try_get::<Option<i64>, _>("borrower_id")?.is_some() {
            Some(BorrowerShort {
                id: row.try_get("borrower_id")?,
                name: row.try_get("borrower_name")?,
                email: row.try_get("borrower_email")?,
            })
        } else {
            None
        };
        Ok(BookInstance {
            id,
            book: BookShort {
                id: row.try_get("book_id")?,
                title: row.try_get("book_title")?,
            },
            due_back: row.try_get("due_back")?,
            status,
            borrower,
        })
    }
}

const SELECT_INSTANCE: &str = r#"
SELECT i.id, i.due_back, i.status, i.book_id, b.title as book_title,
i.borrower_id, u.name as borrower_name, u.email as borrower_email
FROM book_instance i
JOIN book b ON i.book_id = b.id
LEFT JOIN users u ON i.borrower_id = u.id
"#;

pub type BookInstanceRepository = BookInstanceRepositoryImpl<Pool<ChosenDB>>;

pub struct BookInstanceRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookInstanceRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateBookInstance) -> Result<BookInstance> {
        let id = Uuid::new_v4();
        let status = payload.status.unwrap_or(Status::Available);
        sqlx::query("INSERT INTO book_instance (id, book_id, due_back, status) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(payload.book_id)
            .bind(payload.due_back)
            .bind(status.code())
            .execute(&self.executor)
            .await?;

        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<BookInstance> {
        let sql = format!("{} WHERE i.id = ?", SELECT_INSTANCE);
        sqlx::query_as::<_, BookInstance>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| crate::Error::RecordNotFound("BookInstance".to_string()))
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<BookInstance>> {
        let ordering = params.ordering(SORT_FIELDS)?;
        let order_clause = if ordering.is_empty() {
            "i.id".to_string()
        } else {
            ordering
        };
        let sql = format!("{} ORDER BY {} LIMIT ? OFFSET ?", SELECT_INSTANCE, order_clause);
        let rows = sqlx::query_as::<_, BookInstance>(&sql)
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

    /// Copies on loan to given user, soonest due first. The order is part
    /// of the contract here, so explicit orderings are refused rather than
    /// silently dropped.
    pub async fn list_borrowed(&self, borrower_id: i64, params: ListingParams) -> Result<Batch<BookInstance>> {
        if let Some(order) = params.order.as_ref().and_then(|o| o.first()) {
            return Err(crate::Error::InvalidOrderByField(order.as_ref().to_string()));
        }
        let sql = format!(
            "{} WHERE i.borrower_id = ? AND i.status = 'o' ORDER BY i.due_back LIMIT ? OFFSET ?",
            SELECT_INSTANCE
        );
        let rows = sqlx::query_as::<_, BookInstance>(&sql)
            .bind(borrower_id)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.executor)
            .await?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instance WHERE borrower_id = ? AND status = 'o'",
        )
        .bind(borrower_id)
        .fetch_one(&self.executor)
        .await?;
        Ok(Batch {
            offset: params.offset,
            total: total as u64,
            rows,
        })
    }

    /// Overwrites the due-back date of a loan.
    pub async fn renew(&self, id: Uuid, due_back: Date) -> Result<BookInstance> {
        let result = sqlx::query("UPDATE book_instance SET due_back = ? WHERE id = ?")
            .bind(due_back)
            .bind(id.to_string())
            .execute(&self.executor)
            .await?;

        if result.rows_affected() == 0 {
            Err(crate::Error::RecordNotFound("BookInstance".to_string()))
        } else {
            self.get(id).await
        }
    }

    /// Available -> on loan; the update is conditional on current status, so
    /// two concurrent borrows of the same copy cannot both succeed.
    pub async fn borrow(&self, id: Uuid, borrower_id: i64, due_back: Date) -> Result<BookInstance> {
        let result = sqlx::query(
            "UPDATE book_instance SET status = 'o', borrower_id = ?, due_back = ? \
             WHERE id = ? AND status = 'a'",
        )
        .bind(borrower_id)
        .bind(due_back)
        .bind(id.to_string())
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get(id).await?;
            debug!("Copy {} not borrowable, status {}", id, current.status);
            Err(crate::Error::NotAvailable)
        } else {
            self.get(id).await
        }
    }

    /// On loan -> available, clearing borrower and due-back date.
    pub async fn mark_returned(&self, id: Uuid) -> Result<BookInstance> {
        let result = sqlx::query(
            "UPDATE book_instance SET status = 'a', borrower_id = NULL, due_back = NULL \
             WHERE id = ? AND status = 'o'",
        )
        .bind(id.to_string())
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get(id).await?;
            debug!("Copy {} not on loan, status {}", id, current.status);
            Err(crate::Error::NotOnLoan)
        } else {
            self.get(id).await
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instance")
            .fetch_one(&self.executor)
            .await?;
        Ok(total as u64)
    }

    pub async fn count_available(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instance WHERE status = 'a'")
            .fetch_one(&self.executor)
            .await?;
        Ok(total as u64)
    }
}
