use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::Date;

use crate::{Batch, ListingParams, error::Result};

const SORT_FIELDS: &[&str] = &["id", "first_name", "last_name", "date_of_birth"];

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateAuthor {
    #[garde(length(min = 1, max = 100))]
    pub first_name: String,
    #[garde(length(min = 1, max = 100))]
    pub last_name: String,
    #[garde(skip)]
    pub date_of_birth: Option<Date>,
    #[garde(skip)]
    pub date_of_death: Option<Date>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub date_of_death: Option<Date>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct AuthorShort {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

pub type AuthorRepository = AuthorRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct AuthorRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> AuthorRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateAuthor) -> Result<Author> {
        let result = sqlx::query(
            "INSERT INTO author (first_name, last_name, date_of_birth, date_of_death) VALUES (?, ?, ?, ?)",
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.date_of_birth)
        .bind(payload.date_of_death)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateAuthor) -> Result<Author> {
        let result = sqlx::query(
            "UPDATE author SET first_name = ?, last_name = ?, date_of_birth = ?, date_of_death = ? WHERE id = ?",
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.date_of_birth)
        .bind(payload.date_of_death)
        .bind(id)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            Err(crate::Error::RecordNotFound("Author".to_string()))
        } else {
            self.get(id).await
        }
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<Author>> {
        let ordering = params.ordering(SORT_FIELDS)?;
        let order_clause = if ordering.is_empty() {
            "id".to_string()
        } else {
            ordering
        };
        let sql = format!(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM author \
             ORDER BY {} LIMIT ? OFFSET ?",
            order_clause
        );
        let rows = sqlx::query_as::<_, Author>(&sql)
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
        let res = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(crate::Error::RecordNotFound("Author".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM author WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| crate::Error::RecordNotFound("Author".to_string()))
    }

    pub async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM author")
            .fetch_one(&self.executor)
            .await?;
        Ok(total as u64)
    }
}
