//! Catalog side tables: authors, publishers, genres, quotes, deliveries.

use sqlx::SqlitePool;

use paperback_core::{AuthorId, DeliveryId, GenreId, PublisherId, QuoteId, money};

use super::RepositoryError;
use crate::models::book::{Author, Delivery, Genre, Publisher, Quote};

#[derive(Debug, sqlx::FromRow)]
struct NamedRow {
    id: i64,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    quote: String,
    author: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: i64,
    method: String,
    price: String,
}

impl DeliveryRow {
    fn into_domain(self) -> Result<Delivery, RepositoryError> {
        let price = money::parse_amount(&self.price)
            .map_err(|e| RepositoryError::DataCorruption(format!("delivery {}: {e}", self.id)))?;

        Ok(Delivery {
            id: DeliveryId::new(self.id),
            method: self.method,
            price,
        })
    }
}

/// Repository for read-mostly catalog side tables.
pub struct CatalogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All authors, name order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn authors(&self) -> Result<Vec<Author>, RepositoryError> {
        let rows = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM authors ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Author {
                id: AuthorId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    /// All publishers, name order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn publishers(&self) -> Result<Vec<Publisher>, RepositoryError> {
        let rows = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM publishers ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Publisher {
                id: PublisherId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    /// All genres, name order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn genres(&self) -> Result<Vec<Genre>, RepositoryError> {
        let rows = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Genre {
                id: GenreId::new(r.id),
                name: r.name,
            })
            .collect())
    }

    /// A random quote for the home page, if any exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn random_quote(&self) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query_as::<_, QuoteRow>(
            "SELECT id, quote, author FROM quotes ORDER BY RANDOM() LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Quote {
            id: QuoteId::new(r.id),
            quote: r.quote,
            author: r.author,
        }))
    }

    /// All delivery methods.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deliveries(&self) -> Result<Vec<Delivery>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryRow>("SELECT id, method, price FROM deliveries")
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(DeliveryRow::into_domain).collect()
    }

    /// Get a delivery method by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_delivery(
        &self,
        id: DeliveryId,
    ) -> Result<Option<Delivery>, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryRow>(
            "SELECT id, method, price FROM deliveries WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(DeliveryRow::into_domain).transpose()
    }
}
