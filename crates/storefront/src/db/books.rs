//! Book repository: catalog reads, filtering, and pagination.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use paperback_core::{
    AuthorId, BookId, BookStatus, Featured, GenreId, PublisherId, money,
};

use super::RepositoryError;
use crate::models::book::{Book, BookFilter};

/// Listing page size.
pub const PAGE_SIZE: i64 = 3;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) author_id: i64,
    pub(crate) publisher_id: i64,
    pub(crate) genre_id: i64,
    pub(crate) year_published: i64,
    pub(crate) status: String,
    pub(crate) price: String,
    pub(crate) discounted_price: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) featured: String,
}

const BOOK_COLUMNS: &str = "id, title, author_id, publisher_id, genre_id, year_published, \
                            status, price, discounted_price, description, featured";

impl BookRow {
    pub(crate) fn into_domain(self) -> Result<Book, RepositoryError> {
        let status: BookStatus = self
            .status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let featured: Featured = self
            .featured
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let price = money::parse_amount(&self.price)
            .map_err(|e| RepositoryError::DataCorruption(format!("book {}: {e}", self.id)))?;
        let discounted_price = self
            .discounted_price
            .as_deref()
            .map(money::parse_amount)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("book {}: {e}", self.id)))?;

        Ok(Book {
            id: BookId::new(self.id),
            title: self.title,
            author_id: AuthorId::new(self.author_id),
            publisher_id: PublisherId::new(self.publisher_id),
            genre_id: GenreId::new(self.genre_id),
            year_published: self.year_published,
            status,
            price,
            discounted_price,
            description: self.description,
            featured,
        })
    }
}

/// Repository for catalog book reads.
pub struct BookRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a book by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(BookRow::into_domain).transpose()
    }

    /// All books, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(BookRow::into_domain).collect()
    }

    /// Filtered, paginated listing. `page` is 1-based; pages hold
    /// [`PAGE_SIZE`] books. Returns the page plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &BookFilter,
        page: i64,
    ) -> Result<(Vec<Book>, i64), RepositoryError> {
        let page = page.max(1);

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(self.pool).await?;

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM books"));
        push_filters(&mut query, filter);
        query.push(" ORDER BY id LIMIT ");
        query.push_bind(PAGE_SIZE);
        query.push(" OFFSET ");
        query.push_bind((page - 1) * PAGE_SIZE);

        let rows: Vec<BookRow> = query.build_query_as().fetch_all(self.pool).await?;
        let books = rows
            .into_iter()
            .map(BookRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((books, total))
    }

    /// Best sellers for the home page: sold books, highest price first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn best_sellers(&self, limit: i64) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE status = ? \
             ORDER BY CAST(price AS REAL) DESC LIMIT ?"
        ))
        .bind(BookStatus::Sold.to_string())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(BookRow::into_domain).collect()
    }

    /// Books in a highlighting tier, newest publication year first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_featured_tier(
        &self,
        tier: Featured,
        limit: i64,
    ) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE featured = ? \
             ORDER BY year_published DESC LIMIT ?"
        ))
        .bind(tier.to_string())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(BookRow::into_domain).collect()
    }

    /// Distinct publication years, for the listing filter vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn distinct_years(&self) -> Result<Vec<i64>, RepositoryError> {
        let years =
            sqlx::query_scalar::<_, i64>("SELECT DISTINCT year_published FROM books ORDER BY year_published")
                .fetch_all(self.pool)
                .await?;

        Ok(years)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &BookFilter) {
    let mut prefix = " WHERE ";
    let mut sep = |query: &mut QueryBuilder<'_, Sqlite>| {
        query.push(prefix);
        prefix = " AND ";
    };

    if let Some(author) = filter.author {
        sep(query);
        query.push("author_id = ").push_bind(author.as_i64());
    }
    if let Some(genre) = filter.genre {
        sep(query);
        query.push("genre_id = ").push_bind(genre.as_i64());
    }
    if let Some(year) = filter.year {
        sep(query);
        query.push("year_published = ").push_bind(year);
    }
    if let Some(status) = filter.status {
        sep(query);
        query.push("status = ").push_bind(status.to_string());
    }
    if let Some(tier) = filter.popular {
        sep(query);
        query.push("featured = ").push_bind(tier.to_string());
    }
}
