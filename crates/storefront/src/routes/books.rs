//! Catalog listing and detail handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use paperback_core::{AuthorId, BookId, BookStatus, Featured, GenreId};

use crate::db::{BookRepository, CatalogRepository, books::PAGE_SIZE};
use crate::error::{AppError, Result};
use crate::models::book::{Author, Book, BookFilter, Genre};
use crate::state::AppState;

/// Query parameters for the filtered listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub author: Option<i64>,
    pub genre: Option<i64>,
    pub year: Option<i64>,
    pub status: Option<String>,
    /// Filters on the `featured` tier (the original calls the param
    /// `popular`).
    pub popular: Option<String>,
    pub page: Option<i64>,
}

impl ListQuery {
    fn into_filter(self) -> Result<(BookFilter, i64)> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<BookStatus>)
            .transpose()
            .map_err(AppError::Validation)?;
        let popular = self
            .popular
            .as_deref()
            .map(str::parse::<Featured>)
            .transpose()
            .map_err(AppError::Validation)?;

        let filter = BookFilter {
            author: self.author.map(AuthorId::new),
            genre: self.genre.map(GenreId::new),
            year: self.year,
            status,
            popular,
        };

        Ok((filter, self.page.unwrap_or(1)))
    }
}

/// Filtered, paginated listing plus the filter vocabulary the catalog page
/// renders its dropdowns from.
#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    pub page: i64,
    pub total_pages: i64,
    pub count: i64,
    pub genres: Vec<Genre>,
    pub authors: Vec<Author>,
    pub years: Vec<i64>,
    pub statuses: Vec<BookStatus>,
}

/// Unfiltered library listing.
#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub books: Vec<Book>,
}

/// Book detail payload.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

/// GET `/books` - filtered catalog listing, 3 books per page.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookListResponse>> {
    let books = BookRepository::new(state.pool());
    let catalog = CatalogRepository::new(state.pool());

    let (filter, page) = query.into_filter()?;
    let page = page.max(1);
    let (page_books, count) = books.list(&filter, page).await?;

    Ok(Json(BookListResponse {
        books: page_books,
        page,
        total_pages: (count + PAGE_SIZE - 1) / PAGE_SIZE,
        count,
        genres: catalog.genres().await?,
        authors: catalog.authors().await?,
        years: books.distinct_years().await?,
        statuses: vec![BookStatus::Borrowed, BookStatus::Sold, BookStatus::Exist],
    }))
}

/// GET `/library` - the whole catalog, unfiltered.
pub async fn library(State(state): State<AppState>) -> Result<Json<LibraryResponse>> {
    let books = BookRepository::new(state.pool()).all().await?;

    Ok(Json(LibraryResponse { books }))
}

/// GET `/books/{book_id}` - book detail.
pub async fn show(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<Json<BookResponse>> {
    let book_id = BookId::new(book_id);
    let book = BookRepository::new(state.pool())
        .get(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {book_id}")))?;

    Ok(Json(BookResponse { book }))
}
