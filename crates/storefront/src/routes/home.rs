//! Home page handler.

use axum::{Json, extract::State};

use paperback_core::Featured;
use serde::Serialize;

use crate::db::{BookRepository, CatalogRepository};
use crate::error::Result;
use crate::models::book::{Book, Genre, Quote};
use crate::state::AppState;

/// How many featured/popular books the home page shows.
const SHELF_SIZE: i64 = 4;

/// Home page payload.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    /// Highest-priced sold book, if any.
    pub best_seller: Option<Book>,
    pub featured: Vec<Book>,
    pub popular: Vec<Book>,
    pub genres: Vec<Genre>,
    pub quote: Option<Quote>,
}

/// GET `/` - best seller, featured and popular shelves, genres, and a
/// random quote.
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>> {
    let books = BookRepository::new(state.pool());
    let catalog = CatalogRepository::new(state.pool());

    let best_seller = books.best_sellers(1).await?.into_iter().next();
    let featured = books.by_featured_tier(Featured::Featured, SHELF_SIZE).await?;
    let popular = books.by_featured_tier(Featured::Popular, SHELF_SIZE).await?;
    let genres = catalog.genres().await?;
    let quote = catalog.random_quote().await?;

    Ok(Json(HomeResponse {
        best_seller,
        featured,
        popular,
        genres,
        quote,
    }))
}
