//! Catalog domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use paperback_core::{AuthorId, BookId, BookStatus, DeliveryId, Featured, GenreId, PublisherId, QuoteId};

/// A book in the catalog.
///
/// Immutable from the cart's perspective: cart lines reference books by id
/// and orders snapshot the price at checkout time.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub publisher_id: PublisherId,
    pub genre_id: GenreId,
    pub year_published: i64,
    pub status: BookStatus,
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub description: Option<String>,
    pub featured: Featured,
}

impl Book {
    /// Discount percentage when a discounted price undercuts the list price.
    #[must_use]
    pub fn discount_percentage(&self) -> u32 {
        match self.discounted_price {
            Some(discounted) if self.price > discounted && !self.price.is_zero() => {
                let pct = (Decimal::ONE_HUNDRED
                    - discounted / self.price * Decimal::ONE_HUNDRED)
                    .round();
                u32::try_from(pct.mantissa()).unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// A catalog author.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

/// A catalog publisher.
#[derive(Debug, Clone, Serialize)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
}

/// A catalog genre.
#[derive(Debug, Clone, Serialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// A quote shown on the home page.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub id: QuoteId,
    pub quote: String,
    pub author: Option<String>,
}

/// A delivery method selectable in the cart view.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub method: String,
    pub price: Decimal,
}

/// Catalog listing filters for `/books`.
///
/// Every field is optional; absent filters match everything.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub author: Option<AuthorId>,
    pub genre: Option<GenreId>,
    pub year: Option<i64>,
    pub status: Option<BookStatus>,
    pub popular: Option<Featured>,
}
