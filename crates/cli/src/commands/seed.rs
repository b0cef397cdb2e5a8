//! Seed the catalog with sample data.
//!
//! Inserts a small set of authors, publishers, genres, books, quotes, and
//! delivery methods so a fresh install has something to browse. Refuses to
//! run against a non-empty catalog unless forced.

use sqlx::SqlitePool;
use tracing::info;

use paperback_core::{BookStatus, Featured};
use paperback_storefront::db;

use super::CommandError;

struct SeedBook {
    title: &'static str,
    author: &'static str,
    publisher: &'static str,
    genre: &'static str,
    year: i64,
    price: &'static str,
    discounted_price: Option<&'static str>,
    status: BookStatus,
    featured: Featured,
}

const BOOKS: &[SeedBook] = &[
    SeedBook {
        title: "Pride and Prejudice",
        author: "Jane Austen",
        publisher: "Whitfield House",
        genre: "Romance",
        year: 1813,
        price: "12.50",
        discounted_price: Some("9.99"),
        status: BookStatus::Exist,
        featured: Featured::Featured,
    },
    SeedBook {
        title: "Nineteen Eighty-Four",
        author: "George Orwell",
        publisher: "Harriman & Sons",
        genre: "Dystopia",
        year: 1949,
        price: "15.00",
        discounted_price: None,
        status: BookStatus::Exist,
        featured: Featured::Popular,
    },
    SeedBook {
        title: "Animal Farm",
        author: "George Orwell",
        publisher: "Harriman & Sons",
        genre: "Dystopia",
        year: 1945,
        price: "10.00",
        discounted_price: None,
        status: BookStatus::Sold,
        featured: Featured::Normal,
    },
    SeedBook {
        title: "The Left Hand of Darkness",
        author: "Ursula K. Le Guin",
        publisher: "Whitfield House",
        genre: "Science Fiction",
        year: 1969,
        price: "14.25",
        discounted_price: Some("11.40"),
        status: BookStatus::Exist,
        featured: Featured::Featured,
    },
    SeedBook {
        title: "A Wizard of Earthsea",
        author: "Ursula K. Le Guin",
        publisher: "Lantern Press",
        genre: "Fantasy",
        year: 1968,
        price: "13.75",
        discounted_price: None,
        status: BookStatus::Borrowed,
        featured: Featured::Popular,
    },
];

const QUOTES: &[(&str, &str)] = &[
    (
        "A reader lives a thousand lives before he dies.",
        "George R.R. Martin",
    ),
    ("So many books, so little time.", "Frank Zappa"),
    (
        "Until I feared I would lose it, I never loved to read. One does not love breathing.",
        "Harper Lee",
    ),
];

const DELIVERIES: &[(&str, &str)] = &[
    ("Standard post", "3.50"),
    ("Courier", "7.00"),
    ("Pickup point", "0.00"),
];

/// Seed the catalog.
///
/// # Errors
///
/// Returns `CommandError::Aborted` when the catalog already holds books
/// and `force` is false, or a database error if any insert fails.
pub async fn catalog(force: bool) -> Result<(), CommandError> {
    let database_url = super::database_url()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&pool)
        .await?;
    if existing > 0 && !force {
        return Err(CommandError::Aborted(format!(
            "catalog already has {existing} books; re-run with --force to seed anyway"
        )));
    }

    for book in BOOKS {
        let author_id = named_id(&pool, "authors", book.author).await?;
        let publisher_id = named_id(&pool, "publishers", book.publisher).await?;
        let genre_id = named_id(&pool, "genres", book.genre).await?;

        sqlx::query(
            r"
            INSERT INTO books
                (title, author_id, publisher_id, genre_id, year_published,
                 status, price, discounted_price, featured)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(book.title)
        .bind(author_id)
        .bind(publisher_id)
        .bind(genre_id)
        .bind(book.year)
        .bind(book.status.to_string())
        .bind(book.price)
        .bind(book.discounted_price)
        .bind(book.featured.to_string())
        .execute(&pool)
        .await?;
    }
    info!("Seeded {} books", BOOKS.len());

    for (quote, author) in QUOTES {
        sqlx::query("INSERT INTO quotes (quote, author) VALUES (?, ?)")
            .bind(quote)
            .bind(author)
            .execute(&pool)
            .await?;
    }
    info!("Seeded {} quotes", QUOTES.len());

    for (method, price) in DELIVERIES {
        sqlx::query("INSERT INTO deliveries (method, price) VALUES (?, ?)")
            .bind(method)
            .bind(price)
            .execute(&pool)
            .await?;
    }
    info!("Seeded {} delivery methods", DELIVERIES.len());

    info!("Seeding complete!");
    Ok(())
}

/// Find-or-create a row in a name-only catalog table, returning its id.
async fn named_id(pool: &SqlitePool, table: &str, name: &str) -> Result<i64, CommandError> {
    let existing: Option<i64> =
        sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE name = ?"))
            .bind(name)
            .fetch_optional(pool)
            .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query_scalar(&format!(
        "INSERT INTO {table} (name) VALUES (?) RETURNING id"
    ))
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
