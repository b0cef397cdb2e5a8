//! Cart repository: open-cart lookup, line mutation, and cart merging.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use paperback_core::{BookId, CartId, CartItemId, CartStatus, OrderId, UserId};

use super::RepositoryError;
use super::books::BookRow;
use crate::models::Identity;
use crate::models::book::Book;
use crate::models::cart::{Cart, CartItem};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: Option<i64>,
    session_key: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl CartRow {
    fn into_domain(self) -> Result<Cart, RepositoryError> {
        let status: CartStatus = self
            .status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Cart {
            id: CartId::new(self.id),
            user_id: self.user_id.map(UserId::new),
            session_key: self.session_key,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    cart_id: i64,
    book_id: i64,
    quantity: i64,
    owned: bool,
    order_id: Option<i64>,
    added_at: DateTime<Utc>,
}

impl CartItemRow {
    fn into_domain(self) -> CartItem {
        CartItem {
            id: CartItemId::new(self.id),
            cart_id: CartId::new(self.cart_id),
            book_id: BookId::new(self.book_id),
            quantity: self.quantity,
            owned: self.owned,
            order_id: self.order_id.map(OrderId::new),
            added_at: self.added_at,
        }
    }
}

/// One cart line joined with its book.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: i64,
    cart_id: i64,
    book_id: i64,
    quantity: i64,
    owned: bool,
    order_id: Option<i64>,
    added_at: DateTime<Utc>,
    title: String,
    author_id: i64,
    publisher_id: i64,
    genre_id: i64,
    year_published: i64,
    status: String,
    price: String,
    discounted_price: Option<String>,
    description: Option<String>,
    featured: String,
}

impl CartLineRow {
    fn into_domain(self) -> Result<(CartItem, Book), RepositoryError> {
        let item = CartItem {
            id: CartItemId::new(self.item_id),
            cart_id: CartId::new(self.cart_id),
            book_id: BookId::new(self.book_id),
            quantity: self.quantity,
            owned: self.owned,
            order_id: self.order_id.map(OrderId::new),
            added_at: self.added_at,
        };
        let book = BookRow {
            id: self.book_id,
            title: self.title,
            author_id: self.author_id,
            publisher_id: self.publisher_id,
            genre_id: self.genre_id,
            year_published: self.year_published,
            status: self.status,
            price: self.price,
            discounted_price: self.discounted_price,
            description: self.description,
            featured: self.featured,
        }
        .into_domain()?;

        Ok((item, book))
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All *open* carts for an identity, most recently created first.
    ///
    /// The one-open-cart invariant makes more than one element a consistency
    /// violation; the cart manager repairs it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_open_carts(&self, identity: &Identity) -> Result<Vec<Cart>, RepositoryError> {
        let rows = match identity {
            Identity::User(user_id) => {
                sqlx::query_as::<_, CartRow>(
                    r"
                    SELECT id, user_id, session_key, status, created_at
                    FROM carts
                    WHERE user_id = ? AND status = ?
                    ORDER BY created_at DESC, id DESC
                    ",
                )
                .bind(user_id.as_i64())
                .bind(CartStatus::Open.to_string())
                .fetch_all(self.pool)
                .await?
            }
            Identity::Anonymous(key) => {
                sqlx::query_as::<_, CartRow>(
                    r"
                    SELECT id, user_id, session_key, status, created_at
                    FROM carts
                    WHERE session_key = ? AND user_id IS NULL AND status = ?
                    ORDER BY created_at DESC, id DESC
                    ",
                )
                .bind(key.as_str())
                .bind(CartStatus::Open.to_string())
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(CartRow::into_domain).collect()
    }

    /// Create a fresh open cart for an identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, identity: &Identity) -> Result<Cart, RepositoryError> {
        let now = Utc::now();
        let (user_id, session_key) = match identity {
            Identity::User(id) => (Some(id.as_i64()), None),
            Identity::Anonymous(key) => (None, Some(key.as_str())),
        };

        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO carts (user_id, session_key, status, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, session_key, status, created_at
            ",
        )
        .bind(user_id)
        .bind(session_key)
        .bind(CartStatus::Open.to_string())
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        row.into_domain()
    }

    /// Delete carts (and, via cascade, their items).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_carts(&self, ids: &[CartId]) -> Result<(), RepositoryError> {
        for id in ids {
            sqlx::query("DELETE FROM carts WHERE id = ?")
                .bind(id.as_i64())
                .execute(self.pool)
                .await?;
        }

        Ok(())
    }

    /// Reassign an anonymous cart to a user (login cart adoption).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn assign_to_user(
        &self,
        cart_id: CartId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE carts SET user_id = ?, session_key = NULL WHERE id = ?")
                .bind(user_id.as_i64())
                .bind(cart_id.as_i64())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Number of lines in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_items(&self, cart_id: CartId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?")
            .bind(cart_id.as_i64())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// All lines of a cart joined with their books, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_with_books(
        &self,
        cart_id: CartId,
    ) -> Result<Vec<(CartItem, Book)>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id AS item_id, ci.cart_id, ci.book_id, ci.quantity, ci.owned,
                   ci.order_id, ci.added_at,
                   b.title, b.author_id, b.publisher_id, b.genre_id, b.year_published,
                   b.status, b.price, b.discounted_price, b.description, b.featured
            FROM cart_items ci
            JOIN books b ON b.id = ci.book_id
            WHERE ci.cart_id = ?
            ORDER BY ci.added_at, ci.id
            ",
        )
        .bind(cart_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartLineRow::into_domain).collect()
    }

    /// Find a cart line by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, book_id, quantity, owned, order_id, added_at
            FROM cart_items
            WHERE id = ?
            ",
        )
        .bind(item_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CartItemRow::into_domain))
    }

    /// Find the (cart, book) line, if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_line(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, book_id, quantity, owned, order_id, added_at
            FROM cart_items
            WHERE cart_id = ? AND book_id = ?
            ",
        )
        .bind(cart_id.as_i64())
        .bind(book_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CartItemRow::into_domain))
    }

    /// Insert a fresh quantity-1 line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the (cart, book) line already
    /// exists, `RepositoryError::Database` for other failures.
    pub async fn insert_line(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<CartItem, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (cart_id, book_id, quantity, owned, added_at)
            VALUES (?, ?, 1, 0, ?)
            RETURNING id, cart_id, book_id, quantity, owned, order_id, added_at
            ",
        )
        .bind(cart_id.as_i64())
        .bind(book_id.as_i64())
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("cart line already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into_domain())
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn set_quantity(
        &self,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(item_id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a cart line.
    ///
    /// # Returns
    ///
    /// Returns `true` if the line was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?")
            .bind(item_id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Merge every line of `from` into `into`, summing quantities where both
    /// carts hold the same book, then delete `from`. Runs in one transaction
    /// so the (cart, book) uniqueness invariant holds throughout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn merge(&self, from: CartId, into: CartId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Books present in both carts: fold quantities into the target line.
        sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = quantity + (
                SELECT src.quantity FROM cart_items src
                WHERE src.cart_id = ? AND src.book_id = cart_items.book_id
            )
            WHERE cart_id = ?
              AND book_id IN (SELECT book_id FROM cart_items WHERE cart_id = ?)
            ",
        )
        .bind(from.as_i64())
        .bind(into.as_i64())
        .bind(from.as_i64())
        .execute(&mut *tx)
        .await?;

        // Books only in the source cart: move the lines over.
        sqlx::query(
            r"
            UPDATE cart_items
            SET cart_id = ?
            WHERE cart_id = ?
              AND book_id NOT IN (SELECT book_id FROM cart_items WHERE cart_id = ?)
            ",
        )
        .bind(into.as_i64())
        .bind(from.as_i64())
        .bind(into.as_i64())
        .execute(&mut *tx)
        .await?;

        // Whatever is left in the source was folded above; drop it with the cart.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(from.as_i64())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM carts WHERE id = ?")
            .bind(from.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
