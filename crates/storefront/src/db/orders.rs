//! Order repository: the checkout transaction and payment state transitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use paperback_core::{BookId, CartStatus, OrderId, OrderItemId, OrderStatus, UserId, money};

use super::RepositoryError;
use crate::models::book::Book;
use crate::models::cart::{Cart, CartItem};
use crate::models::order::{Order, OrderItem};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    session_key: Option<String>,
    payment_ref: String,
    total_price: String,
    status: String,
    created_at: DateTime<Utc>,
    payment_date: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_domain(self) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let total_price = money::parse_amount(&self.total_price)
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", self.id)))?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: self.user_id.map(UserId::new),
            session_key: self.session_key,
            payment_ref: self.payment_ref,
            total_price,
            status,
            created_at: self.created_at,
            payment_date: self.payment_date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    book_id: i64,
    quantity: i64,
    price: String,
}

impl OrderItemRow {
    fn into_domain(self) -> Result<OrderItem, RepositoryError> {
        let price = money::parse_amount(&self.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("order item {}: {e}", self.id))
        })?;

        Ok(OrderItem {
            id: OrderItemId::new(self.id),
            order_id: OrderId::new(self.order_id),
            book_id: BookId::new(self.book_id),
            quantity: self.quantity,
            price,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, user_id, session_key, payment_ref, total_price, status, created_at, payment_date";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_domain).transpose()
    }

    /// Get an order together with its item snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_items(
        &self,
        id: OrderId,
    ) -> Result<Option<(Order, Vec<OrderItem>)>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_id, book_id, quantity, price FROM order_items \
             WHERE order_id = ? ORDER BY id",
        )
        .bind(id.as_i64())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(OrderItemRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some((order, items)))
    }

    /// Number of orders a user created at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_recent(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id.as_i64())
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Convert a cart into a pending order inside one transaction:
    /// insert the order, snapshot every line into `order_items` at the
    /// book's current price, back-reference the cart lines, and flip the
    /// cart to `checked_out`.
    ///
    /// Any failure rolls the whole transaction back; no partial
    /// order/order-item rows survive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart is no longer open.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        cart: &Cart,
        lines: &[(CartItem, Book)],
        total_price: Decimal,
    ) -> Result<Order, RepositoryError> {
        let now = Utc::now();
        let payment_ref = uuid::Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, session_key, payment_ref, total_price, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id.as_i64())
        .bind(cart.session_key.as_deref())
        .bind(&payment_ref)
        .bind(money::format_amount(total_price))
        .bind(OrderStatus::Pending.to_string())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (item, book) in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, book_id, quantity, price) VALUES (?, ?, ?, ?)",
            )
            .bind(order_row.id)
            .bind(book.id.as_i64())
            .bind(item.quantity)
            .bind(money::format_amount(book.price))
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE cart_items SET order_id = ? WHERE id = ?")
                .bind(order_row.id)
                .bind(item.id.as_i64())
                .execute(&mut *tx)
                .await?;
        }

        // The status guard makes a concurrent double-checkout of the same
        // cart lose: the second transaction affects zero rows and aborts.
        let result = sqlx::query("UPDATE carts SET status = ? WHERE id = ? AND status = ?")
            .bind(CartStatus::CheckedOut.to_string())
            .bind(cart.id.as_i64())
            .bind(CartStatus::Open.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(
                "cart already checked out".to_owned(),
            ));
        }

        tx.commit().await?;

        order_row.into_domain()
    }

    /// Complete payment for a pending order: stamp the payment date and mark
    /// every unowned cart line of the owning user as owned, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is not pending.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn complete_payment(
        &self,
        order_id: OrderId,
        user_id: Option<UserId>,
        payment_date: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET status = ?, payment_date = ? WHERE id = ? AND status = ?",
        )
        .bind(OrderStatus::Completed.to_string())
        .bind(payment_date)
        .bind(order_id.as_i64())
        .bind(OrderStatus::Pending.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict("order is not pending".to_owned()));
        }

        if let Some(user_id) = user_id {
            sqlx::query(
                r"
                UPDATE cart_items
                SET owned = 1
                WHERE owned = 0
                  AND cart_id IN (SELECT id FROM carts WHERE user_id = ?)
                ",
            )
            .bind(user_id.as_i64())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Mark a pending order failed. No ownership side effects.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is not pending.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn fail_payment(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
            .bind(OrderStatus::Failed.to_string())
            .bind(order_id.as_i64())
            .bind(OrderStatus::Pending.to_string())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict("order is not pending".to_owned()));
        }

        Ok(())
    }
}
