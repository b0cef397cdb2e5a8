//! The cart manager.
//!
//! Owns every cart mutation and enforces the one-open-cart-per-identity
//! invariant. All operations take the resolved [`Identity`] explicitly; the
//! service never looks at the request itself.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use paperback_core::{BookId, CartItemId, DeliveryId, UserId};

use crate::db::{BookRepository, CartRepository, CatalogRepository};
use crate::error::{AppError, Result};
use crate::models::book::{Book, Delivery};
use crate::models::cart::{Cart, CartItem, QuantityAction};
use crate::models::{Identity, SessionKey};

/// Result of adding a book to a cart.
#[derive(Debug)]
pub struct AddedItem {
    pub item: CartItem,
    pub book: Book,
    /// Number of lines in the cart after the add.
    pub cart_count: i64,
}

/// Result of a quantity update: the new line state plus the recomputed
/// totals the client needs to redraw.
#[derive(Debug)]
pub struct QuantityUpdate {
    pub item_id: CartItemId,
    pub book_id: BookId,
    pub new_quantity: i64,
    pub line_total: Decimal,
    pub cart_total: Decimal,
}

/// One line of the cart view, joined with its book.
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub book: Book,
    pub line_total: Decimal,
}

/// Everything the cart page needs in one shot.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    /// Number of lines (not units).
    pub item_count: i64,
    /// Sum of `quantity x book.price` over all lines.
    pub total: Decimal,
    pub deliveries: Vec<Delivery>,
    pub delivery: Option<Delivery>,
    pub total_with_delivery: Decimal,
}

/// The cart manager.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    books: BookRepository<'a>,
    catalog: CatalogRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            books: BookRepository::new(pool),
            catalog: CatalogRepository::new(pool),
        }
    }

    /// The identity's open cart, created lazily on first access.
    ///
    /// Repair policy: finding more than one open cart is a consistency
    /// violation; the most recent survives and the rest are deleted without
    /// migrating their items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn get_or_create_cart(&self, identity: &Identity) -> Result<Cart> {
        let mut open = self.carts.find_open_carts(identity).await?.into_iter();

        if let Some(newest) = open.next() {
            let stale: Vec<_> = open.map(|cart| cart.id).collect();
            if !stale.is_empty() {
                tracing::warn!(
                    identity = %identity,
                    kept = %newest.id,
                    deleted = stale.len(),
                    "multiple open carts for one identity; keeping the most recent"
                );
                self.carts.delete_carts(&stale).await?;
            }
            return Ok(newest);
        }

        Ok(self.carts.create(identity).await?)
    }

    /// Add one unit of a book to the identity's cart.
    ///
    /// Find-or-create on the (cart, book) line: an existing line gains one
    /// unit, a fresh line starts at quantity 1.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AuthenticationRequired` for anonymous identities
    /// and `AppError::NotFound` when the book doesn't exist.
    pub async fn add_item(&self, identity: &Identity, book_id: BookId) -> Result<AddedItem> {
        if identity.user_id().is_none() {
            return Err(AppError::AuthenticationRequired);
        }

        let book = self
            .books
            .get(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {book_id}")))?;

        let cart = self.get_or_create_cart(identity).await?;

        let item = match self.carts.find_line(cart.id, book.id).await? {
            Some(line) => {
                let quantity = line.quantity + 1;
                self.carts.set_quantity(line.id, quantity).await?;
                CartItem { quantity, ..line }
            }
            None => self.carts.insert_line(cart.id, book.id).await?,
        };

        let cart_count = self.carts.count_items(cart.id).await?;

        Ok(AddedItem {
            item,
            book,
            cart_count,
        })
    }

    /// Apply an increase/decrease to a cart line.
    ///
    /// Increase adds one unit; decrease subtracts one but never drops below
    /// quantity 1 (removal is a separate operation). Idempotent at the
    /// floor: decreasing a quantity-1 line changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the line doesn't exist or belongs
    /// to a different identity's cart.
    pub async fn update_quantity(
        &self,
        identity: &Identity,
        item_id: CartItemId,
        action: QuantityAction,
    ) -> Result<QuantityUpdate> {
        let cart = self.get_or_create_cart(identity).await?;

        let item = self
            .carts
            .find_item(item_id)
            .await?
            .filter(|item| item.cart_id == cart.id)
            .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;

        let new_quantity = match action {
            QuantityAction::Increase => item.quantity + 1,
            QuantityAction::Decrease => (item.quantity - 1).max(1),
        };
        if new_quantity != item.quantity {
            self.carts.set_quantity(item.id, new_quantity).await?;
        }

        let lines = self.carts.items_with_books(cart.id).await?;
        let cart_total = cart_total(&lines);
        let line_total = lines
            .iter()
            .find(|(line, _)| line.id == item.id)
            .map(|(line, book)| Decimal::from(line.quantity) * book.price)
            .unwrap_or_default();

        Ok(QuantityUpdate {
            item_id: item.id,
            book_id: item.book_id,
            new_quantity,
            line_total,
            cart_total,
        })
    }

    /// Remove a cart line.
    ///
    /// A line that exists but belongs to another identity's cart is left
    /// alone and the call reports `false` rather than erroring, mirroring
    /// the storefront's silent redirect on a stale remove link.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the line doesn't exist at all.
    pub async fn remove_item(&self, identity: &Identity, item_id: CartItemId) -> Result<bool> {
        let item = self
            .carts
            .find_item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;

        let cart = self.get_or_create_cart(identity).await?;
        if item.cart_id != cart.id {
            tracing::debug!(
                item = %item_id,
                identity = %identity,
                "remove for a line outside the identity's cart; ignoring"
            );
            return Ok(false);
        }

        self.carts.delete_item(item_id).await?;
        Ok(true)
    }

    /// The full cart page payload: lines, totals, and delivery options.
    ///
    /// The selected delivery method lives in the session and only affects
    /// the displayed total; checkout totals ignore it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn cart_view(
        &self,
        identity: &Identity,
        selected_delivery: Option<DeliveryId>,
    ) -> Result<CartView> {
        let cart = self.get_or_create_cart(identity).await?;
        let lines = self.carts.items_with_books(cart.id).await?;

        let total = cart_total(&lines);
        let lines: Vec<CartLine> = lines
            .into_iter()
            .map(|(item, book)| CartLine {
                line_total: Decimal::from(item.quantity) * book.price,
                item,
                book,
            })
            .collect();

        let deliveries = self.catalog.deliveries().await?;
        let delivery = match selected_delivery {
            Some(id) => self.catalog.get_delivery(id).await?,
            None => None,
        };
        let total_with_delivery = total + delivery.as_ref().map_or(Decimal::ZERO, |d| d.price);

        Ok(CartView {
            item_count: i64::try_from(lines.len()).unwrap_or(i64::MAX),
            lines,
            total,
            deliveries,
            delivery,
            total_with_delivery,
        })
    }

    /// Fold the anonymous session's cart into the user's on login.
    ///
    /// Quantities are summed per book so the (cart, book) uniqueness
    /// invariant holds; the anonymous cart is deleted. When the user has no
    /// open cart yet, the anonymous cart is adopted wholesale.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn merge_on_login(&self, key: &SessionKey, user_id: UserId) -> Result<()> {
        let anonymous = Identity::Anonymous(key.clone());
        let mut anon_carts = self.carts.find_open_carts(&anonymous).await?.into_iter();

        let Some(anon_cart) = anon_carts.next() else {
            return Ok(());
        };
        let stale: Vec<_> = anon_carts.map(|cart| cart.id).collect();
        if !stale.is_empty() {
            self.carts.delete_carts(&stale).await?;
        }

        match self
            .carts
            .find_open_carts(&Identity::User(user_id))
            .await?
            .into_iter()
            .next()
        {
            Some(user_cart) => {
                tracing::info!(
                    from = %anon_cart.id,
                    into = %user_cart.id,
                    user = %user_id,
                    "merging anonymous cart into user cart"
                );
                self.carts.merge(anon_cart.id, user_cart.id).await?;
            }
            None => {
                self.carts.assign_to_user(anon_cart.id, user_id).await?;
            }
        }

        Ok(())
    }
}

/// Sum of `quantity x book.price` over the lines, in exact decimal
/// arithmetic.
fn cart_total(lines: &[(CartItem, Book)]) -> Decimal {
    lines
        .iter()
        .map(|(item, book)| Decimal::from(item.quantity) * book.price)
        .sum()
}
