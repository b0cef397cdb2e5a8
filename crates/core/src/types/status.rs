//! Status enums for books, carts, and orders.
//!
//! All variants round-trip through `Display`/`FromStr` because they are
//! stored as TEXT columns.

use serde::{Deserialize, Serialize};

/// Catalog availability of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Borrowed,
    Sold,
    #[default]
    Exist,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Borrowed => write!(f, "borrowed"),
            Self::Sold => write!(f, "sold"),
            Self::Exist => write!(f, "exist"),
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(Self::Borrowed),
            "sold" => Ok(Self::Sold),
            "exist" => Ok(Self::Exist),
            _ => Err(format!("invalid book status: {s}")),
        }
    }
}

/// Catalog highlighting tier of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Featured {
    #[default]
    Normal,
    Featured,
    Popular,
}

impl std::fmt::Display for Featured {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Featured => write!(f, "featured"),
            Self::Popular => write!(f, "popular"),
        }
    }
}

impl std::str::FromStr for Featured {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "featured" => Ok(Self::Featured),
            "popular" => Ok(Self::Popular),
            _ => Err(format!("invalid featured tier: {s}")),
        }
    }
}

/// Lifecycle state of a cart.
///
/// A cart is `Open` from creation until checkout converts it into an order,
/// after which it is `CheckedOut` and never mutated or checked out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    #[default]
    Open,
    CheckedOut,
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::CheckedOut => write!(f, "checked_out"),
        }
    }
}

impl std::str::FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "checked_out" => Ok(Self::CheckedOut),
            _ => Err(format!("invalid cart status: {s}")),
        }
    }
}

/// Payment lifecycle state of an order.
///
/// The only legal transitions are `Draft -> Pending` and
/// `Pending -> {Completed, Failed}`. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Pending)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
