use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::errors::OrderError;

// ============================================================================
// Identifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DishId(pub i32);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// A strictly positive line-item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(value: i32) -> Result<Self, OrderError> {
        if value <= 0 {
            return Err(OrderError::InvalidQuantity(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn checked_add(self, other: Quantity) -> Result<Quantity, OrderError> {
        self.0
            .checked_add(other.0)
            .map(Quantity)
            .ok_or(OrderError::QuantityOverflow)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = OrderError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Order Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Cooked,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Cooked => "COOKED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Completed)
    }

    /// Line items can only change while the kitchen has not started plating.
    pub fn accepts_line_items(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Forward-only lifecycle. `Pending -> Completed` is the checkout of an
    /// order that never reached the pass.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Cooked) | (Pending, Cancelled) | (Pending, Completed)
                | (Cooked, Cancelled) | (Cooked, Completed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "COOKED" => Ok(OrderStatus::Cooked),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "COMPLETED" => Ok(OrderStatus::Completed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

// ============================================================================
// Selections & Requests
// ============================================================================

/// One requested (dish, quantity) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishSelection {
    pub dish_id: DishId,
    pub quantity: Quantity,
}

impl DishSelection {
    pub fn new(dish_id: i32, quantity: i32) -> Result<Self, OrderError> {
        Ok(Self {
            dish_id: DishId(dish_id),
            quantity: Quantity::new(quantity)?,
        })
    }
}

/// Parses the `"dishId,quantity"` form typed at the ordering terminal.
impl FromStr for DishSelection {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OrderError::InvalidSelection(s.to_string());

        let (dish, quantity) = s.split_once(',').ok_or_else(invalid)?;
        let dish_id: i32 = dish.trim().parse().map_err(|_| invalid())?;
        let quantity: i32 = quantity.trim().parse().map_err(|_| invalid())?;

        DishSelection::new(dish_id, quantity)
    }
}

/// A validated request to place an order: the boundary rejects empty
/// selections before the engine sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    user_id: UserId,
    selections: Vec<DishSelection>,
}

impl OrderRequest {
    pub fn new(user_id: UserId, selections: Vec<DishSelection>) -> Result<Self, OrderError> {
        if selections.is_empty() {
            return Err(OrderError::NoDishesSelected);
        }
        Ok(Self { user_id, selections })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Folds repeated dishes into a single line each, keeping first-seen order.
    pub fn line_items(&self) -> Result<Vec<DishSelection>, OrderError> {
        let mut merged: Vec<DishSelection> = Vec::with_capacity(self.selections.len());
        for selection in &self.selections {
            match merged.iter_mut().find(|s| s.dish_id == selection.dish_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.checked_add(selection.quantity)?
                }
                None => merged.push(*selection),
            }
        }
        Ok(merged)
    }
}

// ============================================================================
// Persisted Shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub order_id: OrderId,
    pub dish_id: DishId,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    pub price: f64,
    pub preparation_time: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDish {
    pub name: String,
    pub price: f64,
    pub preparation_time: Duration,
}

/// Read-back view of one order and the dishes on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub dishes: Vec<(String, i32)>,
}

/// Σ(preparation time × quantity) over the order's lines.
pub fn total_preparation_time<I>(lines: I) -> Result<Duration, OrderError>
where
    I: IntoIterator<Item = (Duration, Quantity)>,
{
    lines.into_iter().try_fold(Duration::ZERO, |total, (prep, quantity)| {
        prep.checked_mul(quantity.get() as u32)
            .and_then(|line| total.checked_add(line))
            .ok_or(OrderError::QuantityOverflow)
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
