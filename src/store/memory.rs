use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{ensure_terminal, DishCatalog, OrderStore};
use crate::domain::order::{
    Dish, DishId, DishSelection, NewDish, Order, OrderError, OrderId, OrderLineItem, OrderStatus,
    OrderSummary, Quantity, UserId,
};

#[derive(Default)]
struct Tables {
    dishes: BTreeMap<DishId, Dish>,
    orders: BTreeMap<OrderId, Order>,
    order_details: BTreeMap<(OrderId, DishId), Quantity>,
    order_seq: i32,
    dish_seq: i32,
}

/// In-memory order store. Each call takes the table lock once, so every
/// operation is applied entirely or not at all.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DishCatalog for InMemoryStore {
    async fn preparation_time(&self, dish_id: DishId) -> Result<Duration, OrderError> {
        let tables = self.tables.read().await;
        tables
            .dishes
            .get(&dish_id)
            .map(|dish| dish.preparation_time)
            .ok_or(OrderError::DishNotFound(dish_id))
    }

    async fn list_dishes(&self) -> Result<Vec<Dish>, OrderError> {
        let tables = self.tables.read().await;
        Ok(tables.dishes.values().cloned().collect())
    }

    async fn add_dish(&self, dish: NewDish) -> Result<Dish, OrderError> {
        let mut tables = self.tables.write().await;
        tables.dish_seq += 1;
        let dish = Dish {
            id: DishId(tables.dish_seq),
            name: dish.name,
            price: dish.price,
            preparation_time: dish.preparation_time,
        };
        tables.dishes.insert(dish.id, dish.clone());
        Ok(dish)
    }

    async fn remove_dish(&self, dish_id: DishId) -> Result<bool, OrderError> {
        let mut tables = self.tables.write().await;
        if tables.order_details.keys().any(|(_, dish)| *dish == dish_id) {
            return Err(OrderError::DishInUse(dish_id));
        }
        Ok(tables.dishes.remove(&dish_id).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(
        &self,
        user_id: UserId,
        lines: &[DishSelection],
    ) -> Result<Order, OrderError> {
        let mut tables = self.tables.write().await;

        // Stage every row first; nothing is written unless all of them are valid.
        if let Some(missing) = lines.iter().find(|l| !tables.dishes.contains_key(&l.dish_id)) {
            return Err(OrderError::DishNotFound(missing.dish_id));
        }
        let mut staged: BTreeMap<DishId, Quantity> = BTreeMap::new();
        for line in lines {
            let quantity = match staged.get(&line.dish_id) {
                Some(existing) => existing.checked_add(line.quantity)?,
                None => line.quantity,
            };
            staged.insert(line.dish_id, quantity);
        }

        tables.order_seq += 1;
        let order = Order {
            id: OrderId(tables.order_seq),
            user_id,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());
        for (dish_id, quantity) in staged {
            tables.order_details.insert((order.id, dish_id), quantity);
        }

        Ok(order)
    }

    async fn mark_cooked(&self, order_id: OrderId) -> Result<bool, OrderError> {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&order_id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = OrderStatus::Cooked;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_line_item(
        &self,
        order_id: OrderId,
        selection: DishSelection,
    ) -> Result<OrderLineItem, OrderError> {
        let mut tables = self.tables.write().await;

        let status = tables
            .orders
            .get(&order_id)
            .map(|order| order.status)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if !status.accepts_line_items() {
            return Err(OrderError::StateConflict { order_id, status });
        }
        if !tables.dishes.contains_key(&selection.dish_id) {
            return Err(OrderError::DishNotFound(selection.dish_id));
        }

        let key = (order_id, selection.dish_id);
        let quantity = match tables.order_details.get(&key) {
            Some(existing) => existing.checked_add(selection.quantity)?,
            None => selection.quantity,
        };
        tables.order_details.insert(key, quantity);

        Ok(OrderLineItem {
            order_id,
            dish_id: selection.dish_id,
            quantity,
        })
    }

    async fn transition_user_orders(
        &self,
        user_id: UserId,
        target: OrderStatus,
    ) -> Result<u64, OrderError> {
        ensure_terminal(target)?;

        let mut tables = self.tables.write().await;
        let mut affected = 0;
        for order in tables.orders.values_mut() {
            if order.user_id == user_id && order.status.can_transition_to(target) {
                order.status = target;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&order_id).cloned())
    }

    async fn line_items(&self, order_id: OrderId) -> Result<Vec<OrderLineItem>, OrderError> {
        let tables = self.tables.read().await;
        Ok(tables
            .order_details
            .range((order_id, DishId(i32::MIN))..=(order_id, DishId(i32::MAX)))
            .map(|(&(order_id, dish_id), &quantity)| OrderLineItem {
                order_id,
                dish_id,
                quantity,
            })
            .collect())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderError> {
        let tables = self.tables.read().await;

        let summaries = tables
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .filter_map(|order| {
                let dishes: Vec<(String, i32)> = tables
                    .order_details
                    .range((order.id, DishId(i32::MIN))..=(order.id, DishId(i32::MAX)))
                    .filter_map(|(&(_, dish_id), quantity)| {
                        tables
                            .dishes
                            .get(&dish_id)
                            .map(|dish| (dish.name.clone(), quantity.get()))
                    })
                    .collect();

                // Inner-join semantics: an order without resolvable lines has no rows.
                (!dishes.is_empty()).then(|| OrderSummary {
                    order_id: order.id,
                    status: order.status,
                    created_at: order.created_at,
                    dishes,
                })
            })
            .collect();

        Ok(summaries)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
