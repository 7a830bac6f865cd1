use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use restaurant_orders::config::Config;
use restaurant_orders::db;
use restaurant_orders::domain::order::{
    DishSelection, NewDish, OrderLifecycleEngine, OrderRequest, UserId,
};
use restaurant_orders::metrics::{self, Metrics};
use restaurant_orders::notifications::UserNotificationService;
use restaurant_orders::store::{DishCatalog, InMemoryStore, OrderStore, PgOrderStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run -- 7 1,2 2,1
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,restaurant_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting restaurant order service");

    let config = Config::from_env()?;

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // Metrics HTTP server gets its own runtime on a background thread
    let server_metrics = metrics.clone();
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime error: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(server_metrics, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 2. Pick the store ===
    let (store, dishes): (Arc<dyn OrderStore>, Arc<dyn DishCatalog>) = match &config.database {
        Some(database) => {
            let pool = db::connect(database).await?;
            db::ensure_schema(&pool).await?;
            let store = Arc::new(PgOrderStore::new(pool));
            (store.clone(), store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running against the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store)
        }
    };
    seed_menu(dishes.as_ref()).await?;
    for dish in dishes.list_dishes().await? {
        tracing::info!(
            "🍲 #{} {} ({:.2}, {}s)",
            dish.id,
            dish.name,
            dish.price,
            dish.preparation_time.as_secs()
        );
    }

    // === 3. Engine with the customer-facing subscriber attached ===
    let engine = OrderLifecycleEngine::new(store, dishes)
        .with_metrics(metrics.clone())
        .with_cook_retry(config.cook_retry.clone());
    engine.attach(Arc::new(UserNotificationService)).await;

    // === 4. Demonstrate the order lifecycle ===
    let request = request_from_args(std::env::args().skip(1).collect())?;
    let user_id = request.user_id();

    let placed = engine.place_order(request).await?;
    tracing::info!(
        "📝 Order #{} placed, ready in {}s",
        placed.order_id,
        placed.preparation_time.as_secs()
    );

    let line = engine
        .add_line_item(placed.order_id, DishSelection::new(2, 1)?)
        .await?;
    tracing::info!("➕ Dish {} now x{}", line.dish_id, line.quantity);

    for summary in engine.orders_for_user(user_id).await? {
        tracing::info!(
            "📋 Order #{} [{}] created {}: {:?}",
            summary.order_id,
            summary.status,
            summary.created_at,
            summary.dishes
        );
    }

    tracing::info!("⏳ Waiting for the kitchen...");
    let outcome = placed.cooking.await??;
    tracing::info!("Cooking finished: {:?}", outcome);

    let completed = engine.complete_orders_for_user(user_id).await?;
    tracing::info!("✅ Checkout completed {} order(s) for user {}", completed, user_id);

    tracing::info!("🎉 Demo complete!");

    Ok(())
}

/// `<user_id> <dishId,quantity>...`; falls back to a fixed demo order.
fn request_from_args(args: Vec<String>) -> anyhow::Result<OrderRequest> {
    let Some((user, selections)) = args.split_first() else {
        return Ok(OrderRequest::new(
            UserId(7),
            vec![DishSelection::new(1, 2)?, DishSelection::new(2, 1)?],
        )?);
    };

    let user_id = UserId(user.parse()?);
    let selections = selections
        .iter()
        .map(|s| s.parse::<DishSelection>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OrderRequest::new(user_id, selections)?)
}

async fn seed_menu(dishes: &dyn DishCatalog) -> anyhow::Result<()> {
    if !dishes.list_dishes().await?.is_empty() {
        return Ok(());
    }

    let menu = [
        ("Borscht", 4.5, 10),
        ("Rye bread", 1.0, 5),
        ("Varenyky", 6.0, 15),
    ];
    for (name, price, secs) in menu {
        dishes
            .add_dish(NewDish {
                name: name.to_string(),
                price,
                preparation_time: Duration::from_secs(secs),
            })
            .await?;
    }
    tracing::info!("Seeded menu with {} dishes", menu.len());
    Ok(())
}
