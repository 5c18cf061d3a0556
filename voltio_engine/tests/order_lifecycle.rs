//! End-to-end tests of the order lifecycle against a real SQLite database:
//! cart mutations, submission with frozen totals, role-gated transitions,
//! CAS conflicts and terminal states.
use sqlx::migrate::MigrateDatabase;
use sqlx::Sqlite;
use voltio_common::Money;
use voltio_engine::{
    aggregation,
    db_types::{Currency, ExchangeRate, OrderStatus, ProductId, Role, UserId, UserInfo},
    events::EventPublishers,
    lifecycle::Denial,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{ExchangeRates, StorefrontDatabase},
    CartApi, OrderFlowApi, OrderFlowError, SqliteDatabase,
};

const CABLE: ProductId = ProductId(1);
const BREAKER_USD: ProductId = ProductId(2);

fn admin() -> UserInfo {
    UserInfo { id: UserId(1), role: Role::Admin, email: "admin@voltio.test".into(), name: "Admin".into() }
}

fn seller() -> UserInfo {
    UserInfo { id: UserId(2), role: Role::Seller, email: "ventas@voltio.test".into(), name: "Ventas".into() }
}

fn client() -> UserInfo {
    UserInfo { id: UserId(3), role: Role::Client, email: "cliente@voltio.test".into(), name: "Cliente".into() }
}

fn other_seller() -> UserInfo {
    UserInfo { id: UserId(4), role: Role::Seller, email: "otro@voltio.test".into(), name: "Otro".into() }
}

async fn setup() -> (SqliteDatabase, OrderFlowApi<SqliteDatabase>, CartApi<SqliteDatabase>) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    seed(&db).await;
    let flow = OrderFlowApi::new(db.clone(), EventPublishers::default());
    let cart = CartApi::new(db.clone());
    (db, flow, cart)
}

async fn seed(db: &SqliteDatabase) {
    sqlx::query(
        "INSERT INTO users (id, role, email, name, assigned_seller_id) VALUES \
         (1, 'ADMIN', 'admin@voltio.test', 'Admin', NULL), \
         (2, 'SELLER', 'ventas@voltio.test', 'Ventas', NULL), \
         (3, 'CLIENT', 'cliente@voltio.test', 'Cliente', 2), \
         (4, 'SELLER', 'otro@voltio.test', 'Otro', NULL)",
    )
    .execute(db.pool())
    .await
    .expect("Error seeding users");
    sqlx::query(
        "INSERT INTO products (id, name, sku, price_base, currency, tax_rate_bp, stock, is_active) VALUES \
         (1, 'Cable unipolar 2.5mm', 'CAB-25', 10000, 'ARS', 2100, 100, TRUE), \
         (2, 'Breaker importado', 'BRK-USD', 1000, 'USD', 2100, 50, TRUE), \
         (3, 'Producto discontinuado', 'OLD-1', 5000, 'ARS', NULL, 0, FALSE)",
    )
    .execute(db.pool())
    .await
    .expect("Error seeding products");
}

async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await.expect("Error closing database");
    Sqlite::drop_database(&url).await.expect("Error dropping database");
}

#[tokio::test]
async fn submission_freezes_totals_and_decrements_stock() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 2).await.expect("Error adding to cart");
    let submitted = flow.submit_order(&client()).await.expect("Error submitting order");

    // the canonical round-trip: 2 × ARS 100.00 @ 21%
    assert_eq!(submitted.order.status, OrderStatus::Submitted);
    assert_eq!(submitted.order.subtotal, Money::from_units(200));
    assert_eq!(submitted.order.tax_total, Money::from_units(42));
    assert_eq!(submitted.order.total, Money::from_units(242));
    assert_eq!(submitted.order.code.as_ref().unwrap().as_str(), "ORD-1");
    assert!(submitted.order.submitted_at.is_some());
    assert_eq!(submitted.order.seller_id, Some(UserId(2)), "draft routes to the assigned seller");

    let (stock,): (i64,) = sqlx::query_as("SELECT stock FROM products WHERE id = 1")
        .fetch_one(db.pool())
        .await
        .expect("Error reading stock");
    assert_eq!(stock, 98);

    // freeze law: reprice the catalog, re-run the aggregator over the stored
    // snapshots, and the frozen totals must reproduce exactly
    sqlx::query("UPDATE products SET price_base = 99999 WHERE id = 1")
        .execute(db.pool())
        .await
        .expect("Error repricing product");
    let stored = db
        .fetch_order_with_items(submitted.order.id)
        .await
        .expect("Error fetching order")
        .expect("Order disappeared");
    let recomputed = aggregation::order_totals(&stored.items);
    assert_eq!(recomputed.subtotal, stored.order.subtotal);
    assert_eq!(recomputed.tax_total, stored.order.tax_total);
    assert_eq!(recomputed.total, stored.order.total);
    tear_down(db).await;
}

#[tokio::test]
async fn adding_the_same_product_merges_quantities_commutatively() {
    let (db, _flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 2).await.expect("Error adding to cart");
    let after = cart.add_item(&client(), CABLE, 3).await.expect("Error adding to cart");
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].quantity, 5);

    // the reverse insertion order lands on the same quantity
    cart.clear(&client()).await.expect("Error clearing cart");
    cart.add_item(&client(), CABLE, 3).await.expect("Error adding to cart");
    let after = cart.add_item(&client(), CABLE, 2).await.expect("Error adding to cart");
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].quantity, 5);
    tear_down(db).await;
}

#[tokio::test]
async fn quantity_edits_replace_the_item_row_and_clamp_to_one() {
    let (db, _flow, cart) = setup().await;
    let draft = cart.add_item(&client(), CABLE, 4).await.expect("Error adding to cart");
    let item_id = draft.items[0].id;

    let updated = cart.update_quantity(&client(), item_id, -3).await.expect("Error updating quantity");
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].quantity, 1, "quantities below 1 clamp to exactly 1");
    assert_ne!(updated.items[0].id, item_id, "the edit replaces the row rather than patching it");
    assert_eq!(updated.items[0].subtotal, Some(Money::from_units(100)));

    let emptied = cart.remove_item(&client(), updated.items[0].id).await.expect("Error removing item");
    assert!(emptied.items.is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn submitting_an_empty_cart_is_a_validation_error() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 1).await.expect("Error adding to cart");
    cart.clear(&client()).await.expect("Error clearing cart");
    let err = flow.submit_order(&client()).await.expect_err("Expected submission to fail");
    assert!(matches!(err, OrderFlowError::EmptyOrder));
    tear_down(db).await;
}

#[tokio::test]
async fn usd_products_need_a_stored_rate() {
    let (db, _flow, cart) = setup().await;
    let err = cart.add_item(&client(), BREAKER_USD, 1).await.expect_err("Expected add to fail");
    assert!(matches!(err, OrderFlowError::Snapshot(_)), "no rate must never be treated as zero");

    // with a sell rate of ARS 1000.00 per USD the USD 10.00 breaker snapshots
    // at ARS 10,000.00
    let rate = ExchangeRate::new(Currency::Usd, Money::from_units(980), Money::from_units(1000), "BNA");
    db.set_exchange_rate(&rate).await.expect("Error storing rate");
    let draft = cart.add_item(&client(), BREAKER_USD, 1).await.expect("Error adding to cart");
    assert_eq!(draft.items[0].unit_price, Some(Money::from_units(10_000)));
    tear_down(db).await;
}

#[tokio::test]
async fn confirm_is_role_gated_and_idempotence_safe() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 1).await.expect("Error adding to cart");
    let submitted = flow.submit_order(&client()).await.expect("Error submitting order");
    let id = submitted.order.id;

    // a seller who is not assigned to the order is turned away
    let err = flow.confirm_order(&other_seller(), id).await.expect_err("Expected confirm to fail");
    assert!(matches!(err, OrderFlowError::Unauthorized(Denial::NotAssignedSeller)));

    // the assigned seller confirms
    let approved = flow.confirm_order(&seller(), id).await.expect("Error confirming order");
    assert_eq!(approved.status, OrderStatus::Approved);

    // a second confirm is a no-op error and the status stays APPROVED
    let err = flow.confirm_order(&seller(), id).await.expect_err("Expected second confirm to fail");
    assert!(matches!(err, OrderFlowError::TransitionForbidden { .. }));
    let order = db.fetch_order(id).await.expect("Error fetching order").expect("Order disappeared");
    assert_eq!(order.status, OrderStatus::Approved);
    tear_down(db).await;
}

#[tokio::test]
async fn losing_a_status_race_is_a_conflict() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 1).await.expect("Error adding to cart");
    let submitted = flow.submit_order(&client()).await.expect("Error submitting order");
    let id = submitted.order.id;

    // both callers read SUBMITTED; the confirm lands first, so the stale
    // cancel's compare-and-swap must fail with a conflict
    flow.confirm_order(&admin(), id).await.expect("Error confirming order");
    let err = db
        .transition_order(id, OrderStatus::Submitted, OrderStatus::Canceled)
        .await
        .expect_err("Expected the stale write to fail");
    assert!(matches!(err, OrderFlowError::Conflict { expected: OrderStatus::Submitted, .. }));
    tear_down(db).await;
}

#[tokio::test]
async fn clients_cancel_early_admins_cancel_approved() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 1).await.expect("Error adding to cart");
    let submitted = flow.submit_order(&client()).await.expect("Error submitting order");
    let id = submitted.order.id;

    flow.confirm_order(&admin(), id).await.expect("Error confirming order");

    // once approved, the client can no longer cancel directly
    let err = flow.cancel_order(&client(), id).await.expect_err("Expected client cancel to fail");
    assert!(matches!(
        err,
        OrderFlowError::Unauthorized(Denial::ClientCannotActAfterSubmission)
    ));

    // the admin can
    let canceled = flow.cancel_order(&admin(), id).await.expect("Error canceling order");
    assert_eq!(canceled.status, OrderStatus::Canceled);
    tear_down(db).await;
}

#[tokio::test]
async fn terminal_states_reject_every_action() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 1).await.expect("Error adding to cart");
    let submitted = flow.submit_order(&client()).await.expect("Error submitting order");
    let id = submitted.order.id;

    // walk the full fulfilment chain
    flow.confirm_order(&admin(), id).await.expect("Error confirming");
    flow.assign_order(&admin(), id, UserId(2)).await.expect("Error assigning");
    flow.fulfill_order(&admin(), id).await.expect("Error fulfilling");
    flow.ship_order(&admin(), id).await.expect("Error shipping");
    let delivered = flow.deliver_order(&admin(), id).await.expect("Error delivering");
    assert_eq!(delivered.status, OrderStatus::Delivered);

    // DELIVERED is terminal, even for admins
    let err = flow.cancel_order(&admin(), id).await.expect_err("Expected cancel to fail");
    assert!(matches!(err, OrderFlowError::TransitionForbidden { .. }));
    let order = db.fetch_order(id).await.expect("Error fetching order").expect("Order disappeared");
    assert_eq!(order.status, OrderStatus::Delivered);
    tear_down(db).await;
}

#[tokio::test]
async fn sellers_only_see_their_assigned_orders() {
    let (db, flow, cart) = setup().await;
    cart.add_item(&client(), CABLE, 1).await.expect("Error adding to cart");
    let submitted = flow.submit_order(&client()).await.expect("Error submitting order");
    let id = submitted.order.id;

    assert!(flow.order_for(&seller(), id).await.is_ok());
    assert!(matches!(
        flow.order_for(&other_seller(), id).await,
        Err(OrderFlowError::Unauthorized(Denial::NotAssignedSeller))
    ));

    let listing = flow.search(&other_seller(), Default::default()).await.expect("Error searching");
    assert_eq!(listing.total_orders, 0);
    let listing = flow.search(&seller(), Default::default()).await.expect("Error searching");
    assert_eq!(listing.total_orders, 1);
    tear_down(db).await;
}
