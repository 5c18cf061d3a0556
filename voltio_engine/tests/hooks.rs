//! Tests for the notification hooks: submissions and status changes reach
//! the subscribed handler with the payload the e-mail collaborator expects,
//! without the transition waiting on them.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use sqlx::migrate::MigrateDatabase;
use sqlx::Sqlite;
use voltio_engine::{
    db_types::{ProductId, QuoteContact, QuoteLine, Role, UserId, UserInfo},
    events::{EventHandler, EventPublishers, NotificationEvent, OrderSubmittedEvent},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::StorefrontDatabase,
    CartApi, OrderFlowApi, SqliteDatabase,
};

fn client() -> UserInfo {
    UserInfo { id: UserId(3), role: Role::Client, email: "cliente@voltio.test".into(), name: "Cliente".into() }
}

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    sqlx::query(
        "INSERT INTO users (id, role, email, name) VALUES (3, 'CLIENT', 'cliente@voltio.test', 'Cliente')",
    )
    .execute(db.pool())
    .await
    .expect("Error seeding users");
    sqlx::query(
        "INSERT INTO products (id, name, sku, price_base, currency, tax_rate_bp, stock, is_active) \
         VALUES (1, 'Cable unipolar 2.5mm', 'CAB-25', 10000, 'ARS', 2100, 100, TRUE)",
    )
    .execute(db.pool())
    .await
    .expect("Error seeding products");
    db
}

async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await.expect("Error closing database");
    Sqlite::drop_database(&url).await.expect("Error dropping database");
}

#[tokio::test]
async fn submission_notifies_the_hook_with_the_client_contact() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (c, s) = (calls.clone(), seen.clone());
    let handler = EventHandler::new(10, Arc::new(move |ev: OrderSubmittedEvent| {
        let (calls, seen) = (c.clone(), s.clone());
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(ev.notification);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let publishers =
        EventPublishers { order_submitted: vec![handler.subscribe()], order_status_changed: vec![] };

    let db = setup().await;
    let flow = OrderFlowApi::new(db.clone(), publishers);
    let cart = CartApi::new(db.clone());
    cart.add_item(&client(), ProductId(1), 2).await.expect("Error adding to cart");
    flow.submit_order(&client()).await.expect("Error submitting order");

    // dropping the api releases the last publisher, so the handler drains and
    // exits; nothing in the submission path waited on it
    drop(flow);
    handler.start_handler().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].order_code, "ORD-1");
    assert_eq!(seen[0].client_name, "Cliente");
    assert_eq!(seen[0].client_email.as_deref(), Some("cliente@voltio.test"));
    assert_eq!(seen[0].event, NotificationEvent::Submitted);
    tear_down(db).await;
}

#[tokio::test]
async fn guest_quotes_notify_with_the_contact_details() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let handler = EventHandler::new(10, Arc::new(move |ev: OrderSubmittedEvent| {
        let seen = s.clone();
        Box::pin(async move {
            seen.lock().unwrap().push(ev);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let publishers =
        EventPublishers { order_submitted: vec![handler.subscribe()], order_status_changed: vec![] };

    let db = setup().await;
    let flow = OrderFlowApi::new(db.clone(), publishers);
    let contact = QuoteContact {
        name: "Obra San Martín".into(),
        email: "compras@obra.test".into(),
        phone: Some("11-5555-0000".into()),
        message: None,
    };
    let lines = vec![QuoteLine {
        product_id: Some(ProductId(1)),
        sku: Some("CAB-25".into()),
        name: "Cable unipolar 2.5mm".into(),
        quantity: 10,
    }];
    let quote = flow.submit_quote(&contact, &lines).await.expect("Error submitting quote");
    assert_eq!(quote.order.code.as_ref().unwrap().as_str(), "COT-1");
    assert!(quote.items[0].unit_price.is_none(), "guest quote lines carry no prices");

    drop(flow);
    handler.start_handler().await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].notification.client_name, "Obra San Martín");
    assert_eq!(seen[0].notification.client_email.as_deref(), Some("compras@obra.test"));
    tear_down(db).await;
}
