//! Basket, login merge and checkout through the shop routes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use booktime_core::{BasketId, BasketStatus, OrderId, OrderLineStatus};
use booktime_integration_tests::{TestApp, TestClient, address};
use booktime_storefront::db::{BasketStore, OrderStore};
use booktime_storefront::models::OrderScope;

fn id_of(body: &Value) -> i32 {
    i32::try_from(body["id"].as_i64().unwrap()).unwrap()
}

async fn add(client: &mut TestClient, product: i32) -> Value {
    let response = client
        .post("/basket/add", json!({ "product": product }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

async fn save_address(client: &mut TestClient, name: &str) -> i32 {
    let response = client
        .post("/account/addresses", serde_json::to_value(address(name)).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    id_of(&response.body)
}

#[tokio::test]
async fn test_add_increments_existing_line() {
    let app = TestApp::new();
    let dune = app.seed_product("Dune", 999).await;
    let mut client = app.client();

    let first = add(&mut client, dune.id.as_i32()).await;
    let second = add(&mut client, dune.id.as_i32()).await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["quantity"], 2);

    let basket = client.get("/basket").await;
    assert_eq!(basket.status, StatusCode::OK);
    assert_eq!(basket.body["count"], 2);
    assert_eq!(basket.body["is_empty"], false);
    assert_eq!(basket.body["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_basket_without_session() {
    let app = TestApp::new();
    let mut client = app.client();

    let basket = client.get("/basket").await;
    assert_eq!(basket.status, StatusCode::OK);
    assert_eq!(basket.body["count"], 0);
    assert_eq!(basket.body["is_empty"], true);
}

#[tokio::test]
async fn test_inactive_product_cannot_be_added() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.post("/basket/add", json!({ "product": 4242 })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quantity_update_and_removal() {
    let app = TestApp::new();
    let dune = app.seed_product("Dune", 999).await;
    let mut client = app.client();

    let line = add(&mut client, dune.id.as_i32()).await;
    let uri = format!("/basket/lines/{}", id_of(&line));

    let response = client.patch(&uri, json!({ "quantity": 4 })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["quantity"], 4);

    let response = client.patch(&uri, json!({ "quantity": 0 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = client.delete(&uri).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let basket = client.get("/basket").await;
    assert_eq!(basket.body["is_empty"], true);
}

#[tokio::test]
async fn test_merge_into_existing_basket_keeps_duplicate_lines() {
    let app = TestApp::new();
    let user = app.seed_user("reader@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;

    // Earlier visit: logged in, two copies in the user's basket.
    let mut earlier = app.client();
    earlier.login("reader@booktime.domain").await;
    add(&mut earlier, dune.id.as_i32()).await;
    let line = add(&mut earlier, dune.id.as_i32()).await;
    let existing = BasketId::new(line["basket"].as_i64().unwrap().try_into().unwrap());

    // New visit: one copy anonymously, then log in.
    let mut client = app.client();
    let anonymous = add(&mut client, dune.id.as_i32()).await;
    let session_basket = BasketId::new(anonymous["basket"].as_i64().unwrap().try_into().unwrap());
    client.login("reader@booktime.domain").await;

    assert!(app.store.get_basket(session_basket).await.unwrap().is_none());
    assert_eq!(
        app.store.open_baskets_for_user(user.id).await.unwrap(),
        vec![existing]
    );

    let mut quantities: Vec<i32> = app
        .store
        .basket_lines(existing)
        .await
        .unwrap()
        .iter()
        .map(|line| line.quantity)
        .collect();
    quantities.sort_unstable();
    assert_eq!(quantities, [1, 2]);

    let basket = client.get("/basket").await;
    assert_eq!(id_of(&basket.body), existing.as_i32());
    assert_eq!(basket.body["count"], 3);
    assert_eq!(basket.body["lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_merge_without_existing_basket_assigns_user() {
    let app = TestApp::new();
    let user = app.seed_user("reader@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;

    let mut client = app.client();
    let line = add(&mut client, dune.id.as_i32()).await;
    let basket_id = BasketId::new(line["basket"].as_i64().unwrap().try_into().unwrap());
    client.login("reader@booktime.domain").await;

    let basket = app.store.get_basket(basket_id).await.unwrap().unwrap();
    assert_eq!(basket.user_id, Some(user.id));
    assert_eq!(
        app.store.open_baskets_for_user(user.id).await.unwrap(),
        vec![basket_id]
    );

    let view = client.get("/basket").await;
    assert_eq!(id_of(&view.body), basket_id.as_i32());
}

#[tokio::test]
async fn test_second_login_does_not_inherit_previous_users_basket() {
    let app = TestApp::new();
    app.seed_user("alice@booktime.domain", None).await;
    app.seed_user("bob@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;

    let mut client = app.client();
    client.login("alice@booktime.domain").await;
    let alices = add(&mut client, dune.id.as_i32()).await;
    let alices_basket = BasketId::new(alices["basket"].as_i64().unwrap().try_into().unwrap());

    client.login("bob@booktime.domain").await;
    let view = client.get("/basket").await;
    assert_eq!(view.body["count"], 0);
    assert_eq!(view.body["is_empty"], true);

    let bobs = add(&mut client, dune.id.as_i32()).await;
    assert_ne!(bobs["basket"], alices["basket"]);
    assert_eq!(bobs["quantity"], 1);

    let lines = app.store.basket_lines(alices_basket).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 1);
}

#[tokio::test]
async fn test_quantity_has_no_upper_bound() {
    let app = TestApp::new();
    let dune = app.seed_product("Dune", 999).await;
    let mut client = app.client();

    let line = add(&mut client, dune.id.as_i32()).await;
    let response = client
        .patch(
            &format!("/basket/lines/{}", id_of(&line)),
            json!({ "quantity": 1001 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["quantity"], 1001);

    let basket = client.get("/basket").await;
    assert_eq!(basket.body["count"], 1001);
}

#[tokio::test]
async fn test_checkout_expands_quantities_and_submits_basket() {
    let app = TestApp::new();
    let user = app.seed_user("reader@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;
    let emma = app.seed_product("Emma", 550).await;

    let mut client = app.client();
    client.login("reader@booktime.domain").await;
    add(&mut client, dune.id.as_i32()).await;
    add(&mut client, dune.id.as_i32()).await;
    let line = add(&mut client, emma.id.as_i32()).await;
    let basket_id = BasketId::new(line["basket"].as_i64().unwrap().try_into().unwrap());

    let address_id = save_address(&mut client, "Ada").await;
    let response = client
        .post(
            "/checkout",
            json!({ "billing_address": address_id, "shipping_address": address_id }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["status"], "new");
    assert_eq!(response.body["billing_city"], "Leeds");
    let order_id = OrderId::new(id_of(&response.body));

    let lines = app.store.order_lines(order_id).await.unwrap();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.status == OrderLineStatus::New));
    assert_eq!(lines.iter().filter(|l| l.product_id == dune.id).count(), 2);
    assert_eq!(lines.iter().filter(|l| l.product_id == emma.id).count(), 1);

    let basket = app.store.get_basket(basket_id).await.unwrap().unwrap();
    assert_eq!(basket.status, BasketStatus::Submitted);
    assert!(app.store.open_baskets_for_user(user.id).await.unwrap().is_empty());

    // The session no longer points at the submitted basket.
    let view = client.get("/basket").await;
    assert_eq!(view.body["is_empty"], true);
    assert_eq!(view.body["id"], Value::Null);

    let again = client
        .post(
            "/checkout",
            json!({ "billing_address": address_id, "shipping_address": address_id }),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_address_changes_do_not_reach_placed_orders() {
    let app = TestApp::new();
    app.seed_user("reader@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;

    let mut client = app.client();
    client.login("reader@booktime.domain").await;
    add(&mut client, dune.id.as_i32()).await;
    let billing = save_address(&mut client, "Ada").await;
    let shipping = save_address(&mut client, "Grace").await;

    let order = client
        .post(
            "/checkout",
            json!({ "billing_address": billing, "shipping_address": shipping }),
        )
        .await;
    assert_eq!(order.status, StatusCode::CREATED);
    let order_id = id_of(&order.body);

    let mut moved = address("Ada Lovelace");
    moved.city = "York".to_owned();
    let response = client
        .put(
            &format!("/account/addresses/{billing}"),
            serde_json::to_value(moved).unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let response = client
        .delete(&format!("/account/addresses/{shipping}"))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let detail = client.get(&format!("/account/orders/{order_id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["billing_name"], "Ada");
    assert_eq!(detail.body["billing_city"], "Leeds");
    assert_eq!(detail.body["shipping_name"], "Grace");
    assert_eq!(detail.body["lines"].as_array().unwrap().len(), 1);

    let stored = app
        .store
        .get_order(OrderId::new(order_id), OrderScope::All)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.billing_city, "Leeds");
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let app = TestApp::new();
    let dune = app.seed_product("Dune", 999).await;
    let mut client = app.client();
    add(&mut client, dune.id.as_i32()).await;

    let response = client
        .post(
            "/checkout",
            json!({ "billing_address": 1, "shipping_address": 1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_basket_cannot_be_checked_out() {
    let app = TestApp::new();
    app.seed_user("reader@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;

    let mut client = app.client();
    client.login("reader@booktime.domain").await;
    let line = add(&mut client, dune.id.as_i32()).await;
    client
        .delete(&format!("/basket/lines/{}", id_of(&line)))
        .await;
    let address_id = save_address(&mut client, "Ada").await;

    let response = client
        .post(
            "/checkout",
            json!({ "billing_address": address_id, "shipping_address": address_id }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_users_address_is_not_found() {
    let app = TestApp::new();
    app.seed_user("ada@booktime.domain", None).await;
    app.seed_user("grace@booktime.domain", None).await;
    let dune = app.seed_product("Dune", 999).await;

    let mut ada = app.client();
    ada.login("ada@booktime.domain").await;
    let foreign = save_address(&mut ada, "Ada").await;

    let mut grace = app.client();
    grace.login("grace@booktime.domain").await;
    add(&mut grace, dune.id.as_i32()).await;

    let response = grace
        .post(
            "/checkout",
            json!({ "billing_address": foreign, "shipping_address": foreign }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = grace.get(&format!("/account/addresses/{foreign}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
