///  To run :
///  cargo r --example client_example
use std::time::Duration;

use ordernest_client::{ListQuery, NestClient};
use ordernest_hex::config::AuthConfig;
use ordernest_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use ordernest_repo::build_repo;
use ordernest_types::domain::order::{CreateOrderRequest, OrderStatus};
use tempfile::tempdir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("ordernest.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let state = AppState::from_config(repo, &AuthConfig::new("example-signing-key"));
    let server = HttpServer::new(
        state,
        HttpServerConfig {
            port: "0".into(),
            request_timeout: Duration::from_secs(20),
        },
    )
    .await?;
    let addr = format!("http://127.0.0.1:{}/", server.local_addr()?.port());

    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_with_shutdown(async move {
        let _ = stopped.await;
    }));

    let anonymous = NestClient::builder(&addr)?
        .with_timeout(Duration::from_secs(5))
        .build()?;
    anonymous.health().await?;

    let user = anonymous.register("demo-shop", "demo-password").await?;
    println!("Registered user id={} username={}", user.id, user.username);

    let tokens = anonymous.login("demo-shop", "demo-password").await?;
    println!("Logged in, access token expires in {}s", tokens.expires_in);
    let client = anonymous.with_token(tokens.access_token);

    let receipt = client
        .create_order(&CreateOrderRequest {
            store_id: Some(131172),
            merchant_order_id: Some("DEMO-1".into()),
            recipient_name: Some("Karim".into()),
            recipient_phone: Some("01711223344".into()),
            recipient_address: Some("House 12, Road 5, Banani".into()),
            recipient_city: Some(1),
            recipient_zone: Some(1),
            delivery_type: Some(48),
            item_type: Some(2),
            item_quantity: Some(1),
            item_weight: Some(1.5),
            amount_to_collect: Some(1500),
            item_description: Some("books".into()),
            ..CreateOrderRequest::default()
        })
        .await?;
    println!(
        "Created consignment {} with delivery fee {}",
        receipt.consignment_id, receipt.delivery_fee
    );

    let page = client.list_orders(&ListQuery::default()).await?;
    println!("Listed {} of {} orders", page.total_in_page, page.total);

    client.cancel_order(&receipt.consignment_id).await?;
    let fetched = client.get_order(&receipt.consignment_id).await?;
    println!("Order {} is now {}", fetched.consignment_id, fetched.status);
    assert_eq!(fetched.status, OrderStatus::Canceled);

    client.logout().await?;

    let _ = stop.send(());
    handle.await??;
    Ok(())
}
