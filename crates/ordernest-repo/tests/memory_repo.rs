#![cfg(feature = "memory")]

use ordernest_repo::memory::InMemoryRepo;
use ordernest_types::domain::order::{CreateOrderRequest, Order, OrderListFilter, OrderStatus};
use ordernest_types::domain::pagination::Pagination;
use ordernest_types::domain::user::NewUser;
use ordernest_types::ports::order_repository::{OrderRepository, RepoError};
use ordernest_types::ports::user_repository::UserRepository;

fn order_for(created_by: u64, merchant_order_id: &str) -> Order {
    Order::new(
        CreateOrderRequest {
            store_id: Some(1),
            merchant_order_id: Some(merchant_order_id.into()),
            recipient_name: Some("Test".into()),
            recipient_phone: Some("01811223344".into()),
            recipient_address: Some("Mirpur 10".into()),
            recipient_city: Some(1),
            recipient_zone: Some(1),
            delivery_type: Some(48),
            item_type: Some(2),
            item_quantity: Some(1),
            item_weight: Some(1.5),
            amount_to_collect: Some(500),
            ..CreateOrderRequest::default()
        },
        created_by,
    )
    .unwrap()
}

#[tokio::test]
async fn memory_repo_order_flow() {
    let repo = InMemoryRepo::new();
    let order = order_for(1, "M-1");

    let receipt = repo.create(order.clone()).await.unwrap();
    assert_eq!(receipt.consignment_id, order.consignment_id);
    assert_eq!(receipt.merchant_order_id, "M-1");
    assert_eq!(receipt.order_status, OrderStatus::Pending);
    assert_eq!(receipt.delivery_fee, 85.0);

    let fetched = repo.get(&order.consignment_id).await.unwrap().unwrap();
    assert_eq!(fetched.recipient_name, "Test");
    assert!(fetched.id > 0);

    repo.cancel(&order.consignment_id, 2).await.unwrap();
    let canceled = repo.get(&order.consignment_id).await.unwrap().unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert_eq!(canceled.updated_by, 2);
}

#[tokio::test]
async fn memory_repo_rejects_duplicate_consignment() {
    let repo = InMemoryRepo::new();
    let order = order_for(1, "M-1");
    repo.create(order.clone()).await.unwrap();
    let dup = repo.create(order).await;
    assert!(matches!(dup, Err(RepoError::Conflict(_))));
}

#[tokio::test]
async fn memory_repo_lists_filtered_pages_in_insertion_order() {
    let repo = InMemoryRepo::new();
    for i in 0..12 {
        repo.create(order_for(1, &format!("M-{i}"))).await.unwrap();
    }
    repo.create(order_for(2, "other")).await.unwrap();

    let filter = OrderListFilter {
        created_by: 1,
        transfer_status: 1,
        archive: 0,
        limit: 5,
        page: 3,
    };
    let (page, total) = repo
        .list(&filter, &Pagination::normalize(5, 3))
        .await
        .unwrap();
    assert_eq!(total, 12);
    let ids: Vec<_> = page.iter().map(|o| o.merchant_order_id.as_str()).collect();
    assert_eq!(ids, ["M-10", "M-11"]);

    let archived = OrderListFilter { archive: 1, ..filter };
    let (page, total) = repo
        .list(&archived, &Pagination::normalize(5, 1))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    let missing = uuid::Uuid::new_v4().to_string();
    assert!(repo.get(&missing).await.unwrap().is_none());
    assert!(matches!(
        repo.cancel(&missing, 1).await,
        Err(RepoError::NotFound)
    ));
    assert!(matches!(
        repo.get_by_username("ghost").await,
        Err(RepoError::NotFound)
    ));
    assert!(matches!(repo.get_by_id(42).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn memory_repo_user_flow() {
    let repo = InMemoryRepo::new();
    let user = repo
        .create_user(NewUser {
            username: "merchant".into(),
            password_hash: "hash".into(),
        })
        .await
        .unwrap();
    assert!(user.id > 0);

    let by_name = repo.get_by_username("merchant").await.unwrap();
    assert_eq!(by_name.id, user.id);
    let by_id = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(by_id.username, "merchant");
    assert_eq!(by_id.password_hash, "hash");

    let dup = repo
        .create_user(NewUser {
            username: "merchant".into(),
            password_hash: "other".into(),
        })
        .await;
    assert!(matches!(dup, Err(RepoError::Conflict(_))));
}
