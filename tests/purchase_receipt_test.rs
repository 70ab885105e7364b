mod common;

use assert_matches::assert_matches;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use kardex_api::{
    entities::{inventory_movement, product, MovementType},
    errors::ServiceError,
    services::{
        adjustment::ReasonRef,
        receipt::{PurchaseReceipt, ReceiptItem, PURCHASE_RECEIPT_REASON_CODE},
        stock,
    },
};

fn receipt(purchase_id: &str, warehouse_id: Uuid, items: Vec<(Uuid, i32)>) -> PurchaseReceipt {
    PurchaseReceipt {
        purchase_id: purchase_id.to_string(),
        warehouse_id,
        items: items
            .into_iter()
            .map(|(product_id, quantity)| ReceiptItem {
                product_id,
                quantity,
            })
            .collect(),
    }
}

async fn product_stock(ctx: &common::TestContext, product_id: Uuid) -> i32 {
    product::Entity::find_by_id(product_id)
        .one(ctx.db.as_ref())
        .await
        .expect("query failed")
        .expect("product missing")
        .stock
}

#[tokio::test]
async fn receipt_skips_untracked_lines_and_applies_the_rest() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let p2 = common::create_product(ctx.db.as_ref(), "SERV-2", None, false).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    // Seed P1 at 6 units via the adjustment engine
    ctx.adjustments
        .adjust_signed(p1.id, w1.id, 6, ReasonRef::Text("inicial".to_string()), None)
        .await
        .unwrap();

    let outcomes = ctx
        .receipts
        .apply_receipt(receipt("PO-1", w1.id, vec![(p1.id, 5), (p2.id, 3)]))
        .await
        .expect("receipt failed");

    // Only the tracked line produced a result
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].product_id, p1.id);
    assert_eq!(outcomes[0].stock_before, 6);
    assert_eq!(outcomes[0].stock_after, 11);

    assert_eq!(product_stock(&ctx, p1.id).await, 11);
    assert_eq!(product_stock(&ctx, p2.id).await, 0);

    let p2_movements = inventory_movement::Entity::find()
        .filter(inventory_movement::Column::ProductId.eq(p2.id))
        .count(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(p2_movements, 0);
}

#[tokio::test]
async fn receipt_movements_carry_the_canonical_reason_and_document_ref() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    let compra = ctx
        .reasons
        .find_by_code(MovementType::Entrada, PURCHASE_RECEIPT_REASON_CODE)
        .await
        .expect("seeded reason missing");

    let outcomes = ctx
        .receipts
        .apply_receipt(receipt("PO-77", w1.id, vec![(p1.id, 5)]))
        .await
        .unwrap();

    let movement = inventory_movement::Entity::find_by_id(outcomes[0].movement_id)
        .one(ctx.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(movement.movement_type, MovementType::Entrada.as_str());
    assert_eq!(movement.quantity, 5);
    assert_eq!(movement.stock_before, 0);
    assert_eq!(movement.stock_after, 5);
    assert_eq!(movement.reason_id, Some(compra.id));
    assert_eq!(movement.reason, None);
    assert_eq!(movement.document_ref.as_deref(), Some("PO-77"));
}

#[tokio::test]
async fn repeated_product_lines_chain_their_snapshots() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    let outcomes = ctx
        .receipts
        .apply_receipt(receipt("PO-2", w1.id, vec![(p1.id, 5), (p1.id, 3)]))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!((outcomes[0].stock_before, outcomes[0].stock_after), (0, 5));
    assert_eq!((outcomes[1].stock_before, outcomes[1].stock_after), (5, 8));
    assert_eq!(product_stock(&ctx, p1.id).await, 8);
}

#[tokio::test]
async fn invalid_receipts_are_rejected_before_any_write() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    let blank_purchase = ctx
        .receipts
        .apply_receipt(receipt("  ", w1.id, vec![(p1.id, 5)]))
        .await;
    assert_matches!(blank_purchase, Err(ServiceError::ValidationError(_)));

    let empty_items = ctx
        .receipts
        .apply_receipt(receipt("PO-3", w1.id, vec![]))
        .await;
    assert_matches!(empty_items, Err(ServiceError::ValidationError(_)));

    let zero_quantity = ctx
        .receipts
        .apply_receipt(receipt("PO-4", w1.id, vec![(p1.id, 0)]))
        .await;
    assert_matches!(zero_quantity, Err(ServiceError::ValidationError(_)));

    let unknown_warehouse = ctx
        .receipts
        .apply_receipt(receipt("PO-5", Uuid::new_v4(), vec![(p1.id, 5)]))
        .await;
    assert_matches!(unknown_warehouse, Err(ServiceError::NotFound(_)));

    let movements = inventory_movement::Entity::find()
        .count(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements, 0);
}

#[tokio::test]
async fn unknown_product_aborts_the_whole_batch() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    let result = ctx
        .receipts
        .apply_receipt(receipt(
            "PO-6",
            w1.id,
            vec![(p1.id, 5), (Uuid::new_v4(), 2)],
        ))
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    // The valid first line must not have survived the rollback
    let movements = inventory_movement::Entity::find()
        .count(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements, 0);
    assert_eq!(product_stock(&ctx, p1.id).await, 0);
    assert!(stock::find_balance(ctx.db.as_ref(), p1.id, w1.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn all_untracked_receipt_returns_no_lines() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "SERV-1", None, false).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    let outcomes = ctx
        .receipts
        .apply_receipt(receipt("PO-7", w1.id, vec![(p1.id, 5)]))
        .await
        .unwrap();
    assert!(outcomes.is_empty());

    let movements = inventory_movement::Entity::find()
        .count(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements, 0);
}

#[tokio::test]
async fn receipt_requires_the_canonical_reason_to_exist() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    let compra = ctx
        .reasons
        .find_by_code(MovementType::Entrada, PURCHASE_RECEIPT_REASON_CODE)
        .await
        .unwrap();
    ctx.reasons.deactivate(compra.id).await.unwrap();

    let result = ctx
        .receipts
        .apply_receipt(receipt("PO-8", w1.id, vec![(p1.id, 5)]))
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}
