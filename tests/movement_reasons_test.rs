mod common;

use assert_matches::assert_matches;

use kardex_api::{
    entities::MovementType,
    errors::ServiceError,
    services::adjustment::{AdjustmentDirection, ReasonRef, StockAdjustment},
};

#[tokio::test]
async fn seeded_catalog_is_present_and_queryable() {
    let ctx = common::setup().await;

    let all = ctx.reasons.list(None, false).await.unwrap();
    let codes: Vec<&str> = all.iter().map(|r| r.code.as_str()).collect();
    assert!(codes.contains(&"COMPRA"));
    assert!(codes.contains(&"VENTA"));
    assert!(codes.contains(&"CONTEO"));

    let entradas = ctx
        .reasons
        .list(Some(MovementType::Entrada), false)
        .await
        .unwrap();
    assert!(entradas
        .iter()
        .all(|r| r.movement_type == MovementType::Entrada.as_str()));

    let compra = ctx
        .reasons
        .find_by_code(MovementType::Entrada, "COMPRA")
        .await
        .unwrap();
    assert_eq!(compra.name, "Compra a proveedor");
}

#[tokio::test]
async fn create_normalizes_codes_and_rejects_duplicates() {
    let ctx = common::setup().await;

    let created = ctx
        .reasons
        .create(
            MovementType::Salida,
            "rotura ".to_string(),
            "Rotura en tienda".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(created.code, "ROTURA");
    assert!(created.active);

    let duplicate = ctx
        .reasons
        .create(
            MovementType::Salida,
            "ROTURA".to_string(),
            "Otra rotura".to_string(),
        )
        .await;
    assert_matches!(duplicate, Err(ServiceError::Conflict(_)));

    // Same code under another movement type is a different key
    let other_type = ctx
        .reasons
        .create(
            MovementType::Entrada,
            "ROTURA".to_string(),
            "Reingreso por rotura".to_string(),
        )
        .await;
    assert!(other_type.is_ok());
}

#[tokio::test]
async fn deactivation_hides_a_reason_from_selection() {
    let ctx = common::setup().await;

    let conteo = ctx
        .reasons
        .find_by_code(MovementType::Ajuste, "CONTEO")
        .await
        .unwrap();

    let deactivated = ctx.reasons.deactivate(conteo.id).await.unwrap();
    assert!(!deactivated.active);

    let lookup = ctx
        .reasons
        .find_by_code(MovementType::Ajuste, "CONTEO")
        .await;
    assert_matches!(lookup, Err(ServiceError::NotFound(_)));

    let visible = ctx.reasons.list(Some(MovementType::Ajuste), false).await.unwrap();
    assert!(visible.iter().all(|r| r.code != "CONTEO"));

    let including_inactive = ctx
        .reasons
        .list(Some(MovementType::Ajuste), true)
        .await
        .unwrap();
    assert!(including_inactive.iter().any(|r| r.code == "CONTEO"));
}

#[tokio::test]
async fn delete_is_gated_on_ledger_references() {
    let ctx = common::setup().await;
    let p1 = common::create_product(ctx.db.as_ref(), "P1", None, true).await;
    let w1 = common::create_warehouse(ctx.db.as_ref(), "W1").await;

    // An unused reason can be removed outright
    let unused = ctx
        .reasons
        .create(
            MovementType::Ajuste,
            "TEMPORAL".to_string(),
            "Motivo temporal".to_string(),
        )
        .await
        .unwrap();
    ctx.reasons.delete(unused.id).await.unwrap();

    // Once a movement references a reason, deletion must fail
    let conteo = ctx
        .reasons
        .find_by_code(MovementType::Ajuste, "CONTEO")
        .await
        .unwrap();
    ctx.adjustments
        .adjust(StockAdjustment {
            product_id: p1.id,
            warehouse_id: w1.id,
            magnitude: 5,
            direction: AdjustmentDirection::Increment,
            reason: ReasonRef::Coded(conteo.id),
            user_id: None,
        })
        .await
        .unwrap();

    let blocked = ctx.reasons.delete(conteo.id).await;
    assert_matches!(blocked, Err(ServiceError::Conflict(_)));

    // The reason survives the failed delete
    let still_there = ctx
        .reasons
        .find_by_code(MovementType::Ajuste, "CONTEO")
        .await;
    assert!(still_there.is_ok());

    let missing = ctx.reasons.delete(uuid::Uuid::new_v4()).await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));
}
