use utoipa::OpenApi;

/// OpenAPI document for the inventory ledger API, served by swagger-ui.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::inventory::adjust_stock,
        crate::handlers::inventory::apply_receipt,
        crate::handlers::inventory::get_product_stock,
        crate::handlers::kardex::query_kardex,
        crate::handlers::alerts::get_stock_alerts,
        crate::handlers::reasons::list_reasons,
        crate::handlers::reasons::create_reason,
        crate::handlers::reasons::deactivate_reason,
        crate::handlers::reasons::delete_reason,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::entities::MovementType,
        crate::handlers::inventory::AdjustStockRequest,
        crate::handlers::inventory::ApplyReceiptRequest,
        crate::handlers::inventory::ReceiptItemRequest,
        crate::handlers::inventory::StockBreakdownResponse,
        crate::handlers::inventory::WarehouseBalanceResponse,
        crate::handlers::reasons::CreateReasonRequest,
        crate::services::adjustment::AdjustmentDirection,
        crate::services::adjustment::AdjustmentOutcome,
        crate::services::receipt::ReceiptLineOutcome,
        crate::services::kardex::KardexRow,
        crate::services::kardex::KardexPage,
        crate::services::kardex::KardexSortKey,
        crate::services::kardex::SortOrder,
        crate::services::alerts::AlertSeverity,
        crate::services::alerts::StockAlert,
    )),
    tags(
        (name = "inventory", description = "Stock adjustments, receipts and balances"),
        (name = "kardex", description = "Movement ledger queries"),
        (name = "movement-reasons", description = "Movement reason catalog")
    )
)]
pub struct ApiDoc;
