use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Movement classification stored on every kardex row.
///
/// ENTRADA and SALIDA come from document flows (receipts, consumption);
/// AJUSTE is a manual correction. The persisted `quantity` is a signed
/// delta for all three kinds, so `stock_after = stock_before + quantity`
/// holds uniformly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Entrada,
    Salida,
    Ajuste,
}

impl MovementType {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}
