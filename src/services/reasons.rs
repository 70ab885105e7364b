use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        inventory_movement,
        movement_reason::{self, Entity as MovementReason},
        MovementType,
    },
    errors::ServiceError,
};

/// CRUD over the movement reason catalog. The only non-obvious rule is the
/// delete gate: a reason referenced by any movement can never be removed,
/// only deactivated, preserving the ledger's referential integrity.
#[derive(Clone)]
pub struct MovementReasonService {
    db: Arc<DatabaseConnection>,
}

impl MovementReasonService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        movement_type: Option<MovementType>,
        include_inactive: bool,
    ) -> Result<Vec<movement_reason::Model>, ServiceError> {
        let db = &*self.db;

        let mut query = MovementReason::find();
        if let Some(movement_type) = movement_type {
            query = query.filter(movement_reason::Column::MovementType.eq(movement_type.as_str()));
        }
        if !include_inactive {
            query = query.filter(movement_reason::Column::Active.eq(true));
        }

        query
            .order_by_asc(movement_reason::Column::MovementType)
            .order_by_asc(movement_reason::Column::Code)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Looks up an active reason by its `(movement_type, code)` key.
    pub async fn find_by_code(
        &self,
        movement_type: MovementType,
        code: &str,
    ) -> Result<movement_reason::Model, ServiceError> {
        let db = &*self.db;

        MovementReason::find()
            .filter(movement_reason::Column::MovementType.eq(movement_type.as_str()))
            .filter(movement_reason::Column::Code.eq(code))
            .filter(movement_reason::Column::Active.eq(true))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Movement reason {}/{} not found",
                    movement_type.as_str(),
                    code
                ))
            })
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        movement_type: MovementType,
        code: String,
        name: String,
    ) -> Result<movement_reason::Model, ServiceError> {
        let db = &*self.db;

        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "reason code is required".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "reason name is required".to_string(),
            ));
        }

        let duplicate = MovementReason::find()
            .filter(movement_reason::Column::MovementType.eq(movement_type.as_str()))
            .filter(movement_reason::Column::Code.eq(code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "movement reason {}/{} already exists",
                movement_type.as_str(),
                code
            )));
        }

        let reason = movement_reason::ActiveModel {
            id: Set(Uuid::new_v4()),
            movement_type: Set(movement_type.as_str().to_string()),
            code: Set(code.clone()),
            name: Set(name.trim().to_string()),
            active: Set(true),
            created_at: Set(Utc::now()),
        };

        let created = reason.insert(db).await.map_err(ServiceError::db_error)?;
        info!(code = %created.code, "movement reason created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<movement_reason::Model, ServiceError> {
        let db = &*self.db;

        let reason = MovementReason::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement reason {} not found", id)))?;

        let mut active: movement_reason::ActiveModel = reason.into();
        active.active = Set(false);
        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Physically deletes a reason, allowed only while no movement links it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;

        let reason = MovementReason::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement reason {} not found", id)))?;

        let usages = inventory_movement::Entity::find()
            .filter(inventory_movement::Column::ReasonId.eq(id))
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        if usages > 0 {
            return Err(ServiceError::Conflict(format!(
                "movement reason {} is referenced by {} movements; deactivate it instead",
                reason.code, usages
            )));
        }

        MovementReason::delete_by_id(id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        info!(code = %reason.code, "movement reason deleted");
        Ok(())
    }
}
