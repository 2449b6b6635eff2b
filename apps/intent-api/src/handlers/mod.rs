//! # Intent Handlers
//!
//! One async function per intent, grouped by area:
//!
//! - [`sale`] - `record_sale`
//! - [`inventory`] - `check_stock`, `check_price`, `list_products`, `low_stock_report`
//! - [`sales_report`] - `sales_summary`, `sale_details`
//! - [`customer`] - `customer_lookup`
//! - [`expense`] - `record_expense`, `expense_summary`
//! - [`overview`] - `business_overview`
//! - [`staff`] - `clock_in`, `clock_out`, `attendance_summary`, `list_employees`, `employee_details`
//! - [`tasks`] - `create_task`, `list_tasks`, `complete_task`
//! - [`help`] - `help`
//!
//! Every handler has the same shape:
//!
//! ```text
//! async fn handler(state: &AppState, ctx: &AuthorizedContext, entities: &Entities) -> HandlerResult
//!
//!   1. validate entities        (ValidationError → Err, no store access)
//!   2. read / write the store   (StoreError → Err with context)
//!   3. format the reply         (Reply { message, data })
//! ```

pub mod customer;
pub mod expense;
pub mod help;
pub mod inventory;
pub mod overview;
pub mod sale;
pub mod sales_report;
pub mod staff;
pub mod tasks;

use serde_json::Value;

use tally_core::{CoreError, ValidationError};
use tally_db::StoreError;

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: String,
    pub data: Option<Value>,
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Self {
        Reply {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        Reply {
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Handler failure. Rendered as `success:false` with status 200.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Business rule or validation failure.
    #[error(transparent)]
    Business(#[from] CoreError),

    /// Store failure, with what the handler was doing.
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl HandlerError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        HandlerError::Store {
            context: context.into(),
            source,
        }
    }

    /// Value of the response's `error` field.
    pub fn code(&self) -> String {
        match self {
            HandlerError::Business(e) => e.code().to_string(),
            HandlerError::Store { source, .. } => source.code().to_string(),
        }
    }
}

impl From<ValidationError> for HandlerError {
    fn from(err: ValidationError) -> Self {
        HandlerError::Business(CoreError::Validation(err))
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        HandlerError::store("Could not reach your business records", err)
    }
}

pub type HandlerResult = Result<Reply, HandlerError>;

/// Integer entity in `1..=max`, `default` when absent.
pub(crate) fn bounded_integer(
    entities: &tally_core::Entities,
    key: &str,
    default: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    let value = entities.integer(key)?.unwrap_or(default);
    if !(1..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: key.to_string(),
            min: 1,
            max,
        });
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for handler tests.

    use std::sync::Arc;

    use serde_json::Value;
    use tally_core::{
        new_id, AuthorizedContext, Employee, Entities, ExecutionContext, InventoryItem, Membership,
        UnverifiedRole,
    };
    use tally_db::MemoryStore;

    use crate::config::{BridgeConfig, StoreBackend};
    use crate::AppState;

    pub const TENANT: &str = "tenant-1";

    pub fn state(store: &MemoryStore) -> AppState {
        let config = BridgeConfig {
            store: StoreBackend::Memory,
            ..BridgeConfig::default()
        };
        let mut state = AppState::new(Arc::new(store.clone()), &config);
        state.sequences = state.sequences.clone().without_jitter();
        state
    }

    pub fn ctx(user_id: &str, role: &str) -> AuthorizedContext {
        let membership = Membership {
            tenant_id: TENANT.into(),
            user_id: user_id.into(),
            role: role.into(),
            is_active: true,
        };
        AuthorizedContext::new(
            ExecutionContext {
                tenant_id: TENANT.into(),
                user_id: user_id.into(),
                role: UnverifiedRole::default(),
                display_name: Some("Amina".into()),
            },
            &membership,
        )
    }

    pub fn entities(value: Value) -> Entities {
        Entities::from(value)
    }

    pub fn product(name: &str, stock: i64, price_cents: i64) -> InventoryItem {
        InventoryItem {
            id: new_id(),
            tenant_id: TENANT.into(),
            name: name.into(),
            sku: None,
            current_stock: stock,
            reorder_level: 5,
            unit_price_cents: price_cents,
            liters_per_unit: None,
        }
    }

    pub fn employee(name: &str, user_id: Option<&str>) -> Employee {
        Employee {
            id: new_id(),
            tenant_id: TENANT.into(),
            user_id: user_id.map(str::to_string),
            full_name: name.into(),
            position: Some("Sales".into()),
            phone: None,
            is_active: true,
        }
    }
}
