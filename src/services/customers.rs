use crate::{
    entities::{customer, Customer, CustomerModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Customer registry: commerce-side records keyed by the platform's opaque
/// user identity.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Strict lookup by platform user id.
    #[instrument(skip(self))]
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No customer for platform user {}", user_id))
            })
    }

    /// Returns the customer for a platform user, creating one on first
    /// commerce interaction.
    #[instrument(skip(self))]
    pub async fn get_or_create(
        &self,
        input: GetOrCreateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        if let Some(existing) = Customer::find()
            .filter(customer::Column::UserId.eq(input.user_id))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let customer_id = Uuid::new_v4();
        let now = Utc::now();

        let record = customer::ActiveModel {
            id: Set(customer_id),
            user_id: Set(input.user_id),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let record = record.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CustomerCreated(customer_id))
            .await;

        info!(
            "Created customer {} for platform user {}",
            customer_id, input.user_id
        );
        Ok(record)
    }

    /// Direct edit of the contact fields.
    #[instrument(skip(self))]
    pub async fn update_contact(
        &self,
        customer_id: Uuid,
        input: UpdateContactInput,
    ) -> Result<CustomerModel, ServiceError> {
        let record = Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        let mut record: customer::ActiveModel = record.into();
        if let Some(phone) = input.phone {
            record.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            record.address = Set(Some(address));
        }
        record.updated_at = Set(Utc::now());

        Ok(record.update(&*self.db).await?)
    }
}

/// Input for get-or-create
#[derive(Debug, Deserialize)]
pub struct GetOrCreateCustomerInput {
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for contact updates
#[derive(Debug, Deserialize)]
pub struct UpdateContactInput {
    pub phone: Option<String>,
    pub address: Option<String>,
}
