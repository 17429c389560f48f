//! Shared fixture for integration tests: in-memory SQLite with the full
//! schema applied, the service layer wired, and seed helpers for the
//! entities a booking references.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use fieldserve_api::{
    auth::{Actor, Role},
    entities::{
        address, booking,
        booking::TimeSlot,
        pricing_option, service_offering, technician,
        technician::TechnicianStatus,
    },
    events,
    handlers::AppServices,
    migrator::Migrator,
    services::bookings::{BookingDetail, CreateBookingRequest},
};

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    // Keeps the event channel open for the lifetime of the test.
    _event_rx: tokio::sync::mpsc::Receiver<events::Event>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect to in-memory sqlite");
        Migrator::up(&db, None).await.expect("apply migrations");

        let db = Arc::new(db);
        let (event_sender, event_rx) = events::channel(256);
        let services = AppServices::new(db.clone(), Arc::new(event_sender));

        Self {
            db,
            services,
            _event_rx: event_rx,
        }
    }

    pub fn admin(&self) -> Actor {
        Actor::new(Uuid::new_v4(), Role::Admin)
    }

    pub fn customer(&self) -> Actor {
        Actor::new(Uuid::new_v4(), Role::Client)
    }

    pub async fn seed_service(&self, name: &str, category: &str) -> service_offering::Model {
        let now = Utc::now();
        service_offering::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            category: Set(category.to_string()),
            description: Set(None),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .expect("seed service")
    }

    pub async fn seed_pricing(
        &self,
        service_id: Uuid,
        name: &str,
        base_amount: i64,
    ) -> pricing_option::Model {
        let now = Utc::now();
        pricing_option::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_id: Set(service_id),
            name: Set(name.to_string()),
            base_amount: Set(base_amount),
            duration_minutes: Set(Some(60)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .expect("seed pricing option")
    }

    pub async fn seed_address(&self, customer_id: Uuid) -> address::Model {
        let now = Utc::now();
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            street: Set("12 Palm Street".to_string()),
            city: Set("Dubai".to_string()),
            region: Set(Some("Jumeirah".to_string())),
            building: Set(None),
            apartment: Set(Some("4B".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .expect("seed address")
    }

    pub async fn seed_technician(
        &self,
        status: TechnicianStatus,
        specialties: &str,
    ) -> technician::Model {
        let now = Utc::now();
        technician::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Seed Technician".to_string()),
            phone: Set(Some("+971500000000".to_string())),
            email: Set(None),
            status: Set(status),
            specialties: Set(specialties.to_string()),
            assigned_jobs: Set(0),
            completed_jobs: Set(0),
            rating: Set(None),
            admin_rating: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .expect("seed technician")
    }

    /// Seeds a service, pricing option and address, then creates a pending
    /// booking owned by `customer`.
    pub async fn create_pending_booking(&self, customer: &Actor) -> BookingDetail {
        let service = self.seed_service("AC maintenance", "hvac").await;
        let pricing = self.seed_pricing(service.id, "Standard visit", 15_000).await;
        let address = self.seed_address(customer.id).await;

        self.services
            .bookings
            .create_booking(
                customer,
                CreateBookingRequest {
                    service_id: service.id,
                    pricing_option_id: pricing.id,
                    address_id: address.id,
                    scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
                    time_slot: TimeSlot::Morning,
                    contact_name: "Amina K".to_string(),
                    contact_phone: "+971501234567".to_string(),
                    contact_email: Some("amina@example.com".to_string()),
                    notes: Some("Unit drips in the hallway".to_string()),
                    is_emergency: false,
                },
            )
            .await
            .expect("create pending booking")
    }

    pub async fn fetch_booking(&self, booking_id: Uuid) -> booking::Model {
        booking::Entity::find_by_id(booking_id)
            .one(&*self.db)
            .await
            .expect("fetch booking")
            .expect("booking exists")
    }

    pub async fn fetch_technician(&self, technician_id: Uuid) -> technician::Model {
        technician::Entity::find_by_id(technician_id)
            .one(&*self.db)
            .await
            .expect("fetch technician")
            .expect("technician exists")
    }
}
