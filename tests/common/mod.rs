use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, Schema};
use serde_json::Value;
use storefront_api::{
    config::AppConfig,
    entities::{self, ProductModel, ProductSpecs},
    events::{self, EventSender},
    services::{AppServices, CreateCategoryInput, CreateProductInput},
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // A single pooled connection keeps every query on the same
        // in-memory database.
        let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
        opts.max_connections(1).min_connections(1);

        let pool = Database::connect(opts)
            .await
            .expect("failed to create test database");

        let backend = pool.get_database_backend();
        let schema = Schema::new(backend);
        let statements = [
            schema.create_table_from_entity(entities::Category),
            schema.create_table_from_entity(entities::Product),
            schema.create_table_from_entity(entities::Cart),
            schema.create_table_from_entity(entities::CartLine),
            schema.create_table_from_entity(entities::Customer),
        ];
        for statement in &statements {
            pool.execute(backend.build(statement))
                .await
                .expect("failed to create test schema");
        }

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::build(db_arc.clone(), event_sender.clone());

        let state = Arc::new(AppState {
            db: db_arc,
            config: AppConfig::new("sqlite::memory:", "127.0.0.1", 18080, "test"),
            event_sender,
            services,
        });

        let router = Router::new()
            .nest("/api/v1", storefront_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with optional JSON body and headers.
    #[allow(dead_code)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Seed a category, optionally bound to a product kind.
    #[allow(dead_code)]
    pub async fn seed_category(
        &self,
        name: &str,
        slug: &str,
        product_kind: Option<entities::ProductKind>,
    ) -> entities::CategoryModel {
        self.state
            .services
            .categories
            .create_category(CreateCategoryInput {
                name: name.to_string(),
                slug: slug.to_string(),
                product_kind,
            })
            .await
            .expect("seed category for tests")
    }

    /// Seed a product. Prices stay on quarter boundaries so SQLite's float
    /// storage round-trips them exactly.
    #[allow(dead_code)]
    pub async fn seed_product(
        &self,
        title: &str,
        slug: &str,
        price: Decimal,
        specs: ProductSpecs,
    ) -> ProductModel {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                category_id: None,
                title: title.to_string(),
                slug: slug.to_string(),
                image: None,
                description: format!("{} seeded for integration tests", title),
                price,
                specs,
            })
            .await
            .expect("seed product for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Collect a response body into JSON.
#[allow(dead_code)]
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is not valid json")
}

/// Notebook specs fixture.
#[allow(dead_code)]
pub fn notebook_specs() -> ProductSpecs {
    ProductSpecs::Notebook(entities::product::NotebookSpecs {
        diagonal_in: Decimal::new(1550, 2),
        display_type: "IPS".to_string(),
        display_resolution: "2560x1600".to_string(),
        processor_name: "Ryzen 7".to_string(),
        processor_freq_ghz: Decimal::new(325, 2),
        processor_cores: 8,
        ram_gb: 16,
        video_name: "Radeon 780M".to_string(),
        video_memory_gb: 2,
        battery_hours: Decimal::new(1000, 2),
        storage_gb: 512,
    })
}

/// Smartphone specs fixture.
#[allow(dead_code)]
pub fn smartphone_specs() -> ProductSpecs {
    ProductSpecs::Smartphone(entities::product::SmartphoneSpecs {
        diagonal_in: Decimal::new(650, 2),
        display_type: "OLED".to_string(),
        display_resolution: "2400x1080".to_string(),
        processor_name: "Tensor G4".to_string(),
        processor_freq_ghz: Decimal::new(305, 2),
        processor_cores: 8,
        video_name: "Mali-G715".to_string(),
        battery_mah: 4700,
        ram_gb: 8,
        sd_slot: false,
        storage_gb: 256,
        main_cam_mp: 50,
        frontal_cam_mp: 12,
    })
}

/// Console specs fixture.
#[allow(dead_code)]
pub fn console_specs() -> ProductSpecs {
    ProductSpecs::Console(entities::product::ConsoleSpecs {
        generation: "9th".to_string(),
        manufacturer: "Sony".to_string(),
        year: 2020,
    })
}

/// PS4 game specs fixture.
#[allow(dead_code)]
pub fn ps4_game_specs() -> ProductSpecs {
    ProductSpecs::Ps4Game(entities::product::GameSpecs {
        age_rating: "18+".to_string(),
    })
}
