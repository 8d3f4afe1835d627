pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod orders;
pub mod pricing;
pub mod validation;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use error::ApiError;
use models::{Product, ProductPriceResponse};
use orders::{OrderItemsRepository, OrderService, OrdersRepository, ProductsRepository};
use pricing::{BandSource, LessonPricingEngine, Transmission};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        product_price,
        pricing::handlers::list_bands_handler,
        pricing::handlers::get_band_handler,
        pricing::handlers::band_price_list_handler,
        pricing::handlers::postcode_band_handler,
        pricing::handlers::postcode_price_list_handler,
        pricing::handlers::update_postcode_band_handler,
        pricing::handlers::area_postcodes_handler,
        pricing::handlers::area_bands_handler,
        orders::handlers::create_order_handler,
        orders::handlers::get_order_handler,
        orders::handlers::recompute_totals_handler,
        orders::handlers::update_order_status_handler,
        orders::handlers::update_payment_handler,
    ),
    components(
        schemas(
            Product,
            ProductPriceResponse,
            pricing::PriceBand,
            pricing::PostcodeEntry,
            pricing::CourseRule,
            pricing::ResolvedPrice,
            pricing::BandAssignment,
            pricing::Transmission,
            pricing::handlers::PostcodeBandResponse,
            pricing::handlers::BandUpdateResponse,
            orders::OrderStatus,
            orders::PaymentStatus,
            orders::OrderItemRequest,
            orders::CreateOrderRequest,
            orders::UpdateStatusRequest,
            orders::UpdatePaymentRequest,
            orders::OrderResponse,
            orders::OrderItemResponse,
        )
    ),
    tags(
        (name = "pricing", description = "Price band and postcode resolution endpoints"),
        (name = "orders", description = "Order and checkout endpoints"),
        (name = "catalog", description = "Product price lookup")
    ),
    info(
        title = "Driving Lessons API",
        version = "1.0.0",
        description = "Location-banded pricing for driving lesson products"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub engine: Arc<LessonPricingEngine>,
    pub order_service: OrderService,
    pub order_items_repo: OrderItemsRepository,
}

/// Query parameters for a product price lookup
///
/// The visitor's postcode arrives as an explicit parameter from the calling
/// context; the engine holds no ambient session state.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductPriceQuery {
    pub postcode: Option<String>,
    pub band: Option<String>,
    pub transmission: Option<Transmission>,
}

/// Handler for GET /api/products/{id}/price
/// Resolves a product's display price
///
/// Band-priced lesson products resolve through the visitor's postcode or an
/// explicitly chosen band. With neither known, a single configured band is
/// used directly; with several, the response asks the caller to pick one.
#[utoipa::path(
    get,
    path = "/api/products/{id}/price",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ProductPriceQuery
    ),
    responses(
        (status = 200, description = "Resolved price or band choice", body = ProductPriceResponse),
        (status = 404, description = "Product, postcode or band not found")
    ),
    tag = "catalog"
)]
async fn product_price(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ProductPriceQuery>,
) -> Result<Json<ProductPriceResponse>, ApiError> {
    tracing::debug!("Resolving price for product {}", id);

    let product = sqlx::query_as::<_, Product>(
        "SELECT product_id, name, price, sale_price, lesson, course \
         FROM products WHERE product_id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Product".to_string(),
        id: id.to_string(),
    })?;

    if !product.is_band_priced() {
        let price = product.price.or(product.sale_price).ok_or_else(|| {
            ApiError::NotFound {
                resource: "Price for product".to_string(),
                id: id.to_string(),
            }
        })?;
        return Ok(Json(ProductPriceResponse::priced(
            id,
            None,
            price,
            product.sale_price,
        )));
    }

    let course = product.course.as_deref().ok_or_else(|| ApiError::NotFound {
        resource: "Course relation for product".to_string(),
        id: id.to_string(),
    })?;

    let transmission = query.transmission.unwrap_or_default();
    let source = if let Some(band) = query.band {
        BandSource::Band(band)
    } else if let Some(postcode) = query.postcode {
        BandSource::Postcode {
            postcode,
            transmission,
        }
    } else {
        // No location known: one configured band prices directly, several
        // mean the caller has to pick an area first
        let bands = state.engine.catalog().list_bands().await?;
        if bands.len() == 1 {
            BandSource::Band(bands[0].band.clone())
        } else {
            return Ok(Json(ProductPriceResponse::band_choice(
                id,
                bands.into_iter().map(|band| band.band).collect(),
            )));
        }
    };

    let mut resolver = state.engine.resolver();
    let band_code = resolver.select_band(source).await?.band.clone();
    let resolved = resolver.compute_price(course, None).await?;

    Ok(Json(ProductPriceResponse::priced(
        id,
        Some(band_code),
        resolved.price,
        resolved.sale_price,
    )))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(db: PgPool, engine: Arc<LessonPricingEngine>) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let order_service = OrderService::new(
        OrdersRepository::new(db.clone()),
        OrderItemsRepository::new(db.clone()),
        ProductsRepository::new(db.clone()),
        engine.clone(),
    );

    let state = AppState {
        order_items_repo: OrderItemsRepository::new(db.clone()),
        db,
        engine,
        order_service,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Catalog
        .route("/api/products/:id/price", get(product_price))
        // Pricing
        .route("/api/bands", get(pricing::handlers::list_bands_handler))
        .route("/api/bands/:band", get(pricing::handlers::get_band_handler))
        .route(
            "/api/bands/:band/prices",
            get(pricing::handlers::band_price_list_handler),
        )
        .route(
            "/api/postcodes/:postcode/band",
            get(pricing::handlers::postcode_band_handler)
                .put(pricing::handlers::update_postcode_band_handler),
        )
        .route(
            "/api/postcodes/:postcode/prices",
            get(pricing::handlers::postcode_price_list_handler),
        )
        .route(
            "/api/areas/:area/postcodes",
            get(pricing::handlers::area_postcodes_handler),
        )
        .route(
            "/api/areas/:area/bands",
            get(pricing::handlers::area_bands_handler),
        )
        // Orders
        .route("/api/orders", post(orders::handlers::create_order_handler))
        .route(
            "/api/orders/:id",
            get(orders::handlers::get_order_handler),
        )
        .route(
            "/api/orders/:id/recompute",
            post(orders::handlers::recompute_totals_handler),
        )
        .route(
            "/api/orders/:id/status",
            put(orders::handlers::update_order_status_handler),
        )
        .route(
            "/api/orders/:id/payment",
            put(orders::handlers::update_payment_handler),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Lessons API - Starting...");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Pre-load the course-rule cache; a failure here is not fatal, the
    // cache populates lazily on first use
    let engine = Arc::new(LessonPricingEngine::new(db_pool.clone()));
    if let Err(e) = engine.warm_cache().await {
        tracing::warn!("Course-rule cache warm-up failed: {}", e);
    }

    let app = create_router(db_pool, engine);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Lessons API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
