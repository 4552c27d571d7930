//! Simple REST API server example for the market engine.
//!
//! Run with: `cargo run --example server -- seed.json`
//!
//! The server pins the buyer to the seeded account, standing in for an
//! authentication layer the engine itself does not have.
//!
//! ## Endpoints
//!
//! - `GET /market` - List all products
//! - `POST /market` - Create a product
//! - `GET /market/{id}` - Get a product by ID
//! - `PATCH /market/{id}` - Partially update a product
//! - `POST /market/deal` - Settle a purchase deal
//! - `GET /account` - Get the current account
//!
//! ## Example Usage
//!
//! ```bash
//! # Buy two copies of product 1
//! curl -X POST http://localhost:3000/market/deal \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": 1, "amount": 2}'
//!
//! # Create a product
//! curl -X POST http://localhost:3000/market \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Философия Java", "author": "Брюс Эккель", "price": 1500, "amount": 15}'
//!
//! # Inspect the catalog and the account
//! curl http://localhost:3000/market
//! curl http://localhost:3000/account
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use market_rs::{Account, AccountId, Market, MarketError, Product, ProductId, ProductUpdate, SettledDeal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for settling a deal.
///
/// ```json
/// {"id": 1, "amount": 2}
/// ```
#[derive(Debug, Deserialize)]
pub struct DealRequest {
    /// Product ID.
    pub id: u64,
    /// Requested quantity, must be positive.
    pub amount: u32,
}

/// Request body for creating a product.
#[derive(Debug, Deserialize)]
pub struct NewProductRequest {
    pub name: String,
    pub author: String,
    pub price: u32,
    pub amount: u32,
}

/// Request body for partially updating a product. Absent fields are kept.
#[derive(Debug, Deserialize)]
pub struct ProductUpdateRequest {
    pub price: Option<u32>,
    pub amount: Option<u32>,
    pub name: Option<String>,
    pub author: Option<String>,
}

/// Response body for a product with its book data inlined.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub price: u32,
    pub amount: u32,
}

impl ProductResponse {
    fn from_product(market: &Market, product: &Product) -> Self {
        let book = market.catalog().book(product.book_id);
        let (name, author) = book.map(|b| (b.name, b.author)).unwrap_or_default();
        ProductResponse {
            id: product.id.0,
            name,
            author,
            price: product.price,
            amount: product.amount,
        }
    }
}

/// Response body for the current account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: u64,
    pub balance: u64,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            id: account.id.0,
            balance: account.balance,
        }
    }
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state: the engine plus the pinned buyer account.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<Market>,
    pub account_id: AccountId,
}

// === Error Handling ===

/// Wrapper for converting `MarketError` into HTTP responses.
///
/// Deal rejections map to client errors; integrity errors surface as 500s
/// because they indicate a violated engine assumption, not a bad request.
pub struct AppError(MarketError);

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            MarketError::ProductNotFound => (StatusCode::BAD_REQUEST, "PRODUCT_NOT_FOUND"),
            MarketError::AccountUnresolvable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ACCOUNT_UNRESOLVABLE")
            }
            MarketError::InsufficientStock => (StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK"),
            MarketError::InsufficientFunds => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
            MarketError::UnknownAccount
            | MarketError::UnknownBook
            | MarketError::DecrementExceedsStock
            | MarketError::DecrementExceedsBalance => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTEGRITY_VIOLATION")
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

fn not_found(what: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{what} not found"),
            code: "NOT_FOUND".to_string(),
        }),
    )
}

// === Handlers ===

/// GET /market - List all products.
async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductResponse>> {
    let products = state
        .market
        .catalog()
        .products()
        .iter()
        .map(|p| ProductResponse::from_product(&state.market, p))
        .collect();
    Json(products)
}

/// POST /market - Create a product together with its book.
async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<NewProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let book_id = state.market.catalog().add_book(request.name, request.author);
    let product_id = state
        .market
        .catalog()
        .add_product(book_id, request.price, request.amount)?;
    let product = state
        .market
        .catalog()
        .product(product_id)
        .ok_or(MarketError::ProductNotFound)?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_product(&state.market, &product)),
    ))
}

/// GET /market/{id} - Get a product by ID.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProductResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .market
        .catalog()
        .product(ProductId(id))
        .map(|product| Json(ProductResponse::from_product(&state.market, &product)))
        .ok_or_else(|| not_found("product"))
}

/// PATCH /market/{id} - Partially update a product and its book.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ProductUpdateRequest>,
) -> Result<Json<ProductResponse>, (StatusCode, Json<ErrorResponse>)> {
    let update = ProductUpdate {
        price: request.price,
        amount: request.amount,
        book_name: request.name,
        book_author: request.author,
    };

    state
        .market
        .catalog()
        .update_product(ProductId(id), update)
        .map(|product| Json(ProductResponse::from_product(&state.market, &product)))
        .map_err(|_| not_found("product"))
}

/// POST /market/deal - Settle a purchase deal for the pinned account.
async fn settle_deal(
    State(state): State<AppState>,
    Json(request): Json<DealRequest>,
) -> Result<Json<SettledDeal>, Response> {
    if request.amount == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "amount must be positive".to_string(),
                code: "INVALID_AMOUNT".to_string(),
            }),
        )
            .into_response());
    }

    state
        .market
        .settle_deal(state.account_id, ProductId(request.id), request.amount)
        .map(Json)
        .map_err(|e| AppError(e).into_response())
}

/// GET /account - Get the current account.
async fn get_account(
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, AppError> {
    state
        .market
        .accounts()
        .get(state.account_id)
        .map(|account| Json(AccountResponse::from(account)))
        .ok_or(AppError(MarketError::AccountUnresolvable))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/market", get(list_products).post(create_product))
        .route("/market/{id}", get(get_product).patch(update_product))
        .route("/market/deal", post(settle_deal))
        .route("/account", get(get_account))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let market = Market::new();

    // Seed from a JSON file if given, otherwise start with a default buyer.
    let account_id = match std::env::args().nth(1) {
        Some(path) => {
            let file = std::fs::File::open(&path).expect("seed file should open");
            market
                .load_seed(std::io::BufReader::new(file))
                .expect("seed data should parse")
        }
        None => market.accounts().create(20_000),
    };

    let state = AppState {
        market: Arc::new(market),
        account_id,
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Market API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  GET   /market       - List all products");
    println!("  POST  /market       - Create a product");
    println!("  GET   /market/:id   - Get product by ID");
    println!("  PATCH /market/:id   - Update product");
    println!("  POST  /market/deal  - Settle a purchase deal");
    println!("  GET   /account      - Get the current account");

    axum::serve(listener, app).await.unwrap();
}
