// Civic Budget - Web Server
// REST API over the catalog store and plan archive

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use civic_budget::{
    create_plan, delete_plan, fetch_categories, get_active_config, get_plan,
    list_plans, AdjustmentSession, Aggregator, Plan, Submitter,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// POST /api/plans request body: submitter metadata plus the raw
/// (unrounded) changes map from the interactive session
#[derive(Deserialize)]
struct CreatePlanRequest {
    user_name: Option<String>,
    user_age: Option<i64>,
    user_occupation: Option<String>,
    changes: HashMap<String, f64>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - Full catalog tree with impacts
async fn get_categories(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match fetch_categories(&conn) {
        Ok(categories) => (StatusCode::OK, Json(ApiResponse::ok(categories))).into_response(),
        Err(e) => {
            eprintln!("Error fetching categories: {}", e);
            internal_error()
        }
    }
}

/// GET /api/config - Active income config
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_active_config(&conn) {
        Ok(Some(config)) => (StatusCode::OK, Json(ApiResponse::ok(config))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err("No active budget config".to_string())),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error fetching config: {}", e);
            internal_error()
        }
    }
}

/// GET /api/plans - All plans, newest first
async fn get_plans(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match list_plans(&conn) {
        Ok(plans) => (StatusCode::OK, Json(ApiResponse::ok(plans))).into_response(),
        Err(e) => {
            eprintln!("Error listing plans: {}", e);
            internal_error()
        }
    }
}

/// POST /api/plans - Finalize a session into an archived plan
async fn submit_plan(
    State(state): State<AppState>,
    Json(request): Json<CreatePlanRequest>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    // Route raw values through the session so its validation applies
    let mut session = AdjustmentSession::new();
    for (subcategory_id, value) in &request.changes {
        if let Err(e) = session.set_change(subcategory_id, *value) {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(e.to_string())),
            )
                .into_response();
        }
    }

    let categories = match fetch_categories(&conn) {
        Ok(categories) => categories,
        Err(e) => {
            eprintln!("Error fetching categories: {}", e);
            return internal_error();
        }
    };

    let total_income = match get_active_config(&conn) {
        Ok(Some(config)) => config.total_income,
        Ok(None) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::err("No active budget config".to_string())),
            )
                .into_response();
        }
        Err(e) => {
            eprintln!("Error fetching config: {}", e);
            return internal_error();
        }
    };

    let submitter = Submitter {
        user_name: request.user_name,
        user_age: request.user_age,
        user_occupation: request.user_occupation,
    };
    let plan = Plan::from_session(&session, &categories, total_income, submitter);

    match create_plan(&conn, &plan) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(plan))).into_response(),
        Err(e) => {
            eprintln!("Error creating plan: {}", e);
            internal_error()
        }
    }
}

/// GET /api/plans/:id - One plan
async fn get_plan_by_id(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_plan(&conn, &plan_id) {
        Ok(Some(plan)) => (StatusCode::OK, Json(ApiResponse::ok(plan))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!("No plan with id {}", plan_id))),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error getting plan {}: {}", plan_id, e);
            internal_error()
        }
    }
}

/// DELETE /api/plans/:id - Remove a plan from the archive
async fn delete_plan_by_id(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match delete_plan(&conn, &plan_id) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("deleted"))).into_response(),
        Err(e) => {
            eprintln!("Error deleting plan {}: {}", plan_id, e);
            internal_error()
        }
    }
}

/// GET /api/aggregate - Population statistics across the whole archive
async fn get_aggregate(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let categories = match fetch_categories(&conn) {
        Ok(categories) => categories,
        Err(e) => {
            eprintln!("Error fetching categories: {}", e);
            return internal_error();
        }
    };

    let plans = match list_plans(&conn) {
        Ok(plans) => plans,
        Err(e) => {
            eprintln!("Error listing plans: {}", e);
            return internal_error();
        }
    };

    let aggregator = match get_active_config(&conn) {
        Ok(Some(config)) => Aggregator::with_income(config.total_income),
        _ => Aggregator::new(),
    };

    let stats = aggregator.aggregate(&plans, &categories);
    (StatusCode::OK, Json(ApiResponse::ok(stats))).into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::err("internal error".to_string())),
    )
        .into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Civic Budget - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("CIVIC_BUDGET_DB").unwrap_or_else(|_| "civic_budget.db".to_string());
    let db_path = std::path::Path::new(&db_path);

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: cargo run seed");
        eprintln!("   to create the catalog first.");
        std::process::exit(1);
    }

    let conn = Connection::open(db_path).expect("Failed to open database");
    println!("✓ Database opened: {:?}", db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route("/config", get(get_config))
        .route("/plans", get(get_plans).post(submit_plan))
        .route("/plans/:id", get(get_plan_by_id).delete(delete_plan_by_id))
        .route("/aggregate", get(get_aggregate))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Catalog:   http://localhost:3000/api/categories");
    println!("   Aggregate: http://localhost:3000/api/aggregate");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
