// Signage Server - group/screen/picture manager with a polling display surface

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use signage_server::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    // Build application router
    let app = create_router(app_state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    println!("🖥️  Signage server starting on http://{}", addr);
    println!("📋 API overview:");
    println!("  GET    /api/v1/groups                     - List groups");
    println!("  POST   /api/v1/groups                     - Create group (role is derived)");
    println!("  GET    /api/v1/screens                    - List screens");
    println!("  POST   /api/v1/pictures                   - Create picture (appended last)");
    println!("  PUT    /api/v1/pictures/{{id}}/position     - Reorder within screen");
    println!("  PUT    /api/v1/pictures/{{id}}/image        - Attach image asset");
    println!("  GET    /screens/{{id}}/show                 - Public display page data");
    println!("  GET    /screens/{{id}}/check-updates        - Poll for content changes");
    println!("  GET    /screens/{{id}}/slides               - Current active slides");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
