//! Pretend upstream for trying the gateway by hand.
//!
//! ```text
//! cargo run --example mock_backend -- 3001 auth
//! cargo run -- --routes demos/routes.json --port 8080
//! curl -i localhost:8080/auth/login
//! ```

use axum::{body::Body, http::Request, Json, Router};
use serde_json::json;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port: u16 = args.next().as_deref().unwrap_or("3001").parse()?;
    let name = args.next().unwrap_or_else(|| "backend".to_string());

    let app = Router::new().fallback(move |request: Request<Body>| {
        let name = name.clone();
        async move {
            Json(json!({
                "backend": name,
                "method": request.method().to_string(),
                "path": request.uri().path(),
                "query": request.uri().query(),
            }))
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Mock backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
