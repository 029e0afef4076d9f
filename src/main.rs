//! Redis REST Gateway entry point.
//!
//! Parses flags, loads configuration and serves until a shutdown signal.

use redis_rest_gateway::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
