mod cli;
mod infra;
mod predict;
mod routes;
mod server;

use dairy_price::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
