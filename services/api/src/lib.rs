mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use rom_estimator::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
