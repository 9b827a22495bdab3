mod cli;
mod commands;
mod render;

use cohort_rank::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
