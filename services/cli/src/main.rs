use cohort_rank_cli::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("cohort-rank: {err}");
        std::process::exit(err.exit_code());
    }
}
