#[tokio::main]
async fn main() {
    if let Err(err) = bc_api::run().await {
        tracing::error!(error = %err, "bc-api failed");
        std::process::exit(1);
    }
}
