//! Event Studio backend binary; all app logic lives in the library.

#[tokio::main]
async fn main() {
    if let Err(e) = event_studio_backend::run().await {
        eprintln!("fatal: {}", e);
        std::process::exit(1);
    }
}
