use std::process;

#[tokio::main]
async fn main() {
    if pub_crawl::cli::run().await.is_err() {
        process::exit(1);
    }
}
