// modbot - deletes what the classifier flags, warns, and mutes repeat offenders

use modbot::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("error: {e:?}");
        std::process::exit(1);
    }
}
