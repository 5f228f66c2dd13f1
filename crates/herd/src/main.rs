use anyhow::Result;
use herd::cli;

// Four workers: the three periodic actions plus slack for the stdin
// reader, mirroring the small fixed pool the service was sized for.
#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    cli::init_tracing()?;
    let matches = cli::build_cli().get_matches();
    cli::dispatch(&matches).await
}
