//! Compile an algorithm source file on a running backend node.
//!
//! ```sh
//! cargo run --example compile -- 127.0.0.1:9000 flood.erl
//! ```

use std::sync::Arc;

use termwire::ops::{AlgorithmApi, CompileOutcome};
use termwire::Client;

#[tokio::main]
async fn main() -> termwire::Result<()> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:9000".to_string());
    let file = args.next().unwrap_or_else(|| "flood.erl".to_string());

    let client = Arc::new(Client::connect(&addr).await?);
    let algorithm = AlgorithmApi::new(client);

    match algorithm.compile(&file).await? {
        CompileOutcome::Ok => println!("compiled {file}"),
        CompileOutcome::Error(diagnostic) => eprintln!("compile failed: {diagnostic}"),
    }
    Ok(())
}
