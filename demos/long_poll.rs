//! Follow a simulation's log stream via long-poll reads.
//!
//! ```sh
//! cargo run --example long_poll -- 127.0.0.1:9000 1
//! ```

use std::sync::Arc;

use termwire::ops::EventsApi;
use termwire::Client;

#[tokio::main]
async fn main() -> termwire::Result<()> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:9000".to_string());
    let simulation: i32 = args
        .next()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1);

    let client = Arc::new(Client::connect(&addr).await?);
    let events = EventsApi::new(client);

    loop {
        let read = events.read_log(simulation);
        let response = read.wait().await?;
        println!("{}", response.payload());
    }
}
