#![forbid(unsafe_code)]
#![deny(warnings, clippy::all, clippy::pedantic, clippy::nursery)]

//! Binary entrypoint delegating to [`loghive_cli::run`].

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = loghive_cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
