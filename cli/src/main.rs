//! Command line program for serving and calling `protobind` protocols.

#[macro_use]
extern crate log;

mod call;
mod cli;
mod serve;
mod services;
mod tracing;

use colored::*;

fn main() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed building tokio runtime");
    let runtime_handle = runtime.handle().clone();

    runtime.block_on(async move {
        match cli::start(cli::arg_matches(), runtime_handle).await {
            Ok(_) => (),
            Err(e) => {
                println!("{}{}", "error: ".red(), e);
                if e.root_cause().to_string() != e.to_string() {
                    println!("Caused by:\n{}", e.root_cause())
                }
                std::process::exit(1);
            }
        }
    });
}
