#![deny(unsafe_code)]

use mimalloc::MiMalloc;

/// High-performance memory allocator for improved allocation throughput.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    let stdout = io::stdout().lock();
    let stderr = io::stderr().lock();
    let status = cli::run(env::args_os(), io::stdin(), stdout, stderr);
    ExitCode::from(u8::try_from(status).unwrap_or(u8::MAX))
}
