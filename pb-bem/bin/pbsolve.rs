//! Boundary-integral Poisson-Boltzmann solver
//!
//! Usage:
//!   pbsolve usrdata.in
//!   RUST_LOG=debug pbsolve --threads 8 usrdata.in

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pb_bem::{Params, run};

#[derive(Parser, Debug)]
#[command(name = "pbsolve")]
#[command(about = "Treecode-accelerated boundary-integral Poisson-Boltzmann solver", long_about = None)]
struct Args {
    /// Parameter file of `key value` pairs
    param_file: PathBuf,

    /// Number of worker threads (default: all cores)
    #[arg(short = 't', long)]
    threads: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("failed to configure thread pool: {e}");
            return ExitCode::FAILURE;
        }
    }

    let params = match Params::from_file(&args.param_file) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    match run(&params) {
        Ok(summary) => {
            println!("elements            : {}", summary.num_elements);
            println!("surface area (A^2)  : {:.6}", summary.surface_area);
            println!("gmres iterations    : {}", summary.iterations);
            println!("relative residual   : {:.6e}", summary.residual);
            println!("solvation energy    : {:.6} kJ/mol", summary.solvation_energy);
            println!("coulomb energy      : {:.6} kJ/mol", summary.coulomb_energy);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
