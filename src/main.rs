use log::info;

use clap::Parser;
use snafu::ErrorCompat;

mod args;
mod tabulate;

use crate::args::Args;
use crate::tabulate::run_selection;

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("config file: {:?}", args.config);

    let res = run_selection(args.config, args.out, args.reference);
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
