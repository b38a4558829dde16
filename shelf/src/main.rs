use clap::Parser;
use shelf::{
    app::{cli, state::init_logging},
    config::StartArgs,
};

#[tokio::main]
async fn main() {
    let args = StartArgs::parse();

    init_logging(&args);

    if let Err(e) = cli::run(args).await {
        e.print();
        std::process::exit(1);
    }
}
