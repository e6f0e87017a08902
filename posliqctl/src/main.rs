use clap::Parser as _;
use posliqctl::BaseArgs;
use tracing_subscriber::EnvFilter;

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = BaseArgs::parse();
    args.evaluate()
}
