pub mod builder;
pub mod cli;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod keys;
pub mod marshal;
pub mod node;
pub mod table;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    cli::CommandLineInterface::load().run()
}
