use anyhow::{bail, Context, Result};
use design_publisher::config::FileDesignSource;
use design_publisher::pipeline;
use design_publisher::publish::resolver::FsContainerResolver;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn usage() -> &'static str {
    "Usage:\n  design-publisher <manifest.toml> <destination-root>"
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (manifest, destination) = match args.as_slice() {
        [manifest, destination] => (manifest, destination),
        _ => bail!(usage()),
    };

    let destination_root = Path::new(destination);
    if !destination_root.is_dir() {
        bail!(
            "destination root '{}' is not a directory",
            destination_root.display()
        );
    }

    let source = FileDesignSource::load(Path::new(manifest))
        .with_context(|| format!("loading design manifest '{manifest}'"))?;
    let resolver = FsContainerResolver::new(destination_root);

    let result = pipeline::run(&source, &resolver)?;
    println!("{}", result.to_json()?);
    Ok(())
}
