#![deny(warnings)]

use anyhow::Context;
use persistence::{decode_profile, ProfileStore};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = match std::env::args().nth(1) {
        Some(dir) => ProfileStore::new(dir),
        None => ProfileStore::from_env(),
    };
    let path = store.path();
    if !path.exists() {
        println!("No profile at {}", path.display());
        return Ok(());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (profile, repairs) =
        decode_profile(&text).with_context(|| format!("decoding {}", path.display()))?;
    if repairs.is_empty() {
        println!("Profile at {} is healthy", path.display());
        return Ok(());
    }
    for r in &repairs {
        println!("- {r}");
    }
    store.save(&profile)?;
    println!("Repaired {} issue(s) in {}", repairs.len(), path.display());
    Ok(())
}
