pub mod apply;
pub mod service;
pub mod target;

use std::path::Path;

use probegrid_registry::Registry;
use probegrid_state::StateStore;

/// Open the state database under the data directory, creating both if needed.
pub fn open_registry(data_dir: &Path) -> anyhow::Result<Registry> {
    std::fs::create_dir_all(data_dir)?;
    let store = StateStore::open(&data_dir.join("probegrid.redb"))?;
    Ok(Registry::new(store))
}
