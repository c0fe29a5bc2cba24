//! `probectl apply` — seed the store from a probes.toml manifest.

use std::path::Path;

use tracing::warn;

use probe_core::{SeedManifest, parse_target};
use probegrid_registry::{Registry, RegistryError, ServiceSpec};

pub fn apply(registry: &Registry, file: &Path) -> anyhow::Result<()> {
    let manifest = SeedManifest::from_file(file)?;

    for svc in &manifest.services {
        let spec = ServiceSpec {
            name: svc.name.clone(),
            db_type: svc.db_type.clone(),
            commands: svc.commands.clone(),
            sample_count: svc.sample_count,
            interval_seconds: svc.interval_seconds,
            username: svc.username.clone(),
            password: svc.password.clone(),
        };
        match registry.register_service(spec) {
            Ok(meta) => println!("✓ registered service {}", meta.service),
            Err(RegistryError::AlreadyExists(name)) => {
                warn!(service = %name, "already registered, keeping existing metadata");
                println!("- service {name} already registered, skipping");
            }
            Err(e) => return Err(e.into()),
        }

        for target in &svc.targets {
            let (host, port) = parse_target(target)?;
            let assignment = registry.assign_target(&svc.name, &host, port)?;
            println!(
                "✓ assigned {} to worker {}",
                assignment.target_id, assignment.worker_id
            );
        }
    }

    Ok(())
}
