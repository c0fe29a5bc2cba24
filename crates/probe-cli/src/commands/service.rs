use probegrid_registry::{Registry, ServiceSpec};

pub fn add(registry: &Registry, spec: ServiceSpec) -> anyhow::Result<()> {
    let meta = registry.register_service(spec)?;
    println!(
        "✓ registered service {} ({}, every {}s, keep {})",
        meta.service, meta.db_type, meta.interval_seconds, meta.sample_count
    );
    Ok(())
}

pub fn list(registry: &Registry) -> anyhow::Result<()> {
    let services = registry.list_services()?;
    if services.is_empty() {
        println!("no services registered");
        return Ok(());
    }
    for meta in services {
        println!(
            "{}  {}  every {}s  keep {}  cmds: {}",
            meta.service,
            meta.db_type,
            meta.interval_seconds,
            meta.sample_count,
            meta.commands.join(",")
        );
    }
    Ok(())
}

pub fn remove(registry: &Registry, name: &str) -> anyhow::Result<()> {
    if registry.remove_service(name)? {
        println!("✓ removed service {name}");
    } else {
        println!("service {name} not found");
    }
    Ok(())
}
