use probe_core::parse_target;
use probegrid_registry::Registry;

pub fn add(registry: &Registry, service: &str, target: &str) -> anyhow::Result<()> {
    let (host, port) = parse_target(target)?;
    let assignment = registry.assign_target(service, &host, port)?;
    println!(
        "✓ assigned {} to worker {}",
        assignment.target_id, assignment.worker_id
    );
    Ok(())
}

pub fn list(registry: &Registry, service: &str) -> anyhow::Result<()> {
    let assignments = registry.list_assignments(service)?;
    if assignments.is_empty() {
        println!("no targets assigned for {service}");
        return Ok(());
    }
    for a in assignments {
        println!(
            "{}  worker {}  pid {}",
            a.target_id, a.worker_id, a.process_id
        );
    }
    Ok(())
}

pub fn reassign(registry: &Registry, service: &str, target_id: &str) -> anyhow::Result<()> {
    let assignment = registry.reassign_target(service, target_id)?;
    println!(
        "✓ moved {} to worker {}",
        assignment.target_id, assignment.worker_id
    );
    Ok(())
}

pub fn claim(
    registry: &Registry,
    service: &str,
    target_id: &str,
    process_id: u32,
) -> anyhow::Result<()> {
    let assignment = registry.claim_target(service, target_id, process_id)?;
    println!(
        "✓ {} claimed by pid {}",
        assignment.target_id, assignment.process_id
    );
    Ok(())
}

pub fn remove(registry: &Registry, service: &str, target_id: &str) -> anyhow::Result<()> {
    if registry.remove_target(service, target_id)? {
        println!("✓ removed target {target_id}");
    } else {
        println!("target {target_id} not found");
    }
    Ok(())
}
