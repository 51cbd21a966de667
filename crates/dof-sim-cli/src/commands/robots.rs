use anyhow::Result;
use dof_sim::robots;
use serde_json::{json, Value};

/// The catalog as printed by `robots --json`, with each asset resolved to its full URL.
fn catalog_json() -> Value {
    robots::all()
        .iter()
        .map(|spec| {
            json!({
                "key": spec.key,
                "name": spec.name,
                "category": spec.category,
                "prim_path": spec.prim_path,
                "usd_path": spec.usd_path(),
                "description": spec.description,
            })
        })
        .collect()
}

pub fn run(as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&catalog_json())?);
        return Ok(());
    }

    for spec in robots::all() {
        println!(
            "{:<8} {:<26} {:<12} {}",
            spec.key,
            spec.name,
            spec.category.to_string(),
            spec.description
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_json_resolves_usd_paths() {
        let catalog = catalog_json();
        let entries = catalog.as_array().unwrap();
        assert_eq!(entries.len(), robots::all().len());

        let franka = &entries[0];
        assert_eq!(franka["key"], "franka");
        assert_eq!(franka["category"], "manipulator");
        assert_eq!(franka["prim_path"], "/World/Franka");
        assert!(franka["usd_path"]
            .as_str()
            .unwrap()
            .ends_with("/Isaac/4.5/Isaac/Robots/Franka/franka.usd"));
        assert!(franka.get("asset").is_none());
    }
}
