use std::path::Path;

use greengrid_core::GridConfig;

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let content = GridConfig::default().to_toml_string()?;
    std::fs::write(path, content)?;
    println!("✓ Generated {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greengrid.toml");

        init(&path, false).unwrap();
        let loaded = GridConfig::from_file(&path).unwrap();
        assert_eq!(loaded, GridConfig::default());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greengrid.toml");
        std::fs::write(&path, "[fleet]\nnode_count = 9\n").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(GridConfig::from_file(&path).unwrap().fleet.node_count, 9);

        init(&path, true).unwrap();
        assert_eq!(GridConfig::from_file(&path).unwrap().fleet.node_count, 5);
    }
}
