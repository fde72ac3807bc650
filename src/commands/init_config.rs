//! Implementation of the `qualforge init-config` command.

use crate::cli::InitConfigArgs;
use crate::config::{Config, ProjectConfig};
use crate::error::{QualforgeError, Result};
use crate::fs::atomic_write_file;

/// Execute the `qualforge init-config` command.
///
/// Writes every setting at its default so the file documents what can be
/// changed. An existing file is only replaced with `--force`.
pub fn cmd_init_config(args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(QualforgeError::UserError(format!(
            "'{}' already exists (use --force to overwrite)",
            args.path.display()
        )));
    }

    let config = default_config(args.name.as_deref());
    let yaml = config.to_yaml()?;

    atomic_write_file(&args.path, &yaml).map_err(|e| {
        QualforgeError::UserError(format!("failed to write '{}': {}", args.path.display(), e))
    })?;

    println!("Wrote {}", args.path.display());
    Ok(())
}

fn default_config(name: Option<&str>) -> Config {
    let mut config = Config::default();
    if let Some(name) = name {
        config.project = ProjectConfig::new(
            name,
            config.project.language(),
            config.project.target_dir(),
        );
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_loadable_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qualforge.yaml");

        cmd_init_config(InitConfigArgs {
            path: path.clone(),
            name: Some("payments".to_string()),
            force: false,
        })
        .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.project.name(), "payments");
        assert_eq!(loaded.model.model, Config::default().model.model);
        assert_eq!(
            loaded.pipeline.journal_path,
            Config::default().pipeline.journal_path
        );
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qualforge.yaml");
        std::fs::write(&path, "project:\n  name: mine\n").unwrap();

        let err = cmd_init_config(InitConfigArgs {
            path: path.clone(),
            name: None,
            force: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "project:\n  name: mine\n"
        );

        cmd_init_config(InitConfigArgs {
            path: path.clone(),
            name: None,
            force: true,
        })
        .unwrap();
        assert_eq!(
            Config::load(&path).unwrap().project.name(),
            Config::default().project.name()
        );
    }

    #[test]
    fn creates_missing_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("conf/nested/qualforge.yaml");

        cmd_init_config(InitConfigArgs {
            path: path.clone(),
            name: None,
            force: false,
        })
        .unwrap();

        assert!(path.is_file());
    }
}
