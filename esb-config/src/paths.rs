use esb_core::{error::Result, user_paths};
use std::path::PathBuf;

/// Get the global config path, reading overrides through `lookup`.
/// Priority order:
/// 1. `ESB_CONFIG_PATH` (the file itself)
/// 2. `ESB_CONFIG_HOME/config.yaml`
/// 3. `~/.esb/config.yaml`
///
/// Blank values count as unset.
pub fn global_config_path<'a, F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let var = |key: &str| lookup(key).map(str::trim).filter(|v| !v.is_empty());
    if let Some(path) = var("ESB_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    if let Some(home) = var("ESB_CONFIG_HOME") {
        return Ok(PathBuf::from(home).join("config.yaml"));
    }
    user_paths::default_global_config_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn path_with(vars: &[(&str, &str)]) -> PathBuf {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        global_config_path(|key| vars.get(key).copied()).unwrap()
    }

    #[test]
    fn test_override_precedence() {
        assert_eq!(
            path_with(&[
                ("ESB_CONFIG_PATH", "/tmp/explicit.yaml"),
                ("ESB_CONFIG_HOME", "/tmp/esb-home"),
            ]),
            PathBuf::from("/tmp/explicit.yaml")
        );
        assert_eq!(
            path_with(&[("ESB_CONFIG_HOME", "/tmp/esb-home")]),
            PathBuf::from("/tmp/esb-home/config.yaml")
        );
    }

    #[test]
    fn test_blank_overrides_fall_back_to_home() {
        let default = path_with(&[("ESB_CONFIG_PATH", ""), ("ESB_CONFIG_HOME", "  ")]);
        assert!(default.ends_with(".esb/config.yaml"));
    }
}
