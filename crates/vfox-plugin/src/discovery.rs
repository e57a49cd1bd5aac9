//! Plugin discovery in a plugin directory.
//!
//! Each plugin is a single `<name>.lua` file; the file stem is the name the
//! SDK is managed under.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension plugin sources carry.
pub const PLUGIN_EXTENSION: &str = "lua";

/// A plugin source file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginSource {
    /// File stem, lowercased.
    pub name: String,

    /// Path to the source file.
    pub path: PathBuf,
}

impl PluginSource {
    /// Read the plugin source.
    pub fn read(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// List the plugin sources in `dir`, sorted by name.
///
/// A missing or unreadable directory yields no plugins.
pub fn discover_plugins(dir: &Path) -> Vec<PluginSource> {
    if !dir.exists() {
        debug!("Plugin directory {:?} does not exist", dir);
        return Vec::new();
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read plugin directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut plugins: Vec<PluginSource> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            if path.extension().and_then(|ext| ext.to_str()) != Some(PLUGIN_EXTENSION) {
                debug!("Skipping {:?}: not a plugin source", path);
                return None;
            }
            let name = path.file_stem()?.to_str()?.to_lowercase();
            Some(PluginSource { name, path })
        })
        .collect();

    plugins.sort();
    info!("Discovered {} plugins in {:?}", plugins.len(), dir);
    plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_plugin_file(dir: &Path, file_name: &str) {
        std::fs::write(dir.join(file_name), "PLUGIN = {}").unwrap();
    }

    #[test]
    fn test_discover_plugins_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_plugin_file(temp_dir.path(), "nodejs.lua");
        create_plugin_file(temp_dir.path(), "java.lua");
        create_plugin_file(temp_dir.path(), "README.md");
        std::fs::create_dir(temp_dir.path().join("golang.lua")).unwrap();

        let plugins = discover_plugins(temp_dir.path());

        let names: Vec<&str> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["java", "nodejs"]);
        assert_eq!(plugins[0].path, temp_dir.path().join("java.lua"));
        assert_eq!(plugins[0].read().unwrap(), "PLUGIN = {}");
    }

    #[test]
    fn test_names_are_lowercased() {
        let temp_dir = TempDir::new().unwrap();
        create_plugin_file(temp_dir.path(), "Python.lua");

        let plugins = discover_plugins(temp_dir.path());
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "python");
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let plugins = discover_plugins(&temp_dir.path().join("nope"));
        assert!(plugins.is_empty());
    }
}
