//! Rule Registry
//!
//! Attribute name → rule set, resolved once at startup. Loading priority:
//! built-in < user-global < project.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::rules::schema::{RuleSet, RuleSetError};

/// Rule set for `@NSCopying`, embedded in the binary
pub const NSCOPYING_RULES: &str = include_str!("../../resources/attributes/nscopying.attr.toml");

/// Where a rule set came from; higher wins on name clashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleSetPriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Project = 2,
}

/// A rule set with its source and priority
#[derive(Debug, Clone)]
pub struct LoadedRuleSet {
    pub rule_set: RuleSet,
    pub priority: RuleSetPriority,
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    sets: HashMap<String, LoadedRuleSet>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the embedded rule sets
    pub fn with_builtin() -> Result<Self, RuleSetError> {
        let mut registry = Self::new();
        registry.add(
            RuleSet::from_toml(NSCOPYING_RULES)?,
            RuleSetPriority::BuiltIn,
            None,
        );
        Ok(registry)
    }

    /// Built-in sets, then the user-global directory, then project directories
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::with_builtin()?;

        if let Some(dir) = &config.user_attribute_dir {
            registry.load_directory(dir, RuleSetPriority::UserGlobal)?;
        }
        for dir in &config.attribute_dirs {
            registry.load_directory(dir, RuleSetPriority::Project)?;
        }

        log::info!(
            "Loaded rule sets for {} attribute(s): {}",
            registry.sets.len(),
            registry.attribute_names().join(", ")
        );
        Ok(registry)
    }

    /// Add a rule set unless one of higher priority already owns the name.
    /// Returns whether the set was stored.
    pub fn add(
        &mut self,
        rule_set: RuleSet,
        priority: RuleSetPriority,
        source_path: Option<PathBuf>,
    ) -> bool {
        let should_load = match self.sets.get(&rule_set.attribute) {
            Some(existing) => priority >= existing.priority,
            None => true,
        };

        if should_load {
            self.sets.insert(
                rule_set.attribute.clone(),
                LoadedRuleSet {
                    rule_set,
                    priority,
                    source_path,
                },
            );
        }
        should_load
    }

    pub fn get(&self, attribute: &str) -> Option<&RuleSet> {
        self.sets.get(attribute).map(|loaded| &loaded.rule_set)
    }

    pub fn get_loaded(&self, attribute: &str) -> Option<&LoadedRuleSet> {
        self.sets.get(attribute)
    }

    /// Registered attribute names, sorted
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Known conformances merged across every rule set
    pub fn known_conformances(&self) -> HashMap<String, Vec<String>> {
        let mut merged: HashMap<String, Vec<String>> = HashMap::new();
        for loaded in self.sets.values() {
            for (name, conformances) in &loaded.rule_set.known_conformances {
                let entry = merged.entry(name.clone()).or_default();
                for conformance in conformances {
                    if !entry.contains(conformance) {
                        entry.push(conformance.clone());
                    }
                }
            }
        }
        merged
    }

    /// Load a single rule set file
    pub fn load_file(
        &mut self,
        path: &Path,
        priority: RuleSetPriority,
    ) -> Result<(), RuleSetError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rule_set = RuleSet::from_toml(&content)?;
        let attribute = rule_set.attribute.clone();

        if self.add(rule_set, priority, Some(path.to_path_buf())) {
            log::debug!("Loaded rule set for @{attribute} from {}", path.display());
        } else {
            log::debug!(
                "Ignoring rule set for @{attribute} from {}: a higher-priority set is loaded",
                path.display()
            );
        }
        Ok(())
    }

    /// Load every `.toml` file in `dir`. A missing directory is not an error;
    /// a bad file is logged and skipped. Returns the number of files loaded.
    pub fn load_directory(
        &mut self,
        dir: &Path,
        priority: RuleSetPriority,
    ) -> Result<usize, RuleSetError> {
        if !dir.exists() {
            return Ok(0);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| RuleSetError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("toml"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path, priority) {
                Ok(()) => loaded += 1,
                Err(e) => log::warn!("Failed to load rule set {}: {}", path.display(), e),
            }
        }
        Ok(loaded)
    }
}
