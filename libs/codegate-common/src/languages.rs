// Language registry
// Pinned toolchain table, built once at startup and read-only afterwards

use crate::types::LanguageSpec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read language table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse language table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No languages configured")]
    Empty,

    #[error("Duplicate language id '{0}'")]
    Duplicate(String),

    #[error("Language '{0}' has an empty field")]
    Incomplete(String),
}

/// On-disk shape of `config/languages.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguagesFile {
    pub languages: Vec<LanguageSpec>,
}

/// (id, runtime version, source file, display name)
const BUILTIN_LANGUAGES: &[(&str, &str, &str, &str)] = &[
    ("python", "3.10.0", "main.py", "Python"),
    ("javascript", "18.15.0", "main.js", "JavaScript"),
    ("typescript", "5.0.3", "main.ts", "TypeScript"),
    ("java", "15.0.2", "Main.java", "Java"),
    ("c", "10.2.0", "main.c", "C"),
    ("cpp", "10.2.0", "main.cpp", "C++"),
    ("csharp", "6.12.0", "Main.cs", "C#"),
    ("go", "1.16.2", "main.go", "Go"),
    ("rust", "1.68.2", "main.rs", "Rust"),
    ("ruby", "3.0.1", "main.rb", "Ruby"),
    ("php", "8.2.3", "main.php", "PHP"),
    ("kotlin", "1.8.20", "Main.kt", "Kotlin"),
    ("swift", "5.3.3", "main.swift", "Swift"),
];

/// Registry of supported languages
/// Lookup is by id; iteration keeps declaration order
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    specs: Vec<LanguageSpec>,
    index: HashMap<String, usize>,
}

impl LanguageRegistry {
    /// The pinned default table
    pub fn builtin() -> Self {
        let specs = BUILTIN_LANGUAGES
            .iter()
            .map(|(id, version, file, display)| LanguageSpec {
                id: id.to_string(),
                runtime_version: version.to_string(),
                source_file_name: file.to_string(),
                display_name: display.to_string(),
            })
            .collect();

        Self::index(specs)
    }

    /// Build a registry from an injected table
    pub fn from_specs(specs: Vec<LanguageSpec>) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.id.is_empty()
                || spec.runtime_version.is_empty()
                || spec.source_file_name.is_empty()
                || spec.display_name.is_empty()
            {
                return Err(RegistryError::Incomplete(spec.id.clone()));
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(RegistryError::Duplicate(spec.id.clone()));
            }
        }

        Ok(Self::index(specs))
    }

    /// Load a registry from a languages.json file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let file: LanguagesFile = serde_json::from_str(&content)?;
        Self::from_specs(file.languages)
    }

    fn index(specs: Vec<LanguageSpec>) -> Self {
        let index = specs
            .iter()
            .enumerate()
            .map(|(pos, spec)| (spec.id.clone(), pos))
            .collect();
        Self { specs, index }
    }

    /// Look up a language by id
    pub fn resolve(&self, language_id: &str) -> Option<&LanguageSpec> {
        self.index.get(language_id).map(|&pos| &self.specs[pos])
    }

    /// Supported ids, in declaration order
    pub fn list_supported(&self) -> Vec<&str> {
        self.specs.iter().map(|spec| spec.id.as_str()).collect()
    }

    /// The whole table, in declaration order
    pub fn specs(&self) -> &[LanguageSpec] {
        &self.specs
    }

    pub fn to_file(&self) -> LanguagesFile {
        LanguagesFile {
            languages: self.specs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecutionRequest, UpstreamPayload};
    use std::io::Write;

    fn spec(id: &str, version: &str, file: &str) -> LanguageSpec {
        LanguageSpec {
            id: id.to_string(),
            runtime_version: version.to_string(),
            source_file_name: file.to_string(),
            display_name: id.to_uppercase(),
        }
    }

    #[test]
    fn test_builtin_versions_are_pinned() {
        let registry = LanguageRegistry::builtin();

        for (id, version, file, display) in BUILTIN_LANGUAGES {
            let spec = registry.resolve(id).expect("builtin id must resolve");
            assert_eq!(spec.runtime_version, *version);
            assert_eq!(spec.source_file_name, *file);
            assert_eq!(spec.display_name, *display);
        }
    }

    #[test]
    fn test_builtin_table_is_valid() {
        let registry = LanguageRegistry::builtin();
        assert!(LanguageRegistry::from_specs(registry.specs().to_vec()).is_ok());
    }

    #[test]
    fn test_list_supported_keeps_order() {
        let registry = LanguageRegistry::builtin();
        let ids = registry.list_supported();

        assert_eq!(ids.len(), BUILTIN_LANGUAGES.len());
        assert_eq!(ids[0], "python");
        assert_eq!(ids[1], "javascript");
        assert_eq!(*ids.last().unwrap(), "swift");
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = LanguageRegistry::builtin();
        assert!(registry.resolve("cobol").is_none());
        assert!(registry.resolve("Python").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn test_payload_file_names_never_leak_across_languages() {
        let registry = LanguageRegistry::builtin();

        for spec in registry.specs() {
            let request = ExecutionRequest {
                source_code: "code".to_string(),
                language_id: spec.id.clone(),
                stdin: String::new(),
                requested_version: None,
            };
            let resolved = registry.resolve(&request.language_id).unwrap();
            let payload = UpstreamPayload::build(&request, resolved);

            assert_eq!(payload.language, spec.id);
            assert_eq!(payload.files[0].name, spec.source_file_name);
            assert_eq!(payload.version, spec.runtime_version);
        }
    }

    #[test]
    fn test_from_specs_rejects_duplicates() {
        let result = LanguageRegistry::from_specs(vec![
            spec("python", "3.10.0", "main.py"),
            spec("python", "3.12.0", "main.py"),
        ]);
        assert!(matches!(result, Err(RegistryError::Duplicate(id)) if id == "python"));
    }

    #[test]
    fn test_from_specs_rejects_empty_and_incomplete() {
        assert!(matches!(
            LanguageRegistry::from_specs(vec![]),
            Err(RegistryError::Empty)
        ));
        assert!(matches!(
            LanguageRegistry::from_specs(vec![spec("go", "", "main.go")]),
            Err(RegistryError::Incomplete(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"languages":[
                {{"id":"go","runtime_version":"1.21.0","source_file_name":"main.go","display_name":"Go"}},
                {{"id":"python","runtime_version":"3.12.0","source_file_name":"main.py","display_name":"Python"}}
            ]}}"#
        )
        .unwrap();

        let registry = LanguageRegistry::load(file.path()).unwrap();
        assert_eq!(registry.list_supported(), vec!["go", "python"]);
        assert_eq!(registry.resolve("python").unwrap().runtime_version, "3.12.0");
    }

    #[test]
    fn test_load_missing_file() {
        let result = LanguageRegistry::load("/nonexistent/languages.json");
        assert!(matches!(result, Err(RegistryError::Read { .. })));
    }
}
