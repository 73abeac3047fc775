// CLI commands for managing Codegate
use anyhow::{bail, Context, Result};
use codegate_common::config::GatewayConfig;
use codegate_common::engine::PistonClient;
use codegate_common::gateway::{Gateway, GatewayOutcome};
use codegate_common::languages::{LanguageRegistry, LanguagesFile};
use codegate_common::types::{IncomingRequest, LanguageSpec, OutcomeKind};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Load the language table; a missing file is an empty table
fn load_languages_config(path: &Path) -> Result<LanguagesFile> {
    if !path.exists() {
        return Ok(LanguagesFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn save_languages_config(path: &Path, config: &LanguagesFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json_content =
        serde_json::to_string_pretty(config).context("Failed to serialize language table")?;
    fs::write(path, json_content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Add a language to the table
pub fn add_language(
    config_path: &Path,
    id: &str,
    version: &str,
    file: &str,
    display: Option<&str>,
) -> Result<()> {
    println!("🚀 Adding language: {}", id);

    if id.is_empty() || version.is_empty() || file.is_empty() {
        bail!("Language id, version and file name cannot be empty");
    }

    let mut languages_json = load_languages_config(config_path)?;

    if languages_json.languages.iter().any(|l| l.id == id) {
        bail!("Language '{}' already exists in {}", id, config_path.display());
    }

    languages_json.languages.push(LanguageSpec {
        id: id.to_string(),
        runtime_version: version.to_string(),
        source_file_name: file.to_string(),
        display_name: display.unwrap_or(id).to_string(),
    });

    // Reject tables the API would refuse to load
    LanguageRegistry::from_specs(languages_json.languages.clone())?;

    save_languages_config(config_path, &languages_json)?;

    println!("✅ Language '{}' ({}) added to {}", id, version, config_path.display());
    Ok(())
}

/// Remove a language from the table
pub fn remove_language(config_path: &Path, id: &str, yes: bool) -> Result<()> {
    println!("🗑️  Removing language: {}", id);

    let mut languages_json = load_languages_config(config_path)?;

    let lang_index = languages_json
        .languages
        .iter()
        .position(|l| l.id == id)
        .ok_or_else(|| anyhow::anyhow!("Language '{}' not found in {}", id, config_path.display()))?;

    if languages_json.languages.len() == 1 {
        bail!("Refusing to remove the last configured language");
    }

    if !yes {
        println!("⚠️  This will remove '{}' from {}", id, config_path.display());
        print!("\nContinue? (y/N): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("❌ Aborted");
            return Ok(());
        }
    }

    languages_json.languages.remove(lang_index);
    save_languages_config(config_path, &languages_json)?;

    println!("✅ Language '{}' removed successfully!", id);
    Ok(())
}

/// Print the table; falls back to the builtin table when no file exists
pub fn list_languages(config_path: &Path) -> Result<()> {
    let (languages, source) = if config_path.exists() {
        (
            load_languages_config(config_path)?.languages,
            config_path.display().to_string(),
        )
    } else {
        (LanguageRegistry::builtin().specs().to_vec(), "builtin".to_string())
    };

    println!("📋 Languages ({}):\n", source);
    println!("{:<12} {:<10} {:<14} {:<12}", "Id", "Version", "File", "Name");
    println!("{}", "─".repeat(52));

    for lang in &languages {
        println!(
            "{:<12} {:<10} {:<14} {:<12}",
            lang.id, lang.runtime_version, lang.source_file_name, lang.display_name
        );
    }

    println!("\n✅ Total: {} language(s)", languages.len());

    Ok(())
}

/// Create config/languages.json seeded with the builtin table
pub fn init_project(path: &str) -> Result<()> {
    println!("🚀 Initializing Codegate project at: {}", path);

    let languages_json_path = Path::new(path).join("config/languages.json");
    if languages_json_path.exists() {
        println!("  ⏭️  Exists: config/languages.json");
    } else {
        save_languages_config(&languages_json_path, &LanguageRegistry::builtin().to_file())?;
        println!("  ✅ Created: config/languages.json");
    }

    println!("✅ Project initialized successfully!");
    println!("\n📋 Next steps:");
    println!("  1. Pin versions: codegate-cli add-lang --id python --version 3.10.0 --file main.py");
    println!("  2. Point the API at it: LANGUAGES_CONFIG=config/languages.json");
    println!("  3. Set ENGINE_URL to your execution engine");

    Ok(())
}

pub struct RunOptions {
    pub config: PathBuf,
    pub file: PathBuf,
    pub language: String,
    pub stdin: Option<PathBuf>,
    pub version: Option<String>,
    pub engine_url: String,
    pub timeout_secs: u64,
}

/// Run a file through the same pipeline as `POST /execute`.
/// Returns whether the program succeeded.
pub async fn run_file(options: RunOptions) -> Result<bool> {
    let code = fs::read_to_string(&options.file)
        .with_context(|| format!("Failed to read {}", options.file.display()))?;
    let stdin = match &options.stdin {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    if options.timeout_secs == 0 {
        bail!("Timeout must be greater than zero");
    }

    let registry = if options.config.exists() {
        LanguageRegistry::load(&options.config)?
    } else {
        LanguageRegistry::builtin()
    };

    let config = GatewayConfig {
        engine_url: options.engine_url,
        timeout: Duration::from_secs(options.timeout_secs),
        ..GatewayConfig::default()
    };
    let client = PistonClient::new(config.engine_url.clone())?;
    let gateway = Gateway::new(Arc::new(registry), client, &config);

    let request = IncomingRequest {
        code: Some(Value::String(code)),
        language: Some(Value::String(options.language)),
        stdin,
        version: options.version,
    };

    match gateway.handle(request).await {
        GatewayOutcome::Rejected(rejection) => bail!("{}", rejection),
        GatewayOutcome::Completed { result, upstream_elapsed } => {
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
                io::stdout().flush()?;
            }

            match result.outcome {
                OutcomeKind::Success => {
                    eprintln!(
                        "✅ {} ({} ms)",
                        result.outcome,
                        result
                            .execution_time_ms
                            .unwrap_or(upstream_elapsed.as_millis() as u64)
                    );
                    Ok(true)
                }
                OutcomeKind::CompilationError | OutcomeKind::RuntimeError | OutcomeKind::Killed => {
                    eprintln!("❌ {}", result.outcome);
                    eprintln!("{}", result.error_message);
                    Ok(false)
                }
                OutcomeKind::GatewayTimeout
                | OutcomeKind::GatewayUpstreamError
                | OutcomeKind::UpstreamUnknown => {
                    bail!("{}: {}", result.outcome, result.error_message)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("config/languages.json")
    }

    #[test]
    fn test_init_writes_builtin_table() {
        let dir = tempfile::tempdir().unwrap();
        init_project(dir.path().to_str().unwrap()).unwrap();

        let registry = LanguageRegistry::load(table_path(&dir)).unwrap();
        assert_eq!(
            registry.list_supported(),
            LanguageRegistry::builtin().list_supported()
        );
    }

    #[test]
    fn test_add_and_remove_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = table_path(&dir);

        add_language(&path, "python", "3.10.0", "main.py", Some("Python")).unwrap();
        add_language(&path, "go", "1.16.2", "main.go", None).unwrap();

        let table = load_languages_config(&path).unwrap();
        assert_eq!(table.languages.len(), 2);
        assert_eq!(table.languages[1].display_name, "go");

        remove_language(&path, "go", true).unwrap();
        let table = load_languages_config(&path).unwrap();
        assert_eq!(table.languages.len(), 1);
        assert_eq!(table.languages[0].id, "python");
    }

    #[test]
    fn test_add_duplicate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = table_path(&dir);

        add_language(&path, "python", "3.10.0", "main.py", None).unwrap();
        assert!(add_language(&path, "python", "3.12.0", "main.py", None).is_err());
    }

    #[test]
    fn test_remove_last_language_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = table_path(&dir);

        add_language(&path, "python", "3.10.0", "main.py", None).unwrap();
        assert!(remove_language(&path, "python", true).is_err());
        assert!(remove_language(&path, "rust", true).is_err());
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_language_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.cob");
        fs::write(&source, "DISPLAY 'HI'.").unwrap();

        let result = run_file(RunOptions {
            config: table_path(&dir),
            file: source,
            language: "cobol".to_string(),
            stdin: None,
            version: None,
            engine_url: "http://127.0.0.1:1/execute".to_string(),
            timeout_secs: 1,
        })
        .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unsupported language 'cobol'"));
    }
}
