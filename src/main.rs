use kobo_highlights::config::{Action, Config, ImportOptions};
use kobo_highlights::import::{self, ImportError, ImportRequest};
use kobo_highlights::settings::{self, JsonSettingsStore, SettingsStore};
use kobo_highlights::vault::Vault;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "kobo_highlights=info";

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let vault = match Vault::open(&config.vault_path) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "vault unavailable");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = match &config.settings_path {
        Some(path) => JsonSettingsStore::new(path),
        None => JsonSettingsStore::in_vault(vault.root()),
    };

    match config.action {
        Action::Import(opts) => import_highlights(&vault, &store, opts),
        Action::ListFolders => list_folders(&vault),
        Action::SetFolder(folder) => set_folder(&vault, &store, &folder),
        Action::ShowSettings => show_settings(&store),
    }
}

fn import_highlights(vault: &Vault, store: &JsonSettingsStore, opts: ImportOptions) -> ExitCode {
    let mut settings = match store.load() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to load settings");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(folder) = opts.folder_override {
        settings.storage_folder = folder;
    }

    let request = ImportRequest {
        database_path: opts.database_path.as_deref(),
        settings: &settings,
        date_range: opts.date_range,
    };

    println!("Extracting highlights...");
    match import::run_import(&request, vault) {
        Ok(report) => {
            for note in &report.written {
                println!("  {} ({} highlights)", vault.resolve(&note.path).display(), note.highlights);
            }
            for note in &report.failed {
                println!("  FAILED {}: {}", vault.resolve(&note.path).display(), note.error);
            }
            if report.is_success() {
                if report.written.is_empty() {
                    println!("No highlights found.");
                } else {
                    println!("Highlights extracted!");
                }
                ExitCode::SUCCESS
            } else {
                println!(
                    "{} of {} books could not be written.",
                    report.failed.len(),
                    report.failed.len() + report.written.len()
                );
                ExitCode::FAILURE
            }
        }
        Err(e @ (ImportError::MissingInput | ImportError::WrongFileType(_) | ImportError::Unreadable { .. })) => {
            tracing::error!(error = %e, "invalid input");
            println!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "import failed");
            println!("Something went wrong... Check the log for more details.");
            ExitCode::FAILURE
        }
    }
}

fn list_folders(vault: &Vault) -> ExitCode {
    match vault.list_folders() {
        Ok(folders) => {
            for folder in folders {
                println!("{}", folder);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to list folders");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn set_folder(vault: &Vault, store: &JsonSettingsStore, folder: &str) -> ExitCode {
    let result = vault
        .list_folders()
        .map_err(|e| e.to_string())
        .and_then(|choices| {
            settings::set_storage_folder(store, &choices, folder).map_err(|e| e.to_string())
        });

    match result {
        Ok(s) => {
            println!("Destination folder: {}", s.storage_folder);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, folder, "failed to set destination folder");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn show_settings(store: &JsonSettingsStore) -> ExitCode {
    match store.load() {
        Ok(s) => {
            println!("Settings file: {}", store.path().display());
            let folder = if s.storage_folder.is_empty() { "." } else { s.storage_folder.as_str() };
            println!("Destination folder: {}", folder);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load settings");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
