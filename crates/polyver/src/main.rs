use std::process::ExitCode;
use std::sync::Arc;

use polyver::logging::init_logging;
use polyver::{AppPaths, AppSettings, JsonPreferenceStore, RuntimeService};

#[tokio::main]
async fn main() -> ExitCode {
    let paths = match AppPaths::new() {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("polyver: {error}");
            return ExitCode::FAILURE;
        }
    };

    let settings = AppSettings::load_from(&paths.settings_file());
    init_logging(&paths, &settings);

    let preferences = Arc::new(JsonPreferenceStore::open(paths.preferences_file()));
    let service = RuntimeService::new(&paths, settings, preferences);

    let mut failed = false;
    for (identifier, result) in service.refresh_all().await {
        let Ok(language) = service.language(&identifier) else {
            continue;
        };
        match result {
            Ok(snapshot) => {
                println!("{} ({identifier})", language.display_name);
                if snapshot.is_empty() {
                    println!("  no installations found");
                }
                for record in &snapshot.records {
                    let marker = if snapshot.is_active(record) { '*' } else { ' ' };
                    println!(
                        "  {marker} {:<12} {:<24} {}",
                        record.version,
                        record.source_label,
                        record.install_path.display()
                    );
                }
            }
            Err(error) => {
                failed = true;
                eprintln!("{}: {error}", language.display_name);
            }
        }
    }

    println!();
    println!(
        "Scripts: {}",
        service.script_writer().script_dir().display()
    );

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
