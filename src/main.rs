use bouquet_editor::config::EditorCommand;
use bouquet_editor::core::{report, ConfigProvider, ConnectivitySet, Storage};
use bouquet_editor::utils::error::ErrorSeverity;
use bouquet_editor::utils::{logger, validation::Validate};
use bouquet_editor::{
    Autofill, ChangeLog, CliConfig, EditorConfig, EditorError, EditorSession, LocalStorage,
    Outcome, SessionEvent,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.to_editor_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.log_format(), cli.verbose(&config));
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0, // 只是警告，狀態未變
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: EditorConfig) -> Result<(), EditorError> {
    let storage = LocalStorage::new(".".to_string());

    if let EditorCommand::Discard = cli.command {
        storage.remove_file(config.autosave_path()).await?;
        println!("🗑️ Autosave discarded");
        return Ok(());
    }

    let change_log_path = config.change_log_path().map(str::to_string);
    let mut session = EditorSession::open(storage, config).await?;

    match &cli.command {
        EditorCommand::Keys => {
            for key in session.store().service_keys() {
                println!("{}\t{}", key, session.service_name(key));
            }
        }
        EditorCommand::Show { key } => {
            let bouquet = session.store().find_bouquet(key).ok_or_else(|| {
                EditorError::BouquetNotFoundError { key: key.clone() }
            })?;
            println!(
                "Devices for Service Key: {} - {}",
                key,
                session.service_name(key)
            );
            for device in &bouquet.devices {
                println!("  {:<28} [{}]", device.label(), device.device_connectivity);
            }
        }
        EditorCommand::Set {
            key,
            device_type,
            device_platform,
            flags,
        } => {
            let connectivity = ConnectivitySet::parse_flags(flags.as_slice())?;
            session
                .handle(SessionEvent::SetConnectivity {
                    key: key.clone(),
                    device_type: device_type.clone(),
                    device_platform: device_platform.clone(),
                    connectivity: connectivity.clone(),
                })
                .await?;
            println!(
                "✅ {} {} - {} set to [{}]",
                key, device_type, device_platform, connectivity
            );
        }
        EditorCommand::Add { key, fill } => {
            let fill: Autofill = fill.parse()?;
            if let Outcome::Added { key, devices } = session
                .handle(SessionEvent::AddBouquet {
                    key: key.clone(),
                    fill,
                })
                .await?
            {
                println!("✅ Service Key {} added with {} devices", key, devices);
            }
        }
        EditorCommand::Remove { key } => {
            if let Outcome::Removed { key, existed } = session
                .handle(SessionEvent::RemoveBouquet { key: key.clone() })
                .await?
            {
                if existed {
                    println!("✅ Service Key {} deleted.", key);
                } else {
                    println!("Service Key {} was not present.", key);
                }
            }
        }
        EditorCommand::Diff { csv } => {
            print_change_log(&session.change_log(), *csv)?;
        }
        EditorCommand::Save { .. } => {
            if let Outcome::Saved {
                output_path,
                change_log,
            } = session.handle(SessionEvent::Save).await?
            {
                println!("✅ Changes saved!");
                println!("📁 Output saved to: {}", output_path);
                if let Some(path) = &change_log_path {
                    session.export_change_log(path, &change_log).await?;
                    println!("📝 Change log saved to: {}", path);
                }
                print_change_log(&change_log, false)?;
            }
        }
        EditorCommand::Discard => {}
    }

    session.close().await
}

fn print_change_log(change_log: &ChangeLog, as_csv: bool) -> Result<(), EditorError> {
    if change_log.is_empty() {
        println!("No changed devices.");
        return Ok(());
    }

    if as_csv {
        print!("{}", report::to_csv(change_log)?);
    } else {
        println!();
        println!("Changed Devices");
        println!("{}", report::to_table(change_log));
    }
    Ok(())
}
