use crate::api::HttpStatusSource;
use crate::config::{ENV_FILES, IndicatorConfig, load_env_files};
use crate::poller::{PollerHandle, StatusPoller};
use crate::state::StatusStore;
use crate::tray::{create_tray, run_tray_updates};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tauri::Manager;
use tracing::info;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from the repository root, then the working directory
    let env_files = load_env_files(&ENV_FILES);
    info!(?env_files, "Environment files loaded");

    let config = IndicatorConfig::from_env();
    info!(config = ?config, "Configuration loaded");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            // Menu events read links and the address from managed state
            app.manage(config.clone());
            create_tray(app.handle(), &config)?;

            let store = StatusStore::new();
            let source = HttpStatusSource::new(&config)?;
            info!(url = source.url(), "Polling status endpoint");

            let (poller, polling_task) =
                StatusPoller::new(source, store.clone(), config.poll_interval()).into_task();
            tauri::async_runtime::spawn(polling_task);
            tauri::async_runtime::spawn(run_tray_updates(
                app.handle().clone(),
                config.clone(),
                store.subscribe(),
                poller.child_token(),
            ));

            // Create shutdown flag to prevent infinite exit loop
            let shutdown_started = Arc::new(AtomicBool::new(false));

            app.manage(poller);
            app.manage(shutdown_started);

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let tauri::RunEvent::ExitRequested { api, .. } = event {
                let shutdown_flag = app_handle.state::<Arc<AtomicBool>>();

                if shutdown_flag.swap(true, Ordering::SeqCst) {
                    // Shutdown already initiated, allow exit to proceed
                    return;
                }

                info!("Exit requested, stopping status polling");
                api.prevent_exit();

                app_handle.state::<PollerHandle>().shutdown();

                app_handle.exit(0);
            }
        });
}
