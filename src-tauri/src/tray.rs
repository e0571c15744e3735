use crate::avatar::{build_avatar_client, fetch_avatars};
use crate::config::IndicatorConfig;
use crate::display::{MenuView, players_heading, tooltip};
use crate::icon::{AVATAR_SIZE, ICON_SIZE, generate_status_icon};
use crate::roster::profile_url;
use crate::state::{ServerStatus, StatusSnapshot};
use std::collections::HashMap;
use tauri::image::Image;
use tauri::menu::{
    IconMenuItemBuilder, Menu, MenuBuilder, MenuEvent, MenuItemBuilder, SubmenuBuilder,
};
use tauri::tray::TrayIconBuilder;
use tauri::{AppHandle, Manager, Wry};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const TRAY_ID: &str = "main";

const STATUS_ID: &str = "status";
const COPY_ADDRESS_ID: &str = "copy_address";
const OPEN_MAP_ID: &str = "open_map";
const OPEN_RULES_ID: &str = "open_rules";
const QUIT_ID: &str = "quit";
const PLAYER_ID_PREFIX: &str = "player:";

/// Create the tray icon in its loading state
pub fn create_tray(app: &AppHandle, config: &IndicatorConfig) -> tauri::Result<()> {
    let status = ServerStatus::Loading;
    let menu = build_menu(app, config, &MenuView::new(config, &status), &HashMap::new())?;
    let icon = Image::new_owned(generate_status_icon(status.kind()), ICON_SIZE, ICON_SIZE);

    TrayIconBuilder::with_id(TRAY_ID)
        .icon(icon)
        .tooltip(tooltip(config, &status))
        .menu(&menu)
        .on_menu_event(handle_menu_event)
        .build(app)?;

    info!("Tray icon created successfully");
    Ok(())
}

fn handle_menu_event(app: &AppHandle, event: MenuEvent) {
    let config = app.state::<IndicatorConfig>();
    let id = event.id.as_ref();

    match id {
        QUIT_ID => app.exit(0),
        COPY_ADDRESS_ID => copy_to_clipboard(&config.server_address),
        OPEN_MAP_ID => open_url(app, &config.map_url),
        OPEN_RULES_ID => open_url(app, &config.rules_url),
        _ => {
            if let Some(player_id) = id.strip_prefix(PLAYER_ID_PREFIX) {
                open_url(app, &profile_url(&config.profile_base_url, player_id));
            }
        }
    }
}

fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
        Ok(()) => info!(text, "Copied server address"),
        Err(e) => warn!("Clipboard error: {}", e),
    }
}

fn open_url(app: &AppHandle, url: &str) {
    if let Err(e) = app.opener().open_url(url, None::<&str>) {
        error!(url, "Failed to open link: {}", e);
    }
}

/// Redraw the tray whenever the store changes, until cancelled. Icon and
/// tooltip follow every change; the menu is rebuilt separately so avatar
/// downloads never hold up the status.
pub async fn run_tray_updates(
    app: AppHandle,
    config: IndicatorConfig,
    rx: watch::Receiver<StatusSnapshot>,
    cancel_token: CancellationToken,
) {
    // Matches the menu built by create_tray
    let (menu_tx, menu_rx) = watch::channel(MenuView::new(&config, &ServerStatus::Loading));

    tokio::join!(
        run_status_updates(&app, &config, rx, menu_tx, &cancel_token),
        run_menu_updates(&app, &config, menu_rx, &cancel_token),
    );
    debug!("Tray updates stopped");
}

async fn run_status_updates(
    app: &AppHandle,
    config: &IndicatorConfig,
    mut rx: watch::Receiver<StatusSnapshot>,
    menu_tx: watch::Sender<MenuView>,
    cancel_token: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = rx.borrow_and_update().clone();
                if let Err(e) = update_tray_status(app, config, &snapshot.status) {
                    error!("Failed to update tray icon: {}", e);
                }

                let view = MenuView::new(config, &snapshot.status);
                menu_tx.send_if_modified(|shown| {
                    if *shown == view {
                        return false;
                    }
                    *shown = view;
                    true
                });
            }
        }
    }
}

async fn run_menu_updates(
    app: &AppHandle,
    config: &IndicatorConfig,
    mut rx: watch::Receiver<MenuView>,
    cancel_token: &CancellationToken,
) {
    let client = match build_avatar_client() {
        Ok(client) => client,
        Err(e) => {
            error!("Menu updates disabled: {}", e);
            return;
        }
    };

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }

                let view = rx.borrow_and_update().clone();
                let avatars = tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    avatars = fetch_avatars(&client, &view.roster) => avatars,
                };

                match build_menu(app, config, &view, &avatars) {
                    Ok(menu) => {
                        if let Err(e) = set_tray_menu(app, menu) {
                            error!("Failed to update tray menu: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to build tray menu: {}", e),
                }
            }
        }
    }
}

pub fn update_tray_status(
    app: &AppHandle,
    config: &IndicatorConfig,
    status: &ServerStatus,
) -> Result<(), Box<dyn std::error::Error>> {
    let tray = app.tray_by_id(TRAY_ID).ok_or("Tray not found")?;

    let icon = Image::new_owned(generate_status_icon(status.kind()), ICON_SIZE, ICON_SIZE);
    tray.set_icon(Some(icon))?;
    tray.set_tooltip(Some(tooltip(config, status)))?;

    Ok(())
}

fn set_tray_menu(app: &AppHandle, menu: Menu<Wry>) -> Result<(), Box<dyn std::error::Error>> {
    let tray = app.tray_by_id(TRAY_ID).ok_or("Tray not found")?;
    tray.set_menu(Some(menu))?;
    Ok(())
}

fn build_menu(
    app: &AppHandle,
    config: &IndicatorConfig,
    view: &MenuView,
    avatars: &HashMap<String, Vec<u8>>,
) -> tauri::Result<Menu<Wry>> {
    let status_item = MenuItemBuilder::with_id(STATUS_ID, &view.status_line)
        .enabled(false)
        .build(app)?;
    let copy_item = MenuItemBuilder::with_id(
        COPY_ADDRESS_ID,
        format!("Copy address ({})", config.server_address),
    )
    .build(app)?;
    let map_item = MenuItemBuilder::with_id(OPEN_MAP_ID, "World Map")
        .enabled(view.map_enabled)
        .build(app)?;
    let rules_item = MenuItemBuilder::with_id(OPEN_RULES_ID, "Guidelines").build(app)?;

    let mut players = SubmenuBuilder::new(app, players_heading(view.roster.len()))
        .enabled(view.players_enabled());
    for entry in &view.roster {
        let mut item = IconMenuItemBuilder::with_id(
            format!("{}{}", PLAYER_ID_PREFIX, entry.id),
            &entry.name,
        );
        if let Some(rgba) = avatars.get(&entry.id) {
            item = item.icon(Image::new_owned(rgba.clone(), AVATAR_SIZE, AVATAR_SIZE));
        }
        players = players.item(&item.build(app)?);
    }
    let players_menu = players.build()?;

    let quit_item = MenuItemBuilder::with_id(QUIT_ID, "Quit").build(app)?;

    MenuBuilder::new(app)
        .item(&status_item)
        .separator()
        .item(&copy_item)
        .item(&map_item)
        .item(&rules_item)
        .item(&players_menu)
        .separator()
        .item(&quit_item)
        .build()
}
