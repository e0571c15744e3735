use crate::config::IndicatorConfig;
use crate::roster::{avatar_url, ordered_roster, profile_url};
use crate::state::{PollStatus, ServerStatus};

pub const INVITE_NOTICE: &str = "This server is invite-only.";

/// Dot colour for each status
pub fn status_color(status: PollStatus) -> [u8; 3] {
    match status {
        PollStatus::Loading => [0x8F, 0x90, 0x94],
        PollStatus::Offline => [0xFF, 0x00, 0x00],
        PollStatus::Unknown => [0xF5, 0xA6, 0x23],
        PollStatus::Online => [0x22, 0xCC, 0x52],
    }
}

/// One-line description of the current status
pub fn status_line(status: &ServerStatus) -> String {
    match status {
        ServerStatus::Loading => "Pinging server...".to_string(),
        ServerStatus::Offline => "The server is currently offline.".to_string(),
        ServerStatus::Unknown(_) => "Unable to ping the server.".to_string(),
        ServerStatus::Online(online) => format!(
            "{} / {} players online.",
            online.ping.players.online, online.ping.players.max
        ),
    }
}

/// Hint shown next to the status dot
pub fn latency_hint(status: &ServerStatus) -> Option<String> {
    match status {
        ServerStatus::Loading => None,
        ServerStatus::Online(online) => Some(format!("{}ms", online.ping.latency)),
        ServerStatus::Offline | ServerStatus::Unknown(_) => Some("Sorry.".to_string()),
    }
}

pub fn tooltip(config: &IndicatorConfig, status: &ServerStatus) -> String {
    let mut tooltip = format!(
        "{}\n{}\n\n{}",
        config.server_name,
        config.server_address,
        status_line(status)
    );
    if let Some(hint) = latency_hint(status) {
        tooltip.push_str(&format!(" ({})", hint));
    }
    tooltip.push('\n');
    tooltip.push_str(INVITE_NOTICE);
    tooltip
}

pub fn players_heading(count: usize) -> String {
    format!("Players Online ({})", count)
}

/// A player row, in display order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub profile_url: String,
}

/// Everything the tray menu shows. Two equal views render the same menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuView {
    pub status_line: String,
    pub map_enabled: bool,
    pub roster: Vec<RosterEntry>,
}

impl MenuView {
    pub fn new(config: &IndicatorConfig, status: &ServerStatus) -> Self {
        let roster = ordered_roster(status.players())
            .into_iter()
            .map(|player| RosterEntry {
                id: player.id.clone(),
                name: player.name.clone(),
                avatar_url: avatar_url(&config.avatar_base_url, &player.id),
                profile_url: profile_url(&config.profile_base_url, &player.id),
            })
            .collect();

        Self {
            status_line: status_line(status),
            map_enabled: status.kind() == PollStatus::Online,
            roster,
        }
    }

    pub fn players_enabled(&self) -> bool {
        !self.roster.is_empty()
    }
}
