use crate::state::{PingResult, Player};

/// Players to keep for display: the upstream sample when anyone is online,
/// otherwise nothing, even if the counts disagree with the sample.
pub fn player_list(ping: &PingResult) -> Vec<Player> {
    match &ping.players.sample {
        Some(sample) if ping.players.online >= 1 => sample.clone(),
        _ => Vec::new(),
    }
}

/// Display order: shortest name first, ties keep upstream order
pub fn ordered_roster(players: &[Player]) -> Vec<&Player> {
    let mut ordered: Vec<&Player> = players.iter().collect();
    ordered.sort_by_key(|player| player.name.chars().count());
    ordered
}

pub fn avatar_url(base_url: &str, player_id: &str) -> String {
    format!("{}/{}/32", base_url.trim_end_matches('/'), player_id)
}

pub fn profile_url(base_url: &str, player_id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), player_id)
}
