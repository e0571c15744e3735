use crate::display::RosterEntry;
use crate::error::FetchError;
use crate::icon::decode_avatar;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use wreq::Client;

/// Per-request limit for avatar downloads, shorter than status requests
pub const AVATAR_TIMEOUT: Duration = Duration::from_secs(2);

pub fn build_avatar_client() -> Result<Client, FetchError> {
    crate::api::build_client(AVATAR_TIMEOUT)
}

/// Download avatars for every roster entry at once, keyed by player id.
/// Failures just leave the entry without an icon.
pub async fn fetch_avatars(client: &Client, roster: &[RosterEntry]) -> HashMap<String, Vec<u8>> {
    let downloads = roster.iter().map(|entry| async move {
        let result = fetch_avatar(client, &entry.avatar_url).await;
        (entry, result)
    });

    join_all(downloads)
        .await
        .into_iter()
        .filter_map(|(entry, result)| match result {
            Ok(rgba) => Some((entry.id.clone(), rgba)),
            Err(e) => {
                debug!(url = %entry.avatar_url, "Avatar unavailable: {}", e);
                None
            }
        })
        .collect()
}

async fn fetch_avatar(client: &Client, url: &str) -> Result<Vec<u8>, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    decode_avatar(&bytes).map_err(|e| e.to_string())
}
