mod app;
mod avatar;
mod icon;
mod tray;

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod poller;
pub mod roster;
pub mod state;

pub use api::{HttpStatusSource, StatusSource, fetch_status_with_base_url, parse_status_body};
pub use app::run;
pub use config::IndicatorConfig;
pub use error::FetchError;
pub use poller::{PollerHandle, StatusPoller, classify};
pub use state::{
    OnlineStatus, PingResult, Player, PlayerCounts, PollStatus, ServerStatus, StatusSnapshot,
    StatusStore,
};
