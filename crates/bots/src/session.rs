use std::fmt;

use pixelbot_cron::PlaylistState;

use crate::services::PlayerSettings;

/// Everything a bot remembers about one chat.
#[derive(Debug, Default)]
pub struct BotSession {
    /// Last brightness read from or written to the device.
    pub brightness: Option<u8>,
    pub display_on: Option<bool>,
    pub playlist: Option<PlaylistState>,
    pub score: Score,
}

impl BotSession {
    /// The session's playlist, seeded from `settings` on first use.
    pub fn playlist_mut(&mut self, settings: &PlayerSettings) -> &mut PlaylistState {
        self.playlist.get_or_insert_with(|| {
            PlaylistState::new(settings.playlist.clone(), settings.order, settings.interval)
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub visit: u32,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.home, self.visit)
    }
}
