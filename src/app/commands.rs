//! Outbound playback commands.
//!
//! These are the only messages the panel sends to the show controller.
//! Each trigger is a fixed, ordered pair: start the playlist, then turn
//! its repeat flag on.  Playlist entity ids are the button numbers.

use core::fmt::Write;

use super::ports::CommandPublisher;
use crate::selector::ButtonIndex;

/// Command name as sent on the wire, e.g. `playlist/3/start`.
pub type CommandName = heapless::String<32>;

/// A single playback command for one playlist entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    /// Start playlist `b`.
    Start(ButtonIndex),
    /// Set playlist `b`'s repeat flag.
    SetRepeat(ButtonIndex, bool),
}

impl PlaybackCommand {
    /// The commands issued, in order, when `button` is confirmed.
    pub fn trigger_sequence(button: ButtonIndex) -> [Self; 2] {
        [Self::Start(button), Self::SetRepeat(button, true)]
    }

    /// Playlist entity id on the show controller.
    pub fn entity(&self) -> u8 {
        match self {
            Self::Start(b) | Self::SetRepeat(b, _) => b.get(),
        }
    }

    pub fn name(&self) -> CommandName {
        let mut name = CommandName::new();
        // 32 bytes always fits "playlist/N/repeat".
        let _ = match self {
            Self::Start(_) => write!(name, "playlist/{}/start", self.entity()),
            Self::SetRepeat(..) => write!(name, "playlist/{}/repeat", self.entity()),
        };
        name
    }

    pub fn payload(&self) -> &'static str {
        match self {
            Self::Start(_) | Self::SetRepeat(_, true) => "1",
            Self::SetRepeat(_, false) => "0",
        }
    }

    pub fn publish(&self, publisher: &mut impl CommandPublisher) {
        publisher.publish(&self.name(), self.payload());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_sequence_is_start_then_repeat() {
        let b = ButtonIndex::new(4).unwrap();
        let seq = PlaybackCommand::trigger_sequence(b);
        assert_eq!(seq[0], PlaybackCommand::Start(b));
        assert_eq!(seq[1], PlaybackCommand::SetRepeat(b, true));
    }

    #[test]
    fn wire_names_and_payloads() {
        let b = ButtonIndex::new(8).unwrap();
        assert_eq!(PlaybackCommand::Start(b).name().as_str(), "playlist/8/start");
        assert_eq!(PlaybackCommand::Start(b).payload(), "1");
        assert_eq!(
            PlaybackCommand::SetRepeat(b, true).name().as_str(),
            "playlist/8/repeat"
        );
        assert_eq!(PlaybackCommand::SetRepeat(b, false).payload(), "0");
    }

    #[test]
    fn entity_matches_button_number() {
        for n in 1..=8 {
            let b = ButtonIndex::new(n).unwrap();
            assert_eq!(PlaybackCommand::Start(b).entity(), n);
        }
    }
}
