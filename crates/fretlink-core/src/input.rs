//! Button identities and rising-edge detection.
//!
//! Hardware reports levels (held / not held). Game logic only reacts to the
//! transition from released to pressed, so a held button scores once.

use strum::{FromRepr, IntoStaticStr};

use crate::config::rhythm::TRACK_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum Button {
    Track0 = 0,
    Track1 = 1,
    Track2 = 2,
    Track3 = 3,
    /// Dedicated action button (disconnect while playing)
    Action = 4,
}

impl Button {
    pub const ALL: [Button; 5] = [
        Button::Track0,
        Button::Track1,
        Button::Track2,
        Button::Track3,
        Button::Action,
    ];

    /// Button bound to a playable track
    pub fn from_track(track: u8) -> Option<Self> {
        if track < TRACK_COUNT {
            Self::from_repr(track)
        } else {
            None
        }
    }

    /// Track index, `None` for the action button
    pub fn track(self) -> Option<u8> {
        let index = self as u8;
        (index < TRACK_COUNT).then_some(index)
    }

    fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{}", name)
    }
}

/// Compact set of buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn with(self, button: Button) -> Self {
        Self(self.0 | button.mask())
    }

    pub fn without(self, button: Button) -> Self {
        Self(self.0 & !button.mask())
    }

    pub fn contains(&self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(|b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Rising-edge detector over sampled button levels
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    held: ButtonSet,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current levels, returning buttons that were just pressed
    pub fn update(&mut self, levels: ButtonSet) -> ButtonSet {
        let rising = ButtonSet(levels.0 & !self.held.0);
        self.held = levels;
        rising
    }
}
