//! Key mask handed over by the input-polling collaborator.
//!
//! The window layer translates whatever its platform reports into these bits
//! once per frame. The frame loop only ever sees the mask.

use bitflags::bitflags;

bitflags! {
    /// Keys held down during the last input poll.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Keys: u32 {
        /// Move forward.
        const UP = 1 << 0;
        /// Move backward.
        const DOWN = 1 << 1;
        /// Turn right.
        const RIGHT = 1 << 2;
        /// Turn left.
        const LEFT = 1 << 3;
        /// Leave the game.
        const ESC = 1 << 4;
    }
}

impl Keys {
    /// True if any key that moves or turns the player is held.
    #[inline]
    #[must_use]
    pub const fn steers(self) -> bool {
        self.intersects(Self::UP.union(Self::DOWN).union(Self::RIGHT).union(Self::LEFT))
    }
}
