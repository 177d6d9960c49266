//! Window-free collaborators.
//!
//! Enough to run a peer end to end on a server or in a test: a top-down
//! minimap instead of the raycast view, a scripted key sequence instead of a
//! keyboard and a checksum instead of a window.

use raycaster_core::{
    Color, FrameBuffer, FrameWriter, Keys, LocalPlayerState, Texture, TexturedSpan, Walkable,
};
use raycaster_networking::PositionsView;

use super::{InputSource, Presenter, Renderer};

/// Square arena of `size` cells with a one-cell wall all around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaMap {
    size: f64,
}

impl ArenaMap {
    /// Creates an arena `size` cells wide and high.
    #[must_use]
    pub const fn new(size: f64) -> Self {
        Self { size }
    }

    /// Side length in cells.
    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size
    }
}

impl Default for ArenaMap {
    /// Same extent as the classic 24x24 level.
    fn default() -> Self {
        Self::new(24.0)
    }
}

impl Walkable for ArenaMap {
    fn is_walkable(&self, x: f64, y: f64) -> bool {
        x >= 1.0 && y >= 1.0 && x < self.size - 1.0 && y < self.size - 1.0
    }
}

/// Top-down view: floor, checkered arena wall, the local player and one dot
/// per peer.
#[derive(Clone, Debug)]
pub struct MinimapRenderer {
    map: ArenaMap,
    /// Stretched over the whole surface, one square per texel.
    wall: Texture,
}

impl MinimapRenderer {
    /// Floor colour.
    pub const FLOOR: Color = 0x0020_2020;
    /// Wall colour.
    pub const WALL: Color = 0x0080_8080;
    /// Second wall colour of the checker pattern.
    pub const WALL_ALT: Color = 0x0060_6060;
    /// Local player colour.
    pub const LOCAL: Color = 0x0000_FF00;
    /// Peer colour.
    pub const PEER: Color = 0x00FF_0000;

    /// Wall texture side in texels.
    const WALL_TEXELS: usize = 24;

    /// Creates a renderer for `map`.
    #[must_use]
    pub fn new(map: ArenaMap) -> Self {
        Self {
            map,
            wall: Texture::checkerboard(Self::WALL_TEXELS, 1, Self::WALL, Self::WALL_ALT),
        }
    }

    /// Map cell to pixel, clamped at zero. Huge coordinates saturate and are
    /// dropped by the frame writer.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_pixel(&self, target: &FrameBuffer, x: f64, y: f64) -> (usize, usize) {
        let sx = target.width() as f64 / self.map.size();
        let sy = target.height() as f64 / self.map.size();
        ((x * sx).max(0.0) as usize, (y * sy).max(0.0) as usize)
    }

    fn draw_wall(&self, frame: &mut FrameWriter<'_>, width: usize, height: usize) {
        for x in 0..width {
            let span = TexturedSpan {
                x,
                y_start: 0,
                y_end: height - 1,
                line_height: height,
                tex_x: x * Self::WALL_TEXELS / width,
                darken: false,
            };
            frame.textured_span(&span, &self.wall);
        }
    }
}

impl Default for MinimapRenderer {
    fn default() -> Self {
        Self::new(ArenaMap::default())
    }
}

impl Renderer for MinimapRenderer {
    fn render(&mut self, target: &FrameBuffer, player: &LocalPlayerState, peers: &PositionsView<'_>) {
        let (wall_x, wall_y) = self.to_pixel(target, 1.0, 1.0);
        let (far_x, far_y) = self.to_pixel(target, self.map.size() - 1.0, self.map.size() - 1.0);

        let mut frame = target.begin_frame();
        self.draw_wall(&mut frame, target.width(), target.height());
        for x in wall_x..far_x {
            frame.span(x, wall_y, far_y.saturating_sub(1), Self::FLOOR);
        }

        // Peers are trusted but their payload is not: anything decodes.
        for (_, sample) in peers.iter().filter(|(_, s)| s.x.is_finite() && s.y.is_finite()) {
            let (px, py) = self.to_pixel(target, sample.x, sample.y);
            dot(&mut frame, px, py, Self::PEER);
        }

        let position = player.position();
        let (px, py) = self.to_pixel(target, position.x, position.y);
        dot(&mut frame, px, py, Self::LOCAL);
    }
}

/// 3x3 marker centred on `(x, y)`.
fn dot(frame: &mut FrameWriter<'_>, x: usize, y: usize, color: Color) {
    for dy in 0..3 {
        for dx in 0..3 {
            let px = x.saturating_add(dx).checked_sub(1);
            let py = y.saturating_add(dy).checked_sub(1);
            if let (Some(px), Some(py)) = (px, py) {
                frame.put(px, py, color);
            }
        }
    }
}

/// Replays a fixed key sequence, looping, optionally pressing ESC after a
/// number of polls.
#[derive(Clone, Debug)]
pub struct ScriptedInput {
    script: Vec<Keys>,
    polls: u64,
    quit_after: Option<u64>,
}

impl ScriptedInput {
    /// Plays `script` over and over. An empty script holds no keys.
    #[must_use]
    pub fn new(script: Vec<Keys>) -> Self {
        Self {
            script,
            polls: 0,
            quit_after: None,
        }
    }

    /// Walks forward while turning left, tracing a circle.
    #[must_use]
    pub fn circling() -> Self {
        Self::new(vec![Keys::UP | Keys::LEFT])
    }

    /// Never presses anything.
    #[must_use]
    pub fn idle() -> Self {
        Self::new(Vec::new())
    }

    /// Reports ESC from poll number `polls` on.
    #[must_use]
    pub fn quit_after(mut self, polls: u64) -> Self {
        self.quit_after = Some(polls);
        self
    }

    /// Number of polls so far.
    #[must_use]
    pub const fn polls(&self) -> u64 {
        self.polls
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Keys {
        let n = self.polls;
        self.polls += 1;

        if self.quit_after.is_some_and(|limit| n >= limit) {
            return Keys::ESC;
        }
        if self.script.is_empty() {
            return Keys::empty();
        }
        #[allow(clippy::cast_possible_truncation)]
        let step = (n % self.script.len() as u64) as usize;
        self.script[step]
    }
}

/// Hashes every presented frame instead of showing it.
#[derive(Clone, Debug, Default)]
pub struct ChecksumPresenter {
    frames: u64,
    last: u64,
}

impl ChecksumPresenter {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    /// Creates a presenter that has seen no frame yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// FNV-1a hash of the last presented frame.
    #[must_use]
    pub const fn checksum(&self) -> u64 {
        self.last
    }

    /// Frames presented.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// FNV-1a over the pixel words.
    #[must_use]
    pub fn hash(frame: &[Color]) -> u64 {
        frame.iter().fold(Self::FNV_OFFSET, |hash, &pixel| {
            (hash ^ u64::from(pixel)).wrapping_mul(Self::FNV_PRIME)
        })
    }
}

impl Presenter for ChecksumPresenter {
    fn present(&mut self, frame: &[Color], width: usize, height: usize) {
        debug_assert_eq!(frame.len(), width * height);
        self.last = Self::hash(frame);
        self.frames += 1;
    }
}
