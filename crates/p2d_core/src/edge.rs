/// Detects the frame where a level-triggered signal goes from released to held.
///
/// The previous sample is stored, so the detector must be fed exactly once per
/// frame; feeding the same frame twice would swallow the edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RisingEdge {
    was_held: bool,
}

impl RisingEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's sample and report whether it is a rising edge.
    pub fn sample(&mut self, held: bool) -> bool {
        let fired = held && !self.was_held;
        self.was_held = held;
        fired
    }

    pub fn was_held(&self) -> bool {
        self.was_held
    }
}
