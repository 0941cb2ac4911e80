//! Variable frames: one global frame, a stack of local frames and an
//! optional temporary frame.

use std::collections::BTreeMap;

use ippcode_common::{FrameTag, Value};

/// Variable name to slot. A declared variable without a value is `None`.
///
/// Ordered so that state dumps list variables deterministically.
pub type Frame = BTreeMap<String, Option<Value>>;

/// All frames visible to a running program.
#[derive(Debug, Clone, Default)]
pub struct Frames {
    global: Frame,
    locals: Vec<Frame>,
    temporary: Option<Frame>,
}

impl Frames {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame a tag refers to, or `None` if it does not currently exist.
    pub fn get(&self, tag: FrameTag) -> Option<&Frame> {
        match tag {
            FrameTag::Global => Some(&self.global),
            FrameTag::Local => self.locals.last(),
            FrameTag::Temporary => self.temporary.as_ref(),
        }
    }

    pub fn get_mut(&mut self, tag: FrameTag) -> Option<&mut Frame> {
        match tag {
            FrameTag::Global => Some(&mut self.global),
            FrameTag::Local => self.locals.last_mut(),
            FrameTag::Temporary => self.temporary.as_mut(),
        }
    }

    /// Replace the temporary frame with a fresh empty one.
    pub fn create_temporary(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// Move the temporary frame onto the local stack. Returns `false` (and
    /// changes nothing) if there is no temporary frame.
    pub fn push_temporary(&mut self) -> bool {
        match self.temporary.take() {
            Some(frame) => {
                self.locals.push(frame);
                true
            }
            None => false,
        }
    }

    /// Pop the top local frame into the temporary frame. Returns `false`
    /// (and changes nothing) if the local stack is empty.
    pub fn pop_local(&mut self) -> bool {
        match self.locals.pop() {
            Some(frame) => {
                self.temporary = Some(frame);
                true
            }
            None => false,
        }
    }

    pub fn global(&self) -> &Frame {
        &self.global
    }

    /// Local frames, bottom first.
    pub fn locals(&self) -> &[Frame] {
        &self.locals
    }

    pub fn temporary(&self) -> Option<&Frame> {
        self.temporary.as_ref()
    }
}
