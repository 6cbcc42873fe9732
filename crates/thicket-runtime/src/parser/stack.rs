//! Parse stack shared between versions.
//!
//! Frames are append-only and point at their parent, so forking a version
//! copies one index and every version sees an immutable stack (a cactus
//! stack). "Pop" only moves a version's head.

use thicket_table::StateId;

use crate::tree::subtree::Subtree;

#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub state: StateId,
    /// `None` only for the bottom frame.
    pub subtree: Option<Subtree>,
    pub parent: Option<u32>,
}

#[derive(Default)]
pub(crate) struct FrameArena {
    frames: Vec<Frame>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bottom frame in `state`.
    pub fn bottom(&mut self, state: StateId) -> u32 {
        self.alloc(Frame {
            state,
            subtree: None,
            parent: None,
        })
    }

    pub fn push(&mut self, parent: u32, state: StateId, subtree: Subtree) -> u32 {
        self.alloc(Frame {
            state,
            subtree: Some(subtree),
            parent: Some(parent),
        })
    }

    fn alloc(&mut self, frame: Frame) -> u32 {
        let index = self.frames.len() as u32;
        self.frames.push(frame);
        index
    }

    pub fn get(&self, index: u32) -> &Frame {
        &self.frames[index as usize]
    }

    pub fn state(&self, index: u32) -> StateId {
        self.frames[index as usize].state
    }

    /// Frames from `head` down to the bottom, bottom included.
    pub fn walk(&self, head: u32) -> impl Iterator<Item = (u32, &Frame)> {
        let mut next = Some(head);
        std::iter::from_fn(move || {
            let index = next?;
            let frame = self.get(index);
            next = frame.parent;
            Some((index, frame))
        })
    }

    /// Subtrees from the bottom up to `head`.
    pub fn subtrees(&self, head: u32) -> Vec<Subtree> {
        let mut out: Vec<Subtree> = self
            .walk(head)
            .filter_map(|(_, frame)| frame.subtree.clone())
            .collect();
        out.reverse();
        out
    }

    /// States of the frames that carry real grammar symbols, bottom first.
    /// Extras and skipped material leave the state unchanged, so they are
    /// left out.
    pub fn states(&self, head: u32) -> Vec<StateId> {
        let mut out: Vec<StateId> = self
            .walk(head)
            .filter(|(_, frame)| frame.subtree.as_ref().is_none_or(|s| !s.is_extra()))
            .map(|(_, frame)| frame.state)
            .collect();
        out.reverse();
        out
    }

    /// Whether both stacks have the same states at the same positions.
    pub fn same_states(&self, a: u32, b: u32) -> bool {
        let mut left = self.walk(a).filter(|(_, f)| f.subtree.as_ref().is_none_or(|s| !s.is_extra()));
        let mut right = self.walk(b).filter(|(_, f)| f.subtree.as_ref().is_none_or(|s| !s.is_extra()));
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some((i, _)), Some((j, _))) if i == j => return true,
                (Some((_, x)), Some((_, y))) if x.state == y.state => continue,
                _ => return false,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}
