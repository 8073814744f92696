use std::fmt;
use std::sync::Arc;

use xi_rope::delta::Transformer;
use xi_rope::{Delta, RopeInfo};

use super::layout::Layout;
use super::rope::Span;

/// A single document edit expressed in tree positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Replace `[from, to)` with `text`. An empty `text` deletes, an empty
    /// range inserts.
    Replace { from: usize, to: usize, text: String },
}

impl Step {
    pub fn replace(from: usize, to: usize, text: impl Into<String>) -> Self {
        Step::Replace {
            from,
            to,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, String::new())
    }
}

/// Who produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Typing or any other caller-authored edit.
    #[default]
    User,
    /// The replacement of an accepted suggestion.
    Accept,
}

/// An ordered list of steps applied atomically. Each step's positions are
/// relative to the document produced by the previous step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    pub steps: Vec<Step>,
    pub origin: Origin,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(origin: Origin) -> Self {
        Self {
            steps: Vec::new(),
            origin,
        }
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn replace(self, from: usize, to: usize, text: impl Into<String>) -> Self {
        self.step(Step::replace(from, to, text))
    }

    #[must_use]
    pub fn insert(self, at: usize, text: impl Into<String>) -> Self {
        self.step(Step::insert(at, text))
    }

    #[must_use]
    pub fn delete(self, from: usize, to: usize) -> Self {
        self.step(Step::delete(from, to))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Text inserted exactly at the position ends up after it.
    Before,
    /// Text inserted exactly at the position ends up before it.
    After,
}

pub(crate) struct MapStep {
    pub(crate) before: Arc<Layout>,
    pub(crate) delta: Delta<RopeInfo>,
    pub(crate) after: Arc<Layout>,
}

/// Carries tree positions from the document before a transaction to the
/// document after it.
///
/// Each step converts position → offset → rope byte in the old layout, runs
/// the byte through the step's delta with xi-rope's `Transformer`, and
/// converts back in the new layout.
#[derive(Clone, Default)]
pub struct Mapping {
    steps: Vec<Arc<MapStep>>,
}

impl Mapping {
    pub(crate) fn push(&mut self, step: MapStep) {
        self.steps.push(Arc::new(step));
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        self.steps.iter().fold(pos, |pos, step| {
            let offset = step.before.position_to_offset_clamped(pos);
            let byte = step.before.byte_of_offset(offset).unwrap_or(0);
            let mut transformer = Transformer::new(&step.delta);
            let mapped = transformer.transform(byte, bias == Bias::After);
            let offset = step.after.offset_of_byte(mapped);
            step.after.offset_to_position_clamped(offset)
        })
    }

    /// Maps a span so that typing at either edge never grows it: the start
    /// sticks after insertions, the end before them. The result may be
    /// degenerate when the whole span was deleted.
    pub fn map_span(&self, span: Span) -> Span {
        Span::new(self.map(span.start, Bias::After), self.map(span.end, Bias::Before))
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("steps", &self.steps.len())
            .finish()
    }
}
