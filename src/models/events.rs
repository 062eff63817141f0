//! Timed events within a layer
//!
//! Document order is temporal order inside a layer. Each event's start is the
//! sum of the durations of the events before it; durations are exact
//! fractions of a whole note.

use crate::models::tree::{MeiTree, NodeId};
use num_rational::Rational64;

/// Re-export Rational for duration calculations. Denominators are powers of
/// two up to 2^27 (2048th note, 16 dots), so 64 bits leave room for any
/// realistic layer length.
pub type Rational = Rational64;

/// Leaf elements that take up time in a bar
pub const EVENT_NAMES: &[&str] = &["note", "rest", "space"];

/// Constructs that are scheduled as one unit
pub const GROUP_NAMES: &[&str] = &["beam", "chord"];

/// Deepest dot count accepted before a duration is treated as unreadable
const MAX_DOTS: u32 = 16;

/// Largest `dur` denominator in common music notation
const MAX_DUR: i64 = 2048;

pub fn is_event(tree: &MeiTree, id: NodeId) -> bool {
    tree.name(id).is_some_and(|name| EVENT_NAMES.contains(&name))
}

pub fn is_group(tree: &MeiTree, id: NodeId) -> bool {
    tree.name(id).is_some_and(|name| GROUP_NAMES.contains(&name))
}

/// Base length of a `dur` value, e.g. "4" → 1/4, "breve" → 2
pub fn parse_dur(value: &str) -> Option<Rational> {
    match value.trim() {
        "breve" => Some(Rational::from_integer(2)),
        "long" => Some(Rational::from_integer(4)),
        "maxima" => Some(Rational::from_integer(8)),
        other => {
            let dur: i64 = other.parse().ok()?;
            if dur > 0 && dur <= MAX_DUR && (dur as u32).is_power_of_two() {
                Some(Rational::new(1, dur))
            } else {
                None
            }
        }
    }
}

/// Multiplier for `dots` augmentation dots: 1 + 1/2 + ... + 1/2^dots
pub fn dot_multiplier(dots: u32) -> Rational {
    let denom = 1i64 << dots;
    Rational::new(2 * denom - 1, denom)
}

/// Length of a leaf event from its `dur` and `dots` attributes.
///
/// Missing or unreadable values yield `None`.
fn own_duration(tree: &MeiTree, id: NodeId) -> Option<Rational> {
    let base = parse_dur(tree.attribute(id, "dur")?)?;
    let dots = match tree.attribute(id, "dots") {
        None => 0,
        Some(value) => value.trim().parse::<u32>().ok().filter(|&d| d <= MAX_DOTS)?,
    };
    Some(base * dot_multiplier(dots))
}

/// Duration of a note, rest, space, chord or beam as a fraction of a whole note.
///
/// - leaf events use `dur` and `dots`
/// - a chord uses its own `dur`, falling back to its longest note
/// - a beam is the sum of its timed children; any unknown child makes it unknown
pub fn event_duration(tree: &MeiTree, id: NodeId) -> Option<Rational> {
    match tree.name(id)? {
        "note" | "rest" | "space" => own_duration(tree, id),
        "chord" => own_duration(tree, id).or_else(|| {
            tree.children_named(id, "note")
                .map(|note| own_duration(tree, note))
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .max()
        }),
        "beam" => tree
            .element_children(id)
            .filter(|&child| is_event(tree, child) || is_group(tree, child))
            .map(|child| event_duration(tree, child))
            .sum(),
        _ => None,
    }
}

/// Presentation visibility: visible unless `visible="false"`. Spaces never count
/// as visible for scheduling.
pub fn is_visible(tree: &MeiTree, id: NodeId) -> bool {
    if tree.is(id, "space") {
        return false;
    }
    tree.attribute(id, "visible") != Some("false")
}

/// A scheduled event inside a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub node: NodeId,
    /// `None` once an earlier event in the layer had an unknown duration
    pub start: Option<Rational>,
    pub duration: Option<Rational>,
}

impl TimedEvent {
    pub fn finish(&self) -> Option<Rational> {
        Some(self.start? + self.duration?)
    }
}

/// Timed events of a layer in document order. Members of a chord or beam are
/// represented by the outermost group that contains them.
pub fn layer_events(tree: &MeiTree, layer: NodeId) -> Vec<NodeId> {
    let mut events = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(layer).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if is_group(tree, id) || is_event(tree, id) {
            events.push(id);
        } else {
            stack.extend(tree.children(id).iter().rev().copied());
        }
    }
    events
}

/// Start offsets and durations for every event of a layer.
///
/// An invisible event with an unknown duration takes no time. A visible one
/// leaves every later start unknown.
pub fn timed_events(tree: &MeiTree, layer: NodeId) -> Vec<TimedEvent> {
    let mut start = Some(Rational::from_integer(0));
    layer_events(tree, layer)
        .into_iter()
        .map(|node| {
            let duration = event_duration(tree, node);
            let event = TimedEvent { node, start, duration };
            if duration.is_some() || is_visible(tree, node) {
                start = event.finish();
            }
            event
        })
        .collect()
}
