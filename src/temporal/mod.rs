//! The temporal value model.
//!
//! A value that changes over time is one of four duration variants:
//! a single [`TInstant`], an [`TInstantSet`] (no continuity between
//! members), a [`TSequence`] (continuous over a period, stepwise or
//! linear interpolation), or a [`TSequenceSet`]. [`Temporal`] is the
//! closed sum over the four; every operator pattern-matches it
//! exhaustively, so there is no "unknown subtype" runtime case.
//!
//! Ordering and uniqueness invariants are validated by the composition
//! functions at creation time; values are immutable afterwards. Derived
//! values own their instant buffers and transfer ownership to the
//! caller on return.

pub mod sync;

pub use sync::synchronize;

use crate::error::{NetMotionError, Result};
use crate::types::NetworkPoint;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// How a sequence's value behaves between stored instants: held
/// constant (stepwise) or interpolated continuously (linear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
}

/// A base value that can live inside a temporal container.
pub trait TemporalValue: Clone + PartialEq + std::fmt::Debug {
    /// Value between `self` (ratio 0) and `other` (ratio 1).
    fn lerp(&self, other: &Self, ratio: f64) -> Self;

    /// Constraint on two instants of the same sequence. The default
    /// accepts anything; network points reject cross-route pairs.
    fn ensure_joinable(&self, _other: &Self) -> Result<()> {
        Ok(())
    }
}

impl TemporalValue for f64 {
    fn lerp(&self, other: &Self, ratio: f64) -> Self {
        self + (other - self) * ratio
    }
}

impl TemporalValue for NetworkPoint {
    fn lerp(&self, other: &Self, ratio: f64) -> Self {
        // Same route by sequence invariant; interpolate the fraction.
        NetworkPoint {
            route_id: self.route_id,
            fraction: self.fraction + (other.fraction - self.fraction) * ratio,
        }
    }

    fn ensure_joinable(&self, other: &Self) -> Result<()> {
        if self.route_id != other.route_id {
            return Err(NetMotionError::MixedRoutes {
                left: self.route_id,
                right: other.route_id,
            });
        }
        Ok(())
    }
}

/// A (timestamp, value) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TInstant<V> {
    pub value: V,
    pub timestamp: SystemTime,
}

impl<V> TInstant<V> {
    pub fn new(value: V, timestamp: SystemTime) -> Self {
        Self { value, timestamp }
    }
}

/// A time period with boundary inclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub start: SystemTime,
    pub end: SystemTime,
    pub lower_inc: bool,
    pub upper_inc: bool,
}

impl Period {
    pub fn new(start: SystemTime, end: SystemTime, lower_inc: bool, upper_inc: bool) -> Self {
        Self {
            start,
            end,
            lower_inc,
            upper_inc,
        }
    }

    pub fn contains(&self, t: SystemTime) -> bool {
        (t > self.start || (t == self.start && self.lower_inc))
            && (t < self.end || (t == self.end && self.upper_inc))
    }

    /// Shared sub-period of two periods, `None` when disjoint.
    pub fn intersection(&self, other: &Period) -> Option<Period> {
        use std::cmp::Ordering;
        let (start, lower_inc) = match self.start.cmp(&other.start) {
            Ordering::Greater => (self.start, self.lower_inc),
            Ordering::Less => (other.start, other.lower_inc),
            Ordering::Equal => (self.start, self.lower_inc && other.lower_inc),
        };
        let (end, upper_inc) = match self.end.cmp(&other.end) {
            Ordering::Less => (self.end, self.upper_inc),
            Ordering::Greater => (other.end, other.upper_inc),
            Ordering::Equal => (self.end, self.upper_inc && other.upper_inc),
        };
        if start < end || (start == end && lower_inc && upper_inc) {
            Some(Period::new(start, end, lower_inc, upper_inc))
        } else {
            None
        }
    }
}

fn ensure_increasing<V>(instants: &[TInstant<V>], what: &str) -> Result<()> {
    if instants.is_empty() {
        return Err(NetMotionError::InvalidInput(format!(
            "{} must contain at least one instant",
            what
        )));
    }
    for pair in instants.windows(2) {
        if pair[0].timestamp >= pair[1].timestamp {
            return Err(NetMotionError::InvalidInput(format!(
                "{} timestamps must be strictly increasing",
                what
            )));
        }
    }
    Ok(())
}

/// An ordered set of instants with pairwise-distinct timestamps. The
/// value is undefined between members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TInstantSet<V> {
    instants: Vec<TInstant<V>>,
}

impl<V: TemporalValue> TInstantSet<V> {
    pub fn new(instants: Vec<TInstant<V>>) -> Result<Self> {
        ensure_increasing(&instants, "Instant set")?;
        Ok(Self { instants })
    }

    pub fn instants(&self) -> &[TInstant<V>] {
        &self.instants
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn period(&self) -> Period {
        Period::new(
            self.instants[0].timestamp,
            self.instants[self.instants.len() - 1].timestamp,
            true,
            true,
        )
    }
}

/// A continuous-time value over a period: strictly increasing instants
/// plus boundary inclusivity and an interpolation mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TSequence<V> {
    instants: Vec<TInstant<V>>,
    lower_inc: bool,
    upper_inc: bool,
    interp: Interpolation,
}

impl<V: TemporalValue> TSequence<V> {
    pub fn new(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
    ) -> Result<Self> {
        ensure_increasing(&instants, "Sequence")?;
        if instants.len() == 1 && !(lower_inc && upper_inc) {
            return Err(NetMotionError::InvalidInput(
                "An instantaneous sequence must be closed on both ends".to_string(),
            ));
        }
        for pair in instants.windows(2) {
            pair[0].value.ensure_joinable(&pair[1].value)?;
        }
        Ok(Self {
            instants,
            lower_inc,
            upper_inc,
            interp,
        })
    }

    /// Single-instant sequence; both bounds are necessarily closed.
    pub fn instantaneous(instant: TInstant<V>, interp: Interpolation) -> Self {
        Self {
            instants: vec![instant],
            lower_inc: true,
            upper_inc: true,
            interp,
        }
    }

    pub fn instants(&self) -> &[TInstant<V>] {
        &self.instants
    }

    pub fn inst(&self, n: usize) -> &TInstant<V> {
        &self.instants[n]
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn interp(&self) -> Interpolation {
        self.interp
    }

    pub fn is_linear(&self) -> bool {
        self.interp == Interpolation::Linear
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn period(&self) -> Period {
        Period::new(
            self.instants[0].timestamp,
            self.instants[self.instants.len() - 1].timestamp,
            self.lower_inc,
            self.upper_inc,
        )
    }

    /// Value at a timestamp inside the sequence period.
    pub fn value_at(&self, t: SystemTime) -> Option<V> {
        if !self.period().contains(t) {
            return None;
        }
        self.value_at_inclusive(t)
    }

    /// Value at a timestamp, treating both period bounds as closed.
    /// Used when resampling onto a restricted domain whose boundary may
    /// be exclusive in the source.
    pub(crate) fn value_at_inclusive(&self, t: SystemTime) -> Option<V> {
        if t < self.instants[0].timestamp
            || t > self.instants[self.instants.len() - 1].timestamp
        {
            return None;
        }
        for (i, inst) in self.instants.iter().enumerate() {
            if inst.timestamp == t {
                return Some(inst.value.clone());
            }
            if inst.timestamp > t {
                let prev = &self.instants[i - 1];
                return Some(match self.interp {
                    Interpolation::Step => prev.value.clone(),
                    Interpolation::Linear => prev.value.lerp(
                        &inst.value,
                        time_ratio(t, prev.timestamp, inst.timestamp),
                    ),
                });
            }
        }
        None
    }
}

/// An ordered list of non-overlapping sequences sharing one
/// interpolation mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TSequenceSet<V> {
    sequences: Vec<TSequence<V>>,
}

impl<V: TemporalValue> TSequenceSet<V> {
    pub fn new(sequences: Vec<TSequence<V>>) -> Result<Self> {
        if sequences.is_empty() {
            return Err(NetMotionError::InvalidInput(
                "Sequence set must contain at least one sequence".to_string(),
            ));
        }
        let interp = sequences[0].interp();
        for seq in &sequences[1..] {
            if seq.interp() != interp {
                return Err(NetMotionError::InvalidInput(
                    "All sequences of a set must share one interpolation mode".to_string(),
                ));
            }
        }
        for pair in sequences.windows(2) {
            let prev = pair[0].period();
            let next = pair[1].period();
            let ordered = prev.end < next.start
                || (prev.end == next.start && !(prev.upper_inc && next.lower_inc));
            if !ordered {
                return Err(NetMotionError::InvalidInput(
                    "Sequences of a set must be ordered and non-overlapping".to_string(),
                ));
            }
        }
        Ok(Self { sequences })
    }

    pub fn sequences(&self) -> &[TSequence<V>] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn interp(&self) -> Interpolation {
        self.sequences[0].interp()
    }

    pub fn period(&self) -> Period {
        let first = self.sequences[0].period();
        let last = self.sequences[self.sequences.len() - 1].period();
        Period::new(first.start, last.end, first.lower_inc, last.upper_inc)
    }
}

/// A value that changes over time: the closed sum over the four
/// duration variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Temporal<V> {
    Instant(TInstant<V>),
    InstantSet(TInstantSet<V>),
    Sequence(TSequence<V>),
    SequenceSet(TSequenceSet<V>),
}

impl<V: TemporalValue> Temporal<V> {
    /// Total number of stored instants.
    pub fn instant_count(&self) -> usize {
        match self {
            Temporal::Instant(_) => 1,
            Temporal::InstantSet(set) => set.len(),
            Temporal::Sequence(seq) => seq.len(),
            Temporal::SequenceSet(set) => set.sequences().iter().map(TSequence::len).sum(),
        }
    }

    /// The n-th stored instant in temporal order.
    pub fn nth_instant(&self, n: usize) -> Option<&TInstant<V>> {
        self.instants().into_iter().nth(n)
    }

    /// All stored instants in temporal order.
    pub fn instants(&self) -> Vec<&TInstant<V>> {
        match self {
            Temporal::Instant(inst) => vec![inst],
            Temporal::InstantSet(set) => set.instants().iter().collect(),
            Temporal::Sequence(seq) => seq.instants().iter().collect(),
            Temporal::SequenceSet(set) => set
                .sequences()
                .iter()
                .flat_map(|seq| seq.instants().iter())
                .collect(),
        }
    }

    /// Time span of the value, bounds included per variant semantics.
    pub fn period(&self) -> Period {
        match self {
            Temporal::Instant(inst) => Period::new(inst.timestamp, inst.timestamp, true, true),
            Temporal::InstantSet(set) => set.period(),
            Temporal::Sequence(seq) => seq.period(),
            Temporal::SequenceSet(set) => set.period(),
        }
    }

    /// Whether values between instants follow linear interpolation.
    /// Instants and instant sets report `true` for a continuous base
    /// type; the duration-variant gates of each operator run first.
    pub fn is_linear(&self) -> bool {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => true,
            Temporal::Sequence(seq) => seq.is_linear(),
            Temporal::SequenceSet(set) => set.interp() == Interpolation::Linear,
        }
    }

    /// Value at a timestamp; `None` outside the domain of definition.
    pub fn value_at(&self, t: SystemTime) -> Option<V> {
        match self {
            Temporal::Instant(inst) => (inst.timestamp == t).then(|| inst.value.clone()),
            Temporal::InstantSet(set) => set
                .instants()
                .iter()
                .find(|inst| inst.timestamp == t)
                .map(|inst| inst.value.clone()),
            Temporal::Sequence(seq) => seq.value_at(t),
            Temporal::SequenceSet(set) => {
                set.sequences().iter().find_map(|seq| seq.value_at(t))
            }
        }
    }

    /// Like [`Temporal::value_at`] but treating sequence bounds as
    /// closed, so a value exists at an exclusive boundary timestamp.
    pub(crate) fn value_at_inclusive(&self, t: SystemTime) -> Option<V> {
        match self {
            Temporal::Sequence(seq) => seq.value_at_inclusive(t),
            Temporal::SequenceSet(set) => set
                .sequences()
                .iter()
                .find_map(|seq| seq.value_at_inclusive(t)),
            other => other.value_at(t),
        }
    }
}

impl<V: TemporalValue + PartialOrd> Temporal<V> {
    /// First stored instant holding the minimum value.
    pub fn min_instant(&self) -> &TInstant<V> {
        let instants = self.instants();
        let mut best = instants[0];
        for inst in &instants[1..] {
            if inst.value < best.value {
                best = inst;
            }
        }
        best
    }

    /// Minimum stored value.
    pub fn min_value(&self) -> V {
        self.min_instant().value.clone()
    }
}

/// Position of `t` within `[t0, t1]` as a ratio in `[0, 1]`.
pub(crate) fn time_ratio(t: SystemTime, t0: SystemTime, t1: SystemTime) -> f64 {
    let span = seconds_between(t0, t1);
    if span == 0.0 {
        0.0
    } else {
        seconds_between(t0, t) / span
    }
}

/// Seconds from `t0` to `t1`, zero if `t1` precedes `t0`.
pub(crate) fn seconds_between(t0: SystemTime, t1: SystemTime) -> f64 {
    t1.duration_since(t0)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}
