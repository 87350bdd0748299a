//! Two-argument temporal synchronization.
//!
//! [`synchronize`] restricts two temporal values to their shared time
//! domain and resamples both at the union of their breakpoints, so the
//! outputs carry matching timestamps and binary operators can work
//! pointwise. Disjoint time domains are the defined "do not intersect
//! in time" outcome, reported as `Ok(None)`, never as an error.

use super::{TInstant, TInstantSet, TSequence, TSequenceSet, Temporal, TemporalValue};
use crate::error::{NetMotionError, Result};
use std::collections::BTreeSet;
use std::time::SystemTime;

/// Restrict `a` and `b` to their common time domain.
///
/// Both outputs have identical timestamps. Synchronizing an already
/// synchronized pair returns it unchanged.
pub fn synchronize<V: TemporalValue, W: TemporalValue>(
    a: &Temporal<V>,
    b: &Temporal<W>,
) -> Result<Option<(Temporal<V>, Temporal<W>)>> {
    match (a, b) {
        (Temporal::Instant(ia), _) => Ok(b.value_at(ia.timestamp).map(|vb| {
            (
                Temporal::Instant(ia.clone()),
                Temporal::Instant(TInstant::new(vb, ia.timestamp)),
            )
        })),
        (_, Temporal::Instant(ib)) => Ok(a.value_at(ib.timestamp).map(|va| {
            (
                Temporal::Instant(TInstant::new(va, ib.timestamp)),
                Temporal::Instant(ib.clone()),
            )
        })),
        (Temporal::InstantSet(sa), _) => sample_at_set(sa, b),
        (_, Temporal::InstantSet(sb)) => {
            // Reuse the set-driven sampling with swapped roles.
            match sample_at_set(sb, a)? {
                Some((vb, va)) => Ok(Some((va, vb))),
                None => Ok(None),
            }
        }
        _ => synchronize_continuous(a, b),
    }
}

/// Sample `other` at the timestamps of `set`; both results are instant
/// collections over the timestamps where both sides are defined.
fn sample_at_set<V: TemporalValue, W: TemporalValue>(
    set: &TInstantSet<V>,
    other: &Temporal<W>,
) -> Result<Option<(Temporal<V>, Temporal<W>)>> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for inst in set.instants() {
        if let Some(value) = other.value_at(inst.timestamp) {
            left.push(inst.clone());
            right.push(TInstant::new(value, inst.timestamp));
        }
    }
    if left.is_empty() {
        return Ok(None);
    }
    Ok(Some((instants_to_temporal(left)?, instants_to_temporal(right)?)))
}

fn instants_to_temporal<V: TemporalValue>(mut instants: Vec<TInstant<V>>) -> Result<Temporal<V>> {
    if instants.len() == 1 {
        Ok(Temporal::Instant(instants.remove(0)))
    } else {
        Ok(Temporal::InstantSet(TInstantSet::new(instants)?))
    }
}

fn components<V: TemporalValue>(temp: &Temporal<V>) -> &[TSequence<V>] {
    match temp {
        Temporal::Sequence(seq) => std::slice::from_ref(seq),
        Temporal::SequenceSet(set) => set.sequences(),
        // Instant variants are handled before this point.
        _ => &[],
    }
}

fn synchronize_continuous<V: TemporalValue, W: TemporalValue>(
    a: &Temporal<V>,
    b: &Temporal<W>,
) -> Result<Option<(Temporal<V>, Temporal<W>)>> {
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    for sa in components(a) {
        for sb in components(b) {
            let Some(period) = sa.period().intersection(&sb.period()) else {
                continue;
            };
            let mut times = BTreeSet::new();
            times.insert(period.start);
            times.insert(period.end);
            let breakpoints = sa
                .instants()
                .iter()
                .map(|inst| inst.timestamp)
                .chain(sb.instants().iter().map(|inst| inst.timestamp));
            for t in breakpoints {
                if t > period.start && t < period.end {
                    times.insert(t);
                }
            }
            let times: Vec<SystemTime> = times.into_iter().collect();
            out_a.push(resample(sa, &times, period.lower_inc, period.upper_inc)?);
            out_b.push(resample(sb, &times, period.lower_inc, period.upper_inc)?);
        }
    }
    if out_a.is_empty() {
        log::debug!("synchronize: operands do not intersect in time");
        return Ok(None);
    }
    Ok(Some((
        sequences_to_temporal(out_a)?,
        sequences_to_temporal(out_b)?,
    )))
}

fn resample<V: TemporalValue>(
    seq: &TSequence<V>,
    times: &[SystemTime],
    lower_inc: bool,
    upper_inc: bool,
) -> Result<TSequence<V>> {
    let mut instants = Vec::with_capacity(times.len());
    for &t in times {
        let value = seq.value_at_inclusive(t).ok_or_else(|| {
            NetMotionError::Internal(
                "synchronized timestamp outside the source sequence".to_string(),
            )
        })?;
        instants.push(TInstant::new(value, t));
    }
    if instants.len() == 1 {
        let inst = instants.remove(0);
        return Ok(TSequence::instantaneous(inst, seq.interp()));
    }
    TSequence::new(instants, lower_inc, upper_inc, seq.interp())
}

fn sequences_to_temporal<V: TemporalValue>(
    mut sequences: Vec<TSequence<V>>,
) -> Result<Temporal<V>> {
    if sequences.len() == 1 {
        Ok(Temporal::Sequence(sequences.remove(0)))
    } else {
        Ok(Temporal::SequenceSet(TSequenceSet::new(sequences)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Interpolation;
    use std::time::{Duration, UNIX_EPOCH};

    fn ts(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn linear_seq(points: &[(f64, u64)]) -> Temporal<f64> {
        let instants = points
            .iter()
            .map(|&(v, t)| TInstant::new(v, ts(t)))
            .collect();
        Temporal::Sequence(
            TSequence::new(instants, true, true, Interpolation::Linear).unwrap(),
        )
    }

    #[test]
    fn test_disjoint_domains_yield_none() {
        let a = linear_seq(&[(0.0, 0), (1.0, 10)]);
        let b = linear_seq(&[(0.0, 20), (1.0, 30)]);
        assert!(synchronize(&a, &b).unwrap().is_none());
    }

    #[test]
    fn test_sequences_resample_at_breakpoint_union() {
        let a = linear_seq(&[(0.0, 0), (10.0, 10)]);
        let b = linear_seq(&[(100.0, 5), (200.0, 15)]);
        let (sa, sb) = synchronize(&a, &b).unwrap().unwrap();

        // Shared domain [5, 10], breakpoints 5 and 10 from both sides.
        let times: Vec<SystemTime> =
            sa.instants().iter().map(|inst| inst.timestamp).collect();
        assert_eq!(times, vec![ts(5), ts(10)]);
        let times_b: Vec<SystemTime> =
            sb.instants().iter().map(|inst| inst.timestamp).collect();
        assert_eq!(times, times_b);

        // Interpolated boundary values.
        assert_eq!(sa.value_at(ts(5)), Some(5.0));
        assert_eq!(sb.value_at(ts(10)), Some(150.0));
    }

    #[test]
    fn test_interior_breakpoints_are_kept() {
        let a = linear_seq(&[(0.0, 0), (10.0, 10)]);
        let b = linear_seq(&[(0.0, 0), (1.0, 3), (2.0, 10)]);
        let (sa, _) = synchronize(&a, &b).unwrap().unwrap();
        let times: Vec<SystemTime> =
            sa.instants().iter().map(|inst| inst.timestamp).collect();
        assert_eq!(times, vec![ts(0), ts(3), ts(10)]);
        assert_eq!(sa.value_at(ts(3)), Some(3.0));
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let a = linear_seq(&[(0.0, 0), (10.0, 10)]);
        let b = linear_seq(&[(100.0, 5), (200.0, 15)]);
        let (sa, sb) = synchronize(&a, &b).unwrap().unwrap();
        let (ra, rb) = synchronize(&sa, &sb).unwrap().unwrap();
        assert_eq!(ra, sa);
        assert_eq!(rb, sb);
    }

    #[test]
    fn test_instant_against_sequence() {
        let a = Temporal::Instant(TInstant::new(7.0, ts(5)));
        let b = linear_seq(&[(0.0, 0), (10.0, 10)]);
        let (sa, sb) = synchronize(&a, &b).unwrap().unwrap();
        assert_eq!(sa, a);
        match sb {
            Temporal::Instant(inst) => {
                assert_eq!(inst.timestamp, ts(5));
                assert_eq!(inst.value, 5.0);
            }
            other => panic!("expected instant, got {:?}", other),
        }

        let outside = Temporal::Instant(TInstant::new(7.0, ts(50)));
        assert!(synchronize(&outside, &b).unwrap().is_none());
    }

    #[test]
    fn test_instant_set_against_sequence() {
        let set = Temporal::InstantSet(
            TInstantSet::new(vec![
                TInstant::new(1.0, ts(2)),
                TInstant::new(2.0, ts(8)),
                TInstant::new(3.0, ts(50)),
            ])
            .unwrap(),
        );
        let b = linear_seq(&[(0.0, 0), (10.0, 10)]);
        let (sa, sb) = synchronize(&set, &b).unwrap().unwrap();
        assert_eq!(sa.instant_count(), 2);
        assert_eq!(sb.value_at(ts(2)), Some(2.0));
        assert_eq!(sb.value_at(ts(8)), Some(8.0));
    }

    #[test]
    fn test_sequence_against_sequence_set() {
        let a = linear_seq(&[(0.0, 0), (30.0, 30)]);
        let b = Temporal::SequenceSet(
            TSequenceSet::new(vec![
                TSequence::new(
                    vec![TInstant::new(0.0, ts(5)), TInstant::new(1.0, ts(10))],
                    true,
                    true,
                    Interpolation::Linear,
                )
                .unwrap(),
                TSequence::new(
                    vec![TInstant::new(2.0, ts(20)), TInstant::new(3.0, ts(25))],
                    true,
                    true,
                    Interpolation::Linear,
                )
                .unwrap(),
            ])
            .unwrap(),
        );
        let (sa, sb) = synchronize(&a, &b).unwrap().unwrap();
        // The single sequence is split onto the set's two components.
        assert!(matches!(sa, Temporal::SequenceSet(_)));
        assert_eq!(sa.instant_count(), sb.instant_count());
        assert_eq!(sa.period().start, ts(5));
        assert_eq!(sa.period().end, ts(25));
    }

    #[test]
    fn test_step_sequence_keeps_interpolation() {
        let step = Temporal::Sequence(
            TSequence::new(
                vec![TInstant::new(1.0, ts(0)), TInstant::new(2.0, ts(10))],
                true,
                true,
                Interpolation::Step,
            )
            .unwrap(),
        );
        let linear = linear_seq(&[(0.0, 5), (10.0, 15)]);
        let (ss, sl) = synchronize(&step, &linear).unwrap().unwrap();
        assert!(!ss.is_linear());
        assert!(sl.is_linear());
        // Step hold at the resample point.
        assert_eq!(ss.value_at(ts(7)), Some(1.0));
    }
}
