//! Settling and collection state for feedback reads

use std::collections::{BTreeMap, BTreeSet, HashSet};

use canarm_codec::{RegisterIndex, RegisterReading};

/// Decides when a motor's target-angle readings have settled
///
/// Works on raw 32-bit patterns so that equal readings compare bit-exactly.
/// One tracker belongs to a single read of a single motor.
#[derive(Debug, Default)]
pub struct SettleTracker {
    seen: HashSet<u32>,
    previous: Option<u32>,
    repeats: u32,
}

impl SettleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation; returns the settled value once there is one
    ///
    /// A first-time pattern becomes the latest distinct value and resets the
    /// repeat counter. A repeated pattern settles on the latest distinct
    /// value. Without a distinct value the pattern itself must repeat twice.
    pub fn observe(&mut self, raw: u32) -> Option<f32> {
        if self.seen.insert(raw) {
            self.previous = Some(raw);
            self.repeats = 0;
            return None;
        }

        self.repeats += 1;
        match self.previous {
            Some(previous) => Some(f32::from_bits(previous)),
            None if self.repeats >= 2 => Some(f32::from_bits(raw)),
            None => None,
        }
    }
}

/// Keeps the first observation of each requested register
#[derive(Debug)]
pub struct GainCollector {
    wanted: BTreeSet<RegisterIndex>,
    values: BTreeMap<RegisterIndex, f32>,
}

impl GainCollector {
    pub fn new(wanted: impl IntoIterator<Item = RegisterIndex>) -> Self {
        Self {
            wanted: wanted.into_iter().collect(),
            values: BTreeMap::new(),
        }
    }

    /// Record a reading; unknown or unrequested registers are ignored
    pub fn observe(&mut self, reading: &RegisterReading) {
        let Some(register) = reading.register() else {
            return;
        };
        if self.wanted.contains(&register) {
            self.values.entry(register).or_insert_with(|| reading.value());
        }
    }

    /// Every requested register has been seen
    pub fn is_complete(&self) -> bool {
        self.wanted.iter().all(|r| self.values.contains_key(r))
    }

    pub fn into_values(self) -> BTreeMap<RegisterIndex, f32> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u32 = 0x3F00_0000; // 0.5
    const B: u32 = 0x3F80_0000; // 1.0

    fn feed(tracker: &mut SettleTracker, raws: &[u32]) -> Vec<Option<f32>> {
        raws.iter().map(|raw| tracker.observe(*raw)).collect()
    }

    #[test]
    fn test_repeat_settles_on_previous() {
        let mut tracker = SettleTracker::new();
        assert_eq!(feed(&mut tracker, &[A, A]), vec![None, Some(0.5)]);
    }

    #[test]
    fn test_latest_distinct_value_wins() {
        let mut tracker = SettleTracker::new();
        assert_eq!(
            feed(&mut tracker, &[A, B, B]),
            vec![None, None, Some(1.0)]
        );
    }

    #[test]
    fn test_older_repeat_settles_on_latest_distinct() {
        let mut tracker = SettleTracker::new();
        assert_eq!(
            feed(&mut tracker, &[A, B, A]),
            vec![None, None, Some(1.0)]
        );
    }

    #[test]
    fn test_bit_exact_comparison() {
        let mut tracker = SettleTracker::new();
        // +0.0 and -0.0 are different patterns
        assert_eq!(tracker.observe(0x0000_0000), None);
        assert_eq!(tracker.observe(0x8000_0000), None);
        assert_eq!(tracker.observe(0x8000_0000).map(f32::to_bits), Some(0x8000_0000));
    }

    #[test]
    fn test_gain_collector_keeps_first_value() {
        let mut gains = GainCollector::new(RegisterIndex::GAINS);
        let kp = RegisterIndex::PositionGain.index();
        gains.observe(&RegisterReading { index: kp, raw: 1.5f32.to_bits() });
        gains.observe(&RegisterReading { index: kp, raw: 9.0f32.to_bits() });
        gains.observe(&RegisterReading { index: 0x1234, raw: 0 });
        assert!(!gains.is_complete());

        for register in [
            RegisterIndex::VelocityGain,
            RegisterIndex::VelocityIntegralGain,
            RegisterIndex::VelocityFilterGain,
        ] {
            gains.observe(&RegisterReading { index: register.index(), raw: 0 });
        }
        assert!(gains.is_complete());
        let values = gains.into_values();
        assert_eq!(values[&RegisterIndex::PositionGain], 1.5);
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_gain_collector_ignores_unrequested() {
        let mut gains = GainCollector::new([RegisterIndex::PositionGain]);
        gains.observe(&RegisterReading {
            index: RegisterIndex::TargetAngle.index(),
            raw: 0,
        });
        assert!(!gains.is_complete());
        assert!(gains.into_values().is_empty());
    }
}
