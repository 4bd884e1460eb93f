//! Temporary way-point recording

use std::collections::HashMap;

use canarm_core::{ArmModel, JointAngleSet, JointSequence, Manipulator};
use parking_lot::RwLock;

use crate::error::{SequenceError, SequenceResult};

/// Way-points captured per interface until they are turned into a sequence
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    records: RwLock<HashMap<String, Vec<JointAngleSet>>>,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a way-point for `interface`
    pub fn record(&self, interface: &str, waypoint: JointAngleSet) {
        tracing::debug!(interface, name = %waypoint.name, "Recorded way-point");
        self.records
            .write()
            .entry(interface.to_string())
            .or_default()
            .push(waypoint);
    }

    /// Way-points recorded so far for `interface`
    pub fn records(&self, interface: &str) -> Vec<JointAngleSet> {
        self.records
            .read()
            .get(interface)
            .cloned()
            .unwrap_or_default()
    }

    /// Rebuild a buffer from a saved snapshot
    pub fn from_snapshot(records: HashMap<String, Vec<JointAngleSet>>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Copy of every interface's buffer
    pub fn snapshot(&self) -> HashMap<String, Vec<JointAngleSet>> {
        self.records.read().clone()
    }

    pub fn clear(&self, interface: &str) {
        self.records.write().remove(interface);
    }

    /// Turn the buffer of `manipulator` into a named sequence
    ///
    /// The side comes from the manipulator and the generation defaults to
    /// `old`. The buffer is cleared only when a sequence is produced.
    pub fn finish(
        &self,
        manipulator: &Manipulator,
        name: &str,
        arm_model: Option<ArmModel>,
    ) -> SequenceResult<JointSequence> {
        let mut records = self.records.write();
        let angles = match records.get(manipulator.interface()) {
            Some(angles) if !angles.is_empty() => angles.clone(),
            _ => {
                return Err(SequenceError::EmptyRecording(
                    manipulator.interface().to_string(),
                ))
            }
        };
        records.remove(manipulator.interface());

        Ok(JointSequence {
            name: name.to_string(),
            side: manipulator.side(),
            arm_model: Some(arm_model.unwrap_or_default()),
            angles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canarm_core::Side;

    #[test]
    fn test_record_and_finish() {
        let buffer = RecordingBuffer::new();
        let arm = Manipulator::for_side("can0", Side::Left).unwrap();
        buffer.record("can0", JointAngleSet::new("a").with(61u8, 0.1));
        buffer.record("can0", JointAngleSet::new("b").with(61u8, 0.2));
        buffer.record("can1", JointAngleSet::new("other"));
        assert_eq!(buffer.records("can0").len(), 2);

        let seq = buffer.finish(&arm, "reach", None).unwrap();
        assert_eq!(seq.side, Side::Left);
        assert_eq!(seq.arm_model, Some(ArmModel::Old));
        assert_eq!(seq.angles.len(), 2);
        assert!(buffer.records("can0").is_empty());
        assert_eq!(buffer.records("can1").len(), 1);
    }

    #[test]
    fn test_finish_empty_buffer_fails() {
        let buffer = RecordingBuffer::new();
        let arm = Manipulator::for_side("can0", Side::Right).unwrap();
        assert!(matches!(
            buffer.finish(&arm, "nothing", None),
            Err(SequenceError::EmptyRecording(_))
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let buffer = RecordingBuffer::new();
        buffer.record("can0", JointAngleSet::new("a").with(61u8, 1.0));
        let restored = RecordingBuffer::from_snapshot(buffer.snapshot());
        assert_eq!(restored.records("can0"), buffer.records("can0"));
    }

    #[test]
    fn test_clear() {
        let buffer = RecordingBuffer::new();
        buffer.record("can0", JointAngleSet::new("a"));
        buffer.clear("can0");
        assert!(buffer.records("can0").is_empty());
    }
}
