//! Feedback acquisition
//!
//! A read is a two phase exchange with the bridge:
//!
//! 1. one read-request frame per (motor, register), spaced by a short gap
//! 2. polling of each motor's response identifier until the value settles
//!    or the time budget runs out
//!
//! Gains are static, so they are read from the first joint only and the
//! first observation of each register is kept. Target angles go through a
//! [`SettleTracker`] per motor; motors that do not settle in time are left
//! out of the result rather than failing the read.

mod convergence;
mod stream;

pub use convergence::{GainCollector, SettleTracker};
pub use stream::observations;

use std::collections::BTreeMap;
use std::sync::Arc;

use canarm_bridge::BusTransport;
use canarm_codec::constants::HOST_ID;
use canarm_codec::{build_read_request, read_response_id, RegisterIndex};
use canarm_core::{ControlResult, Manipulator, MotorAddress};
use futures::StreamExt;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout_at, Instant};

use crate::config::FeedbackTiming;

/// Settled angles and gains from one read
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackSnapshot {
    /// Target angle per motor that settled within the budget
    pub angles: BTreeMap<MotorAddress, f32>,
    /// Gains read from the first joint
    pub gains: BTreeMap<RegisterIndex, f32>,
}

impl FeedbackSnapshot {
    /// Gains keyed by their register name (`loc_kp`, ...)
    pub fn named_gains(&self) -> BTreeMap<&'static str, f32> {
        self.gains.iter().map(|(r, v)| (r.name(), *v)).collect()
    }
}

/// Reads angles and gains back from one manipulator
#[derive(Clone)]
pub struct FeedbackEngine {
    transport: Arc<dyn BusTransport>,
    manipulator: Arc<Manipulator>,
    timing: FeedbackTiming,
    host: u8,
}

impl FeedbackEngine {
    pub fn new(transport: Arc<dyn BusTransport>, manipulator: Arc<Manipulator>) -> Self {
        Self {
            transport,
            manipulator,
            timing: FeedbackTiming::default(),
            host: HOST_ID,
        }
    }

    pub fn with_timing(mut self, timing: FeedbackTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> &FeedbackTiming {
        &self.timing
    }

    /// Full read: request every register, then collect gains and angles
    pub async fn query(&self) -> ControlResult<FeedbackSnapshot> {
        tracing::info!(
            iface = %self.manipulator.interface(),
            joints = self.manipulator.len(),
            "Reading feedback"
        );
        self.request_reads().await?;
        let gains = self.collect_gains().await;
        let angles = self.collect_angles().await;

        tracing::info!(
            iface = %self.manipulator.interface(),
            settled = angles.len(),
            joints = self.manipulator.len(),
            gains = gains.len(),
            "Feedback read complete"
        );
        Ok(FeedbackSnapshot { angles, gains })
    }

    /// Send one read request per (motor, register), in order
    pub async fn request_reads(&self) -> ControlResult<()> {
        for motor in self.manipulator.motors() {
            for register in RegisterIndex::ALL {
                let frame = build_read_request(
                    self.manipulator.interface(),
                    self.host,
                    motor.id(),
                    register,
                );
                tracing::debug!(motor = %motor, register = %register, id = frame.id, "Requesting register");
                self.transport.send(&frame).await?;
                sleep(self.timing.request_gap()).await;
            }
        }
        Ok(())
    }

    /// Gain registers of the first joint, as many as arrive within budget
    pub async fn collect_gains(&self) -> BTreeMap<RegisterIndex, f32> {
        let motor = self.manipulator.first();
        let deadline = Instant::now() + self.timing.gain_budget();
        let readings = observations(
            self.transport.clone(),
            self.manipulator.interface().to_string(),
            read_response_id(self.host, motor.id()),
            deadline,
            self.timing,
        );
        futures::pin_mut!(readings);

        let mut collector = GainCollector::new(RegisterIndex::GAINS);
        let collect = async {
            while let Some(reading) = readings.next().await {
                collector.observe(&reading);
                if collector.is_complete() {
                    break;
                }
            }
        };
        if timeout_at(deadline, collect).await.is_err() {
            tracing::debug!(motor = %motor, "Gain budget expired");
        }
        collector.into_values()
    }

    /// Settled target angle of every joint, one task per joint
    pub async fn collect_angles(&self) -> BTreeMap<MotorAddress, f32> {
        let deadline = Instant::now() + self.timing.angle_budget();
        let mut tasks = JoinSet::new();
        for motor in self.manipulator.motors().iter().copied() {
            let transport = self.transport.clone();
            let interface = self.manipulator.interface().to_string();
            let response_id = read_response_id(self.host, motor.id());
            let timing = self.timing;
            tasks.spawn(async move {
                let settled = settle_angle(transport, interface, response_id, deadline, timing).await;
                (motor, settled)
            });
        }

        let mut angles = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((motor, Some(angle))) => {
                    angles.insert(motor, angle);
                }
                Ok((motor, None)) => {
                    tracing::warn!(
                        iface = %self.manipulator.interface(),
                        motor = %motor,
                        "Angle did not settle within budget"
                    );
                }
                Err(e) => tracing::warn!(error = %e, "Angle read task failed"),
            }
        }
        angles
    }
}

async fn settle_angle(
    transport: Arc<dyn BusTransport>,
    interface: String,
    response_id: u32,
    deadline: Instant,
    timing: FeedbackTiming,
) -> Option<f32> {
    let readings = observations(transport, interface, response_id, deadline, timing);
    futures::pin_mut!(readings);

    let mut tracker = SettleTracker::new();
    let settle = async {
        while let Some(reading) = readings.next().await {
            if reading.register() != Some(RegisterIndex::TargetAngle) {
                continue;
            }
            if let Some(angle) = tracker.observe(reading.raw) {
                return Some(angle);
            }
        }
        None
    };
    timeout_at(deadline, settle).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canarm_bridge::MockBus;
    use canarm_codec::constants::command;
    use canarm_codec::encode_register;
    use canarm_core::{ControlError, Side};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const ANGLE: u16 = 0x7016;

    fn engine(bus: &Arc<MockBus>) -> FeedbackEngine {
        let arm = Arc::new(Manipulator::for_side("can0", Side::Left).unwrap());
        FeedbackEngine::new(bus.clone(), arm)
    }

    fn angle_batches(values: &[f32]) -> Vec<Vec<Vec<u8>>> {
        values
            .iter()
            .map(|v| vec![encode_register(ANGLE, *v).to_vec()])
            .collect()
    }

    fn response(motor: u8) -> u32 {
        read_response_id(HOST_ID, motor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_requests_cover_every_register() {
        let bus = Arc::new(MockBus::scripted());
        engine(&bus).request_reads().await.unwrap();

        let sent = bus.sent();
        assert_eq!(sent.len(), 7 * RegisterIndex::ALL.len());
        assert!(sent
            .iter()
            .all(|f| f.id >> 24 == command::READ_PARAMETER as u32 && f.extended));
        assert_eq!(sent[0].id, 0x1100_FD3D);
        assert_eq!(&sent[0].data[..2], &[0x16, 0x70]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_failure_is_reported() {
        let bus = Arc::new(MockBus::scripted());
        bus.set_connected(false);
        assert!(matches!(
            engine(&bus).query().await,
            Err(ControlError::Transport(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_settles_on_first_value() {
        let bus = Arc::new(MockBus::scripted());
        bus.script("can0", response(62), angle_batches(&[0.5, 0.5, 1.0, 1.0]));

        let angles = engine(&bus).collect_angles().await;
        assert_eq!(angles.get(&MotorAddress(62)), Some(&0.5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_distinct_value_settles() {
        let bus = Arc::new(MockBus::scripted());
        bus.script("can0", response(63), angle_batches(&[0.5, 1.0, 1.0]));

        let angles = engine(&bus).collect_angles().await;
        assert_eq!(angles.get(&MotorAddress(63)), Some(&1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_result_when_motors_stay_silent() {
        let bus = Arc::new(MockBus::scripted());
        // The gain phase polls the first joint, so script two others
        bus.script("can0", response(62), angle_batches(&[0.1, 0.1]));
        bus.script("can0", response(67), angle_batches(&[-0.7, -0.7]));

        let start = Instant::now();
        let snapshot = engine(&bus).query().await.unwrap();
        assert_eq!(
            snapshot.angles,
            BTreeMap::from([(MotorAddress(62), 0.1), (MotorAddress(67), -0.7)])
        );
        assert!(Instant::now() - start <= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gains_from_first_joint() {
        let bus = Arc::new(MockBus::scripted());
        bus.push_poll(
            "can0",
            response(61),
            vec![
                encode_register(RegisterIndex::PositionGain.index(), 30.0).to_vec(),
                encode_register(RegisterIndex::VelocityGain.index(), 2.0).to_vec(),
                encode_register(RegisterIndex::VelocityIntegralGain.index(), 0.02).to_vec(),
                encode_register(RegisterIndex::VelocityFilterGain.index(), 0.1).to_vec(),
                encode_register(ANGLE, 0.3).to_vec(),
            ],
        );

        let engine = engine(&bus);
        let start = Instant::now();
        let gains = engine.collect_gains().await;
        assert!(Instant::now() - start < engine.timing().gain_budget());
        assert_eq!(gains.len(), 4);
        assert_eq!(gains[&RegisterIndex::PositionGain], 30.0);
        assert_eq!(gains[&RegisterIndex::VelocityIntegralGain], 0.02);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_arm_reads_back_written_angles() {
        let bus = Arc::new(MockBus::default());
        for (i, motor) in (61u8..=67).enumerate() {
            bus.set_register("can0", motor, ANGLE, i as f32 * 0.1);
            bus.set_register("can0", motor, RegisterIndex::PositionGain.index(), 25.0);
        }

        let snapshot = engine(&bus).query().await.unwrap();
        assert_eq!(snapshot.angles.len(), 7);
        assert_eq!(snapshot.angles[&MotorAddress(63)], 2.0 * 0.1);
        assert_eq!(snapshot.named_gains()["loc_kp"], 25.0);
        assert_eq!(snapshot.named_gains()["spd_kp"], 0.0);
    }
}
