//! In-memory bus for testing

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use canarm_codec::constants::command;
use canarm_codec::{decode, encode_register, read_response_id, CanFrame};
use parking_lot::RwLock;

use crate::adapter::BusTransport;
use crate::config::MockBusConfig;
use crate::error::{BridgeError, Result};

type InboxKey = (String, u32);

/// Mock bus
///
/// Records every frame sent and serves polls from two sources: batches
/// scripted by the test (consumed one per poll) and, when motor simulation
/// is on, the latest reply to every read request (returned on every poll,
/// like the bridge's message buffer).
pub struct MockBus {
    config: MockBusConfig,
    connected: AtomicBool,
    fail_polls: AtomicBool,
    sent: RwLock<Vec<CanFrame>>,
    failing_ids: RwLock<HashSet<u32>>,
    scripted: RwLock<HashMap<InboxKey, VecDeque<Vec<Vec<u8>>>>>,
    retained: RwLock<HashMap<InboxKey, BTreeMap<u16, Vec<u8>>>>,
    registers: RwLock<HashMap<(String, u8, u16), u32>>,
}

impl MockBus {
    pub fn new(config: &MockBusConfig) -> Self {
        Self {
            config: config.clone(),
            connected: AtomicBool::new(true),
            fail_polls: AtomicBool::new(false),
            sent: RwLock::new(Vec::new()),
            failing_ids: RwLock::new(HashSet::new()),
            scripted: RwLock::new(HashMap::new()),
            retained: RwLock::new(HashMap::new()),
            registers: RwLock::new(HashMap::new()),
        }
    }

    /// Mock bus that only answers with scripted batches
    pub fn scripted() -> Self {
        Self::new(&MockBusConfig {
            latency_ms: 0,
            simulate_motors: false,
        })
    }

    /// Queue one poll result for `(interface, id)`
    pub fn push_poll(&self, interface: &str, id: u32, payloads: Vec<Vec<u8>>) {
        self.scripted
            .write()
            .entry((interface.to_string(), id))
            .or_default()
            .push_back(payloads);
    }

    /// Queue several poll results, one per inner vector
    pub fn script(&self, interface: &str, id: u32, batches: Vec<Vec<Vec<u8>>>) {
        for batch in batches {
            self.push_poll(interface, id, batch);
        }
    }

    /// Preset a motor register value as if it had been written
    pub fn set_register(&self, interface: &str, motor: u8, index: u16, value: f32) {
        self.registers
            .write()
            .insert((interface.to_string(), motor, index), value.to_bits());
    }

    /// Current value of a simulated register
    pub fn register(&self, interface: &str, motor: u8, index: u16) -> Option<f32> {
        self.registers
            .read()
            .get(&(interface.to_string(), motor, index))
            .map(|raw| f32::from_bits(*raw))
    }

    /// Frames sent so far, in send order
    pub fn sent(&self) -> Vec<CanFrame> {
        self.sent.read().clone()
    }

    pub fn clear_sent(&self) {
        self.sent.write().clear();
    }

    /// Make sends to this identifier fail
    pub fn fail_sends_to(&self, id: u32) {
        self.failing_ids.write().insert(id);
    }

    /// Make every poll fail
    pub fn set_poll_failure(&self, fail: bool) {
        self.fail_polls.store(fail, Ordering::SeqCst);
    }

    /// Set connection state; a disconnected bus fails all traffic
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn simulate(&self, frame: &CanFrame) {
        let command_byte = (frame.id >> 24) as u8;
        let motor = (frame.id & 0xFF) as u8;
        let Ok(reading) = decode(&frame.data) else {
            return;
        };

        match command_byte {
            command::WRITE_PARAMETER => {
                self.registers
                    .write()
                    .insert((frame.interface.clone(), motor, reading.index), reading.raw);
            }
            command::READ_PARAMETER => {
                let host = ((frame.id >> 8) & 0xFF) as u8;
                let raw = self
                    .registers
                    .read()
                    .get(&(frame.interface.clone(), motor, reading.index))
                    .copied()
                    .unwrap_or(0);
                let reply = encode_register(reading.index, f32::from_bits(raw));
                self.retained
                    .write()
                    .entry((frame.interface.clone(), read_response_id(host, motor)))
                    .or_default()
                    .insert(reading.index, reply.to_vec());
            }
            _ => {}
        }
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new(&MockBusConfig::default())
    }
}

#[async_trait]
impl BusTransport for MockBus {
    async fn send(&self, frame: &CanFrame) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable("mock bus disconnected".to_string()));
        }
        self.simulate_latency().await;

        if self.failing_ids.read().contains(&frame.id) {
            return Err(BridgeError::server_error(
                500,
                format!("injected failure for 0x{:08X}", frame.id),
            ));
        }

        tracing::debug!(iface = %frame.interface, id = frame.id, data = ?frame.data, "Mock bus: sent frame");
        self.sent.write().push(frame.clone());
        if self.config.simulate_motors {
            self.simulate(frame);
        }
        Ok(())
    }

    async fn poll(&self, interface: &str, id: u32) -> Result<Vec<Vec<u8>>> {
        if !self.connected.load(Ordering::SeqCst) || self.fail_polls.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable("mock bus poll failed".to_string()));
        }
        self.simulate_latency().await;

        let key = (interface.to_string(), id);
        if let Some(batch) = self
            .scripted
            .write()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
        {
            return Ok(batch);
        }

        Ok(self
            .retained
            .read()
            .get(&key)
            .map(|frames| frames.values().cloned().collect())
            .unwrap_or_default())
    }
}
