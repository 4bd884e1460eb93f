//! Stream of decoded register observations from the bridge inbox

use std::sync::Arc;

use async_stream::stream;
use canarm_bridge::BusTransport;
use canarm_codec::{decode, RegisterReading};
use futures::Stream;
use tokio::time::{sleep, Instant};

use crate::config::FeedbackTiming;

/// Poll `(interface, response_id)` until `deadline`, yielding every frame
/// that decodes
///
/// Failed polls are logged and retried after the retry pause. Frames that
/// do not decode are skipped. The stream ends at the deadline; consumers
/// that are done earlier simply drop it.
pub fn observations(
    transport: Arc<dyn BusTransport>,
    interface: String,
    response_id: u32,
    deadline: Instant,
    timing: FeedbackTiming,
) -> impl Stream<Item = RegisterReading> {
    stream! {
        while Instant::now() < deadline {
            let frames = match transport.poll(&interface, response_id).await {
                Ok(frames) => frames,
                Err(e) => {
                    tracing::debug!(iface = %interface, id = response_id, error = %e, "Poll failed, retrying");
                    sleep(timing.poll_retry()).await;
                    continue;
                }
            };

            for data in frames {
                match decode(&data) {
                    Ok(reading) => {
                        yield reading;
                    }
                    Err(e) => {
                        tracing::debug!(iface = %interface, id = response_id, error = %e, "Skipping undecodable frame");
                    }
                }
            }
            sleep(timing.poll_interval()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canarm_bridge::MockBus;
    use canarm_codec::encode_register;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_yields_decoded_frames_until_deadline() {
        let bus = Arc::new(MockBus::scripted());
        bus.script(
            "can0",
            7,
            vec![
                vec![encode_register(0x7016, 1.0).to_vec(), vec![1, 2, 3]],
                vec![],
                vec![encode_register(0x7016, 2.0).to_vec()],
            ],
        );

        let deadline = Instant::now() + Duration::from_millis(1000);
        let readings: Vec<f32> = observations(bus, "can0".into(), 7, deadline, FeedbackTiming::default())
            .map(|r| r.value())
            .collect()
            .await;
        assert_eq!(readings, vec![1.0, 2.0]);
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_polls_are_retried() {
        let bus = Arc::new(MockBus::scripted());
        bus.set_poll_failure(true);
        let start = Instant::now();
        let deadline = start + Duration::from_millis(200);
        let count = observations(bus, "can0".into(), 7, deadline, FeedbackTiming::default())
            .count()
            .await;
        assert_eq!(count, 0);
        // Four attempts at 0, 60, 120 and 180 ms
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_millis(240));
        assert!(elapsed < Duration::from_millis(300));
    }
}
