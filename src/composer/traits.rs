//! Trait definition for the composition service.
//!
//! The scheduler only sees [`Composer`], so tests can substitute a mock
//! and production code uses [`ElevenLabsClient`].
//!
//! [`ElevenLabsClient`]: super::client::ElevenLabsClient

use async_trait::async_trait;

use super::domain::{AudioStream, ComposeError, CompositionPlan};

/// Turns a composition plan into encoded audio.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Compose one track. The returned stream yields MP3 bytes.
    async fn compose(&self, plan: &CompositionPlan) -> Result<AudioStream, ComposeError>;
}

#[async_trait]
impl Composer for super::client::ElevenLabsClient {
    async fn compose(&self, plan: &CompositionPlan) -> Result<AudioStream, ComposeError> {
        self.compose(plan).await
    }
}

/// Mock composer for testing.
///
/// Returns scripted outcomes in order, then falls back to a default.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use futures::StreamExt;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Bytes returned by a successful mock composition.
    pub const MOCK_AUDIO: &[u8] = b"ID3-mock-audio";

    pub struct MockComposer {
        /// Outcomes consumed one per call
        script: Mutex<VecDeque<Result<Vec<u8>, ComposeError>>>,
        /// Outcome once the script is exhausted
        fallback: Result<Vec<u8>, ComposeError>,
        /// Simulated service latency
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        plans: Mutex<Vec<CompositionPlan>>,
    }

    impl MockComposer {
        fn with_fallback(fallback: Result<Vec<u8>, ComposeError>) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                fallback,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                plans: Mutex::new(Vec::new()),
            }
        }

        /// Always succeeds with [`MOCK_AUDIO`].
        pub fn succeeding() -> Self {
            Self::with_fallback(Ok(MOCK_AUDIO.to_vec()))
        }

        /// Always fails with the given error.
        pub fn failing(error: ComposeError) -> Self {
            Self::with_fallback(Err(error))
        }

        /// Plays back `outcomes` in order, then succeeds.
        pub fn scripted(outcomes: Vec<Result<Vec<u8>, ComposeError>>) -> Self {
            let mock = Self::succeeding();
            *mock.script.lock() = outcomes.into();
            mock
        }

        /// Add latency to every call.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Highest number of overlapping compose calls seen.
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        /// Plans received so far.
        pub fn plans(&self) -> Vec<CompositionPlan> {
            self.plans.lock().clone()
        }
    }

    #[async_trait]
    impl Composer for MockComposer {
        async fn compose(&self, plan: &CompositionPlan) -> Result<AudioStream, ComposeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            self.plans.lock().push(plan.clone());

            if self.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let outcome = self
                .script
                .lock()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            let bytes = outcome?;
            Ok(futures::stream::iter(vec![Ok(bytes)]).boxed())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn empty_plan() -> CompositionPlan {
            CompositionPlan {
                positive_global_styles: vec![],
                negative_global_styles: vec![],
                sections: vec![],
            }
        }

        #[tokio::test]
        async fn test_mock_succeeds_with_audio() {
            let mock = MockComposer::succeeding();
            let mut stream = mock.compose(&empty_plan()).await.unwrap();
            let chunk = stream.next().await.unwrap().unwrap();
            assert_eq!(chunk, MOCK_AUDIO);
            assert_eq!(mock.calls(), 1);
        }

        #[tokio::test]
        async fn test_mock_script_then_fallback() {
            let mock = MockComposer::scripted(vec![Err(ComposeError::RateLimited)]);
            assert!(matches!(
                mock.compose(&empty_plan()).await,
                Err(ComposeError::RateLimited)
            ));
            assert!(mock.compose(&empty_plan()).await.is_ok());
            assert_eq!(mock.calls(), 2);
            assert_eq!(mock.plans().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_failing() {
            let mock = MockComposer::failing(ComposeError::Network("down".to_string()));
            assert!(mock.compose(&empty_plan()).await.is_err());
            assert!(mock.compose(&empty_plan()).await.is_err());
        }
    }
}
