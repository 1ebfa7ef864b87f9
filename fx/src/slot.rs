//! Last-request-wins conversion slot.

use parking_lot::Mutex;
use ratewise_common::ConversionResult;
use tracing::debug;

use crate::cancel::CancelHandle;
use crate::conversion::ConversionRequest;
use crate::engine::ConversionEngine;
use crate::error::FxResult;

/// Runs at most one live conversion at a time.
///
/// Starting a conversion cancels whichever one the slot started before, so
/// a caller that keeps re-issuing requests (e.g. as the user types) only
/// ever gets an answer for the latest input.
#[derive(Debug, Default)]
pub struct ConversionSlot {
    current: Mutex<Option<CancelHandle>>,
}

impl ConversionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and run a conversion, superseding any in-flight one.
    ///
    /// Invalid input fails without touching the in-flight conversion.
    pub async fn convert(
        &self,
        engine: &ConversionEngine,
        base: &str,
        quote: &str,
        amount: f64,
    ) -> FxResult<ConversionResult> {
        let request = ConversionRequest::new(base, quote, amount)?;

        let (handle, cancel) = CancelHandle::new();
        let previous = self.current.lock().replace(handle);
        if let Some(previous) = previous {
            debug!("Superseding in-flight conversion");
            previous.cancel();
        }

        engine.execute(&request, &cancel).await
    }

    /// Cancel the in-flight conversion, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.current.lock().take() {
            handle.cancel();
        }
    }
}
