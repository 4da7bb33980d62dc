//! Spoken output.

use std::sync::Mutex;

/// Best-effort speech synthesis.
///
/// Implementations cancel whatever is being spoken before starting `text`.
/// Nothing is returned; failures are the implementation's to log.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
}

/// Speech stand-in that writes utterances to the log.
///
/// Tracks the current utterance so a replacement is visible as a
/// cancellation in the trace.
#[derive(Debug, Default)]
pub struct TracingSpeech {
    current: Mutex<Option<String>>,
}

impl TracingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent utterance.
    pub fn current(&self) -> Option<String> {
        self.current.lock().ok().and_then(|c| c.clone())
    }
}

impl SpeechOutput for TracingSpeech {
    fn speak(&self, text: &str) {
        let Ok(mut current) = self.current.lock() else {
            tracing::warn!("Speech state poisoned, utterance dropped");
            return;
        };
        if let Some(previous) = current.replace(text.to_string()) {
            tracing::debug!(cancelled = %previous, "Cancelled in-progress utterance");
        }
        tracing::info!(utterance = %text, "Speaking");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_utterance_replaces_previous() {
        let speech = TracingSpeech::new();
        speech.speak("first");
        speech.speak("second");
        assert_eq!(speech.current().as_deref(), Some("second"));
    }
}
