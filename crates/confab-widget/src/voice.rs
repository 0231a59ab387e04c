use tracing::debug;

use confab_core::Result;

/// Receives user-speech transcripts from the voice module.
pub type TranscriptSink = Box<dyn Fn(String) + Send + Sync>;

/// Optional voice collaborator.
///
/// The engine only starts and stops conversations and forwards volume
/// changes; everything else (capture, playback, the vendor SDK) lives
/// behind this trait in the host. Transcribed user speech comes back
/// through the sink handed to [`VoiceModule::start_conversation`].
pub trait VoiceModule: Send {
    fn start_conversation(&mut self, transcripts: TranscriptSink) -> Result<()>;
    fn end_conversation(&mut self);
    fn set_volume(&mut self, volume: f64);
    fn is_active(&self) -> bool;
}

/// Inert voice module used when the host provides none.
#[derive(Debug, Default)]
pub struct NullVoice {
    active: bool,
}

impl NullVoice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VoiceModule for NullVoice {
    fn start_conversation(&mut self, _transcripts: TranscriptSink) -> Result<()> {
        debug!("No voice module configured; ignoring start");
        self.active = true;
        Ok(())
    }

    fn end_conversation(&mut self) {
        self.active = false;
    }

    fn set_volume(&mut self, _volume: f64) {}

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_voice_lifecycle() {
        let mut voice = NullVoice::new();
        assert!(!voice.is_active());
        voice.start_conversation(Box::new(|_| {})).unwrap();
        assert!(voice.is_active());
        voice.set_volume(0.5);
        voice.end_conversation();
        assert!(!voice.is_active());
    }
}
