//! Best-effort audio seam.
//!
//! The soundtrack is an external collaborator: the scene only asks it
//! to start looping when the intro triggers, and treats rejection
//! (autoplay policy, missing device) as a logged warning. The default
//! [`NullAudio`] backend plays nothing and always succeeds, which keeps
//! headless runs and tests silent.

use crate::error::AudioError;

/// Playback backend hook.
pub trait AudioSink {
    /// Start looping the soundtrack. Called once, on the trigger.
    fn play_loop(&mut self) -> Result<(), AudioError>;
}

/// No-op backend.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_loop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_audio_always_plays() {
        assert!(NullAudio.play_loop().is_ok());
    }

    struct Rejecting;
    impl AudioSink for Rejecting {
        fn play_loop(&mut self) -> Result<(), AudioError> {
            Err(AudioError::Backend("autoplay blocked".into()))
        }
    }

    #[test]
    fn test_rejection_is_reportable() {
        let err = Rejecting.play_loop().unwrap_err();
        assert!(err.to_string().contains("autoplay blocked"));
    }
}
