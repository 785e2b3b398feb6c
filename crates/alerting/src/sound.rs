//! Alert sound loading and playback

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::AlertError;

/// Alert sound held in memory so playback never touches the filesystem
#[derive(Debug, Clone)]
pub struct SoundResource {
    path: PathBuf,
    bytes: Arc<[u8]>,
}

impl SoundResource {
    /// Read the sound and check that it can be decoded
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AlertError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AlertError::SoundMissing(path.to_path_buf()));
        }

        let bytes: Arc<[u8]> = std::fs::read(path)?.into();
        if bytes.is_empty() {
            return Err(AlertError::Decode(format!("{} is empty", path.display())));
        }

        #[cfg(feature = "audio")]
        rodio::Decoder::new(std::io::Cursor::new(Arc::clone(&bytes)))
            .map_err(|e| AlertError::Decode(format!("{}: {}", path.display(), e)))?;

        info!("Loaded alert sound {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Blocking audio playback. Called from a background task, never from the
/// frame loop.
pub trait SoundPlayer: Send + Sync {
    /// Play the sound to completion
    fn play(&self, sound: &SoundResource) -> Result<(), AlertError>;
}

/// Plays through the default output device with rodio
#[cfg(feature = "audio")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioPlayer;

#[cfg(feature = "audio")]
impl SoundPlayer for RodioPlayer {
    fn play(&self, sound: &SoundResource) -> Result<(), AlertError> {
        let (_stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| AlertError::Playback(e.to_string()))?;
        let sink = rodio::Sink::try_new(&handle).map_err(|e| AlertError::Playback(e.to_string()))?;
        let source = rodio::Decoder::new(std::io::Cursor::new(Arc::clone(&sound.bytes)))
            .map_err(|e| AlertError::Decode(e.to_string()))?;

        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

/// Player used when the build has no audio backend; always defers to the
/// fallback beep
#[cfg(not(feature = "audio"))]
#[derive(Debug, Default, Clone, Copy)]
struct SilentPlayer;

#[cfg(not(feature = "audio"))]
impl SoundPlayer for SilentPlayer {
    fn play(&self, sound: &SoundResource) -> Result<(), AlertError> {
        Err(AlertError::Unsupported(format!(
            "cannot play {} without the `audio` feature",
            sound.path.display()
        )))
    }
}

/// Player for this build
pub fn default_player() -> Arc<dyn SoundPlayer> {
    #[cfg(feature = "audio")]
    {
        Arc::new(RodioPlayer)
    }

    #[cfg(not(feature = "audio"))]
    {
        Arc::new(SilentPlayer)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 8 samples of 16-bit mono PCM at 8 kHz
    pub(crate) fn tiny_wav() -> Vec<u8> {
        let samples: [i16; 8] = [0, 1000, 2000, 1000, 0, -1000, -2000, -1000];
        let data_len = (samples.len() * 2) as u32;

        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&1u16.to_le_bytes()); // mono
        wav.extend_from_slice(&8000u32.to_le_bytes());
        wav.extend_from_slice(&16000u32.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            wav.extend_from_slice(&s.to_le_bytes());
        }
        wav
    }

    #[test]
    fn test_load_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alert.wav");
        std::fs::write(&path, tiny_wav()).unwrap();

        let sound = SoundResource::load(&path).unwrap();
        assert_eq!(sound.path(), path.as_path());
        assert_eq!(sound.bytes().len(), 44 + 16);
    }

    #[test]
    fn test_missing_sound() {
        let dir = tempfile::tempdir().unwrap();
        let err = SoundResource::load(dir.path().join("alert.wav")).unwrap_err();
        assert!(matches!(err, AlertError::SoundMissing(_)));
    }

    #[test]
    fn test_empty_sound_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alert.wav");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(SoundResource::load(&path), Err(AlertError::Decode(_))));
    }

    #[cfg(not(feature = "audio"))]
    #[test]
    fn test_default_player_defers_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alert.wav");
        std::fs::write(&path, tiny_wav()).unwrap();
        let sound = SoundResource::load(&path).unwrap();

        assert!(matches!(
            default_player().play(&sound),
            Err(AlertError::Unsupported(_))
        ));
    }
}
