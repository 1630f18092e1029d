//! Host audio backend interface.
//!
//! The engine never owns the backend. It opens one voice at creation, keeps the
//! returned [`VoiceId`], and borrows the backend for each tick.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// Signed 16-bit big-endian, the Screamer's native sample layout.
    S16Be,
    S16Le,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::S16Be | SampleFormat::S16Le => 2,
        }
    }
}

/// Handle to a voice owned by an [`AudioBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VoiceId(pub u32);

pub trait AudioBackend {
    fn open(&mut self, format: SampleFormat, channels: u8) -> Result<VoiceId, AudioError>;

    /// Queue one frame of interleaved samples for playback.
    fn write(&mut self, voice: VoiceId, frame: &[u8]);

    /// Fill `frame` with captured samples, returning how many bytes were available.
    fn read(&mut self, voice: VoiceId, frame: &mut [u8]) -> usize;

    fn close(&mut self, voice: VoiceId);
}

#[derive(Debug, Clone)]
struct MemoryVoice {
    format: SampleFormat,
    channels: u8,
    played: Vec<u8>,
    capture: VecDeque<u8>,
}

/// In-memory backend: records played bytes and serves queued capture bytes.
///
/// Useful for headless machines and for tests.
#[derive(Debug, Default)]
pub struct MemoryAudioBackend {
    voices: BTreeMap<VoiceId, MemoryVoice>,
    next_id: u32,
    max_voices: Option<usize>,
}

impl MemoryAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_voices(max_voices: usize) -> Self {
        Self {
            max_voices: Some(max_voices),
            ..Self::default()
        }
    }

    pub fn is_open(&self, voice: VoiceId) -> bool {
        self.voices.contains_key(&voice)
    }

    pub fn open_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voice_format(&self, voice: VoiceId) -> Option<(SampleFormat, u8)> {
        self.voices.get(&voice).map(|v| (v.format, v.channels))
    }

    /// Bytes written to `voice` so far.
    pub fn played(&self, voice: VoiceId) -> &[u8] {
        self.voices
            .get(&voice)
            .map(|v| v.played.as_slice())
            .unwrap_or(&[])
    }

    pub fn take_played(&mut self, voice: VoiceId) -> Vec<u8> {
        self.voices
            .get_mut(&voice)
            .map(|v| std::mem::take(&mut v.played))
            .unwrap_or_default()
    }

    /// Make `bytes` available to subsequent `read` calls on `voice`.
    pub fn queue_capture(&mut self, voice: VoiceId, bytes: &[u8]) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.capture.extend(bytes.iter().copied());
        }
    }
}

impl AudioBackend for MemoryAudioBackend {
    fn open(&mut self, format: SampleFormat, channels: u8) -> Result<VoiceId, AudioError> {
        if channels == 0 {
            return Err(AudioError::UnsupportedFormat { format, channels });
        }
        if self.max_voices.is_some_and(|max| self.voices.len() >= max) {
            return Err(AudioError::NoVoice);
        }
        let id = VoiceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.voices.insert(
            id,
            MemoryVoice {
                format,
                channels,
                played: Vec::new(),
                capture: VecDeque::new(),
            },
        );
        Ok(id)
    }

    fn write(&mut self, voice: VoiceId, frame: &[u8]) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.played.extend_from_slice(frame);
        }
    }

    fn read(&mut self, voice: VoiceId, frame: &mut [u8]) -> usize {
        let Some(v) = self.voices.get_mut(&voice) else {
            return 0;
        };
        let n = frame.len().min(v.capture.len());
        for (dst, src) in frame.iter_mut().zip(v.capture.drain(..n)) {
            *dst = src;
        }
        n
    }

    fn close(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }
}
