/// One decoded audio chunk (interleaved PCM)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Interleaved samples
    pub samples: Vec<f32>,

    /// Sample rate of the audio
    pub sample_rate: u32,

    /// Number of interleaved channels
    pub channels: u16,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Get the duration of this chunk in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
