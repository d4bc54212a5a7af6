/// A decoded track: one sample vector per channel, normalized to -1.0..=1.0.
///
/// Built once per decoded file and never mutated afterwards; share it behind
/// an `Arc` between the amplitude panel and the analyser.
#[derive(Clone, Debug)]
pub struct AudioSampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioSampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (length of the longest channel).
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in seconds; zero when the sample rate is unknown.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Average of all channels per frame.
    pub fn mixdown(&self) -> Vec<f32> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels[0].clone(),
            n => {
                let mut out = vec![0.0f32; self.frames()];
                for channel in &self.channels {
                    for (acc, &s) in out.iter_mut().zip(channel.iter()) {
                        *acc += s;
                    }
                }
                let scale = 1.0 / n as f32;
                out.iter_mut().for_each(|s| *s *= scale);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_longest_channel() {
        let buffer = AudioSampleBuffer::new(vec![vec![0.0; 22050], vec![0.0; 44100]], 44100);
        assert_eq!(buffer.frames(), 44100);
        assert!((buffer.duration() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_sample_rate_has_zero_duration() {
        let buffer = AudioSampleBuffer::mono(vec![0.5; 10], 0);
        assert_eq!(buffer.duration(), 0.0);
    }

    #[test]
    fn mixdown_averages_channels() {
        let buffer = AudioSampleBuffer::new(vec![vec![1.0, 0.0], vec![0.0, -1.0]], 8000);
        assert_eq!(buffer.mixdown(), vec![0.5, -0.5]);
    }
}
