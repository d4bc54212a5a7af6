use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::AudioSampleBuffer;

/// Decode every packet of the first audio track into per-channel samples.
///
/// Corrupt packets are skipped; end of stream is not an error.
pub fn decode_audio(path: &Path) -> Result<AudioSampleBuffer> {
    let mut format = open_format(path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found")?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;
    let mut channels: Vec<Vec<f32>> =
        vec![Vec::new(); track.codec_params.channels.map_or(1, |c| c.count()).max(1)];

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut skipped = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(Error::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        interleaved.copy_interleaved_ref(decoded);
        deinterleave(interleaved.samples(), &mut channels);
    }

    if skipped > 0 {
        log::warn!("Skipped {} undecodable packet(s) in {}", skipped, path.display());
    }

    let buffer = AudioSampleBuffer::new(channels, sample_rate);
    log::info!(
        "Decoded audio: {} frames x {} channels, {}Hz, {:.1}s",
        buffer.frames(),
        buffer.channel_count(),
        sample_rate,
        buffer.duration()
    );
    Ok(buffer)
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;
    Ok(probed.format)
}

/// Split interleaved samples across per-channel vectors.
fn deinterleave(samples: &[f32], channels: &mut [Vec<f32>]) {
    let count = channels.len();
    if count == 1 {
        channels[0].extend_from_slice(samples);
        return;
    }
    for frame in samples.chunks_exact(count) {
        for (channel, &s) in channels.iter_mut().zip(frame) {
            channel.push(s);
        }
    }
}
