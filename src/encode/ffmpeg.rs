use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use super::FrameSink;

pub struct VideoSettings<'a> {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: &'a str,
    pub pix_fmt: &'a str,
    pub crf: u32,
}

/// Source audio muxed under the video, shifted by `offset` seconds.
pub struct AudioTrack<'a> {
    pub path: &'a Path,
    pub offset: f32,
}

pub struct FfmpegEncoder {
    child: Child,
    frame_len: usize,
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, audio: Option<AudioTrack<'_>>, settings: &VideoSettings<'_>) -> Result<Self> {
        let args = build_args(output_path, audio.as_ref(), settings);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width,
            settings.height,
            settings.fps,
            settings.codec
        );

        Ok(Self {
            child,
            frame_len: settings.width as usize * settings.height as usize * 4,
        })
    }
}

fn build_args(output_path: &Path, audio: Option<&AudioTrack<'_>>, settings: &VideoSettings<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{}x{}", settings.width, settings.height).into(),
        "-framerate".into(), settings.fps.to_string().into(),
        "-i".into(), "pipe:0".into(),
    ];

    if let Some(track) = audio {
        if track.offset > 0.0 {
            args.extend(["-itsoffset".into(), format!("{:.3}", track.offset).into()]);
        }
        args.extend(["-i".into(), track.path.as_os_str().to_os_string()]);
    }

    args.extend([
        // yuv420p needs even dimensions
        "-vf".into(), "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
        "-c:v".into(), settings.codec.into(),
        "-pix_fmt".into(), settings.pix_fmt.into(),
        "-crf".into(), settings.crf.to_string().into(),
        "-preset".into(), "medium".into(),
    ]);

    if audio.is_some() {
        args.extend(["-c:a".into(), "aac".into(), "-b:a".into(), "192k".into()]);
    }

    args.push(output_path.as_os_str().to_os_string());
    args
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_len {
            anyhow::bail!(
                "Frame is {} bytes, encoder expects {}",
                rgba_pixels.len(),
                self.frame_len
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgba_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> VideoSettings<'static> {
        VideoSettings {
            width: 640,
            height: 480,
            fps: 30,
            codec: "libx264",
            pix_fmt: "yuv420p",
            crf: 18,
        }
    }

    #[test]
    fn silent_render_has_no_audio_input() {
        let args = build_args(Path::new("out.mp4"), None, &settings());
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(!args.iter().any(|a| a == "-c:a"));
        assert_eq!(args.last().map(|a| a.as_os_str()), Some(Path::new("out.mp4").as_os_str()));
    }

    #[test]
    fn lead_in_offsets_audio() {
        let track = AudioTrack {
            path: Path::new("song.flac"),
            offset: 1.5,
        };
        let args = build_args(Path::new("out.mp4"), Some(&track), &settings());
        let pos = args.iter().position(|a| a == "-itsoffset").unwrap();
        assert_eq!(args[pos + 1], "1.500");
        assert_eq!(args[pos + 3], "song.flac");
        assert!(args.iter().any(|a| a == "640x480"));
    }
}
