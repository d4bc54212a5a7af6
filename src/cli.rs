use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonoscope", about = "Amplitude charts and spectrum visualizations for audio files")]
pub struct Cli {
    /// Config file (defaults to sonoscope.toml or the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the full-track amplitude chart to a PNG
    Chart(ChartArgs),
    /// Print the amplitude point sequence
    Points(PointsArgs),
    /// Render the frequency-bar spectrum to a video
    Spectrum(RenderArgs),
    /// Render the circular spectrum to a video
    Circular(RenderArgs),
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "chart.png")]
    pub output: PathBuf,

    /// Viewport width in logical pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Viewport height in logical pixels
    #[arg(long, default_value_t = 300)]
    pub height: u32,

    /// Device pixel ratio of the viewport
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f32,

    /// Pointer position "X,Y" to run through the tooltip hit test
    #[arg(long, value_parser = parse_probe)]
    pub probe: Option<(f32, f32)>,
}

#[derive(Args, Debug)]
pub struct PointsArgs {
    /// Input audio file
    pub input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Input audio file
    pub input: PathBuf,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Write numbered PNG frames to this directory instead of encoding video
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// Viewport width in logical pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Viewport height in logical pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Device pixel ratio of the viewport
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Seconds of idle animation before playback starts
    #[arg(long, default_value_t = 0.0)]
    pub lead_in: f32,

    /// Seconds of idle animation after playback ends
    #[arg(long, default_value_t = 0.0)]
    pub tail: f32,

    /// H.264 CRF quality (0-51, lower = better)
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,
}

fn parse_probe(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad X '{}': {}", x, e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad Y '{}': {}", y, e))?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(format!("probe must be finite, got '{}'", s));
    }
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_parses_pair() {
        assert_eq!(parse_probe("40, 20.5"), Ok((40.0, 20.5)));
        assert!(parse_probe("40").is_err());
        assert!(parse_probe("x,1").is_err());
        assert!(parse_probe("inf,1").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from(["sonoscope", "chart", "song.wav", "--probe", "10,20"]);
        match cli.command {
            Command::Chart(args) => {
                assert_eq!(args.probe, Some((10.0, 20.0)));
                assert_eq!(args.output, PathBuf::from("chart.png"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::parse_from(["sonoscope", "circular", "song.wav", "--lead-in", "1.5", "-c", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Command::Circular(args) => assert_eq!(args.lead_in, 1.5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
