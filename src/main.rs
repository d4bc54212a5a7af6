mod cli;
mod config;
mod encode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use cli::{ChartArgs, Cli, Command, PointsArgs, RenderArgs};
use config::Config;
use encode::ffmpeg::{AudioTrack, FfmpegEncoder, VideoSettings};
use encode::png_sequence::PngSequence;
use encode::FrameSink;
use sonoscope::audio::amplitude::extract_amplitude;
use sonoscope::audio::analyser::StreamingAnalyser;
use sonoscope::audio::buffer::AudioSampleBuffer;
use sonoscope::audio::decode::decode_audio;
use sonoscope::render::palette::BACKGROUND;
use sonoscope::render::text::TextPainter;
use sonoscope::schedule::events::{EventHub, ViewEvent};
use sonoscope::schedule::frame::{Flow, FrameClock, FrameLoop};
use sonoscope::viz::amplitude::AmplitudePanel;
use sonoscope::viz::circular::CircularSpectrum;
use sonoscope::viz::spectrum::SpectrumBars;
use sonoscope::viz::{FrameInput, FrameMode, LiveView};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let cfg = match config::find_config(cli.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(err) => {
                log::warn!("{:#}", err);
                Config::default()
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Command::Chart(mut args) => {
            merge_chart(&mut args, &cfg);
            run_chart(&args, &cfg)
        }
        Command::Points(args) => run_points(&args),
        Command::Spectrum(mut args) => {
            merge_render(&mut args, &cfg);
            let view = SpectrumBars::new(
                args.width as f32,
                args.height as f32,
                args.dpr,
                cfg.spectrum.options(),
            )?;
            run_live(&args, &cfg, view, "spectrum")
        }
        Command::Circular(mut args) => {
            merge_render(&mut args, &cfg);
            let view = CircularSpectrum::new(
                args.width as f32,
                args.height as f32,
                args.dpr,
                cfg.circular.options(),
            )?;
            run_live(&args, &cfg, view, "circular")
        }
    }
}

// Config values apply only when the CLI is at its default
fn merge_chart(args: &mut ChartArgs, cfg: &Config) {
    if args.width == 1000 { args.width = cfg.chart.width; }
    if args.height == 300 { args.height = cfg.chart.height; }
    if args.dpr == 1.0 { args.dpr = cfg.output.dpr; }
}

fn merge_render(args: &mut RenderArgs, cfg: &Config) {
    if args.width == 1280 { args.width = cfg.output.width; }
    if args.height == 720 { args.height = cfg.output.height; }
    if args.dpr == 1.0 { args.dpr = cfg.output.dpr; }
    if args.fps == 30 { args.fps = cfg.output.fps; }
    if args.crf == 18 { args.crf = cfg.output.crf; }
    if args.codec == "libx264" { args.codec = cfg.output.codec.clone(); }
    if args.pix_fmt == "yuv420p" { args.pix_fmt = cfg.output.pix_fmt.clone(); }
}

/// Decode failures become "no buffer"; the views fall back to their
/// placeholder and idle states.
fn load_buffer(input: &Path) -> Option<Arc<AudioSampleBuffer>> {
    log::info!("Decoding audio...");
    match decode_audio(input) {
        Ok(buffer) => Some(Arc::new(buffer)),
        Err(err) => {
            log::warn!("No audio available: {:#}", err);
            None
        }
    }
}

fn load_painter(font: Option<&Path>) -> Result<TextPainter> {
    match font {
        Some(path) => TextPainter::from_file(path),
        None => TextPainter::embedded(),
    }
}

fn run_chart(args: &ChartArgs, cfg: &Config) -> Result<()> {
    let painter = Arc::new(load_painter(cfg.output.font.as_deref())?);
    let options = cfg.chart.options();
    let debounce = options.debounce;
    let mut panel = AmplitudePanel::new(
        painter,
        options,
        args.width as f32,
        args.height as f32,
        args.dpr,
    )?;

    let hub = EventHub::new();
    let events = hub.subscribe();

    panel.load(load_buffer(&args.input));
    hub.emit(ViewEvent::Resize {
        width: args.width as f32,
        height: args.height as f32,
        dpr: args.dpr,
    });
    if let Some((x, y)) = args.probe {
        hub.emit(ViewEvent::PointerMove { x, y });
    }

    if panel.wait() {
        if let Some(cache) = panel.cache() {
            log::info!("Chart cache built from {} points", cache.points().len());
        }
    }

    let now = Instant::now();
    for event in events.drain() {
        panel.handle_event(event, now)?;
    }

    if args.probe.is_some() {
        panel.poll_timers(now + debounce);
        match panel.tooltip() {
            Some(tip) => println!("{}", tip),
            None => println!("No data under pointer"),
        }
    }

    panel
        .surface()
        .save_png(&args.output)
        .context("Failed to write chart")?;
    log::info!("Done! Output: {}", args.output.display());
    Ok(())
}

fn run_points(args: &PointsArgs) -> Result<()> {
    let buffer = decode_audio(&args.input)?;
    let points = extract_amplitude(&buffer);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    println!("{:>8}  {:>9}  {:>8}", "time", "amplitude", "dB");
    for p in &points {
        println!("{:>8.2}  {:>9.5}  {:>8.2}", p.time, p.amplitude, p.decibels);
    }
    Ok(())
}

fn run_live<V: LiveView>(args: &RenderArgs, cfg: &Config, mut view: V, name: &str) -> Result<()> {
    let fps = args.fps.max(1);
    let lead_in = args.lead_in.max(0.0);
    let tail = args.tail.max(0.0);

    let buffer = load_buffer(&args.input);
    let (mono, sample_rate, duration) = match &buffer {
        Some(b) => (b.mixdown(), b.sample_rate(), b.duration()),
        None => (Vec::new(), 0, 0.0),
    };

    let total_frames = ((lead_in + duration + tail) * fps as f32).ceil() as u64;
    if total_frames == 0 {
        anyhow::bail!("Nothing to render: no audio and no --lead-in/--tail");
    }

    log::info!(
        "Rendering {} view: {}x{} @ {}fps, {} frames",
        name,
        view.surface().pixel_width(),
        view.surface().pixel_height(),
        fps,
        total_frames
    );

    let (width, height) = (view.surface().pixel_width(), view.surface().pixel_height());
    let mut sink: Box<dyn FrameSink> = match &args.frames_dir {
        Some(dir) => Box::new(PngSequence::new(dir, width, height)?),
        None => {
            let settings = VideoSettings {
                width,
                height,
                fps,
                codec: &args.codec,
                pix_fmt: &args.pix_fmt,
                crf: args.crf,
            };
            let audio = buffer.as_ref().map(|_| AudioTrack {
                path: &args.input,
                offset: lead_in,
            });
            Box::new(FfmpegEncoder::new(&args.output, audio, &settings)?)
        }
    };

    let mut analyser = StreamingAnalyser::new(cfg.analyser.analyser_config());
    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let mut failure = None;
    let mut last_mode = None;
    {
        let frames = FrameLoop::new();
        let handle = frames.start(|clock: &FrameClock| {
            let t = clock.seconds() - lead_in;
            let playing = !mono.is_empty() && t >= 0.0 && t < duration;
            if playing {
                let playhead = (t * sample_rate as f32) as usize;
                analyser.update(&mono, playhead);
            }
            let snapshot = playing.then(|| analyser.snapshot());
            let mode = view.draw(FrameInput::from_source(snapshot, playing), clock);
            if last_mode != Some(mode) {
                log::debug!("Frame {}: {:?}", clock.index, mode);
                if mode == FrameMode::Idle {
                    analyser.reset();
                }
                last_mode = Some(mode);
            }

            let rgba = view.surface().to_opaque_rgba(BACKGROUND);
            if let Err(err) = sink.write_frame(&rgba) {
                failure = Some(err);
                return Flow::Stop;
            }
            pb.inc(1);
            if clock.index + 1 >= total_frames {
                Flow::Stop
            } else {
                Flow::Continue
            }
        });

        let mut index = 0;
        while handle.is_active() {
            frames.pump(FrameClock::at_rate(index, fps));
            index += 1;
        }
    }

    if let Some(err) = failure {
        pb.abandon();
        return Err(err);
    }
    pb.finish_with_message("Rendering complete");

    log::info!("Finishing output...");
    sink.finish()?;

    match &args.frames_dir {
        Some(dir) => log::info!("Done! Frames: {}", dir.display()),
        None => log::info!("Done! Output: {}", args.output.display()),
    }
    Ok(())
}
