use std::sync::Arc;
use std::time::{Duration, Instant};

use sonoscope::audio::amplitude::{extract_amplitude, DB_MIN};
use sonoscope::audio::analyser::{AnalyserConfig, StreamingAnalyser};
use sonoscope::audio::buffer::AudioSampleBuffer;
use sonoscope::render::text::TextPainter;
use sonoscope::schedule::events::{EventHub, ViewEvent};
use sonoscope::schedule::frame::{Flow, FrameClock, FrameLoop};
use sonoscope::viz::amplitude::{AmplitudePanel, ChartOptions, PanelState, CACHE_HEIGHT, CACHE_WIDTH};
use sonoscope::viz::circular::{CircularOptions, CircularSpectrum};
use sonoscope::viz::spectrum::{SpectrumBars, SpectrumOptions};
use sonoscope::viz::{FrameInput, FrameMode, LiveView};

fn sine(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let n = (seconds * sample_rate as f32) as usize;
    (0..n)
        .map(|i| 0.5 * (std::f32::consts::TAU * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

#[test]
fn one_second_of_silence_gives_two_floor_points() {
    let buffer = AudioSampleBuffer::mono(vec![0.0; 44_100], 44_100);
    let points = extract_amplitude(&buffer);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].time, 0.0);
    assert_eq!(points[1].time, 0.5);
    assert!(points.iter().all(|p| p.decibels == DB_MIN && p.amplitude == 0.0));
}

#[test]
fn chart_probe_through_event_hub() {
    let painter = Arc::new(TextPainter::embedded().unwrap());
    let options = ChartOptions::default();
    let debounce = options.debounce;
    let (w, h) = (800.0, 300.0);
    let mut panel = AmplitudePanel::new(painter, options, w, h, 1.0).unwrap();

    let hub = EventHub::new();
    let events = hub.subscribe();

    panel.load(Some(Arc::new(AudioSampleBuffer::mono(vec![0.0; 8000], 8000))));
    assert!(panel.wait());
    assert_eq!(panel.state(), PanelState::Ready);

    hub.emit(ViewEvent::PointerMove {
        x: 100.0 * w / CACHE_WIDTH,
        y: 60.0 * h / CACHE_HEIGHT,
    });
    let now = Instant::now();
    for event in events.drain() {
        panel.handle_event(event, now).unwrap();
    }

    assert!(!panel.poll_timers(now + debounce / 2));
    assert!(panel.tooltip().is_none());
    assert!(panel.poll_timers(now + debounce));

    let tip = panel.tooltip().unwrap();
    assert_eq!(tip.label, "0:00");
    assert_eq!(tip.value, "-90.00");
    assert_eq!(tip.to_string(), "Time: 0:00  Amplitude: -90.00 dB");

    hub.emit(ViewEvent::PointerLeave);
    for event in events.drain() {
        panel.handle_event(event, now).unwrap();
    }
    assert!(panel.tooltip().is_none());
}

#[test]
fn analyser_feeds_spectrum_for_a_fixed_number_of_frames() {
    let sample_rate = 8000;
    let mono = sine(1000.0, 1.0, sample_rate);
    let mut analyser = StreamingAnalyser::new(AnalyserConfig::default());
    let mut view = SpectrumBars::new(640.0, 360.0, 1.0, SpectrumOptions::default()).unwrap();
    let mut modes = Vec::new();
    let mut peak = (0.0, 0.0);

    {
        let frames = FrameLoop::new();
        let handle = frames.start(|clock: &FrameClock| {
            let playhead = ((clock.seconds() + 0.25) * sample_rate as f32) as usize;
            analyser.update(&mono, playhead);
            let input = FrameInput::from_source(Some(analyser.snapshot()), true);
            let bars = view.bars(input, clock.seconds());
            peak = (bars[16].height, bars[60].height);
            modes.push(view.draw(input, clock));
            if clock.index >= 2 {
                Flow::Stop
            } else {
                Flow::Continue
            }
        });

        let mut index = 0;
        while handle.is_active() {
            frames.pump(FrameClock::at_rate(index, 30));
            index += 1;
        }
        assert_eq!(index, 3);
        assert!(frames.is_idle());
        assert_eq!(frames.pump(FrameClock::at_rate(index, 30)), 0);
    }

    assert_eq!(modes, vec![FrameMode::Live; 3]);
    // 1 kHz lands in bin 128, which bar 16 reads at stride 8
    assert!(peak.0 > peak.1, "tone bar {} vs high bar {}", peak.0, peak.1);
}

#[test]
fn circular_without_source_idles_and_keeps_turning() {
    let options = CircularOptions::default();
    let speed = options.rotation_speed;
    let mut view = CircularSpectrum::new(600.0, 400.0, 1.0, options).unwrap();
    assert_eq!(view.surface().pixel_width(), 400);

    for index in 0..4 {
        let clock = FrameClock::at_rate(index, 30);
        let input = FrameInput::from_source(None, true);
        assert_eq!(LiveView::draw(&mut view, input, &clock), FrameMode::Idle);
    }
    assert!((view.rotation().angle() - 4.0 * speed * 0.5).abs() < 1e-6);

    for bar in view.bars(FrameInput::Idle, 1.25) {
        let length = ((bar.outer.x - bar.inner.x).powi(2) + (bar.outer.y - bar.inner.y).powi(2)).sqrt();
        assert!((10.0 - 1e-3..=30.0 + 1e-3).contains(&length), "idle bar {} is {}", bar.index, length);
    }
}

#[test]
fn live_views_survive_resize() {
    let mut view = SpectrumBars::new(320.0, 180.0, 1.0, SpectrumOptions::default()).unwrap();
    LiveView::resize(&mut view, 160.0, 90.0, 2.0).unwrap();
    assert_eq!(view.surface().pixel_width(), 320);
    let mode = view.draw(FrameInput::Idle, &FrameClock::new(0, Duration::ZERO));
    assert_eq!(mode, FrameMode::Idle);
    assert!(LiveView::resize(&mut view, -1.0, 90.0, 1.0).is_err());
}
