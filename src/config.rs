use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sonoscope::audio::analyser::AnalyserConfig;
use sonoscope::viz::amplitude::ChartOptions;
use sonoscope::viz::circular::CircularOptions;
use sonoscope::viz::spectrum::SpectrumOptions;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analyser: AnalyserSection,
    #[serde(default)]
    pub spectrum: SpectrumSection,
    #[serde(default)]
    pub circular: CircularSection,
    #[serde(default)]
    pub chart: ChartSection,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_dpr")]
    pub dpr: f32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    /// TTF used for chart labels instead of the bundled font
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyserSection {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
}

#[derive(Debug, Deserialize)]
pub struct SpectrumSection {
    #[serde(default = "default_spectrum_bars")]
    pub bar_count: usize,
    #[serde(default = "default_bar_spacing")]
    pub spacing: f32,
    #[serde(default = "default_spectrum_glow")]
    pub glow: f32,
}

#[derive(Debug, Deserialize)]
pub struct CircularSection {
    #[serde(default = "default_circular_bars")]
    pub bar_count: usize,
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
    #[serde(default = "default_circular_glow")]
    pub glow: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChartSection {
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
    #[serde(default = "default_dpr")]
    pub cache_dpr: f32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            dpr: default_dpr(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
            font: None,
        }
    }
}

impl Default for AnalyserSection {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
        }
    }
}

impl Default for SpectrumSection {
    fn default() -> Self {
        Self {
            bar_count: default_spectrum_bars(),
            spacing: default_bar_spacing(),
            glow: default_spectrum_glow(),
        }
    }
}

impl Default for CircularSection {
    fn default() -> Self {
        Self {
            bar_count: default_circular_bars(),
            rotation_speed: default_rotation_speed(),
            glow: default_circular_glow(),
        }
    }
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
            cache_dpr: default_dpr(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl AnalyserSection {
    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.fft_size,
            smoothing: self.smoothing,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
        }
    }
}

impl SpectrumSection {
    pub fn options(&self) -> SpectrumOptions {
        SpectrumOptions {
            bar_count: self.bar_count,
            spacing: self.spacing,
            glow: self.glow,
            ..SpectrumOptions::default()
        }
    }
}

impl CircularSection {
    pub fn options(&self) -> CircularOptions {
        CircularOptions {
            bar_count: self.bar_count,
            rotation_speed: self.rotation_speed,
            glow: self.glow,
            ..CircularOptions::default()
        }
    }
}

impl ChartSection {
    pub fn options(&self) -> ChartOptions {
        ChartOptions {
            cache_dpr: self.cache_dpr,
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_dpr() -> f32 { 1.0 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }
fn default_fft_size() -> usize { 1024 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_decibels() -> f32 { -90.0 }
fn default_max_decibels() -> f32 { -10.0 }
fn default_spectrum_bars() -> usize { 64 }
fn default_bar_spacing() -> f32 { 2.0 }
fn default_spectrum_glow() -> f32 { 15.0 }
fn default_circular_bars() -> usize { 128 }
fn default_rotation_speed() -> f32 { 0.001 }
fn default_circular_glow() -> f32 { 20.0 }
fn default_chart_width() -> u32 { 1000 }
fn default_chart_height() -> u32 { 300 }
fn default_debounce_ms() -> u64 { 50 }

/// Explicit path, then ./sonoscope.toml, then the per-user config files.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("sonoscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("sonoscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("sonoscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
