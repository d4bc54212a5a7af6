//! Audio-to-geometry visualization core: a cached full-track amplitude chart,
//! a live frequency-bar spectrum and a rotating circular spectrum, plus the
//! host-pumped scheduling they run under.

pub mod audio;
pub mod render;
pub mod schedule;
pub mod viz;
