pub mod amplitude;
pub mod analyser;
pub mod buffer;
pub mod decode;
pub mod features;
pub mod window;
