pub mod key;
pub mod postprocess;
pub mod score;
