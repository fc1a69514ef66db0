pub mod audio;
pub mod separator;
pub mod transcriber;
