pub mod ffmpeg_frame_source;
pub mod image_loader;
pub mod image_sequence_source;
pub mod latest_frame_source;
