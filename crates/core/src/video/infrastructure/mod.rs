pub mod ffmpeg_frame_extractor;
pub mod ffmpeg_video_assembler;
pub mod image_file_reader;
pub mod image_file_writer;
pub mod temp_workspace;
