pub mod parallel_frame_processor;
pub mod swap_session_factory;
