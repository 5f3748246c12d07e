pub mod analyse_target_use_case;
pub mod frame_processor;
pub mod infrastructure;
pub mod pipeline_error;
pub mod progress;
pub mod run_summary;
pub mod swap_image_use_case;
pub mod swap_request;
pub mod swap_session;
pub mod swap_video_use_case;

#[cfg(test)]
pub(crate) mod test_support;
