pub mod content_classifier;
pub mod nsfw_filter;
