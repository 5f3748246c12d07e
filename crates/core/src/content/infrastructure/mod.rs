pub mod onnx_nsfw_classifier;
