pub mod face_analyser;
pub mod face_detector;
pub mod face_embedder;
