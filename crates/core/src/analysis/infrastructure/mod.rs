pub mod arcface_embedder;
pub mod onnx_yolo_face_detector;
