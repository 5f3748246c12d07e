pub mod face_swapper;
pub mod frame_swapper;
