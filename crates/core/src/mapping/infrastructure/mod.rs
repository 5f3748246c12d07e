pub mod face_dump;
pub mod manifest;
