pub mod cluster;
pub mod default_face_selector;
pub mod frame_mapper;
pub mod frame_record;
pub mod mapping_table;
