//! ArcFace identity embeddings via ONNX Runtime.
use std::path::Path;
use std::sync::Mutex;

use crate::analysis::domain::face_embedder::FaceEmbedder;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::open_shared_session;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: open_shared_session(model_path)?,
        })
    }
}

impl FaceEmbedder for ArcFaceEmbedder {
    fn embed(&self, face_crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
        if face_crop.is_empty() {
            return Err("Cannot embed an empty face crop".into());
        }
        let tensor = preprocess(face_crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let values = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        Ok(Embedding::new(values))
    }
}

/// Resize to 112x112 (nearest, pixel centres), scale to `[-1, 1]`, NCHW.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src = crop.as_ndarray();
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}
