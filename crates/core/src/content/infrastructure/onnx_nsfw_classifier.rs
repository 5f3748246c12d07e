//! open-NSFW classifier via ONNX Runtime.
use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;

use crate::content::domain::content_classifier::ContentClassifier;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::open_shared_session;

const RESIZE_TO: u32 = 256;
const INPUT_SIZE: u32 = 224;
/// Per-channel BGR means subtracted before inference.
const BGR_MEAN: [f32; 3] = [104.0, 117.0, 123.0];

pub struct OnnxNsfwClassifier {
    session: Mutex<ort::session::Session>,
}

impl OnnxNsfwClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: open_shared_session(model_path)?,
        })
    }
}

impl ContentClassifier for OnnxNsfwClassifier {
    fn nsfw_probability(&self, frame: &Frame) -> Result<f32, Box<dyn std::error::Error>> {
        let image = frame.to_rgb_image().ok_or("NSFW check needs an RGB frame")?;
        let input_value = ort::value::Tensor::from_array(preprocess(&image))?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let scores = outputs[0].try_extract_array::<f32>()?;
        let scores = scores.as_slice().ok_or("Cannot get NSFW score slice")?;
        // [sfw, nsfw]
        scores
            .get(1)
            .copied()
            .ok_or_else(|| "NSFW model returned fewer than two scores".into())
    }
}

/// Resize to 256x256, centre-crop 224x224, BGR minus mean, NHWC.
fn preprocess(image: &image::RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        RESIZE_TO,
        RESIZE_TO,
        image::imageops::FilterType::Triangle,
    );
    let offset = (RESIZE_TO - INPUT_SIZE) / 2;
    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let pixel = resized.get_pixel(x + offset, y + offset);
            for (c, mean) in BGR_MEAN.iter().enumerate() {
                tensor[[0, y as usize, x as usize, c]] = pixel[2 - c] as f32 - mean;
            }
        }
    }
    tensor
}
