//! inswapper-128 face swap model via ONNX Runtime.
use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array2, Array4};

use crate::shared::detected_face::DetectedFace;
use crate::shared::embedding::l2_normalize;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::open_shared_session;
use crate::swapping::domain::face_swapper::FaceSwapper;

const INPUT_SIZE: u32 = 128;
const LATENT_DIM: usize = 512;
/// Square crop side relative to the longer side of the face box.
const CROP_SCALE: f32 = 1.3;

pub struct Inswapper {
    session: Mutex<ort::session::Session>,
    /// Projects an identity embedding into the model's latent space.
    emap: Option<Array2<f32>>,
}

impl Inswapper {
    pub fn new(model_path: &Path, emap: Option<Array2<f32>>) -> Result<Self, Box<dyn std::error::Error>> {
        if emap.is_none() {
            log::warn!("No embedding projection for the swap model; using raw embeddings");
        }
        Ok(Self {
            session: open_shared_session(model_path)?,
            emap,
        })
    }

    fn run(&self, target: Array4<f32>, latent: Array2<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let target_value = ort::value::Tensor::from_array(target)?;
        let source_value = ort::value::Tensor::from_array(latent)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![target_value, source_value])?;
        let swapped = outputs[0].try_extract_array::<f32>()?;
        let values = swapped
            .as_slice()
            .ok_or("Cannot get swap output slice")?
            .to_vec();
        let expected = 3 * (INPUT_SIZE * INPUT_SIZE) as usize;
        if values.len() != expected {
            return Err(format!("Swap model returned {} values, expected {expected}", values.len()).into());
        }
        Ok(values)
    }
}

/// Reads a `512 x 512` little-endian `f32` projection matrix.
pub fn load_emap(path: &Path) -> Result<Array2<f32>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let expected = LATENT_DIM * LATENT_DIM * 4;
    if bytes.len() != expected {
        return Err(format!(
            "{} has {} bytes, expected {expected}",
            path.display(),
            bytes.len()
        )
        .into());
    }
    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(Array2::from_shape_vec((LATENT_DIM, LATENT_DIM), values)?)
}

/// `embedding . emap`, L2-normalised, as a `[1, 512]` batch.
fn source_latent(embedding: &[f32], emap: Option<&Array2<f32>>) -> Result<Array2<f32>, Box<dyn std::error::Error>> {
    if embedding.len() != LATENT_DIM {
        return Err(format!(
            "Source embedding has {} values, expected {LATENT_DIM}",
            embedding.len()
        )
        .into());
    }
    let row = ndarray::ArrayView1::from(embedding);
    let mut latent = match emap {
        Some(m) => row.dot(m).to_vec(),
        None => embedding.to_vec(),
    };
    l2_normalize(&mut latent);
    Ok(Array2::from_shape_vec((1, LATENT_DIM), latent)?)
}

/// RGB crop resized to 128x128, scaled to `[0, 1]`, NCHW.
fn preprocess(crop: &image::RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(crop, INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}

/// NCHW `[0, 1]` model output back to an RGB image.
fn postprocess(values: &[f32]) -> image::RgbImage {
    let size = INPUT_SIZE as usize;
    let plane = size * size;
    image::RgbImage::from_fn(INPUT_SIZE, INPUT_SIZE, |x, y| {
        let i = y as usize * size + x as usize;
        let px = |c: usize| (values[c * plane + i].clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgb([px(0), px(1), px(2)])
    })
}

impl FaceSwapper for Inswapper {
    fn swap(
        &self,
        source: &DetectedFace,
        target: &DetectedFace,
        frame: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let rect = target
            .bbox
            .square_rect(CROP_SCALE, frame.width(), frame.height());
        if rect.is_empty() {
            return Ok(());
        }
        let crop = frame
            .crop(&rect)
            .to_rgb_image()
            .ok_or("Swap target crop is not RGB")?;

        let latent = source_latent(source.embedding.as_slice(), self.emap.as_ref())?;
        let output = self.run(preprocess(&crop), latent)?;

        let swapped = image::imageops::resize(
            &postprocess(&output),
            rect.width,
            rect.height,
            image::imageops::FilterType::Triangle,
        );
        frame.paste(&Frame::from_rgb_image(swapped, frame.index()), rect.x, rect.y);
        Ok(())
    }
}
