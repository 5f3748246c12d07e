//! YOLO face detector on ONNX Runtime: letterbox, inference, NMS.
use std::path::Path;
use std::sync::Mutex;

use crate::analysis::domain::face_detector::{FaceCandidate, FaceDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::open_shared_session;

/// Used when the model's input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// 5 landmarks of (x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

const KEYPOINT_CONF_THRESH: f32 = 0.5;

/// Letterbox padding value, YOLO convention.
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloFaceDetector {
    session: Mutex<ort::session::Session>,
    confidence: f32,
    input_size: u32,
}

impl OnnxYoloFaceDetector {
    /// Loads the model and reads its square input size from the NCHW input
    /// shape, falling back to 640.
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_shared_session(model_path)?;
        let input_size = {
            let guard = session
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            let size = guard
                .inputs()
                .first()
                .and_then(|input| match input.dtype() {
                    ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                        Some(shape[2] as u32)
                    }
                    _ => None,
                })
                .unwrap_or(DEFAULT_INPUT_SIZE);
            size
        };

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloFaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        // [1, features, detections] when transposed, else [1, detections, features]
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(candidate) = parse_row(&row, self.confidence, &letterboxed.transform) {
                candidates.push(candidate);
            }
        }

        Ok(nms(candidates, NMS_IOU_THRESH))
    }
}

/// Maps letterboxed model coordinates back to frame coordinates.
#[derive(Clone, Copy, Debug)]
struct LetterboxTransform {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl LetterboxTransform {
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    transform: LetterboxTransform,
}

/// Row layout: `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_row(row: &[f32], confidence: f32, transform: &LetterboxTransform) -> Option<FaceCandidate> {
    if row.len() < 5 || row[4] < confidence {
        return None;
    }
    let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
    let (x1, y1) = transform.unmap(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = transform.unmap(cx + w / 2.0, cy + h / 2.0);

    let keypoints = (row.len() >= 5 + NUM_KEYPOINT_VALUES).then(|| {
        let mut pts = [(0.0f32, 0.0f32); 5];
        for (k, pt) in pts.iter_mut().enumerate() {
            let base = 5 + k * 3;
            if row[base + 2] >= KEYPOINT_CONF_THRESH {
                *pt = transform.unmap(row[base], row[base + 1]);
            }
        }
        pts
    });

    Some(FaceCandidate {
        bbox: BoundingBox::new(x1, y1, x2, y2),
        score: row[4],
        keypoints,
    })
}

/// Resizes into a `target_size` square, keeping aspect ratio, padded grey.
/// Output is NCHW in `[0, 1]`.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let target = target_size as f32;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let size = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f32 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f32 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        transform: LetterboxTransform {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    }
}

/// Greedy NMS, highest score first.
fn nms(mut candidates: Vec<FaceCandidate>, iou_thresh: f64) -> Vec<FaceCandidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceCandidate> = Vec::new();
    for candidate in candidates {
        if keep
            .iter()
            .all(|kept| kept.bbox.iou(&candidate.bbox) <= iou_thresh)
        {
            keep.push(candidate);
        }
    }
    keep
}
