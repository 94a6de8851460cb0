/// Multi-class YOLO detector (Ultralytics export) on ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, per-class NMS and mapping
/// class ids to the configured label vocabulary.
use std::path::Path;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::execution_providers;

/// Fallback input resolution when the model input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Number of box values (cx, cy, w, h) preceding the class scores in each row.
const BOX_VALUES: usize = 4;

/// YOLO object detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    class_names: Vec<String>,
    iou_threshold: f32,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Loads a YOLO ONNX model.
    ///
    /// `class_names` maps class ids to labels in model order. The input
    /// resolution is read from the model's NCHW input shape, falling back
    /// to 640 when it is dynamic.
    pub fn new(
        model_path: &Path,
        class_names: Vec<String>,
        iou_threshold: f32,
        accelerate: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(execution_providers(accelerate))?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded detector {} ({} classes, input {input_size}px)",
            model_path.display(),
            class_names.len()
        );

        Ok(Self {
            session,
            class_names,
            iou_threshold,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw = decode_predictions(data, &shape, confidence_threshold, &letterbox)?;
        let kept = nms(&mut raw, self.iou_threshold);

        Ok(kept
            .into_iter()
            .map(|d| {
                let bbox = clip_to_frame(d.bbox, frame.width(), frame.height());
                Detection::new(label_for(&self.class_names, d.class_id), d.confidence, bbox)
            })
            .collect())
    }
}

fn label_for(class_names: &[String], class_id: usize) -> String {
    class_names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{class_id}"))
}

fn clip_to_frame(b: BoundingBox, width: u32, height: u32) -> BoundingBox {
    let (w, h) = (width as f32, height as f32);
    BoundingBox::new(
        b.x1.clamp(0.0, w),
        b.y1.clamp(0.0, h),
        b.x2.clamp(0.0, w),
        b.y2.clamp(0.0, h),
    )
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Scale and padding applied by [`letterbox`], needed to map boxes back.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f32,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn unmap(&self, b: BoundingBox) -> BoundingBox {
        let (px, py) = (self.pad_x as f32, self.pad_y as f32);
        BoundingBox::new(
            (b.x1 - px) / self.scale,
            (b.y1 - py) / self.scale,
            (b.x2 - px) / self.scale,
            (b.y2 - py) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size` NCHW float32.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let target = target_size as f32;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // YOLO pads with 114 gray.
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

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

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    bbox: BoundingBox,
    class_id: usize,
    confidence: f32,
}

/// Parses a `[1, 4 + classes, N]` (or `[1, N, 4 + classes]`) output into
/// frame-space detections scoring at least `threshold`.
fn decode_predictions(
    data: &[f32],
    shape: &[usize],
    threshold: f32,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    // Ultralytics exports features-first; anchors always outnumber features.
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= BOX_VALUES {
        return Err(format!("YOLO output has no class scores: {shape:?}"));
    }
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        ));
    }

    let value = |det: usize, feat: usize| {
        if transposed {
            data[feat * num_dets + det]
        } else {
            data[det * num_feats + feat]
        }
    };

    let mut dets = Vec::new();
    for i in 0..num_dets {
        let (class_id, confidence) = (BOX_VALUES..num_feats)
            .map(|f| (f - BOX_VALUES, value(i, f)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if confidence < threshold {
            continue;
        }
        let bbox = BoundingBox::from_center(value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        dets.push(RawDetection {
            bbox: letterbox.unmap(bbox),
            class_id,
            confidence,
        });
    }
    Ok(dets)
}

/// Greedy per-class NMS: sort by confidence, suppress same-class overlaps.
fn nms(dets: &mut [RawDetection], iou_thresh: f32) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if dets[i].bbox.iou(&dets[j].bbox) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
