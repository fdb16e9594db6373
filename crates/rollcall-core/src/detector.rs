//! Staged cascade face detector.
//!
//! Evaluates a pre-trained cascade of weighted rectangular intensity features
//! over a sliding window, using integral images for constant-time region sums
//! and per-window variance normalization. Candidate windows are scanned across
//! a scale pyramid and merged by rectangle grouping.

use crate::types::FaceRegion;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const DEFAULT_SCALE_FACTOR: f32 = 1.1;
const DEFAULT_MIN_NEIGHBORS: u32 = 3;
const DEFAULT_MIN_SIZE: u32 = 30;
/// Relative tolerance when deciding whether two raw hits belong to the same
/// grouped region.
const GROUP_EPS: f32 = 0.2;
/// Variance floor: flat windows would otherwise divide by a near-zero stddev.
const MIN_WINDOW_VARIANCE: f64 = 1.0;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("cascade model not found: {0} — point ROLLCALL_MODEL or --model at a cascade JSON file")]
    ModelNotFound(String),
    #[error("failed to read cascade model: {0}")]
    ModelRead(#[from] std::io::Error),
    #[error("failed to parse cascade model: {0}")]
    ModelParse(#[from] serde_json::Error),
    #[error("invalid cascade model: {0}")]
    ModelInvalid(String),
}

/// Scan parameters for one `detect` call.
#[derive(Debug, Clone)]
pub struct DetectParams {
    /// Window growth factor between pyramid levels.
    pub scale_factor: f32,
    /// Minimum merged hits for a region to survive grouping.
    pub min_neighbors: u32,
    /// Minimum window side length in pixels; smaller scales are skipped.
    pub min_size: u32,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

/// One weighted rectangle of a feature, in base-window coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f32,
}

/// A decision stump: feature value against a variance-scaled threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct WeakClassifier {
    pub feature: Vec<FeatureRect>,
    pub threshold: f32,
    pub pass_value: f32,
    pub fail_value: f32,
}

/// One rejection stage: the sum of stump votes must reach the stage threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct Stage {
    pub threshold: f32,
    pub classifiers: Vec<WeakClassifier>,
}

/// On-disk cascade description, deserialized from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CascadeModel {
    pub name: String,
    pub window_width: u32,
    pub window_height: u32,
    pub stages: Vec<Stage>,
}

/// Cascade-based face detector.
#[derive(Debug)]
pub struct CascadeDetector {
    model: CascadeModel,
}

impl CascadeDetector {
    /// Load a cascade model from a JSON file.
    pub fn load(model_path: &Path) -> Result<Self, DetectorError> {
        if !model_path.exists() {
            return Err(DetectorError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let raw = std::fs::read_to_string(model_path)?;
        let model: CascadeModel = serde_json::from_str(&raw)?;

        tracing::info!(
            path = %model_path.display(),
            name = %model.name,
            stages = model.stages.len(),
            window = format!("{}x{}", model.window_width, model.window_height),
            "loaded cascade model"
        );

        Self::from_model(model)
    }

    /// Build a detector from an already-parsed model, validating its geometry.
    pub fn from_model(model: CascadeModel) -> Result<Self, DetectorError> {
        if model.window_width == 0 || model.window_height == 0 {
            return Err(DetectorError::ModelInvalid(
                "base window must be non-empty".into(),
            ));
        }
        if model.stages.is_empty() {
            return Err(DetectorError::ModelInvalid("model has no stages".into()));
        }
        for (si, stage) in model.stages.iter().enumerate() {
            for wc in &stage.classifiers {
                for r in &wc.feature {
                    if r.x + r.width > model.window_width || r.y + r.height > model.window_height {
                        return Err(DetectorError::ModelInvalid(format!(
                            "stage {si}: feature rect {}x{}+{}+{} exceeds the {}x{} base window",
                            r.width, r.height, r.x, r.y, model.window_width, model.window_height
                        )));
                    }
                }
            }
        }
        Ok(Self { model })
    }

    /// Detect faces in a grayscale frame.
    ///
    /// Returns grouped regions ordered strongest-first (most merged hits).
    /// Zero detections is an ordinary empty result; this never fails.
    pub fn detect(
        &self,
        frame: &[u8],
        width: u32,
        height: u32,
        params: &DetectParams,
    ) -> Vec<FaceRegion> {
        let w = width as usize;
        let h = height as usize;
        if frame.len() < w * h || w == 0 || h == 0 {
            tracing::warn!(
                expected = w * h,
                actual = frame.len(),
                "frame buffer shorter than its dimensions; skipping detection"
            );
            return Vec::new();
        }

        let integral = IntegralImage::new(frame, w, h);
        let mut hits = Vec::new();

        let base_w = self.model.window_width as f32;
        let base_h = self.model.window_height as f32;
        let min_size = params.min_size as usize;

        let mut scale = 1.0f32;
        loop {
            let win_w = (base_w * scale).round() as usize;
            let win_h = (base_h * scale).round() as usize;
            if win_w > w || win_h > h {
                break;
            }

            if win_w >= min_size && win_h >= min_size {
                let step = (scale.round() as usize).max(1);
                for y in (0..=h - win_h).step_by(step) {
                    for x in (0..=w - win_w).step_by(step) {
                        if self.eval_window(&integral, x, y, scale, win_w, win_h) {
                            hits.push(Hit {
                                x: x as u32,
                                y: y as u32,
                                width: win_w as u32,
                                height: win_h as u32,
                            });
                        }
                    }
                }
            }

            scale *= params.scale_factor;
        }

        let mut regions = group_regions(&hits, params.min_neighbors);
        regions.sort_by(|a, b| b.neighbors.cmp(&a.neighbors));

        tracing::debug!(
            raw_hits = hits.len(),
            regions = regions.len(),
            "cascade scan complete"
        );

        regions
    }

    /// Run every stage against one window; true if all stages accept.
    fn eval_window(
        &self,
        integral: &IntegralImage,
        x: usize,
        y: usize,
        scale: f32,
        win_w: usize,
        win_h: usize,
    ) -> bool {
        let area = (win_w * win_h) as f64;
        let inv_area = 1.0 / area;

        let mean = integral.rect_sum(x, y, win_w, win_h) as f64 * inv_area;
        let variance =
            (integral.sq_rect_sum(x, y, win_w, win_h) as f64 * inv_area - mean * mean)
                .max(MIN_WINDOW_VARIANCE);
        let stddev = variance.sqrt();

        for stage in &self.model.stages {
            let mut votes = 0.0f64;
            for wc in &stage.classifiers {
                let mut feature = 0.0f64;
                for r in &wc.feature {
                    // Scale the rect into window coordinates; rounding may
                    // drift a pixel past the window edge, so clamp.
                    let rx = x + (r.x as f32 * scale).round() as usize;
                    let ry = y + (r.y as f32 * scale).round() as usize;
                    let rw = ((r.width as f32 * scale).round() as usize)
                        .min((x + win_w).saturating_sub(rx));
                    let rh = ((r.height as f32 * scale).round() as usize)
                        .min((y + win_h).saturating_sub(ry));
                    if rw == 0 || rh == 0 {
                        continue;
                    }
                    feature += r.weight as f64 * integral.rect_sum(rx, ry, rw, rh) as f64;
                }
                let value = feature * inv_area;
                votes += if value >= wc.threshold as f64 * stddev {
                    wc.pass_value as f64
                } else {
                    wc.fail_value as f64
                };
            }
            if votes < stage.threshold as f64 {
                return false;
            }
        }

        true
    }
}

/// Raw ungrouped window hit.
#[derive(Debug, Clone, Copy)]
struct Hit {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Summed-area tables over pixel values and squared pixel values.
///
/// Both tables are `(width + 1) x (height + 1)` with a zero border so rect
/// sums need no edge special-casing.
struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl IntegralImage {
    fn new(gray: &[u8], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sum = vec![0u64; stride * (height + 1)];
        let mut sq_sum = vec![0u64; stride * (height + 1)];

        for y in 0..height {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..width {
                let p = gray[y * width + x] as u64;
                row += p;
                row_sq += p * p;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = sum[idx - stride] + row;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self { stride, sum, sq_sum }
    }

    fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        rect_lookup(&self.sum, self.stride, x, y, w, h)
    }

    fn sq_rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        rect_lookup(&self.sq_sum, self.stride, x, y, w, h)
    }
}

fn rect_lookup(table: &[u64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> u64 {
    let a = table[y * stride + x];
    let b = table[y * stride + x + w];
    let c = table[(y + h) * stride + x];
    let d = table[(y + h) * stride + x + w];
    d + a - b - c
}

/// Merge raw hits into grouped regions, dropping groups with fewer than
/// `min_neighbors` members. The surviving region is the member average.
fn group_regions(hits: &[Hit], min_neighbors: u32) -> Vec<FaceRegion> {
    struct Cluster {
        rep: Hit,
        sum_x: u64,
        sum_y: u64,
        sum_w: u64,
        sum_h: u64,
        count: u32,
    }

    let mut clusters: Vec<Cluster> = Vec::new();

    for &hit in hits {
        match clusters.iter_mut().find(|c| similar(&c.rep, &hit)) {
            Some(c) => {
                c.sum_x += hit.x as u64;
                c.sum_y += hit.y as u64;
                c.sum_w += hit.width as u64;
                c.sum_h += hit.height as u64;
                c.count += 1;
            }
            None => clusters.push(Cluster {
                rep: hit,
                sum_x: hit.x as u64,
                sum_y: hit.y as u64,
                sum_w: hit.width as u64,
                sum_h: hit.height as u64,
                count: 1,
            }),
        }
    }

    clusters
        .into_iter()
        .filter(|c| c.count >= min_neighbors)
        .map(|c| {
            let n = c.count as u64;
            FaceRegion {
                x: (c.sum_x / n) as u32,
                y: (c.sum_y / n) as u32,
                width: (c.sum_w / n) as u32,
                height: (c.sum_h / n) as u32,
                neighbors: c.count,
            }
        })
        .collect()
}

/// Two hits are similar when their corners agree within a fraction of their
/// smaller side lengths.
fn similar(a: &Hit, b: &Hit) -> bool {
    let delta = GROUP_EPS * 0.5 * (a.width.min(b.width) + a.height.min(b.height)) as f32;
    let close = |p: u32, q: u32| (p as f32 - q as f32).abs() <= delta;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.width, b.x + b.width)
        && close(a.y + a.height, b.y + b.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single-stage cascade over an 8x8 window: one full-window feature whose
    /// stump passes when the window mean reaches `threshold * stddev`.
    fn uniform_model(threshold: f32) -> CascadeModel {
        CascadeModel {
            name: "test".into(),
            window_width: 8,
            window_height: 8,
            stages: vec![Stage {
                threshold: 0.5,
                classifiers: vec![WeakClassifier {
                    feature: vec![FeatureRect {
                        x: 0,
                        y: 0,
                        width: 8,
                        height: 8,
                        weight: 1.0,
                    }],
                    threshold,
                    pass_value: 1.0,
                    fail_value: -1.0,
                }],
            }],
        }
    }

    fn hit(x: u32, y: u32, w: u32, h: u32) -> Hit {
        Hit { x, y, width: w, height: h }
    }

    #[test]
    fn test_integral_rect_sums() {
        // 4x4 frame, values 1..=16 row-major
        let frame: Vec<u8> = (1..=16).collect();
        let ii = IntegralImage::new(&frame, 4, 4);

        assert_eq!(ii.rect_sum(0, 0, 4, 4), (1..=16u64).sum::<u64>());
        assert_eq!(ii.rect_sum(0, 0, 1, 1), 1);
        assert_eq!(ii.rect_sum(3, 3, 1, 1), 16);
        // interior 2x2 block: 6 + 7 + 10 + 11
        assert_eq!(ii.rect_sum(1, 1, 2, 2), 34);
    }

    #[test]
    fn test_integral_squared_sums() {
        let frame = vec![3u8; 4];
        let ii = IntegralImage::new(&frame, 2, 2);
        assert_eq!(ii.sq_rect_sum(0, 0, 2, 2), 4 * 9);
    }

    #[test]
    fn test_group_requires_min_neighbors() {
        // Three overlapping hits and one far away
        let hits = vec![
            hit(10, 10, 30, 30),
            hit(11, 10, 30, 30),
            hit(10, 12, 30, 30),
            hit(200, 200, 30, 30),
        ];

        let regions = group_regions(&hits, 3);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].neighbors, 3);
        // averaged position
        assert_eq!(regions[0].x, 10);
        assert_eq!(regions[0].width, 30);
    }

    #[test]
    fn test_group_keeps_singletons_when_allowed() {
        let hits = vec![hit(10, 10, 30, 30), hit(200, 200, 30, 30)];
        let regions = group_regions(&hits, 1);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_regions(&[], 3).is_empty());
    }

    #[test]
    fn test_detect_bright_uniform_frame() {
        let detector = CascadeDetector::from_model(uniform_model(0.0)).unwrap();
        let frame = vec![200u8; 32 * 32];
        let params = DetectParams {
            scale_factor: 1.1,
            min_neighbors: 1,
            min_size: 8,
        };

        let regions = detector.detect(&frame, 32, 32, &params);
        assert!(!regions.is_empty(), "permissive cascade should fire");
        assert!(regions[0].width >= 8);
        // strongest-first ordering
        for pair in regions.windows(2) {
            assert!(pair[0].neighbors >= pair[1].neighbors);
        }
    }

    #[test]
    fn test_detect_rejecting_cascade() {
        // Uniform frame has stddev 1 (floored) and mean 200; a stump
        // threshold of 300 can never be reached.
        let detector = CascadeDetector::from_model(uniform_model(300.0)).unwrap();
        let frame = vec![200u8; 64 * 64];
        let regions = detector.detect(&frame, 64, 64, &DetectParams::default());
        assert!(regions.is_empty());
    }

    #[test]
    fn test_detect_min_size_excludes_small_frames() {
        let detector = CascadeDetector::from_model(uniform_model(0.0)).unwrap();
        let frame = vec![200u8; 20 * 20];
        // Default min size is 30x30 — no window in a 20x20 frame qualifies.
        let regions = detector.detect(&frame, 20, 20, &DetectParams::default());
        assert!(regions.is_empty());
    }

    #[test]
    fn test_detect_short_buffer_is_empty_result() {
        let detector = CascadeDetector::from_model(uniform_model(0.0)).unwrap();
        let regions = detector.detect(&[0u8; 10], 64, 64, &DetectParams::default());
        assert!(regions.is_empty());
    }

    #[test]
    fn test_load_missing_model() {
        let err = CascadeDetector::load(Path::new("/nonexistent/cascade.json")).unwrap_err();
        assert!(matches!(err, DetectorError::ModelNotFound(_)));
    }

    #[test]
    fn test_model_parse_error() {
        let result: Result<CascadeModel, _> = serde_json::from_str("{not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_model_validation_rejects_oversized_feature() {
        let mut model = uniform_model(0.0);
        model.stages[0].classifiers[0].feature[0].width = 20;
        let err = CascadeDetector::from_model(model).unwrap_err();
        assert!(matches!(err, DetectorError::ModelInvalid(_)));
    }

    #[test]
    fn test_model_validation_rejects_empty_stages() {
        let model = CascadeModel {
            name: "empty".into(),
            window_width: 8,
            window_height: 8,
            stages: vec![],
        };
        assert!(matches!(
            CascadeDetector::from_model(model),
            Err(DetectorError::ModelInvalid(_))
        ));
    }

    #[test]
    fn test_model_json_roundtrip_shape() {
        let json = r#"{
            "name": "frontalface",
            "window_width": 24,
            "window_height": 24,
            "stages": [
                {
                    "threshold": 0.8,
                    "classifiers": [
                        {
                            "feature": [
                                { "x": 0, "y": 0, "width": 24, "height": 12, "weight": 1.0 },
                                { "x": 0, "y": 12, "width": 24, "height": 12, "weight": -1.0 }
                            ],
                            "threshold": 0.02,
                            "pass_value": 1.0,
                            "fail_value": -0.5
                        }
                    ]
                }
            ]
        }"#;

        let model: CascadeModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.window_width, 24);
        assert_eq!(model.stages[0].classifiers[0].feature.len(), 2);
        assert!(CascadeDetector::from_model(model).is_ok());
    }
}
