//! 区域颜色识别
//!
//! 在区域内按 `stride` 间隔取种子点，种子命中某颜色阈值时以全分辨率做
//! 四连通洪水填充得到色块；像素数不少于 `pixels_threshold` 的色块参与比较，
//! 最大色块的颜色即识别结果。每种颜色独立搜索，阈值允许重叠。

use crate::color::{ColorLabel, ColorThresholds, Lab};
use crate::config::VisionConfig;
use crate::frame::{Frame, Region};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// 默认种子间隔（像素）
pub const DEFAULT_STRIDE: usize = 10;
/// 默认最小色块像素数
pub const DEFAULT_PIXELS_THRESHOLD: usize = 50;

/// 一个连通色块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    pub label: ColorLabel,
    /// 像素数
    pub pixels: usize,
    /// 外接矩形（帧坐标）
    pub bounds: Region,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    region: Region,
    thresholds: ColorThresholds,
    stride: usize,
    pixels_threshold: usize,
}

impl Classifier {
    pub fn new(region: Region, thresholds: ColorThresholds) -> Self {
        Self {
            region,
            thresholds,
            stride: DEFAULT_STRIDE,
            pixels_threshold: DEFAULT_PIXELS_THRESHOLD,
        }
    }

    pub fn from_config(config: &VisionConfig) -> Self {
        Self::new(config.region, config.thresholds)
            .with_stride(config.stride)
            .with_pixels_threshold(config.pixels_threshold)
    }

    /// 种子间隔，0 按 1 处理
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride.max(1);
        self
    }

    pub fn with_pixels_threshold(mut self, pixels_threshold: usize) -> Self {
        self.pixels_threshold = pixels_threshold;
        self
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// 识别区域内的颜色；没有足够大的色块时返回 `None`
    pub fn classify(&self, frame: &Frame) -> Option<ColorLabel> {
        let mut largest: Option<Blob> = None;
        for blob in self.find_blobs(frame) {
            // 严格大于：像素数相同时保留先找到的（按 Red / Green / Blue 顺序）
            if largest.is_none_or(|best| blob.pixels > best.pixels) {
                largest = Some(blob);
            }
        }

        match largest {
            Some(blob) => {
                debug!(
                    "Detected {} blob: {} px at ({}, {})",
                    blob.label, blob.pixels, blob.bounds.x, blob.bounds.y
                );
                Some(blob.label)
            },
            None => {
                debug!("No blob above {} px in region", self.pixels_threshold);
                None
            },
        }
    }

    /// 所有达到像素阈值的色块，按颜色顺序、扫描顺序排列
    pub fn find_blobs(&self, frame: &Frame) -> Vec<Blob> {
        let Some(roi) = self.region.clip(frame.width(), frame.height()) else {
            debug!("Region {:?} lies outside the {}x{} frame", self.region, frame.width(), frame.height());
            return Vec::new();
        };

        let labs: Vec<Lab> = (roi.y..roi.y + roi.height)
            .flat_map(|y| (roi.x..roi.x + roi.width).map(move |x| (x, y)))
            .map(|(x, y)| Lab::from_rgb(frame.pixel(x, y).unwrap_or_default()))
            .collect();

        let mut blobs = Vec::new();
        for label in ColorLabel::ALL {
            let threshold = self.thresholds.get(label);
            let mask: Vec<bool> = labs.iter().map(|&lab| threshold.contains(lab)).collect();
            let mut visited = vec![false; mask.len()];

            for sy in (0..roi.height).step_by(self.stride) {
                for sx in (0..roi.width).step_by(self.stride) {
                    let index = sy * roi.width + sx;
                    if !mask[index] || visited[index] {
                        continue;
                    }
                    let (pixels, bounds) = flood_fill(&mask, &mut visited, roi.width, roi.height, sx, sy);
                    trace!("{} seed ({}, {}) -> {} px", label, sx, sy, pixels);
                    if pixels >= self.pixels_threshold {
                        blobs.push(Blob {
                            label,
                            pixels,
                            bounds: Region::new(
                                roi.x + bounds.x,
                                roi.y + bounds.y,
                                bounds.width,
                                bounds.height,
                            ),
                        });
                    }
                }
            }
        }
        blobs
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Region::default(), ColorThresholds::default())
    }
}

/// 四连通填充，返回像素数和区域内坐标的外接矩形
fn flood_fill(
    mask: &[bool],
    visited: &mut [bool],
    width: usize,
    height: usize,
    sx: usize,
    sy: usize,
) -> (usize, Region) {
    let mut queue = VecDeque::new();
    visited[sy * width + sx] = true;
    queue.push_back((sx, sy));

    let (mut min_x, mut max_x, mut min_y, mut max_y) = (sx, sx, sy, sy);
    let mut pixels = 0;

    while let Some((x, y)) = queue.pop_front() {
        pixels += 1;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            if nx >= width || ny >= height {
                continue;
            }
            let index = ny * width + nx;
            if mask[index] && !visited[index] {
                visited[index] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    (
        pixels,
        Region::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
    )
}
