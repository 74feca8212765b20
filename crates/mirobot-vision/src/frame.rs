//! 帧与区域
//!
//! 相机输出 QVGA（320x240）RGB565；这里统一解码为 8 位 RGB 像素。

use crate::error::VisionError;
use serde::{Deserialize, Serialize};

/// QVGA 宽度
pub const QVGA_WIDTH: usize = 320;
/// QVGA 高度
pub const QVGA_HEIGHT: usize = 240;

/// 8 位 RGB 像素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 从 RGB565 解码（5/6 位分量扩展到 8 位，高位复制到低位）
    pub fn from_rgb565(value: u16) -> Self {
        let r5 = ((value >> 11) & 0x1f) as u8;
        let g6 = ((value >> 5) & 0x3f) as u8;
        let b5 = (value & 0x1f) as u8;
        Self {
            r: (r5 << 3) | (r5 >> 2),
            g: (g6 << 2) | (g6 >> 4),
            b: (b5 << 3) | (b5 >> 2),
        }
    }
}

/// 矩形区域（像素坐标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 与帧求交；完全在帧外时返回 `None`
    pub fn clip(&self, width: usize, height: usize) -> Option<Region> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Region::new(self.x, self.y, w, h))
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl Default for Region {
    /// QVGA 画面中央偏下的 70x70 取料工位
    fn default() -> Self {
        Region::new(145, 145, 70, 70)
    }
}

/// 一帧图像（行优先）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Frame {
    /// 用同一颜色填充的帧
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, VisionError> {
        if frame_len(width, height, 1) != Some(pixels.len()) {
            return Err(VisionError::FrameSize {
                width,
                height,
                expected: frame_len(width, height, 3).unwrap_or(usize::MAX),
                actual: pixels.len().saturating_mul(3),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 解码大端 RGB565 原始数据（每像素 2 字节）
    pub fn from_rgb565(bytes: &[u8], width: usize, height: usize) -> Result<Self, VisionError> {
        check_len(bytes, width, height, 2)?;
        let pixels = bytes
            .chunks_exact(2)
            .map(|px| Rgb::from_rgb565(u16::from_be_bytes([px[0], px[1]])))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 解码 RGB888 原始数据（每像素 3 字节）
    pub fn from_rgb888(bytes: &[u8], width: usize, height: usize) -> Result<Self, VisionError> {
        check_len(bytes, width, height, 3)?;
        let pixels = bytes
            .chunks_exact(3)
            .map(|px| Rgb::new(px[0], px[1], px[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 越界时返回 `None`
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// 将区域内（与帧求交后）所有像素设为同一颜色
    pub fn fill_region(&mut self, region: Region, color: Rgb) {
        let Some(region) = region.clip(self.width, self.height) else {
            return;
        };
        for y in region.y..region.y + region.height {
            let row = y * self.width;
            for x in region.x..region.x + region.width {
                self.pixels[row + x] = color;
            }
        }
    }
}

/// `width * height * bpp`，溢出时为 `None`
fn frame_len(width: usize, height: usize, bpp: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(bpp)
}

fn check_len(bytes: &[u8], width: usize, height: usize, bpp: usize) -> Result<(), VisionError> {
    let expected = frame_len(width, height, bpp);
    if expected != Some(bytes.len()) {
        return Err(VisionError::FrameSize {
            width,
            height,
            expected: expected.unwrap_or(usize::MAX),
            actual: bytes.len(),
        });
    }
    Ok(())
}
