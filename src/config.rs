// 该文件是 Wangshan （望山） 项目的一部分。
// src/config.rs - 检测器配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use tracing::debug;

/// 每个边界框的基础特征数量 (x, y, w, h, 物体置信度)
pub const BOX_FEATURE_COUNT: usize = 5;

/// Pascal VOC 数据集类别名称
pub const PASCAL_VOC_LABELS: [&str; 20] = [
  "aeroplane",
  "bicycle",
  "bird",
  "boat",
  "bottle",
  "bus",
  "car",
  "cat",
  "chair",
  "cow",
  "diningtable",
  "dog",
  "horse",
  "motorbike",
  "person",
  "pottedplant",
  "sheep",
  "sofa",
  "train",
  "tvmonitor",
];

/// Tiny YOLOv2 的锚框先验尺寸（宽、高），以网格单元为单位
pub const TINY_YOLO_V2_ANCHORS: [(f32, f32); 5] = [
  (1.08, 1.19),
  (3.42, 4.41),
  (6.63, 11.38),
  (9.42, 5.11),
  (16.62, 10.52),
];

/// 锚框先验尺寸（宽、高），以网格单元为单位
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPrior {
  pub width: f32,
  pub height: f32,
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("网格尺寸无效: {rows} 行 x {cols} 列")]
  InvalidGrid { rows: usize, cols: usize },
  #[error("至少需要一个锚框先验")]
  NoAnchors,
  #[error("类别名称列表为空")]
  NoLabels,
  #[error("网格单元像素尺寸无效: {width} x {height}")]
  InvalidCellSize { width: f32, height: f32 },
}

/// 检测器配置
///
/// 描述上游网络输出张量的固定布局：网格行列数、每个单元的锚框先验、
/// 类别词表以及单元对应的像素尺寸。配置一经创建不可变，
/// 同一配置可在多个解析器之间复用。
#[derive(Debug, Clone)]
pub struct DetectorConfig {
  /// 网格列数
  cols: usize,
  /// 网格行数
  rows: usize,
  /// 锚框先验，每个单元的锚框数量即该列表长度
  anchors: Vec<AnchorPrior>,
  /// 类别名称，顺序与网络输出的类别通道一致
  labels: Vec<String>,
  /// 单元像素宽度
  cell_width: f32,
  /// 单元像素高度
  cell_height: f32,
}

impl DetectorConfig {
  /// 创建并校验配置
  pub fn new(
    cols: usize,
    rows: usize,
    anchors: Vec<AnchorPrior>,
    labels: Vec<String>,
    cell_width: f32,
    cell_height: f32,
  ) -> Result<Self, ConfigError> {
    if cols == 0 || rows == 0 {
      return Err(ConfigError::InvalidGrid { rows, cols });
    }
    if anchors.is_empty() {
      return Err(ConfigError::NoAnchors);
    }
    if labels.is_empty() {
      return Err(ConfigError::NoLabels);
    }
    if !(cell_width.is_finite() && cell_width > 0.0)
      || !(cell_height.is_finite() && cell_height > 0.0)
    {
      return Err(ConfigError::InvalidCellSize {
        width: cell_width,
        height: cell_height,
      });
    }

    let config = Self {
      cols,
      rows,
      anchors,
      labels,
      cell_width,
      cell_height,
    };
    debug!(
      "检测器配置: {}x{} 网格, {} 锚框/单元, {} 类别, 张量长度 {}",
      config.cols,
      config.rows,
      config.anchors_per_cell(),
      config.class_count(),
      config.tensor_len()
    );
    Ok(config)
  }

  /// Tiny YOLOv2 预设配置: 13x13 网格, 5 锚框, Pascal VOC 20 类, 32 像素单元
  pub fn tiny_yolo_v2() -> Self {
    let anchors = TINY_YOLO_V2_ANCHORS
      .iter()
      .map(|&(width, height)| AnchorPrior { width, height })
      .collect();
    let labels = PASCAL_VOC_LABELS.iter().map(|s| s.to_string()).collect();

    Self {
      cols: 13,
      rows: 13,
      anchors,
      labels,
      cell_width: 32.0,
      cell_height: 32.0,
    }
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn anchors(&self) -> &[AnchorPrior] {
    &self.anchors
  }

  pub fn labels(&self) -> &[String] {
    &self.labels
  }

  pub fn cell_width(&self) -> f32 {
    self.cell_width
  }

  pub fn cell_height(&self) -> f32 {
    self.cell_height
  }

  /// 每个单元的锚框数量
  pub fn anchors_per_cell(&self) -> usize {
    self.anchors.len()
  }

  /// 类别数量
  pub fn class_count(&self) -> usize {
    self.labels.len()
  }

  /// 通道数量 = 锚框数 x (5 + 类别数)
  pub fn channel_count(&self) -> usize {
    self.anchors_per_cell() * (BOX_FEATURE_COUNT + self.class_count())
  }

  /// 张量总长度 = 通道数 x 行数 x 列数
  pub fn tensor_len(&self) -> usize {
    self.channel_count() * self.rows * self.cols
  }

  /// 过滤前的候选框总数 = 行数 x 列数 x 锚框数
  pub fn candidate_count(&self) -> usize {
    self.rows * self.cols * self.anchors_per_cell()
  }

  /// 图像像素宽度
  pub fn image_width(&self) -> f32 {
    self.cols as f32 * self.cell_width
  }

  /// 图像像素高度
  pub fn image_height(&self) -> f32 {
    self.rows as f32 * self.cell_height
  }
}
