// 该文件是 Wangshan （望山） 项目的一部分。
// src/tensor.rs - 输出张量布局
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

use crate::config::{BOX_FEATURE_COUNT, DetectorConfig};
use crate::geometry::Rect;

/// 张量错误
#[derive(Error, Debug)]
pub enum TensorError {
  #[error("张量长度不匹配: 期望 {expected}, 实际 {actual}")]
  SizeMismatch { expected: usize, actual: usize },
}

/// 通道主序排布的网格输出张量
///
/// 上游网络把 通道 x 行 x 列 的输出展平成一维数组，
/// 线性下标 = 通道 x (行数 x 列数) + 行 x 列数 + 列。
/// 该布局是与已训练权重兼容的线格式，不可更改。
pub struct GridTensor<'a> {
  data: &'a [f32],
  cols: usize,
  rows: usize,
  /// 通道步长 = 行数 x 列数
  channel_stride: usize,
}

impl<'a> GridTensor<'a> {
  /// 按配置校验长度并包装张量
  ///
  /// 长度不符立即报错，不做任何部分解码。
  pub fn new(config: &DetectorConfig, data: &'a [f32]) -> Result<Self, TensorError> {
    let expected = config.tensor_len();
    if data.len() != expected {
      return Err(TensorError::SizeMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      data,
      cols: config.cols(),
      rows: config.rows(),
      channel_stride: config.rows() * config.cols(),
    })
  }

  /// 锚框 anchor 的通道起点 = anchor x (5 + 类别数)
  pub fn channel_base(anchor: usize, class_count: usize) -> usize {
    anchor * (BOX_FEATURE_COUNT + class_count)
  }

  /// (列, 行, 通道) 的线性下标
  ///
  /// 前置条件：坐标在配置声明的范围内；越界属于调用方违约。
  fn offset(&self, col: usize, row: usize, channel: usize) -> usize {
    debug_assert!(col < self.cols && row < self.rows);
    let index = channel * self.channel_stride + row * self.cols + col;
    debug_assert!(index < self.data.len());
    index
  }

  /// 读取原始回归量 (x, y, w, h)，位于通道 base..base+3
  pub fn box_params(&self, col: usize, row: usize, channel_base: usize) -> Rect {
    Rect {
      x: self.data[self.offset(col, row, channel_base)],
      y: self.data[self.offset(col, row, channel_base + 1)],
      width: self.data[self.offset(col, row, channel_base + 2)],
      height: self.data[self.offset(col, row, channel_base + 3)],
    }
  }

  /// 读取原始物体置信度 logit，位于通道 base+4
  pub fn objectness(&self, col: usize, row: usize, channel_base: usize) -> f32 {
    self.data[self.offset(col, row, channel_base + BOX_FEATURE_COUNT - 1)]
  }

  /// 读取类别 logit 向量，位于通道 base+5 起连续 class_count 个
  pub fn class_logits(
    &self,
    col: usize,
    row: usize,
    channel_base: usize,
    class_count: usize,
  ) -> Vec<f32> {
    (0..class_count)
      .map(|c| self.data[self.offset(col, row, channel_base + BOX_FEATURE_COUNT + c)])
      .collect()
  }
}
