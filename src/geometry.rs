// 该文件是 Wangshan （望山） 项目的一部分。
// src/geometry.rs - 边界框几何
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

use crate::config::AnchorPrior;
use crate::math::sigmoid;

/// 矩形（左上角 + 宽高）
///
/// 同一类型承担两种角色：既存放网络输出的原始回归量
/// (x, y, w, h 均为未激活的 logit)，也表示映射后的图像坐标系矩形。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl Rect {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn right(&self) -> f32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.height
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  /// 将矩形裁剪到图像范围 [0, image_width] x [0, image_height] 内
  ///
  /// 原始回归量未做限幅，exp 之后的宽高可能远超图像边界。
  pub fn clamp_to(&self, image_width: f32, image_height: f32) -> Self {
    let left = self.x.clamp(0.0, image_width);
    let top = self.y.clamp(0.0, image_height);
    let right = self.right().clamp(0.0, image_width);
    let bottom = self.bottom().clamp(0.0, image_height);

    Self {
      x: left,
      y: top,
      width: (right - left).max(0.0),
      height: (bottom - top).max(0.0),
    }
  }
}

/// 将单元内的原始回归量映射为图像坐标系矩形
///
/// 中心点 = (单元坐标 + sigmoid(偏移)) x 单元像素尺寸，
/// 宽高 = exp(原始宽高) x 单元像素尺寸 x 锚框先验。
pub fn map_to_image(
  col: usize,
  row: usize,
  raw: &Rect,
  prior: AnchorPrior,
  cell_width: f32,
  cell_height: f32,
) -> Rect {
  let center_x = (col as f32 + sigmoid(raw.x)) * cell_width;
  let center_y = (row as f32 + sigmoid(raw.y)) * cell_height;
  let width = raw.width.exp() * cell_width * prior.width;
  let height = raw.height.exp() * cell_height * prior.height;

  Rect {
    x: center_x - width / 2.0,
    y: center_y - height / 2.0,
    width,
    height,
  }
}

/// 两个矩形的交并比
///
/// 任一矩形面积不为正时返回 0，保证退化框不会影响抑制过程。
pub fn iou(a: &Rect, b: &Rect) -> f32 {
  if a.area() <= 0.0 || b.area() <= 0.0 {
    return 0.0;
  }

  let left = a.x.max(b.x);
  let top = a.y.max(b.y);
  let right = a.right().min(b.right());
  let bottom = a.bottom().min(b.bottom());

  let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
  intersection / (a.area() + b.area() - intersection)
}
