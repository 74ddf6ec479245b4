// 该文件是 Wangshan （望山） 项目的一部分。
// src/parser.rs - 网格输出解析与非极大值抑制
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

use tracing::debug;

use crate::config::DetectorConfig;
use crate::geometry::{Rect, iou, map_to_image};
use crate::math::{argmax, sigmoid, softmax};
use crate::tensor::{GridTensor, TensorError};

/// 检测结果
///
/// 一经创建不可变；矩形为图像像素坐标，置信度为
/// 物体置信度与最高类别概率的乘积。
#[derive(Debug, Clone)]
pub struct Detection {
  /// 边界框（左上角 + 宽高，图像像素坐标）
  pub rect: Rect,
  /// 综合置信度，范围 [0, 1]
  pub confidence: f32,
  /// 类别索引
  pub class_id: usize,
  /// 类别名称
  pub label: String,
}

/// 网格输出解析器
///
/// 对整个流程而言是纯函数：同一张量、配置与阈值必然产生相同的结果序列。
pub struct YoloParser {
  config: DetectorConfig,
  /// 置信度阈值，两级过滤共用
  confidence_threshold: f32,
  /// NMS 交并比阈值
  nms_threshold: f32,
}

impl YoloParser {
  pub fn new(config: DetectorConfig, confidence_threshold: f32, nms_threshold: f32) -> Self {
    Self {
      config,
      confidence_threshold,
      nms_threshold,
    }
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  /// 解码张量并按置信度过滤，返回发现顺序的候选框
  ///
  /// 每个 (单元, 锚框) 独立做两级过滤：
  /// 1. 物体置信度 = sigmoid(logit)，低于阈值立即丢弃，跳过分类计算；
  /// 2. 综合置信度 = 最高类别概率 x 物体置信度，低于阈值丢弃。
  pub fn parse(&self, tensor: &GridTensor) -> Vec<Detection> {
    let class_count = self.config.class_count();
    let mut detections = Vec::new();

    for row in 0..self.config.rows() {
      for col in 0..self.config.cols() {
        for (anchor, &prior) in self.config.anchors().iter().enumerate() {
          let base = GridTensor::channel_base(anchor, class_count);

          let objectness = sigmoid(tensor.objectness(col, row, base));
          if objectness < self.confidence_threshold {
            continue;
          }

          let logits = tensor.class_logits(col, row, base, class_count);
          let probs = softmax(&logits);
          // 配置保证类别数不为零
          let Some((class_id, top_prob)) = argmax(&probs) else {
            continue;
          };

          let confidence = top_prob * objectness;
          if confidence < self.confidence_threshold {
            continue;
          }

          let raw = tensor.box_params(col, row, base);
          let rect = map_to_image(
            col,
            row,
            &raw,
            prior,
            self.config.cell_width(),
            self.config.cell_height(),
          )
          .clamp_to(self.config.image_width(), self.config.image_height());

          detections.push(Detection {
            rect,
            confidence,
            class_id,
            label: self.config.labels()[class_id].clone(),
          });
        }
      }
    }

    debug!(
      "解码完成: {} 个候选中 {} 个超过阈值 {}",
      self.config.candidate_count(),
      detections.len(),
      self.confidence_threshold
    );
    detections
  }

  /// 贪心非极大值抑制
  ///
  /// 返回置信度降序、互相交并比不超过阈值、数量不超过 limit 的子集。
  /// 置信度相同时保持发现顺序（稳定排序）。
  pub fn suppress(&self, mut detections: Vec<Detection>, limit: usize) -> Vec<Detection> {
    if limit == 0 {
      return Vec::new();
    }

    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    // 活跃标记仅在本次调用内有效
    let mut active = vec![true; detections.len()];
    let mut results = Vec::new();

    for i in 0..detections.len() {
      if !active[i] {
        continue;
      }

      results.push(detections[i].clone());
      if results.len() >= limit {
        break;
      }

      for j in (i + 1)..detections.len() {
        if active[j] && iou(&detections[i].rect, &detections[j].rect) > self.nms_threshold {
          active[j] = false;
        }
      }
    }

    debug!(
      "抑制完成: {} 个候选保留 {} 个 (上限 {}, 交并比阈值 {})",
      detections.len(),
      results.len(),
      limit,
      self.nms_threshold
    );
    results
  }

  /// 校验、解码、过滤并抑制，一次完成
  pub fn detect(&self, data: &[f32], limit: usize) -> Result<Vec<Detection>, TensorError> {
    let tensor = GridTensor::new(&self.config, data)?;
    let detections = self.parse(&tensor);
    Ok(self.suppress(detections, limit))
  }
}

#[cfg(test)]
mod tests {
  use super::{Detection, YoloParser};
  use crate::config::{AnchorPrior, DetectorConfig};
  use crate::geometry::Rect;

  fn parser(nms_threshold: f32) -> YoloParser {
    let config = DetectorConfig::new(
      2,
      2,
      vec![AnchorPrior {
        width: 1.0,
        height: 1.0,
      }],
      vec!["a".to_string(), "b".to_string(), "c".to_string()],
      32.0,
      32.0,
    )
    .unwrap();
    YoloParser::new(config, 0.3, nms_threshold)
  }

  fn detection(rect: Rect, confidence: f32) -> Detection {
    Detection {
      rect,
      confidence,
      class_id: 0,
      label: "a".to_string(),
    }
  }

  #[test]
  fn suppress_keeps_higher_confidence_of_identical_rects() {
    let parser = parser(0.5);
    let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
    let boxes = vec![detection(rect, 0.6), detection(rect, 0.9)];

    let kept = parser.suppress(boxes, 10);
    assert_eq!(kept.len(), 1);
    assert!((kept[0].confidence - 0.9).abs() < 1e-6);
  }

  #[test]
  fn suppress_respects_limit() {
    let parser = parser(0.5);
    // 互不重叠的框，全部可保留
    let boxes: Vec<Detection> = (0..5)
      .map(|i| {
        detection(
          Rect::new(i as f32 * 100.0, 0.0, 10.0, 10.0),
          0.9 - i as f32 * 0.1,
        )
      })
      .collect();

    let kept = parser.suppress(boxes.clone(), 3);
    assert_eq!(kept.len(), 3);
    assert_eq!(parser.suppress(boxes, 0).len(), 0);
  }

  #[test]
  fn suppress_sorts_by_descending_confidence() {
    let parser = parser(0.5);
    let boxes: Vec<Detection> = [0.2, 0.8, 0.5]
      .iter()
      .enumerate()
      .map(|(i, &c)| detection(Rect::new(i as f32 * 100.0, 0.0, 10.0, 10.0), c))
      .collect();

    let kept = parser.suppress(boxes, 10);
    let confidences: Vec<f32> = kept.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.8, 0.5, 0.2]);
  }
}
