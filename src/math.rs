// 该文件是 Wangshan （望山） 项目的一部分。
// src/math.rs - 概率变换
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

/// 数值稳定的 sigmoid 函数
///
/// 按符号分支，保证 exp 的参数始终非正，|v| 很大时不会溢出。
pub fn sigmoid(v: f32) -> f32 {
  if v >= 0.0 {
    1.0 / (1.0 + (-v).exp())
  } else {
    let k = v.exp();
    k / (1.0 + k)
  }
}

/// softmax 归一化
///
/// 先减去最大值再取指数，避免大 logit 溢出；输出各项在 [0,1] 内且和为 1。
pub fn softmax(values: &[f32]) -> Vec<f32> {
  let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exp: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
  let sum: f32 = exp.iter().sum();
  exp.into_iter().map(|v| v / sum).collect()
}

/// 返回最大值及其索引
///
/// 多个元素并列最大时取索引最小者，空切片返回 None。
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
  let mut top: Option<(usize, f32)> = None;
  for (index, &value) in values.iter().enumerate() {
    match top {
      Some((_, best)) if value <= best => {}
      _ => top = Some((index, value)),
    }
  }
  top
}

#[cfg(test)]
mod tests {
  use super::{argmax, sigmoid, softmax};

  #[test]
  fn sigmoid_midpoint_and_range() {
    assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    for v in [-80.0, -10.0, -1.0, 1.0, 10.0, 80.0] {
      let s = sigmoid(v);
      assert!(s > 0.0 && s < 1.0, "sigmoid({v}) = {s}");
    }
  }

  #[test]
  fn sigmoid_stable_for_extreme_logits() {
    assert!(sigmoid(1000.0).is_finite());
    assert!(sigmoid(-1000.0).is_finite());
    assert!(sigmoid(1000.0) > 0.999_999);
    assert!(sigmoid(-1000.0) < 1e-6);
  }

  #[test]
  fn softmax_is_a_distribution() {
    let probs = softmax(&[1.0, 2.0, 3.0, 4.0]);
    let sum: f32 = probs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    // 单调：更大的 logit 对应更大的概率
    assert!(probs[3] > probs[2] && probs[2] > probs[1] && probs[1] > probs[0]);
  }

  #[test]
  fn softmax_survives_large_logits() {
    let probs = softmax(&[1000.0, 999.0, 0.0]);
    let sum: f32 = probs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    assert!(probs[0] > probs[1]);
  }

  #[test]
  fn argmax_breaks_ties_with_lowest_index() {
    assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some((1, 3.0)));
    assert_eq!(argmax(&[5.0, 5.0, 5.0]), Some((0, 5.0)));
    assert_eq!(argmax(&[-1.0]), Some((0, -1.0)));
    assert_eq!(argmax(&[]), None);
  }
}
