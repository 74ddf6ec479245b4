// 该文件是 Wangshan （望山） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use wangshan::{DetectorConfig, YoloParser};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  println!("Wangshan 网格输出解析器");
  println!("======================");
  println!("张量文件: {}", args.tensor);
  println!("置信度阈值: {}", args.confidence);
  println!("NMS 阈值: {}", args.nms_threshold);
  println!("边界框上限: {}", args.limit);
  println!();

  info!("读取张量文件: {}", args.tensor);
  let raw = std::fs::read_to_string(&args.tensor)
    .with_context(|| format!("无法读取张量文件: {}", args.tensor))?;
  let data: Vec<f32> =
    serde_json::from_str(&raw).with_context(|| format!("张量文件格式无效: {}", args.tensor))?;
  info!("张量长度: {}", data.len());

  let config = DetectorConfig::tiny_yolo_v2();
  let parser = YoloParser::new(config, args.confidence, args.nms_threshold);

  let now = std::time::Instant::now();
  let detections = parser.detect(&data, args.limit)?;
  info!("解析完成，耗时: {:.2?}", now.elapsed());

  println!("检测到 {} 个对象", detections.len());
  for det in &detections {
    println!(
      "  - {}: {:.2}% at ({:.0}, {:.0}, {:.0}x{:.0})",
      det.label,
      det.confidence * 100.0,
      det.rect.x,
      det.rect.y,
      det.rect.width,
      det.rect.height
    );
  }

  Ok(())
}
