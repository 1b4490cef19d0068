// ==========================================
// 窗帘软装报价系统 - 测试数据生成器
// ==========================================
// 用途: 生成样例价目表 CSV,供手工验证导入流程
// 用法: cargo run --bin generate_test_data [输出目录]
// ==========================================

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const GRID_CM: &str = "\
Drop/Width,100,150,200,250
120,45,55,65,78
180,50,62,74,90
240,58,71,89,108
300,66,82,101,124
";

const GRID_MM: &str = "\
Drop/Width,1000,1500,2000,2500
1200,45,55,65,78
1800,50,62,74,90
2400,58,71,89,108
";

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("test_data"));

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("无法创建输出目录: {}", out_dir.display()))?;

    let cm_path = out_dir.join("grid_cm.csv");
    fs::write(&cm_path, GRID_CM).with_context(|| format!("写入失败: {}", cm_path.display()))?;

    let mm_path = out_dir.join("grid_mm.csv");
    fs::write(&mm_path, GRID_MM).with_context(|| format!("写入失败: {}", mm_path.display()))?;

    println!("已生成:");
    println!("  {}", cm_path.display());
    println!("  {}  (毫米口径,导入时应被量级推断)", mm_path.display());
    Ok(())
}
