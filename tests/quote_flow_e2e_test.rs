// ==========================================
// 窗帘软装报价系统 - 报价全流程 E2E 测试
// ==========================================
// 流程: 价目表导入 → 网格定价 → 组装汇总 → 派生富集 → upsert → 读回
// ==========================================


use curtain_quote::api::{ApiError, GridApi, QuoteApi};
use curtain_quote::config::ConfigManager;
use curtain_quote::repository::{PricingGridRepository, WindowSummaryRepository};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

fn setup_apis() -> (GridApi, QuoteApi) {
    let conn = test_helpers::create_shared_connection();
    let grid_repo = Arc::new(PricingGridRepository::from_connection(conn.clone()));
    let summary_repo = Arc::new(WindowSummaryRepository::from_connection(conn.clone()));
    let config = ConfigManager::from_connection(conn).unwrap();
    (GridApi::new(grid_repo, &config), QuoteApi::new(summary_repo))
}

#[tokio::test]
async fn test_full_quote_flow() {
    let (grid_api, quote_api) = setup_apis();

    // ===== 1. 导入价目表 =====
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(test_helpers::SAMPLE_GRID_CSV_CM.as_bytes())
        .unwrap();
    file.flush().unwrap();

    let outcome = grid_api
        .import_grid(file.path(), "工厂A-布艺帘", None)
        .await
        .unwrap();
    assert_eq!(outcome.width_count, 3);

    // ===== 2. 网格定价 =====
    // 轨宽 200cm / 帘高 220cm → 最近 (200, 240) → 89
    let manufacturing = grid_api.price_window("工厂A-布艺帘", 200.0, 220.0).unwrap();
    assert_eq!(manufacturing, 89.0);

    // ===== 3. 组装汇总并保存(派生富集在保存路径内完成) =====
    let mut summary = test_helpers::sample_curtain_summary("job12-win3");
    summary.manufacturing_cost = Some(manufacturing);

    let enriched = quote_api.save_worksheet(summary).unwrap();
    assert_eq!(
        enriched.measurements_details.get("widths_required"),
        Some(&json!(3.0))
    );
    assert_eq!(enriched.manufacturing_cost, Some(89.0));

    // ===== 4. 读回(报价渲染口径) =====
    let stored = quote_api.get_window_summary("job12-win3").unwrap();
    assert_eq!(
        stored.measurements_details.get("total_drop_per_width_cm"),
        Some(&json!(245.0))
    );
    assert_eq!(stored.manufacturing_cost, Some(89.0));

    // ===== 5. 再保存一次: 富集幂等,upsert 覆盖 =====
    let enriched_again = quote_api.save_worksheet(stored).unwrap();
    assert_eq!(
        serde_json::to_value(&enriched_again.measurements_details).unwrap(),
        serde_json::to_value(&enriched.measurements_details).unwrap()
    );
    assert_eq!(quote_api.list_window_summaries().unwrap().len(), 1);
}

#[tokio::test]
async fn test_price_window_unknown_grid_is_not_found() {
    let (grid_api, _) = setup_apis();
    let err = grid_api.price_window("不存在的网格", 100.0, 100.0).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_soft_deleted_grid_invisible_to_pricing() {
    let (grid_api, _) = setup_apis();

    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(test_helpers::SAMPLE_GRID_CSV_CM.as_bytes())
        .unwrap();
    file.flush().unwrap();

    let outcome = grid_api
        .import_grid(file.path(), "停用网格", None)
        .await
        .unwrap();

    grid_api.deactivate_grid(&outcome.grid_id).unwrap();
    let err = grid_api.price_window("停用网格", 100.0, 120.0).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 列表含停用项的口径
    assert_eq!(grid_api.list_grids(false).unwrap().len(), 0);
    assert_eq!(grid_api.list_grids(true).unwrap().len(), 1);
}

#[tokio::test]
async fn test_hard_blind_worksheet_costs_survive_save() {
    let (_, quote_api) = setup_apis();

    let mut summary = test_helpers::sample_curtain_summary("job12-win4");
    summary.treatment_category = Some("roller_blind".to_string());
    summary.total_cost = Some(320.0);
    summary.manufacturing_cost = Some(180.0);

    let enriched = quote_api.save_worksheet(summary).unwrap();
    // 非布艺类别: 成本原样落库,不派生
    assert_eq!(enriched.total_cost, Some(320.0));
    assert_eq!(enriched.manufacturing_cost, Some(180.0));
    assert!(enriched
        .measurements_details
        .get("required_width_cm")
        .is_none());

    let stored = quote_api.get_window_summary("job12-win4").unwrap();
    assert_eq!(stored.total_cost, Some(320.0));
}

#[tokio::test]
async fn test_save_worksheet_requires_window_id() {
    let (_, quote_api) = setup_apis();
    let summary = test_helpers::sample_curtain_summary("");
    let err = quote_api.save_worksheet(summary).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
