// ==========================================
// 窗帘软装报价系统 - 仓储层集成测试
// ==========================================
// 覆盖: 网格生命周期(软删除/硬删除) / 汇总 upsert(最后写入者胜)
// ==========================================


use curtain_quote::repository::{
    PricingGridRepository, RepositoryError, WindowSummaryRepository,
};
use serde_json::json;
use std::sync::Arc;

fn setup_repos() -> (Arc<PricingGridRepository>, Arc<WindowSummaryRepository>) {
    let conn = test_helpers::create_shared_connection();
    (
        Arc::new(PricingGridRepository::from_connection(conn.clone())),
        Arc::new(WindowSummaryRepository::from_connection(conn)),
    )
}

// ==========================================
// 测试 1: 网格生命周期
// ==========================================

#[test]
fn test_grid_insert_and_read_back() {
    let (grid_repo, _) = setup_repos();
    let grid = test_helpers::sample_canonical_grid("仓储读写");
    grid_repo.insert(&grid).unwrap();

    let by_id = grid_repo.find_by_id(&grid.grid_id).unwrap().unwrap();
    assert_eq!(by_id.name, "仓储读写");
    assert_eq!(by_id.grid_data, grid.grid_data);
    assert!(by_id.active);

    let by_name = grid_repo.find_by_name("仓储读写").unwrap().unwrap();
    assert_eq!(by_name.grid_id, grid.grid_id);
}

#[test]
fn test_grid_repo_file_backed() {
    // 文件库路径构造(仓储自行开连接)
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let grid_repo = PricingGridRepository::new(&db_path).unwrap();

    let grid = test_helpers::sample_canonical_grid("文件库");
    grid_repo.insert(&grid).unwrap();
    assert!(grid_repo.find_by_name("文件库").unwrap().is_some());
}

#[test]
fn test_grid_unique_name() {
    let (grid_repo, _) = setup_repos();
    grid_repo
        .insert(&test_helpers::sample_canonical_grid("唯一名"))
        .unwrap();
    let err = grid_repo
        .insert(&test_helpers::sample_canonical_grid("唯一名"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_grid_soft_delete_hides_from_name_lookup() {
    let (grid_repo, _) = setup_repos();
    let grid = test_helpers::sample_canonical_grid("软删除");
    grid_repo.insert(&grid).unwrap();

    assert!(grid_repo.soft_delete(&grid.grid_id).unwrap());

    // 名称查询只看 active
    assert!(grid_repo.find_by_name("软删除").unwrap().is_none());
    // 按 id 仍可读(含已软删除)
    let stored = grid_repo.find_by_id(&grid.grid_id).unwrap().unwrap();
    assert!(!stored.active);

    // 列表口径
    assert_eq!(grid_repo.list(false).unwrap().len(), 0);
    assert_eq!(grid_repo.list(true).unwrap().len(), 1);
}

#[test]
fn test_grid_hard_delete() {
    let (grid_repo, _) = setup_repos();
    let grid = test_helpers::sample_canonical_grid("硬删除");
    grid_repo.insert(&grid).unwrap();

    assert!(grid_repo.hard_delete(&grid.grid_id).unwrap());
    assert!(grid_repo.find_by_id(&grid.grid_id).unwrap().is_none());
    // 再次删除: 无记录受影响
    assert!(!grid_repo.hard_delete(&grid.grid_id).unwrap());
}

// ==========================================
// 测试 2: 汇总 upsert
// ==========================================

#[test]
fn test_summary_upsert_then_update_last_writer_wins() {
    let (_, summary_repo) = setup_repos();

    let mut summary = test_helpers::sample_curtain_summary("w-42");
    summary.total_cost = Some(500.0);
    summary_repo.upsert(&summary).unwrap();

    // 第二次写同一 window_id: 覆盖而非新增
    summary.total_cost = Some(650.0);
    summary
        .measurements_details
        .insert("pooling_cm".to_string(), json!(5));
    summary_repo.upsert(&summary).unwrap();

    let all = summary_repo.list().unwrap();
    assert_eq!(all.len(), 1);

    let stored = summary_repo.find_by_window_id("w-42").unwrap().unwrap();
    assert_eq!(stored.total_cost, Some(650.0));
    assert_eq!(
        stored.measurements_details.get("pooling_cm"),
        Some(&json!(5))
    );
}

#[test]
fn test_summary_round_trip_preserves_flexible_fields() {
    let (_, summary_repo) = setup_repos();

    let mut summary = test_helpers::sample_curtain_summary("w-7");
    summary.selected_options = Some(json!([{ "name": "memory shaping", "price": 30 }]));
    summary
        .fabric_details
        .insert("pattern_repeat_cm".to_string(), json!(64));
    summary_repo.upsert(&summary).unwrap();

    let stored = summary_repo.find_by_window_id("w-7").unwrap().unwrap();
    assert_eq!(stored.selected_options, summary.selected_options);
    assert_eq!(
        stored.fabric_details.get("pattern_repeat_cm"),
        Some(&json!(64))
    );
    assert_eq!(stored.rail_width, Some(json!(200)));
}

#[test]
fn test_summary_empty_window_id_rejected() {
    let (_, summary_repo) = setup_repos();
    let summary = test_helpers::sample_curtain_summary("  ");
    let err = summary_repo.upsert(&summary).unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError(_)));
}

#[test]
fn test_summary_delete() {
    let (_, summary_repo) = setup_repos();
    summary_repo
        .upsert(&test_helpers::sample_curtain_summary("w-9"))
        .unwrap();

    assert!(summary_repo.delete("w-9").unwrap());
    assert!(summary_repo.find_by_window_id("w-9").unwrap().is_none());
    assert!(!summary_repo.delete("w-9").unwrap());
}
