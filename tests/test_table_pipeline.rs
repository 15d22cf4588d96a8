//! 表格处理流水线测试：过滤、排序、搜索、逐步展开与 CSV 导出

use std::sync::Arc;

use ranking_lib::models::stock::{FieldKey, StockRecord};
use ranking_lib::models::table::{FilterKey, MouseAction, SortDirection, SortEntry, SortSpec, TableFilters};
use ranking_lib::services::filter::FilterEngine;
use ranking_lib::services::sort::{compare, sort_records};
use ranking_lib::services::table::{ScrollMetrics, TableController};

fn stock(code: &str, name: &str, sector: &str, change: Option<f64>) -> StockRecord {
    StockRecord {
        code: code.to_string(),
        name: name.to_string(),
        sector: sector.to_string(),
        change_percent: change,
        ..Default::default()
    }
}

fn sample() -> Vec<StockRecord> {
    vec![
        StockRecord {
            turnover: Some(5_000_000.0),
            consecutive_board: "2连板".to_string(),
            limit_up_label: "芯片".to_string(),
            ..stock("600001", "甲股份", "芯片概念、5G", Some(9.98))
        },
        StockRecord {
            turnover: Some(1_000.0),
            consecutive_board: "首板".to_string(),
            ..stock("000002", "*ST乙", "白酒", Some(-3.2))
        },
        StockRecord {
            turnover: None,
            ..stock("300003", "丙科技", "5G、算力", Some(1.5))
        },
        StockRecord {
            turnover: Some(80_000.0),
            consecutive_board: "首板".to_string(),
            ..stock("002004", "丁制造", "汽车零部件", None)
        },
    ]
}

fn codes(rows: &[&StockRecord]) -> Vec<String> {
    rows.iter().map(|r| r.code.clone()).collect()
}

fn desc(key: FieldKey) -> SortSpec {
    SortSpec {
        entries: vec![SortEntry {
            key,
            direction: SortDirection::Desc,
            priority: 0,
        }],
    }
}

// ==================== 过滤 ====================

#[test]
fn test_disabled_filters_are_identity() {
    let data = sample();
    let mut filters = TableFilters::default();
    filters.turnover.min = Some(1e12);
    filters.sector.selected = vec!["不存在".to_string()];
    // 未启用的条件不生效
    let rows = FilterEngine::apply(&data, &filters);
    assert_eq!(rows.len(), data.len(), "未启用的过滤不应改变结果");
}

#[test]
fn test_range_with_equal_bounds_keeps_exact_match() {
    let data = sample();
    let mut filters = TableFilters::default();
    filters.set_range(FilterKey::Turnover, Some(80_000.0), Some(80_000.0));
    let rows = FilterEngine::apply(&data, &filters);
    assert_eq!(codes(&rows), vec!["002004"]);
}

#[test]
fn test_missing_value_fails_defined_bound() {
    let data = sample();
    let mut filters = TableFilters::default();
    filters.set_range(FilterKey::Turnover, Some(0.0), None);
    let rows = FilterEngine::apply(&data, &filters);
    assert!(!codes(&rows).contains(&"300003".to_string()), "缺失成交额的记录应被排除");
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_sector_multiselect_matches_split_substring() {
    let data = sample();
    let mut filters = TableFilters::default();
    filters.toggle_option(FilterKey::Sector, "芯片", true);
    assert!(filters.sector.enabled, "勾选后应自动启用");
    let rows = FilterEngine::apply(&data, &filters);
    assert_eq!(codes(&rows), vec!["600001"], "“芯片”应命中“芯片概念”");

    filters.toggle_option(FilterKey::Sector, "5G", true);
    let rows = FilterEngine::apply(&data, &filters);
    assert_eq!(codes(&rows), vec!["600001", "300003"]);

    filters.toggle_option(FilterKey::Sector, "芯片", false);
    filters.toggle_option(FilterKey::Sector, "5G", false);
    assert!(!filters.sector.enabled, "清空选项后应自动停用");
}

#[test]
fn test_enabled_multiselect_with_empty_selection_is_noop() {
    let data = sample();
    let mut filters = TableFilters::default();
    filters.consecutive_board.enabled = true;
    assert_eq!(FilterEngine::apply(&data, &filters).len(), data.len());

    filters.consecutive_board.selected = vec!["首板".to_string()];
    let rows = FilterEngine::apply(&data, &filters);
    assert_eq!(codes(&rows), vec!["000002", "002004"], "普通多选字段按完全相等匹配");
}

#[test]
fn test_available_options_first_seen_order() {
    let data = sample();
    let sectors = FilterEngine::available_options(&data, FieldKey::Sector);
    assert_eq!(sectors, vec!["芯片概念", "5G", "白酒", "算力", "汽车零部件"]);

    let boards = FilterEngine::available_options(&data, FieldKey::ConsecutiveBoard);
    assert_eq!(boards, vec!["2连板", "首板"], "空值不应出现在选项中");

    assert_eq!(FilterEngine::data_range(&data, FieldKey::Turnover), (1_000.0, 5_000_000.0));
    assert_eq!(FilterEngine::data_range(&[], FieldKey::Turnover), (0.0, 100.0));
}

#[test]
fn test_active_count_and_reset() {
    let mut filters = TableFilters::default();
    filters.set_range(FilterKey::ChangePercent, Some(-2.0), None);
    filters.toggle_option(FilterKey::LimitUpLabel, "芯片", true);
    assert_eq!(filters.active_count(), 2);
    filters.toggle_enabled(FilterKey::ChangePercent);
    assert_eq!(filters.active_count(), 1);
    filters.clear(FilterKey::LimitUpLabel);
    assert_eq!(filters.active_count(), 0);
    filters.set_range(FilterKey::Turnover, Some(1.0), Some(2.0));
    filters.reset();
    assert_eq!(filters, TableFilters::default());
}

// ==================== 排序 ====================

#[test]
fn test_sorted_output_is_ordered_permutation() {
    let data = sample();
    let spec = desc(FieldKey::ChangePercent);
    let mut rows: Vec<&StockRecord> = data.iter().collect();
    sort_records(&mut rows, &spec);

    assert_eq!(rows.len(), data.len());
    for pair in rows.windows(2) {
        assert_ne!(
            compare(pair[0], pair[1], &spec),
            std::cmp::Ordering::Greater,
            "相邻两行不应逆序"
        );
    }
    // 缺失值最小，降序时排在最后
    assert_eq!(codes(&rows), vec!["600001", "300003", "000002", "002004"]);
}

#[test]
fn test_multi_key_sort_uses_priority() {
    let a = StockRecord { consecutive_board: "首板".into(), ..stock("a", "", "", Some(1.0)) };
    let b = StockRecord { consecutive_board: "首板".into(), ..stock("b", "", "", Some(5.0)) };
    let c = StockRecord { consecutive_board: "2连板".into(), ..stock("c", "", "", Some(3.0)) };
    let data = [a, b, c];

    let spec = SortSpec {
        entries: vec![
            SortEntry { key: FieldKey::ChangePercent, direction: SortDirection::Desc, priority: 1 },
            SortEntry { key: FieldKey::ConsecutiveBoard, direction: SortDirection::Asc, priority: 0 },
        ],
    };
    let mut rows: Vec<&StockRecord> = data.iter().collect();
    sort_records(&mut rows, &spec);
    // "2连板" < "首板"（字典序），同板内按涨幅降序
    assert_eq!(codes(&rows), vec!["c", "b", "a"]);
}

#[test]
fn test_change_percent_ties_broken_by_code_ascending() {
    let data = vec![
        stock("600003", "", "", Some(5.0)),
        stock("000009", "", "", Some(2.0)),
        stock("300001", "", "", Some(5.0)),
        stock("000001", "", "", Some(5.0)),
    ];
    let spec = SortSpec {
        entries: vec![
            SortEntry { key: FieldKey::ChangePercent, direction: SortDirection::Desc, priority: 0 },
            SortEntry { key: FieldKey::Code, direction: SortDirection::Asc, priority: 1 },
        ],
    };
    let mut rows: Vec<&StockRecord> = data.iter().collect();
    sort_records(&mut rows, &spec);
    assert_eq!(codes(&rows), vec!["000001", "300001", "600003", "000009"], "涨幅相同按代码升序");
}

#[test]
fn test_equal_keys_keep_encounter_order() {
    let data: Vec<StockRecord> = (0..5).map(|i| stock(&i.to_string(), "", "", Some(1.0))).collect();
    let mut rows: Vec<&StockRecord> = data.iter().collect();
    sort_records(&mut rows, &desc(FieldKey::ChangePercent));
    assert_eq!(codes(&rows), vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn test_header_click_state_machine() {
    let mut spec = SortSpec::empty();

    spec.on_header_click(FieldKey::Turnover, MouseAction::Primary);
    assert_eq!(spec.get(FieldKey::Turnover).map(|e| e.direction), Some(SortDirection::Desc));
    assert_eq!(spec.get(FieldKey::Turnover).map(|e| e.priority), Some(0));

    spec.on_header_click(FieldKey::Turnover, MouseAction::Primary);
    assert!(spec.get(FieldKey::Turnover).is_none(), "降序状态下左键应移除排序");

    spec.on_header_click(FieldKey::Name, MouseAction::Secondary);
    assert_eq!(spec.get(FieldKey::Name).map(|e| e.direction), Some(SortDirection::Asc));
    spec.on_header_click(FieldKey::Name, MouseAction::Secondary);
    assert_eq!(spec.get(FieldKey::Name).map(|e| e.direction), Some(SortDirection::Desc));
    assert_eq!(spec.get(FieldKey::Name).map(|e| e.priority), Some(0), "右键切换不改变优先级");

    // 升序状态下左键切到降序
    spec.on_header_click(FieldKey::Code, MouseAction::Secondary);
    spec.on_header_click(FieldKey::Code, MouseAction::Primary);
    assert_eq!(spec.get(FieldKey::Code).map(|e| e.direction), Some(SortDirection::Desc));
    assert_eq!(spec.get(FieldKey::Code).map(|e| e.priority), Some(1));
}

// ==================== 表格控制器 ====================

fn many(n: usize) -> Arc<Vec<StockRecord>> {
    Arc::new(
        (0..n)
            .map(|i| stock(&format!("{:06}", i), &format!("股票{}", i), "", Some(i as f64 / 10.0)))
            .collect(),
    )
}

#[test]
fn test_reveal_growth_caps_at_filtered_len() {
    let mut table = TableController::new(many(500));
    assert_eq!(table.rows().len(), 100);

    let bottom = ScrollMetrics { scroll_top: 960.0, scroll_height: 1000.0, client_height: 0.0 };
    assert!(table.on_scroll(bottom));
    assert_eq!(table.reveal_count(), 150);

    let far = ScrollMetrics { scroll_top: 0.0, scroll_height: 1000.0, client_height: 400.0 };
    assert!(!table.on_scroll(far), "离底部较远时不应加载");

    while table.reveal_more() {}
    assert_eq!(table.reveal_count(), 500);
    assert_eq!(table.rows().len(), 500);
    assert!(!table.on_scroll(bottom));
    assert_eq!(table.summary(), "显示 500 / 500 条数据");
}

#[test]
fn test_st_exclusion_and_search() {
    let mut table = TableController::new(Arc::new(sample()));
    assert_eq!(table.filtered_len(), 4);

    table.set_filter_st(true);
    assert_eq!(table.filtered_len(), 3);
    assert!(table.filtered().iter().all(|r| !r.name.contains("ST")));

    table.set_search("5g");
    assert_eq!(codes(&table.filtered()), vec!["600001", "300003"], "搜索不区分大小写");

    table.set_search("首板");
    assert_eq!(codes(&table.filtered()), vec!["002004"], "连板字段参与搜索");

    table.set_filter_st(false);
    table.set_search("");
    assert_eq!(table.filtered_len(), 4);
}

#[test]
fn test_default_sort_is_change_percent_desc() {
    let table = TableController::new(Arc::new(sample()));
    assert_eq!(codes(&table.filtered()), vec!["600001", "300003", "000002", "002004"]);
}

#[test]
fn test_csv_export_covers_full_filtered_set() {
    let records: Vec<StockRecord> = (0..120)
        .map(|i| stock(&format!("{:06}", i), "名称", "", Some(1.0)))
        .chain(std::iter::once(stock("999999", "带,逗号\"引号\"", "a、b", Some(2.5))))
        .collect();
    let table = TableController::new(Arc::new(records));
    assert_eq!(table.rows().len(), 100, "只展开前 100 行");

    let csv_text = table
        .export_csv(Some(&[FieldKey::Code, FieldKey::Name, FieldKey::ChangePercent]))
        .unwrap();
    assert!(csv_text.contains("\"带,逗号\"\"引号\"\"\""), "含逗号与引号的单元格需转义");

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["代码", "名称", "涨幅(%)"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 121, "导出全部过滤结果而不只是已展开部分");
    assert_eq!(&rows[0][0], "999999");
    assert_eq!(&rows[0][1], "带,逗号\"引号\"");
    assert_eq!(&rows[0][2], "+2.50%");
}

#[test]
fn test_csv_export_defaults_to_visible_columns() {
    let mut table = TableController::new(Arc::new(sample()));
    for key in FieldKey::ALL {
        table.columns_mut().toggle(key, false);
    }
    table.columns_mut().toggle(FieldKey::Name, true);
    table.columns_mut().toggle(FieldKey::Code, true);

    let csv_text = table.export_csv(None).unwrap();
    let first_line = csv_text.lines().next().unwrap();
    assert_eq!(first_line, "代码,名称");
    assert_eq!(csv_text.lines().count(), 5);
}
