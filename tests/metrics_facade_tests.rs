//! Metrics Facade Tests
//!
//! Drives `compute_metrics` the way the dashboard does: raw export in,
//! filter context per selection, report out.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use fieldops_kpi::{
    compute_metrics, compute_metrics_for_windows, FilterContext, KpiConfig, MetricsError, MetricsReport,
    ServiceCategory, ServiceOrder,
};

fn at(month: u32, d: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, d)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .unwrap()
}

fn order(code: &str, client: &str, service_type: &str, subtype: &str, created: NaiveDateTime, hours: i64) -> ServiceOrder {
    ServiceOrder {
        code: code.to_string(),
        client_code: client.to_string(),
        service_type: service_type.to_string(),
        service_subtype: subtype.to_string(),
        status: "Finalizada".to_string(),
        created_at: Some(created),
        finalized_at: Some(created + Duration::hours(hours)),
        city: "Recife".to_string(),
        neighborhood: "Boa Viagem".to_string(),
        technician_name: "Ana".to_string(),
        ..Default::default()
    }
}

/// March and April activity for three clients.
fn export() -> Vec<ServiceOrder> {
    let mut no_finish = order("OS-7", "C4", "Corretiva", "Corretiva TV", at(3, 20, 9), 1);
    no_finish.finalized_at = None;
    let mut absent = order("OS-8", "C4", "Corretiva", "Corretiva TV", at(3, 21, 9), 2);
    absent.reason = "Cliente ausente".to_string();

    vec![
        // C1: corrective fibre repair, reopened four days later
        order("OS-1", "C1", "Corretiva", "Corretiva Fibra", at(3, 1, 8), 20),
        order("OS-2", "C1", "Corretiva", "Corretiva Fibra", at(3, 6, 8), 30),
        // C2: TV main point install, reopened by an additional point
        order("OS-3", "C2", "Ponto Principal", "Ponto Principal TV", at(3, 10, 8), 48),
        order("OS-4", "C2", "Ponto Adicional", "Ponto Adicional TV", at(3, 15, 8), 5),
        // C3: April only, unmapped type
        order("OS-5", "C3", "Retirada", "Retirada de Equipamento", at(4, 2, 8), 10),
        order("OS-6", "C3", "Corretiva", "Corretiva TV", at(4, 3, 8), 24),
        no_finish,
        absent,
    ]
}

#[test]
fn hidden_data_returns_zero_report() {
    let ctx = FilterContext {
        show_data: false,
        ..FilterContext::default()
    };
    let report = compute_metrics(&export(), &ctx, &KpiConfig::default()).unwrap();
    assert_eq!(report.time, MetricsReport::empty().time);
    assert_eq!(report.eligible_orders, 0);
    assert_eq!(report.reopening.reopened_count, 0);
    assert!(report.reopening.pairs.is_empty());
}

#[test]
fn hidden_report_has_the_shape_of_a_computed_empty_window() {
    let config = KpiConfig::default();
    let hidden = compute_metrics(
        &export(),
        &FilterContext {
            show_data: false,
            ..FilterContext::default()
        },
        &config,
    )
    .unwrap();
    // Nothing in the export was finalized in 2023
    let empty_window = compute_metrics(&export(), &FilterContext::for_month(2023, 3), &config).unwrap();

    assert_eq!(hidden.reopening, empty_window.reopening);
    assert_eq!(hidden.time, empty_window.time);
    let buckets: Vec<&str> = hidden.reopening.by_original_type.keys().map(String::as_str).collect();
    assert_eq!(buckets, vec!["Corretiva", "Ponto Principal"]);
}

#[test]
fn empty_input_returns_zero_report() {
    let report = compute_metrics(&[], &FilterContext::default(), &KpiConfig::default()).unwrap();
    assert_eq!(report.time.percent_within_goal, 0.0);
    assert_eq!(report.time.average_time_hours, 0.0);
    assert!(report.time.by_category.is_empty());
    assert_eq!(report.reopening.reopening_rate, 0.0);
}

#[test]
fn whole_export_counts() {
    let report = compute_metrics(&export(), &FilterContext::default(), &KpiConfig::default()).unwrap();

    // OS-8 rejected by reason, OS-7 retained but malformed
    assert_eq!(report.rejections.excluded_reason, 1);
    assert_eq!(report.retained_orders, 7);
    assert_eq!(report.anomalies.missing_finalized_at, 1);
    assert_eq!(report.eligible_orders, 6);

    let time = &report.time;
    assert_eq!(time.total_orders, report.eligible_orders);
    assert_eq!(time.orders_within_goal + time.orders_outside_goal, report.eligible_orders);
    // OS-2 (30 h vs 24 h) is the only one late; OS-6 lands exactly on its goal
    assert_eq!(time.orders_outside_goal, 1);
    assert_eq!(time.by_category["Retirada"].goal_hours, 48.0);
    assert_eq!(time.by_category["Corretiva TV"].within_goal_count, 1);

    let reopening = &report.reopening;
    assert_eq!(reopening.reopened_count, 2);
    // OS-1, OS-2, OS-3, OS-6
    assert_eq!(reopening.total_originals, 4);
    assert_eq!(reopening.reopening_rate, 0.5);
    assert_eq!(reopening.by_category[&ServiceCategory::Fibra], 1);
    assert_eq!(reopening.by_category[&ServiceCategory::Tv], 1);
    assert_eq!(reopening.by_technician["Ana"], 2);
    assert_eq!(reopening.by_original_type["Ponto Principal"].reopenings, 1);
    assert!(reopening.applied_original_type.is_none());
}

#[test]
fn month_filter_applies_on_finalization() {
    let march = compute_metrics(&export(), &FilterContext::for_month(2024, 3), &KpiConfig::default()).unwrap();
    assert_eq!(march.eligible_orders, 4);
    assert_eq!(march.reopening.reopened_count, 2);

    let april = compute_metrics(&export(), &FilterContext::for_month(2024, 4), &KpiConfig::default()).unwrap();
    assert_eq!(april.eligible_orders, 2);
    assert_eq!(april.reopening.reopened_count, 0);
    // OS-7 never finalized, so no month can hold it
    assert_eq!(april.anomalies.total(), 0);
}

#[test]
fn original_type_filter_narrows_headline_only() {
    let ctx = FilterContext::default().with_original_type("ponto principal");
    let report = compute_metrics(&export(), &ctx, &KpiConfig::default()).unwrap();

    let reopening = &report.reopening;
    assert_eq!(reopening.applied_original_type.as_deref(), Some("Ponto Principal"));
    assert_eq!(reopening.reopened_count, 1);
    assert_eq!(reopening.total_originals, 1);
    assert_eq!(reopening.reopening_rate, 1.0);
    // Breakdowns still cover both pairs
    assert_eq!(reopening.pairs.len(), 2);
    assert_eq!(reopening.by_technician["Ana"], 2);
}

#[test]
fn all_sentinel_does_not_narrow() {
    let all = compute_metrics(&export(), &FilterContext::default().with_original_type("Todos"), &KpiConfig::default())
        .unwrap();
    let none = compute_metrics(&export(), &FilterContext::default(), &KpiConfig::default()).unwrap();
    assert_eq!(all, none);
}

#[test]
fn invalid_year_is_an_error() {
    let ctx = FilterContext {
        selected_year: Some("24".to_string()),
        ..FilterContext::default()
    };
    let err = compute_metrics(&export(), &ctx, &KpiConfig::default()).unwrap_err();
    assert!(matches!(err, MetricsError::InvalidPeriod { field: "year", .. }));
}

#[test]
fn computation_is_repeatable_and_leaves_input_alone() {
    let orders = export();
    let before = orders.clone();
    let config = KpiConfig::default();
    let first = compute_metrics(&orders, &FilterContext::default(), &config).unwrap();
    let second = compute_metrics(&orders, &FilterContext::default(), &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(orders, before);
}

#[test]
fn parallel_windows_match_sequential_calls() {
    let orders = export();
    let config = KpiConfig::default();
    let contexts = vec![
        FilterContext::default(),
        FilterContext::for_month(2024, 3),
        FilterContext::for_month(2024, 4),
        FilterContext::for_month(2024, 3).with_original_type("Corretiva"),
    ];

    let parallel = compute_metrics_for_windows(&orders, &contexts, &config).unwrap();
    assert_eq!(parallel.len(), contexts.len());
    for (ctx, report) in contexts.iter().zip(&parallel) {
        assert_eq!(report, &compute_metrics(&orders, ctx, &config).unwrap());
    }
}

#[test]
fn report_serializes_with_camel_case_keys() {
    let report = compute_metrics(&export(), &FilterContext::default(), &KpiConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["time"]["percentWithinGoal"].is_number());
    assert!(json["reopening"]["byOriginalType"]["Corretiva"]["reopeningRate"].is_number());
    assert_eq!(json["reopening"]["pairs"][0]["originalCode"], "OS-1");
}
