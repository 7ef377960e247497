mod support;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use invest_status::clock::ManualClock;
use invest_status::error::StatusError;
use invest_status::format::AmountStyle;
use invest_status::models::{HistorySnapshot, MetricSet};
use invest_status::portfolio::{
    AccountStatusService, BaselinePolicy, Locale, PortfolioSnapshotCache, ReportFormatter,
};
use invest_status::storage::MemoryHistoryStore;
use support::{d, manual_clock, start_time, totals, MockSource};

fn previous_baseline() -> HistorySnapshot {
    HistorySnapshot {
        total_amount: Some(d("95000")),
        total_bonds: Some(d("40000")),
        total_shares: Some(d("28000")),
        total_etf: Some(d("20000")),
        total_currencies: Some(d("7000")),
        timestamp: Some(start_time()),
        ..Default::default()
    }
}

async fn service(
    source: Arc<MockSource>,
    history: Arc<MemoryHistoryStore>,
    clock: Arc<ManualClock>,
    policy: BaselinePolicy,
) -> AccountStatusService {
    let cache = PortfolioSnapshotCache::new(source, "2000123456", history)
        .with_clock(clock)
        .with_ttl(Duration::from_secs(60))
        .with_metric_set(MetricSet::without_payouts());
    let formatter = ReportFormatter::new(
        MetricSet::without_payouts(),
        Locale::Ru,
        AmountStyle::default(),
    );
    AccountStatusService::open(cache, formatter, policy).await
}

#[tokio::test]
async fn status_text_shows_deltas_against_persisted_baseline() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let mut service = service(source, history, manual_clock(), BaselinePolicy::default()).await;

    let text = service.status_text().await?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Общая стоимость портфеля: *100 000.0* (+*5 000.0*)");
    assert_eq!(lines[1], "Стоимость облигаций: *40 000.0*");
    assert_eq!(lines[4], "Доступные денежные средства: *10 000.0* (+*3 000.0*)");

    Ok(())
}

#[tokio::test]
async fn render_baseline_advances_after_each_render() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let clock = manual_clock();
    let mut service = service(source.clone(), history, clock.clone(), BaselinePolicy::default()).await;

    service.status_text().await?;
    let again = service.status_text().await?;
    assert!(!again.contains('('), "no deltas expected on unchanged data: {again}");
    assert_eq!(service.render_baseline().total_currencies, Some(d("10000")));

    source.set_cash("9500.5");
    clock.advance(chrono::Duration::seconds(61));
    let text = service.status_text().await?;
    assert!(text.contains("Доступные денежные средства: *9 500.5* (-*499.5*)"));

    Ok(())
}

#[tokio::test]
async fn first_observation_is_never_alertable() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::new());
    let mut service = service(source, history.clone(), manual_clock(), BaselinePolicy::default()).await;

    assert!(!service.has_alertable_change().await?);
    assert_eq!(history.save_count(), 1);

    Ok(())
}

#[tokio::test]
async fn previous_check_compares_against_last_observation() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "7000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let clock = manual_clock();
    let mut service = service(source.clone(), history, clock.clone(), BaselinePolicy::PreviousCheck).await;

    assert!(!service.has_alertable_change().await?);

    source.set_cash("10000");
    clock.advance(chrono::Duration::seconds(31));
    assert!(service.has_alertable_change().await?);

    clock.advance(chrono::Duration::seconds(31));
    assert!(!service.has_alertable_change().await?, "change is reported once");

    Ok(())
}

#[tokio::test]
async fn load_once_keeps_comparing_against_initial_record() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let clock = manual_clock();
    let mut service = service(source, history, clock.clone(), BaselinePolicy::LoadOnce).await;

    assert!(service.has_alertable_change().await?);
    clock.advance(chrono::Duration::seconds(31));
    assert!(service.has_alertable_change().await?);

    Ok(())
}

#[tokio::test]
async fn fetch_failure_surfaces_as_data_source_error() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    source.fail(true);
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let mut service = service(source.clone(), history.clone(), manual_clock(), BaselinePolicy::default()).await;

    let err = service.has_alertable_change().await.unwrap_err();
    assert!(matches!(err, StatusError::DataSource(_)));
    assert_eq!(history.save_count(), 0);

    assert_eq!(
        service.status_text_or_notice().await,
        "⚠️ Произошла ошибка при получении данных"
    );
    assert_eq!(
        service.status_message().await,
        "⚠️ Произошла ошибка при получении данных"
    );
    assert_eq!(service.render_baseline(), &previous_baseline());

    source.fail(false);
    assert!(service.status_text().await?.contains("(+*3 000.0*)"));

    Ok(())
}

#[tokio::test]
async fn failed_history_writes_do_not_repeat_alerts() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    history.fail_saves(true);
    let clock = manual_clock();
    let mut service = service(source, history.clone(), clock.clone(), BaselinePolicy::PreviousCheck).await;

    assert!(service.has_alertable_change().await?);
    clock.advance(chrono::Duration::seconds(31));
    assert!(!service.has_alertable_change().await?, "unchanged cash must not alert again");
    clock.advance(chrono::Duration::seconds(31));
    assert!(!service.has_alertable_change().await?);

    assert_eq!(history.current().await, Some(previous_baseline()));

    Ok(())
}

#[tokio::test]
async fn restored_checkpoint_reports_the_change_again() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let clock = manual_clock();
    let mut service = service(source, history, clock.clone(), BaselinePolicy::PreviousCheck).await;

    let checkpoint = service.checkpoint();
    assert!(service.has_alertable_change().await?);
    service.status_text().await?;
    service.restore(checkpoint);

    assert_eq!(service.render_baseline(), &previous_baseline());
    clock.advance(chrono::Duration::seconds(31));
    assert!(service.has_alertable_change().await?);

    Ok(())
}

#[tokio::test]
async fn status_message_prefixes_header() -> Result<()> {
    let source = MockSource::new(totals("100000", "40000", "30000", "20000", "10000"));
    let history = Arc::new(MemoryHistoryStore::with_snapshot(previous_baseline()));
    let mut service = service(source, history, manual_clock(), BaselinePolicy::default()).await;

    let message = service.status_message().await;
    assert!(message.starts_with("📊 *Текущий статус портфеля:*\n\nОбщая стоимость портфеля:"), "{message}");

    Ok(())
}
