//! Unit tests for the evaluation scheduler

use crate::test_utils::idle_service;
use signalcast::core::{cron_expression, EvaluationScheduler};
use signalcast::error::ServiceError;

#[test]
fn test_cron_expression_seconds_and_minutes() {
    assert_eq!(cron_expression(30), "*/30 * * * * *");
    assert_eq!(cron_expression(60), "0 */1 * * * *");
    assert_eq!(cron_expression(900), "0 */15 * * * *");
}

#[test]
fn test_zero_interval_is_rejected() {
    assert!(matches!(
        EvaluationScheduler::new(idle_service(), 0),
        Err(ServiceError::Scheduler(_))
    ));
}

#[tokio::test]
async fn test_scheduler_start_stop() {
    let scheduler = EvaluationScheduler::new(idle_service(), 3600).unwrap();
    assert!(!scheduler.is_running().await);

    scheduler.start().await;
    assert!(scheduler.is_running().await);

    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
}
