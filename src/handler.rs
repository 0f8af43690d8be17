use crate::models::RunOutcome;
use crate::services::unzip_service::UnzipService;
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{Error, LambdaEvent};
use tracing::Instrument;

/// Lambda entry point for S3 `ObjectCreated` notifications.
pub async fn function_handler(
    service: &UnzipService,
    event: LambdaEvent<S3Event>,
) -> Result<RunOutcome, Error> {
    let span = tracing::info_span!("unzip_run", request_id = %event.context.request_id);

    let outcome = service.run(&event.payload).instrument(span).await;
    into_invocation_result(outcome, service.config().fail_invocation_on_error)
}

/// Decide what the host sees. By default every run reports success; with
/// `fail_on_error` an unsuccessful run becomes an invocation error so the
/// host can retry or alert.
pub fn into_invocation_result(outcome: RunOutcome, fail_on_error: bool) -> Result<RunOutcome, Error> {
    if fail_on_error && !outcome.is_success() {
        let detail = serde_json::to_string(&outcome)?;
        return Err(format!("unzip run failed: {}", detail).into());
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchReport, PhaseStatus, RunReport, UploadFailure};

    fn failed_report() -> RunOutcome {
        RunOutcome::Completed(RunReport {
            source_bucket: "source-bucket".to_string(),
            object_key: "report.zip".to_string(),
            destination_prefix: "extracted/report".to_string(),
            initialize: PhaseStatus::Ok,
            fetch: PhaseStatus::Ok,
            extract: PhaseStatus::Ok,
            dispatch: PhaseStatus::failed("1 of 2 uploads failed"),
            uploads: DispatchReport {
                uploaded: vec!["a.txt".to_string()],
                failed: vec![UploadFailure {
                    file_name: "b.txt".to_string(),
                    reason: "access denied".to_string(),
                }],
            },
            source_deletion: PhaseStatus::Skipped,
            cleanup: PhaseStatus::Ok,
            success: false,
        })
    }

    #[test]
    fn test_failed_run_reported_as_success_by_default() {
        let result = into_invocation_result(failed_report(), false).unwrap();
        assert!(!result.is_success());
    }

    #[test]
    fn test_failed_run_escalated_when_configured() {
        let err = into_invocation_result(failed_report(), true).unwrap_err();
        assert!(err.to_string().contains("b.txt"));
    }

    #[test]
    fn test_no_op_is_never_escalated() {
        let outcome = RunOutcome::no_op("no records in S3 event");
        assert!(into_invocation_result(outcome, true).is_ok());
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(RunOutcome::no_op("empty")).unwrap();
        assert_eq!(value["outcome"], "no_op");
        assert_eq!(value["reason"], "empty");

        let value = serde_json::to_value(failed_report()).unwrap();
        assert_eq!(value["outcome"], "completed");
        assert_eq!(value["dispatch"]["status"], "failed");
        assert_eq!(value["uploads"]["failed"][0]["file_name"], "b.txt");
    }
}
