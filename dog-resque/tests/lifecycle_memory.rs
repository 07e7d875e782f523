use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

use dog_resque::{
    args_into, Job, JobArgs, JobContext, JobError, JobEventKind, JobHandler, JobId, JobStatus,
    MemoryBackend, NamedJob, NewJob, QueueClient, ResqueConfig, ResqueError, JobEvent,
};

/// Records deliveries; fails when `to` has no `@`
#[derive(Deserialize)]
struct SendWelcome {
    to: String,
    #[serde(skip)]
    ctx: Option<JobContext>,
}

#[async_trait]
impl JobHandler for SendWelcome {
    fn bind(&mut self, ctx: JobContext) {
        self.ctx = Some(ctx);
    }

    async fn perform(&mut self) -> Result<(), JobError> {
        if let Some(ctx) = &self.ctx {
            ctx.update_status(JobStatus::Running)
                .await
                .map_err(|e| JobError::failed(e.to_string()))?;
        }

        if self.to.contains('@') {
            Ok(())
        } else {
            Err(JobError::failed(format!("bad address: {}", self.to)))
        }
    }
}

impl NamedJob for SendWelcome {
    const CLASS: &'static str = "SendWelcome";

    fn from_args(args: JobArgs, _queue: &str) -> Result<Self, JobError> {
        args_into(args)
    }
}

fn create_test_client() -> QueueClient {
    let client = QueueClient::new(MemoryBackend::new());
    client.registry().register::<SendWelcome>().unwrap();
    client
}

/// Reserve, perform, and on error fail, the way a worker loop would
async fn work_one(job: &mut Job) -> Result<bool, ResqueError> {
    match job.perform().await {
        Ok(performed) => {
            if performed {
                job.update_status(JobStatus::Complete).await?;
            }
            Ok(performed)
        }
        Err(e) => {
            job.fail(&e).await?;
            Err(e)
        }
    }
}

#[tokio::test]
async fn test_create_and_reserve_roundtrip() {
    let client = create_test_client().with_id_generator(|| JobId::from("abc123"));

    let id = client
        .create(NewJob::new("emails", "SendWelcome").with_args(json!({"to": "a@example.com"})))
        .await
        .unwrap();
    assert_eq!(id.as_str(), "abc123");
    assert_eq!(client.size("emails").await.unwrap(), 1);

    let raw = client.store().pop("emails").await.unwrap().unwrap();
    let wire: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(wire["class"], "SendWelcome");
    assert_eq!(wire["args"], json!([{"to": "a@example.com"}]));
    assert_eq!(wire["id"], "abc123");

    client.store().push("emails", raw).await.unwrap();
    let job = client.reserve("emails").await.unwrap().unwrap();
    assert_eq!(job.queue(), "emails");
    assert_eq!(job.class(), "SendWelcome");
    assert_eq!(
        job.to_string(),
        r#"(Job{emails} | ID: abc123 | SendWelcome | [{"to":"a@example.com"}])"#
    );
    assert!(client.reserve("emails").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_args_enqueue_nothing() {
    let client = create_test_client();

    for bad in [json!("a@example.com"), json!(42), json!(["a@example.com"])] {
        let result = client
            .create(NewJob::new("emails", "SendWelcome").with_args(bad))
            .await;
        assert!(matches!(result, Err(ResqueError::InvalidArgument(_))));
    }

    assert_eq!(client.size("emails").await.unwrap(), 0);
    assert!(client.queues().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reserve_empty_queue() {
    let client = create_test_client();
    assert!(client.reserve("nothing-here").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reserve_blocking_times_out() {
    let client = create_test_client();
    let started = tokio::time::Instant::now();

    let job = client
        .reserve_blocking(&["high", "low"], Some(Duration::from_secs(3)))
        .await
        .unwrap();

    assert!(job.is_none());
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_reserve_blocking_uses_configured_timeout() {
    let config = ResqueConfig::default().with_blocking_timeout(Duration::from_secs(1));
    let client = create_test_client().with_config(config).unwrap();

    let job = client.reserve_blocking(&["default"], None).await.unwrap();
    assert!(job.is_none());
}

#[tokio::test]
async fn test_reserve_blocking_wakes_on_create() {
    let client = create_test_client();
    let producer = client.clone();

    let waiter = tokio::spawn(async move {
        client
            .reserve_blocking(&["high", "low"], Some(Duration::from_secs(5)))
            .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let id = producer
        .create(NewJob::new("low", "SendWelcome").with_args(json!({"to": "b@example.com"})))
        .await
        .unwrap();

    let job = waiter.await.unwrap().unwrap().unwrap();
    assert_eq!(job.queue(), "low");
    assert_eq!(job.id(), Some(&id));
}

#[test_log::test(tokio::test)]
async fn test_tracked_job_completes() {
    let client = create_test_client();
    let id = client
        .create(
            NewJob::new("emails", "SendWelcome")
                .with_args(json!({"to": "a@example.com"}))
                .with_monitor(true),
        )
        .await
        .unwrap();
    assert_eq!(client.status_tracker().get(&id).await.unwrap(), Some(JobStatus::Waiting));

    let mut job = client.reserve("emails").await.unwrap().unwrap();
    assert!(work_one(&mut job).await.unwrap());
    assert_eq!(job.status().await.unwrap(), Some(JobStatus::Complete));
    assert_eq!(client.failures().count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn test_failed_job_is_recorded_and_recreated() {
    let client = create_test_client();
    let id = client
        .create(
            NewJob::new("emails", "SendWelcome")
                .with_args(json!({"to": "nobody"}))
                .with_monitor(true),
        )
        .await
        .unwrap();

    let mut job = client.reserve("emails").await.unwrap().unwrap();
    job.set_worker("host:42:emails");

    let err = work_one(&mut job).await.unwrap_err();
    assert_eq!(err.kind(), "HandlerExecutionFailure");
    assert_eq!(job.status().await.unwrap(), Some(JobStatus::Failed));

    let failures = client.failures().all().await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].payload.job_id(), Some(&id));
    assert_eq!(failures[0].error, "Job handler failed: bad address: nobody");
    assert_eq!(client.stats().get("failed").await.unwrap(), 1);
    assert_eq!(client.stats().get("failed:host:42:emails").await.unwrap(), 1);

    let retry = job.recreate().await.unwrap();
    assert_ne!(retry, id);
    assert_eq!(client.status_tracker().get(&retry).await.unwrap(), Some(JobStatus::Waiting));

    let again = client.reserve("emails").await.unwrap().unwrap();
    assert_eq!(again.id(), Some(&retry));
    assert_eq!(again.arguments(), job.arguments());
}

#[tokio::test]
async fn test_unknown_class_fails_with_resolution_error() {
    let client = create_test_client();
    client.create(NewJob::new("default", "Missing")).await.unwrap();

    let mut job = client.reserve("default").await.unwrap().unwrap();
    let err = work_one(&mut job).await.unwrap_err();

    assert!(matches!(err, ResqueError::HandlerNotFound(ref class) if class == "Missing"));
    let failures = client.failures().all().await.unwrap();
    assert_eq!(failures[0].exception, "HandlerResolutionFailure");
}

#[tokio::test]
async fn test_before_perform_can_skip() {
    let client = create_test_client();
    client.events().listen(JobEventKind::BeforePerform, |event| match event.job() {
        Some(job) if job.arguments().contains_key("skip") => Err(ResqueError::DontPerform),
        _ => Ok(()),
    });

    client
        .create(NewJob::new("emails", "SendWelcome").with_args(json!({"to": "nobody", "skip": true})))
        .await
        .unwrap();

    let mut job = client.reserve("emails").await.unwrap().unwrap();
    assert!(!work_one(&mut job).await.unwrap());
    assert_eq!(client.failures().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_enqueue_hooks() {
    let client = create_test_client();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    client.events().listen(JobEventKind::BeforeEnqueue, move |event| {
        let JobEvent::BeforeEnqueue(params) = event else {
            return Ok(());
        };
        log.lock().push(format!("before:{}", params.queue));
        if params.queue == "blocked" {
            return Err(ResqueError::DontCreate);
        }
        Ok(())
    });

    let log = seen.clone();
    client.events().listen(JobEventKind::AfterEnqueue, move |event| {
        if let Some(params) = event.enqueue_params() {
            log.lock().push(format!("after:{}", params.id));
        }
        Ok(())
    });

    let id = client
        .enqueue(NewJob::new("emails", "SendWelcome").with_args(json!({"to": "a@example.com"})))
        .await
        .unwrap()
        .unwrap();
    let blocked = client.enqueue(NewJob::new("blocked", "SendWelcome")).await.unwrap();

    assert_eq!(blocked, None);
    assert_eq!(client.size("blocked").await.unwrap(), 0);
    assert_eq!(
        *seen.lock(),
        vec!["before:emails".to_string(), format!("after:{}", id), "before:blocked".to_string()]
    );
}

#[tokio::test]
async fn test_display_truncates_long_arguments() {
    let client = create_test_client();
    let body = "x".repeat(1000);
    client
        .create(NewJob::new("emails", "SendWelcome").with_args(json!({"to": body, "__meta": body})))
        .await
        .unwrap();

    let job = client.reserve("emails").await.unwrap().unwrap();
    let shown = job.to_string();

    assert!(shown.contains(&format!("\"to\":\"{}...\"", "x".repeat(509))));
    assert!(shown.contains(&format!("\"__meta\":\"{}\"", body)));
}
