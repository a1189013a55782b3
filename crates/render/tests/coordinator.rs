//! Coordinator behaviour against a scripted in-process backend, on a
//! paused clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use reelforge_core::brand::BrandAssets;
use reelforge_core::error::CoreError;
use reelforge_core::job::JobStatus;
use reelforge_core::request::RenderRequest;
use reelforge_core::timeline::{Slide, Timeline};
use reelforge_core::types::JobId;
use reelforge_render::api::{CreatedJob, JobStatusReport};
use reelforge_render::{
    CoordinatorState, FailureReason, PollPolicy, RenderApi, RenderApiError, RenderCoordinator,
    RenderError,
};
use tokio::time::Instant;

#[derive(Default)]
struct ScriptedApi {
    creates: AtomicUsize,
    polls: Mutex<Vec<Instant>>,
    answers: Mutex<VecDeque<Result<JobStatusReport, RenderApiError>>>,
    reject: Option<String>,
    latency: Duration,
}

impl ScriptedApi {
    fn answering(answers: Vec<Result<JobStatusReport, RenderApiError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    fn requests(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.poll_count()
    }
}

fn report(status: JobStatus) -> Result<JobStatusReport, RenderApiError> {
    Ok(JobStatusReport {
        status,
        output_url: None,
        error_message: None,
    })
}

#[async_trait]
impl RenderApi for ScriptedApi {
    async fn create(&self, _request: &RenderRequest) -> Result<CreatedJob, RenderApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match &self.reject {
            Some(body) => Err(RenderApiError::ApiError {
                status: 422,
                body: body.clone(),
            }),
            None => Ok(CreatedJob {
                id: JobId::new(),
                status: JobStatus::Pending,
            }),
        }
    }

    async fn status(&self, _id: JobId) -> Result<JobStatusReport, RenderApiError> {
        self.polls.lock().unwrap().push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| report(JobStatus::Processing))
    }
}

fn request(slides: Vec<Slide>) -> RenderRequest {
    RenderRequest::new(Timeline::new(slides), BrandAssets::named("Acme"), "dark")
}

fn coordinator(api: &Arc<ScriptedApi>) -> RenderCoordinator {
    RenderCoordinator::new(api.clone(), PollPolicy::default())
}

#[tokio::test]
async fn overlong_slide_is_rejected_without_network() {
    let api = Arc::new(ScriptedApi::default());
    let result = coordinator(&api)
        .start(&request(vec![Slide::new("a".repeat(151))]))
        .await;

    assert_matches!(result, Err(RenderError::Validation(CoreError::Validation(_))));
    assert_eq!(api.requests(), 0);
}

#[tokio::test]
async fn too_many_slides_is_rejected_without_network() {
    let api = Arc::new(ScriptedApi::default());
    let slides = (0..16).map(|i| Slide::new(format!("{i}"))).collect();
    let result = coordinator(&api).submit(&request(slides)).await;

    assert_matches!(result, Err(RenderError::Validation(_)));
    assert_eq!(api.requests(), 0);
}

#[tokio::test]
async fn backend_rejection_is_a_submission_error() {
    let api = Arc::new(ScriptedApi {
        reject: Some(r#"{"error":"Renderer busy","code":"CONFLICT"}"#.into()),
        ..ScriptedApi::default()
    });
    let err = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .err()
        .unwrap();

    assert_matches!(err, RenderError::Submission(_));
    assert_eq!(
        err.failure_reason().unwrap().message(),
        "Failed to start render: Renderer busy"
    );
}

#[tokio::test(start_paused = true)]
async fn processing_job_times_out_after_exactly_one_hundred_polls() {
    let api = Arc::new(ScriptedApi::default());
    let start = Instant::now();
    let mut job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();

    let state = job.wait().await;
    assert_eq!(
        state,
        CoordinatorState::Failed {
            reason: FailureReason::Timeout {
                after: Duration::from_secs(300)
            }
        }
    );
    assert_eq!(start.elapsed(), Duration::from_secs(300));

    let polls = api.polls.lock().unwrap().clone();
    assert_eq!(polls.len(), 100);
    assert!(api.requests() <= 101);
    for pair in polls.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(3000));
    }
    assert_eq!(polls[0] - start, Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn done_stops_polling() {
    let api = Arc::new(ScriptedApi::answering(vec![
        report(JobStatus::Pending),
        report(JobStatus::Processing),
        Ok(JobStatusReport {
            status: JobStatus::Done,
            output_url: Some("https://cdn/out.mp4".into()),
            error_message: None,
        }),
    ]));
    let job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();

    let url = job.finish().await.unwrap();
    assert_eq!(url.as_deref(), Some("https://cdn/out.mp4"));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.poll_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_status_responses_do_not_overlap_polls() {
    let api = Arc::new(ScriptedApi {
        latency: Duration::from_secs(2),
        ..ScriptedApi::answering(vec![
            report(JobStatus::Processing),
            report(JobStatus::Processing),
            Ok(JobStatusReport {
                status: JobStatus::Done,
                output_url: Some("https://cdn/out.mp4".into()),
                error_message: None,
            }),
        ])
    });
    let start = Instant::now();
    let job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();

    job.finish().await.unwrap();

    // The interval starts once the previous response is in.
    let polls = api.polls.lock().unwrap().clone();
    let offsets: Vec<Duration> = polls.iter().map(|at| *at - start).collect();
    assert_eq!(
        offsets,
        vec![
            Duration::from_millis(3000),
            Duration::from_millis(8000),
            Duration::from_millis(13000),
        ]
    );
    assert_eq!(start.elapsed(), Duration::from_millis(15000));
}

#[tokio::test(start_paused = true)]
async fn backend_failure_carries_its_message() {
    let api = Arc::new(ScriptedApi::answering(vec![Ok(JobStatusReport {
        status: JobStatus::Failed,
        output_url: None,
        error_message: Some("encoder crashed".into()),
    })]));
    let mut job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();

    assert_eq!(
        job.wait().await,
        CoordinatorState::Failed {
            reason: FailureReason::Backend("encoder crashed".into())
        }
    );
}

#[tokio::test(start_paused = true)]
async fn transport_error_fails_without_retry() {
    let api = Arc::new(ScriptedApi::answering(vec![
        report(JobStatus::Processing),
        Err(RenderApiError::ApiError {
            status: 502,
            body: "bad gateway".into(),
        }),
    ]));
    let job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();
    let state = job.subscribe();

    assert_matches!(job.finish().await, Err(RenderError::PollTransport(_)));
    assert_eq!(
        state.borrow().clone(),
        CoordinatorState::Failed {
            reason: FailureReason::ConnectionLost("bad gateway".into())
        }
    );

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn status_never_regresses() {
    let api = Arc::new(ScriptedApi::answering(vec![
        report(JobStatus::Processing),
        report(JobStatus::Pending),
    ]));
    let job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(6500)).await;
    assert_eq!(api.poll_count(), 2);
    assert_eq!(job.state(), CoordinatorState::Processing);
}

#[tokio::test(start_paused = true)]
async fn cancelled_tracking_stops_for_good() {
    let api = Arc::new(ScriptedApi::default());
    let job = coordinator(&api)
        .start(&request(vec![Slide::new("ok")]))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(6500)).await;
    job.cancel();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(api.poll_count(), 2);
    assert!(job.is_finished());
    assert_eq!(job.state(), CoordinatorState::Processing);
}

#[tokio::test(start_paused = true)]
async fn jobs_are_tracked_independently() {
    let api = Arc::new(ScriptedApi::default());
    let coordinator = coordinator(&api);
    let first = coordinator.track(JobId::new(), JobStatus::Pending);
    let second = coordinator.track(JobId::new(), JobStatus::Processing);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    first.cancel();
    tokio::time::sleep(Duration::from_millis(6000)).await;

    // second: polls at 3000, 6000, 9000; first: only at 3000.
    assert_eq!(api.poll_count(), 4);
    assert!(first.is_finished());
    assert!(!second.is_finished());
}
