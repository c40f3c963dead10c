mod common;

use std::time::Duration;

use common::*;
use pretty_assertions::assert_eq;
use promptdesk_core::{
    update, AppState, Effect, JobId, JobStatus, Msg, Notification, PollSettings, StatusIndicator,
    StatusReport, DEFAULT_POLL_PERIOD,
};

#[test]
fn upload_registers_queued_job_and_starts_timer() {
    init_logging();
    let state = signed_in(AppState::new());

    let (state, effects) = uploaded(state, "j1", 10);

    assert_eq!(status_of(&state, "j1"), Some(JobStatus::Queued));
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notification::UploadAccepted {
                job_id: JobId::from("j1")
            }),
            Effect::StartTimer {
                timer: 1,
                period: DEFAULT_POLL_PERIOD
            },
        ]
    );
    assert!(state.scheduler().is_running());
}

#[test]
fn full_lifecycle_notifies_once_and_stops_timer() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "j1", 10);

    // Tick 1: fetch, job moves to processing silently.
    let (state, effects) = tick(state, 1, 3);
    assert_eq!(
        effects,
        vec![Effect::FetchStatus {
            job_id: JobId::from("j1")
        }]
    );
    let (state, effects) = fetched(state, "j1", StatusReport::new(JobStatus::Processing));
    assert!(effects.is_empty());
    assert_eq!(status_of(&state, "j1"), Some(JobStatus::Processing));

    // Tick 2: completes, exactly one notification and one refresh.
    let (state, effects) = tick(state, 1, 6);
    assert_eq!(effects.len(), 1);
    let (state, effects) = fetched(state, "j1", StatusReport::new(JobStatus::Complete));
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notification::JobCompleted {
                job_id: JobId::from("j1"),
                owner_id: 10
            }),
            Effect::RefreshEntities,
        ]
    );
    assert_eq!(status_of(&state, "j1"), Some(JobStatus::Complete));

    // Tick 3: nothing pending, the timer cancels itself.
    let (state, effects) = tick(state, 1, 9);
    assert_eq!(effects, vec![Effect::CancelTimer { timer: 1 }]);
    assert!(!state.scheduler().is_running());
    assert_eq!(state.view().jobs[0].indicator, StatusIndicator::Done);
}

#[test]
fn terminal_status_is_sticky() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "j1", 10);
    let (state, first) = fetched(state, "j1", StatusReport::new(JobStatus::Complete));
    assert_eq!(notifications(&first), 1);

    let mut state = state;
    let mut late_notifications = 0;
    for report in [
        StatusReport::new(JobStatus::Complete),
        StatusReport::error("stale retry"),
        StatusReport::new(JobStatus::Processing),
        StatusReport::new(JobStatus::Queued),
    ] {
        let (next, effects) = fetched(state, "j1", report);
        late_notifications += notifications(&effects);
        assert!(!effects.contains(&Effect::RefreshEntities));
        state = next;
    }

    assert_eq!(late_notifications, 0);
    assert_eq!(status_of(&state, "j1"), Some(JobStatus::Complete));
    assert_eq!(state.registry().get(&JobId::from("j1")).unwrap().message, None);
}

#[test]
fn empty_registry_cancels_on_first_tick() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "j1", 10);
    let (state, _) = update(state, Msg::DocumentDeleted { job_id: JobId::from("j1") });

    let (state, effects) = tick(state, 1, 3);

    assert_eq!(effects, vec![Effect::CancelTimer { timer: 1 }]);
    assert!(!state.scheduler().is_running());
}

#[test]
fn failed_fetch_is_isolated_to_its_job() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "a", 1);
    let (state, _) = uploaded(state, "b", 2);
    let timer = state.scheduler().active_timer().unwrap();

    let (state, effects) = tick(state, timer, 3);
    assert_eq!(
        effects,
        vec![
            Effect::FetchStatus {
                job_id: JobId::from("a")
            },
            Effect::FetchStatus {
                job_id: JobId::from("b")
            },
        ]
    );

    // Results arrive out of order; B's success does not wait for A.
    let (state, _) = fetched(state, "b", StatusReport::new(JobStatus::Processing));
    let (state, effects) = fetched(state, "a", StatusReport::error("http status 502"));
    assert_eq!(
        effects[0],
        Effect::Notify(Notification::JobFailed {
            job_id: JobId::from("a"),
            message: "http status 502".to_string()
        })
    );

    assert_eq!(status_of(&state, "a"), Some(JobStatus::Error));
    assert_eq!(status_of(&state, "b"), Some(JobStatus::Processing));

    let (state, effects) = tick(state, timer, 6);
    assert_eq!(
        effects,
        vec![Effect::FetchStatus {
            job_id: JobId::from("b")
        }]
    );
    assert!(state.scheduler().is_running());
}

#[test]
fn second_upload_replaces_timer_and_stale_ticks_are_dropped() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "a", 1);
    let (state, effects) = uploaded(state, "b", 2);

    assert_eq!(
        effects[1..].to_vec(),
        vec![
            Effect::CancelTimer { timer: 1 },
            Effect::StartTimer {
                timer: 2,
                period: DEFAULT_POLL_PERIOD
            },
        ]
    );

    let (state, effects) = tick(state, 1, 3);
    assert!(effects.is_empty());
    let (state, effects) = tick(state, 2, 3);
    assert_eq!(effects.len(), 2);
    assert_eq!(state.registry().get(&JobId::from("a")).unwrap().polls, 1);
}

#[test]
fn reupload_for_same_prompt_replaces_its_job() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "old", 5);
    let (state, _) = uploaded(state, "new", 5);

    assert_eq!(status_of(&state, "old"), None);
    assert_eq!(status_of(&state, "new"), Some(JobStatus::Queued));
    assert_eq!(state.registry().len(), 1);
}

#[test]
fn jobs_exceeding_poll_budget_fail_once() {
    init_logging();
    let state = signed_in(AppState::with_poll_settings(PollSettings {
        period: Duration::from_secs(3),
        max_polls: Some(2),
    }));
    let (state, _) = uploaded(state, "slow", 1);

    let (state, first) = tick(state, 1, 3);
    let (state, _) = fetched(state, "slow", StatusReport::new(JobStatus::Processing));
    let (state, second) = tick(state, 1, 6);
    let (state, _) = fetched(state, "slow", StatusReport::new(JobStatus::Processing));
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);

    let (state, effects) = tick(state, 1, 9);
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notification::JobFailed {
                job_id: JobId::from("slow"),
                message: "document processing timed out".to_string()
            }),
            Effect::RefreshEntities,
            Effect::CancelTimer { timer: 1 },
        ]
    );
    assert_eq!(status_of(&state, "slow"), Some(JobStatus::Error));

    // A late answer for the timed-out job changes nothing.
    let (state, effects) = fetched(state, "slow", StatusReport::new(JobStatus::Complete));
    assert!(effects.is_empty());
    assert_eq!(status_of(&state, "slow"), Some(JobStatus::Error));
}

#[test]
fn outstanding_fetch_is_not_repeated_on_later_ticks() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "slow", 1);

    let (state, first) = tick(state, 1, 3);
    assert_eq!(
        first,
        vec![Effect::FetchStatus {
            job_id: JobId::from("slow")
        }]
    );

    // The server has not answered yet; the timer keeps running but asks
    // nothing new.
    let (state, second) = tick(state, 1, 6);
    let (state, third) = tick(state, 1, 9);
    assert!(second.is_empty());
    assert!(third.is_empty());
    assert!(state.scheduler().is_running());
    assert_eq!(state.registry().get(&JobId::from("slow")).unwrap().polls, 1);

    let (state, _) = fetched(state, "slow", StatusReport::new(JobStatus::Processing));
    let (state, effects) = tick(state, 1, 12);
    assert_eq!(
        effects,
        vec![Effect::FetchStatus {
            job_id: JobId::from("slow")
        }]
    );
    assert_eq!(state.registry().get(&JobId::from("slow")).unwrap().polls, 2);
}

#[test]
fn reply_after_stop_polling_still_clears_the_outstanding_mark() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "j1", 1);
    let (state, _) = tick(state, 1, 3);
    let (state, _) = update(state, Msg::StopPolling);

    let (state, effects) = fetched(state, "j1", StatusReport::new(JobStatus::Complete));
    assert!(effects.is_empty());
    assert!(!state.registry().get(&JobId::from("j1")).unwrap().in_flight);

    // Polling picks the job up again after a restart.
    let (state, effects) = uploaded(state, "j2", 2);
    let timer = state.scheduler().active_timer().unwrap();
    assert!(effects.iter().any(|e| matches!(e, Effect::StartTimer { .. })));
    let (_state, effects) = tick(state, timer, 6);
    assert_eq!(effects.len(), 2);
}

#[test]
fn results_after_stop_polling_are_discarded() {
    init_logging();
    let state = signed_in(AppState::new());
    let (state, _) = uploaded(state, "j1", 1);
    let (state, effects) = update(state, Msg::StopPolling);
    assert_eq!(effects, vec![Effect::CancelTimer { timer: 1 }]);

    let (state, effects) = fetched(state, "j1", StatusReport::new(JobStatus::Complete));

    assert!(effects.is_empty());
    assert_eq!(status_of(&state, "j1"), Some(JobStatus::Queued));
}

#[test]
fn upload_rejections_register_nothing() {
    init_logging();
    let upload = promptdesk_core::DocumentUpload {
        owner_id: 1,
        filename: "book.pdf".to_string(),
        book_reference: "Book".to_string(),
        bytes: b"%PDF-1.7".to_vec(),
    };

    let (state, effects) = update(AppState::new(), Msg::UploadRequested(upload.clone()));
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(Notification::UploadFailed { .. })]
    ));

    let state = signed_in(state);
    let (state, effects) = update(state, Msg::UploadRequested(upload.clone()));
    assert_eq!(effects, vec![Effect::UploadDocument(upload)]);

    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            message: "http status 413".to_string(),
        },
    );
    assert_eq!(notifications(&effects), 1);
    assert!(state.registry().is_empty());
    assert!(!state.scheduler().is_running());
}
