//! Integration tests for `todo_reminder`.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;
use todo_reminder::alerts::AlertFeed;
use todo_reminder::checker::DeadlineChecker;
use todo_reminder::command::RealCommandRunner;
use todo_reminder::error::Error;
use todo_reminder::notifier::Notifier;
use todo_reminder::tasks::{NewTask, SqliteTaskStore, TaskStore, ViewFilter};
use todo_reminder::testing::RecordingNotifier;
use todo_reminder::traits::CommandRunner;
use todo_reminder::VERSION;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 9, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

fn store(dir: &TempDir) -> Arc<SqliteTaskStore> {
    Arc::new(SqliteTaskStore::new(dir.path().join("tasks.db")).unwrap())
}

fn checker(store: &Arc<SqliteTaskStore>, notifier: &Arc<RecordingNotifier>) -> DeadlineChecker {
    DeadlineChecker::new(
        Arc::clone(store) as Arc<dyn TaskStore + Send + Sync>,
        Arc::clone(notifier) as Arc<dyn Notifier>,
        Arc::new(AlertFeed::default()),
    )
}

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

#[test]
fn test_real_command_runner() {
    let runner = RealCommandRunner::new();
    let output = runner.run("echo", &["hello"], None).unwrap();
    assert!(output.success());
    assert!(output.stdout.contains("hello"));
}

#[test]
fn test_create_list_and_remind_once() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let notifier = Arc::new(RecordingNotifier::new());
    let checker = checker(&store, &notifier);

    let task = store
        .create_task(
            &NewTask::new("Renew passport", now() + Duration::hours(2), now() + Duration::hours(1)),
            now(),
        )
        .unwrap();

    let all = store.list_tasks(ViewFilter::All, now()).unwrap();
    assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![task.id]);
    assert!(store.list_tasks(ViewFilter::Completed, now()).unwrap().is_empty());

    let tick_at = now() + Duration::hours(1) + Duration::minutes(1);
    let report = checker.tick(tick_at).unwrap();
    assert_eq!(report.reminded, vec![task.id]);
    assert_eq!(notifier.count(), 1);
    assert!(store.get_task(task.id).unwrap().unwrap().notified);

    let again = checker.tick(tick_at).unwrap();
    assert!(again.reminded.is_empty());
    assert_eq!(notifier.count(), 1);
}

#[test]
fn test_past_deadline_rejected_and_nothing_persisted() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    let result = store.create_task(
        &NewTask::new("Too late", now() - Duration::hours(1), now() - Duration::hours(2)),
        now(),
    );
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(store.list_tasks(ViewFilter::All, now()).unwrap().is_empty());
    assert_eq!(store.counts().unwrap().total, 0);
}

#[test]
fn test_complete_twice_matches_once() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let task = store
        .create_task(&NewTask::new("Once", now() + Duration::hours(3), now()), now())
        .unwrap();

    let first = store.complete_task(task.id).unwrap();
    let second = store.complete_task(task.id).unwrap();
    assert_eq!(first, second);
    assert!(second.completed);
    assert!(matches!(store.complete_task(task.id + 100), Err(Error::TaskNotFound(_))));
}

#[test]
fn test_completed_task_never_notified() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let notifier = Arc::new(RecordingNotifier::new());
    let checker = checker(&store, &notifier);

    let task = store
        .create_task(&NewTask::new("Finished early", now() + Duration::hours(1), now()), now())
        .unwrap();
    store.complete_task(task.id).unwrap();

    let report = checker.tick(now() + Duration::days(2)).unwrap();
    assert!(report.is_empty());
    assert_eq!(notifier.count(), 0);
}

#[test]
fn test_database_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let store = store(&dir);
        store
            .create_task(&NewTask::new("Persisted", now() + Duration::hours(5), now()), now())
            .unwrap()
            .id
    };

    let reopened = store(&dir);
    let task = reopened.get_task(id).unwrap().unwrap();
    assert_eq!(task.title, "Persisted");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_create_rejects_past_times(deadline_min in -600_i64..600, notify_min in -600_i64..600) {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let deadline = now() + Duration::minutes(deadline_min);
        let notify = now() + Duration::minutes(notify_min);

        let result = store.create_task(&NewTask::new("p", deadline, notify), now());
        if deadline_min < 0 || notify_min < 0 {
            prop_assert!(matches!(result, Err(Error::Validation(_))));
            prop_assert_eq!(store.counts().unwrap().total, 0);
        } else if notify_min > deadline_min {
            prop_assert!(matches!(result, Err(Error::Validation(_))));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn prop_due_view_is_exact_subset(
        deadlines in prop::collection::vec(0_i64..(3 * 24 * 60), 1..8),
        complete_mask in prop::collection::vec(any::<bool>(), 8),
        later_min in 0_i64..(2 * 24 * 60),
    ) {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for (i, minutes) in deadlines.iter().enumerate() {
            let task = store
                .create_task(&NewTask::new("t", now() + Duration::minutes(*minutes), now()), now())
                .unwrap();
            if complete_mask[i] {
                store.complete_task(task.id).unwrap();
            }
        }

        let view_at = now() + Duration::minutes(later_min);
        let mut expected: Vec<i64> = store
            .list_tasks(ViewFilter::All, view_at)
            .unwrap()
            .into_iter()
            .filter(|t| t.is_due_soon(view_at))
            .map(|t| t.id)
            .collect();
        expected.sort_unstable();
        let mut due: Vec<i64> =
            store.list_tasks(ViewFilter::Due, view_at).unwrap().into_iter().map(|t| t.id).collect();
        due.sort_unstable();
        prop_assert_eq!(due, expected);
    }

    #[test]
    fn prop_never_notified_twice(notify_mins in prop::collection::vec(0_i64..120, 1..6), tick_min in 0_i64..240) {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let notifier = Arc::new(RecordingNotifier::new());
        let checker = checker(&store, &notifier);
        for m in &notify_mins {
            store
                .create_task(&NewTask::new("n", now() + Duration::minutes(300), now() + Duration::minutes(*m)), now())
                .unwrap();
        }

        let at = now() + Duration::minutes(tick_min);
        let first = checker.tick(at).unwrap();
        for id in &first.reminded {
            prop_assert!(store.get_task(*id).unwrap().unwrap().notified);
        }
        let second = checker.tick(at).unwrap();
        prop_assert!(second.reminded.is_empty());
        prop_assert_eq!(notifier.count(), first.reminded.len());
    }
}
