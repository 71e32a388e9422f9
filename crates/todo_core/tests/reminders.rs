use todo_core::db::open_db_in_memory;
use todo_core::reminder::due::fire_time;
use todo_core::{
    plan_for_task, AlarmCommand, InMemoryAlarmScheduler, NotificationAction,
    RecordingAlarmScheduler, ReminderService, SqliteTaskRepository, Task, TaskRepository,
};

const MINUTE_MS: i64 = 60_000;
const NOW: i64 = 1_700_000_000_000;

#[test]
fn fire_time_subtracts_lead_minutes() {
    assert_eq!(fire_time(NOW + 60 * MINUTE_MS, 15), NOW + 45 * MINUTE_MS);
    assert_eq!(fire_time(NOW, 0), NOW);
}

#[test]
fn schedule_registers_future_reminder_keyed_by_task_id() {
    let service = ReminderService::new(InMemoryAlarmScheduler::new());
    let task = persisted_task(7, NOW + 60 * MINUTE_MS, 15);

    let plan = service.schedule_task(&task, NOW).unwrap().unwrap();
    assert_eq!(plan.task_id, 7);
    assert_eq!(plan.fire_at_ms, NOW + 45 * MINUTE_MS);

    let registered = service.scheduler().scheduled(7).unwrap();
    assert_eq!(registered, plan);
}

#[test]
fn past_fire_time_is_never_registered() {
    let service = ReminderService::new(InMemoryAlarmScheduler::new());

    // Due in 10 minutes with a 15 minute lead: fire time already passed.
    let task = persisted_task(1, NOW + 10 * MINUTE_MS, 15);
    assert!(service.schedule_task(&task, NOW).unwrap().is_none());

    let exact = persisted_task(2, NOW + 15 * MINUTE_MS, 15);
    assert!(service.schedule_task(&exact, NOW).unwrap().is_none());

    assert!(service.scheduler().is_empty());
}

#[test]
fn disabled_completed_and_undated_tasks_get_no_plan() {
    let mut disabled = persisted_task(1, NOW + 60 * MINUTE_MS, 5);
    disabled.notification_enabled = false;
    let mut completed = persisted_task(2, NOW + 60 * MINUTE_MS, 5);
    completed.is_completed = true;
    let undated = persisted_task(3, 0, 5);

    assert!(plan_for_task(&disabled, NOW).is_none());
    assert!(plan_for_task(&completed, NOW).is_none());
    assert!(plan_for_task(&undated, NOW).is_none());
}

#[test]
fn reschedule_replaces_existing_alarm() {
    let service = ReminderService::new(InMemoryAlarmScheduler::new());
    let mut task = persisted_task(3, NOW + 60 * MINUTE_MS, 15);
    service.schedule_task(&task, NOW).unwrap();

    task.due_at_ms = NOW + 120 * MINUTE_MS;
    service.reschedule_task(&task, NOW).unwrap();

    assert_eq!(service.scheduler().len(), 1);
    assert_eq!(
        service.scheduler().scheduled(3).unwrap().fire_at_ms,
        NOW + 105 * MINUTE_MS
    );
}

#[test]
fn reschedule_to_past_drops_existing_alarm() {
    let service = ReminderService::new(InMemoryAlarmScheduler::new());
    let mut task = persisted_task(4, NOW + 60 * MINUTE_MS, 15);
    service.schedule_task(&task, NOW).unwrap();

    task.notification_enabled = false;
    assert!(service.reschedule_task(&task, NOW).unwrap().is_none());
    assert!(service.scheduler().scheduled(4).is_none());
}

#[test]
fn reschedule_emits_cancel_before_schedule() {
    let service = ReminderService::new(RecordingAlarmScheduler::new());
    let task = persisted_task(5, NOW + 60 * MINUTE_MS, 15);

    service.reschedule_task(&task, NOW).unwrap();

    let commands = service.scheduler().take_commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0], AlarmCommand::Cancel { task_id: 5 });
    assert!(matches!(&commands[1], AlarmCommand::Schedule(plan) if plan.task_id == 5));
}

#[test]
fn boot_recovery_skips_disabled_completed_and_past_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let future = create(&repo, NOW + 60 * MINUTE_MS, 15, true, false);
    create(&repo, NOW + 60 * MINUTE_MS, 15, false, false);
    create(&repo, NOW + 60 * MINUTE_MS, 15, true, true);
    create(&repo, NOW - MINUTE_MS, 15, true, false);
    // Due in the future, but its fire time has already passed.
    create(&repo, NOW + 5 * MINUTE_MS, 15, true, false);

    let service = ReminderService::new(InMemoryAlarmScheduler::new());
    let scheduled = service.restore_after_boot(&repo, NOW).unwrap();

    assert_eq!(scheduled, 1);
    let plans = service.scheduler().plans();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].task_id, future);
}

#[test]
fn reschedule_all_counts_only_registered_alarms() {
    let service = ReminderService::new(InMemoryAlarmScheduler::new());
    let mut muted = persisted_task(2, NOW + 60 * MINUTE_MS, 0);
    muted.notification_enabled = false;
    let tasks = vec![
        persisted_task(1, NOW + 60 * MINUTE_MS, 0),
        muted,
        persisted_task(3, NOW + 30 * MINUTE_MS, 10),
    ];

    assert_eq!(service.reschedule_all(&tasks, NOW).unwrap(), 2);
    assert!(service.scheduler().scheduled(2).is_none());
}

#[test]
fn fired_alarm_builds_notification_for_active_task_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let service = ReminderService::new(InMemoryAlarmScheduler::new());

    let mut task = Task::new("Dentist");
    task.description = "bring insurance card".to_string();
    task.due_at_ms = NOW + 2 * 60 * MINUTE_MS;
    let id = repo.create_task(&task).unwrap();

    let content = service.on_alarm_fired(&repo, id, NOW).unwrap().unwrap();
    assert_eq!(content.task_id, id);
    assert_eq!(content.title, "Reminder: Dentist");
    assert_eq!(content.body, "bring insurance card • In 2 hours");

    repo.set_completed(id, true).unwrap();
    assert!(service.on_alarm_fired(&repo, id, NOW).unwrap().is_none());
    assert!(service.on_alarm_fired(&repo, 999, NOW).unwrap().is_none());
}

#[test]
fn complete_action_marks_done_and_cancels_alarm() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let service = ReminderService::new(InMemoryAlarmScheduler::new());

    let id = create(&repo, NOW + 60 * MINUTE_MS, 15, true, false);
    let task = repo.get_task(id).unwrap().unwrap();
    service.schedule_task(&task, NOW).unwrap();

    let updated = service
        .handle_action(&repo, id, NotificationAction::Complete, NOW)
        .unwrap()
        .unwrap();
    assert!(updated.is_completed);
    assert!(repo.get_task(id).unwrap().unwrap().is_completed);
    assert!(service.scheduler().scheduled(id).is_none());

    assert!(service
        .handle_action(&repo, id, NotificationAction::Complete, NOW)
        .unwrap()
        .is_none());
}

#[test]
fn snooze_action_pushes_due_time_and_rearms() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let service = ReminderService::new(InMemoryAlarmScheduler::new());

    let due = NOW + 10 * MINUTE_MS;
    let id = create(&repo, due, 5, true, false);

    let updated = service
        .handle_action(&repo, id, NotificationAction::Snooze, NOW)
        .unwrap()
        .unwrap();
    assert_eq!(updated.due_at_ms, due + 15 * MINUTE_MS);
    assert_eq!(
        repo.get_task(id).unwrap().unwrap().due_at_ms,
        due + 15 * MINUTE_MS
    );
    assert_eq!(
        service.scheduler().scheduled(id).unwrap().fire_at_ms,
        due + 10 * MINUTE_MS
    );
}

fn persisted_task(id: i64, due_at_ms: i64, lead_minutes: u32) -> Task {
    let mut task = Task::new(format!("task {id}"));
    task.id = id;
    task.due_at_ms = due_at_ms;
    task.lead_minutes = lead_minutes;
    task
}

fn create(
    repo: &SqliteTaskRepository<'_>,
    due_at_ms: i64,
    lead_minutes: u32,
    notification_enabled: bool,
    completed: bool,
) -> i64 {
    let mut task = Task::new("reminder");
    task.due_at_ms = due_at_ms;
    task.lead_minutes = lead_minutes;
    task.notification_enabled = notification_enabled;
    task.is_completed = completed;
    repo.create_task(&task).unwrap()
}
