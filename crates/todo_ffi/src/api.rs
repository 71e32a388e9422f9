//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hand alarm mutations back to the platform shell as data.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every DB-backed call opens its own connection and closes it on return.
//! - Failures are reported in the response envelope, never thrown.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::warn;
use todo_core::db::Connection;
use todo_core::{
    core_version as core_version_inner, format_file_size, init_logging as init_logging_inner,
    now_epoch_ms, open_db, ping as ping_inner, schema_version as schema_version_inner,
    AlarmCommand, Attachment, AttachmentService, AttachmentStore, FileType, NotificationAction,
    RecordingAlarmScheduler, ReminderResult, ReminderService, Settings, SettingsService,
    SqliteAttachmentRepository, SqliteSettingsRepository, SqliteTaskRepository, Task, TaskDraft,
    TaskService, TaskServiceError, TaskSortOrder, ThemeMode,
};

const DB_FILE_NAME: &str = "todo_core.sqlite3";
const ATTACHMENTS_DIR_NAME: &str = "todo_attachments";
const DB_PATH_ENV: &str = "TODO_DB_PATH";
const ATTACHMENTS_DIR_ENV: &str = "TODO_ATTACHMENTS_DIR";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ATTACHMENTS_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Schema version this build migrates the database to.
#[flutter_rust_bridge::frb(sync)]
pub fn schema_version() -> u32 {
    schema_version_inner()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Human readable size label, e.g. `1.5 KB`.
#[flutter_rust_bridge::frb(sync)]
pub fn format_size(bytes: u64) -> String {
    format_file_size(bytes)
}

/// Task projection shown by the Flutter UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at_ms: i64,
    /// `0` when the task has no due time.
    pub due_at_ms: i64,
    pub is_completed: bool,
    pub is_overdue: bool,
    pub notification_enabled: bool,
    pub lead_minutes: u32,
    pub category: String,
    pub has_attachments: bool,
}

/// One alarm mutation the platform shell must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmItem {
    /// `schedule` or `cancel`.
    pub kind: String,
    /// Alarm key.
    pub task_id: i64,
    /// Set for `schedule` only.
    pub fire_at_ms: Option<i64>,
    pub due_at_ms: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Single-task response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResponse {
    pub ok: bool,
    pub task: Option<TaskItem>,
    /// Alarm mutations caused by this call, in order.
    pub alarms: Vec<AlarmItem>,
    pub message: String,
}

impl TaskResponse {
    fn success(message: impl Into<String>, task: Option<&Task>, alarms: Vec<AlarmItem>) -> Self {
        Self {
            ok: true,
            task: task.map(to_task_item),
            alarms,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task: None,
            alarms: Vec::new(),
            message: message.into(),
        }
    }
}

/// Task list response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

impl TaskListResponse {
    fn from_result(op: &str, result: Result<Vec<Task>, String>) -> Self {
        match result {
            Ok(tasks) => Self {
                ok: true,
                message: format!("Found {} task(s).", tasks.len()),
                items: tasks.iter().map(to_task_item).collect(),
            },
            Err(err) => Self {
                ok: false,
                items: Vec::new(),
                message: format!("{op} failed: {err}"),
            },
        }
    }
}

/// Input for editing an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdateRequest {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_at_ms: i64,
    pub category: String,
    pub notification_enabled: bool,
    pub lead_minutes: u32,
}

/// Category list or counter response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoriesResponse {
    pub ok: bool,
    pub items: Vec<String>,
    pub incomplete_count: u64,
    pub message: String,
}

/// Attachment projection shown by the Flutter UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentItem {
    pub id: i64,
    pub task_id: i64,
    pub file_name: String,
    pub file_path: String,
    /// `image|document|video|audio|other`.
    pub file_type: String,
    pub file_size: i64,
    pub size_label: String,
    pub created_at_ms: i64,
}

/// Attachment response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentResponse {
    pub ok: bool,
    pub items: Vec<AttachmentItem>,
    pub message: String,
}

impl AttachmentResponse {
    fn from_result(op: &str, result: Result<Vec<Attachment>, String>) -> Self {
        match result {
            Ok(attachments) => Self {
                ok: true,
                message: format!("{} attachment(s).", attachments.len()),
                items: attachments.iter().map(to_attachment_item).collect(),
            },
            Err(err) => Self {
                ok: false,
                items: Vec::new(),
                message: format!("{op} failed: {err}"),
            },
        }
    }
}

/// Boot recovery response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRestoreResponse {
    pub ok: bool,
    pub scheduled: u32,
    pub alarms: Vec<AlarmItem>,
    pub message: String,
}

/// Content to show when an alarm fires; `show=false` means stay silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResponse {
    pub ok: bool,
    pub show: bool,
    pub task_id: i64,
    pub title: String,
    pub body: String,
    pub message: String,
}

/// User preferences projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsItem {
    pub hide_completed: bool,
    pub default_lead_minutes: u32,
    pub default_category: String,
    pub visible_categories: Vec<String>,
    /// `system|light|dark`.
    pub theme_mode: String,
    /// `due_time|creation_time`.
    pub sort_order: String,
}

/// Partial preference update; `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdateRequest {
    pub hide_completed: Option<bool>,
    pub default_lead_minutes: Option<u32>,
    pub default_category: Option<String>,
    pub visible_categories: Option<Vec<String>>,
    pub theme_mode: Option<String>,
    pub sort_order: Option<String>,
}

/// Settings response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    pub settings: Option<SettingsItem>,
    pub message: String,
}

/// Creates a task, filling unset fields from stored preferences.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the stored task and the alarm to register, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: String,
    due_at_ms: i64,
    category: Option<String>,
    notification_enabled: bool,
    lead_minutes: Option<u32>,
) -> TaskResponse {
    let draft = TaskDraft {
        title,
        description,
        due_at_ms,
        category,
        notification_enabled,
        lead_minutes,
    };
    let result = with_db(|conn| {
        let settings = load_settings(conn)?;
        let tasks = task_service(conn)?;
        let task = tasks
            .create_task(&draft, &settings.task_defaults())
            .map_err(|err| err.to_string())?;
        let alarms = with_reminders(|reminders| reminders.schedule_task(&task, now_epoch_ms()))?;
        Ok((task, alarms))
    });
    match result {
        Ok((task, alarms)) => TaskResponse::success("Task created.", Some(&task), alarms),
        Err(err) => TaskResponse::failure(format!("task_create failed: {err}")),
    }
}

/// Replaces editable fields of an existing task and re-arms its alarm.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(request: TaskUpdateRequest) -> TaskResponse {
    let result = with_db(|conn| {
        let tasks = task_service(conn)?;
        let mut task = tasks
            .get_task(request.id)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("task not found: {}", request.id))?;
        task.title = request.title.trim().to_string();
        task.description = request.description.trim().to_string();
        task.due_at_ms = request.due_at_ms;
        task.category = request.category.trim().to_string();
        task.notification_enabled = request.notification_enabled;
        task.lead_minutes = request.lead_minutes;

        let stored = tasks.update_task(&task).map_err(|err| err.to_string())?;
        let alarms =
            with_reminders(|reminders| reminders.reschedule_task(&stored, now_epoch_ms()))?;
        Ok((stored, alarms))
    });
    match result {
        Ok((task, alarms)) => TaskResponse::success("Task updated.", Some(&task), alarms),
        Err(err) => TaskResponse::failure(format!("task_update failed: {err}")),
    }
}

/// Loads one task by id.
#[flutter_rust_bridge::frb(sync)]
pub fn task_get(id: i64) -> TaskResponse {
    let result = with_db(|conn| {
        task_service(conn)?
            .get_task(id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(task)) => TaskResponse::success("Task loaded.", Some(&task), Vec::new()),
        Ok(None) => TaskResponse::failure(format!("task_get failed: task not found: {id}")),
        Err(err) => TaskResponse::failure(format!("task_get failed: {err}")),
    }
}

/// Sets the completion flag; completing cancels the alarm, reopening
/// re-arms it.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_completed(id: i64, completed: bool) -> TaskResponse {
    complete_with("task_set_completed", id, |tasks| {
        tasks.set_completed(id, completed)
    })
}

/// Flips the completion flag.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_completed(id: i64) -> TaskResponse {
    complete_with("task_toggle_completed", id, |tasks| tasks.toggle_completed(id))
}

/// Deletes a task with its attachments and stored files.
///
/// # FFI contract
/// - Returns a `cancel` alarm for the deleted task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: i64) -> TaskResponse {
    let result = with_db(|conn| {
        let store = attachment_store();
        let attachments = attachment_service(conn, &store)?;
        let removed_files = attachments
            .delete_task_with_files(id)
            .map_err(|err| err.to_string())?;
        let alarms = with_reminders(|reminders| reminders.cancel_task(id))?;
        Ok((removed_files, alarms))
    });
    match result {
        Ok((removed_files, alarms)) => TaskResponse::success(
            format!("Task deleted ({removed_files} file(s) removed)."),
            None,
            alarms,
        ),
        Err(err) => TaskResponse::failure(format!("task_delete failed: {err}")),
    }
}

/// Lists tasks for the main screen.
///
/// Input semantics:
/// - `show_completed`: `None` follows the `hide_completed` preference.
/// - `category`: exact category match; `None` lists all categories.
/// - `sort`: `due_time|creation_time`; `None` follows the preference.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(
    show_completed: Option<bool>,
    category: Option<String>,
    sort: Option<String>,
) -> TaskListResponse {
    let result = with_db(|conn| {
        let settings = load_settings(conn)?;
        let sort = match sort.as_deref() {
            Some(raw) => {
                TaskSortOrder::parse(raw).ok_or_else(|| format!("unsupported sort `{raw}`"))?
            }
            None => settings.sort_order,
        };
        let show_completed = show_completed.unwrap_or(!settings.hide_completed);
        let category = category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        task_service(conn)?
            .filtered_tasks(show_completed, category, sort)
            .map_err(|err| err.to_string())
    });
    TaskListResponse::from_result("task_list", result)
}

/// Substring search over title and description.
#[flutter_rust_bridge::frb(sync)]
pub fn task_search(text: String) -> TaskListResponse {
    let result = with_db(|conn| {
        task_service(conn)?
            .search_tasks(text.trim())
            .map_err(|err| err.to_string())
    });
    TaskListResponse::from_result("task_search", result)
}

/// Distinct task categories plus the incomplete task counter.
#[flutter_rust_bridge::frb(sync)]
pub fn task_categories() -> CategoriesResponse {
    let result = with_db(|conn| {
        let tasks = task_service(conn)?;
        let items = tasks.list_categories().map_err(|err| err.to_string())?;
        let incomplete = tasks.incomplete_count().map_err(|err| err.to_string())?;
        Ok((items, incomplete))
    });
    match result {
        Ok((items, incomplete_count)) => CategoriesResponse {
            ok: true,
            message: format!("{} categor(ies).", items.len()),
            items,
            incomplete_count,
        },
        Err(err) => CategoriesResponse {
            ok: false,
            items: Vec::new(),
            incomplete_count: 0,
            message: format!("task_categories failed: {err}"),
        },
    }
}

/// Copies a user-picked file into the attachment store and links it.
#[flutter_rust_bridge::frb(sync)]
pub fn attachment_add(task_id: i64, source_path: String, file_name: String) -> AttachmentResponse {
    let result = with_db(|conn| {
        let store = attachment_store();
        let attachment = attachment_service(conn, &store)?
            .attach_file(task_id, Path::new(source_path.trim()), file_name.trim())
            .map_err(|err| err.to_string())?;
        Ok(vec![attachment])
    });
    AttachmentResponse::from_result("attachment_add", result)
}

/// Lists attachments of a task, oldest first.
///
/// `file_type` narrows to `image|document|video|audio|other`.
#[flutter_rust_bridge::frb(sync)]
pub fn attachment_list(task_id: i64, file_type: Option<String>) -> AttachmentResponse {
    let result = with_db(|conn| {
        let file_type = match file_type.as_deref() {
            Some(raw) => Some(
                FileType::parse(raw).ok_or_else(|| format!("unsupported file type `{raw}`"))?,
            ),
            None => None,
        };
        let store = attachment_store();
        attachment_service(conn, &store)?
            .list_attachments(task_id, file_type)
            .map_err(|err| err.to_string())
    });
    AttachmentResponse::from_result("attachment_list", result)
}

/// Deletes an attachment row and its stored file.
#[flutter_rust_bridge::frb(sync)]
pub fn attachment_delete(id: i64) -> AttachmentResponse {
    let result = with_db(|conn| {
        let store = attachment_store();
        let removed = attachment_service(conn, &store)?
            .remove_attachment(id)
            .map_err(|err| err.to_string())?;
        Ok(vec![removed])
    });
    AttachmentResponse::from_result("attachment_delete", result)
}

/// Rebuilds all reminder alarms after a device reboot.
///
/// # FFI contract
/// - Called from the platform boot receiver.
/// - Returns one `schedule` alarm per future reminder.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_restore_after_boot() -> ReminderRestoreResponse {
    let result = with_db(|conn| {
        let repo = SqliteTaskRepository::try_new(conn).map_err(|err| err.to_string())?;
        let mut scheduled = 0;
        let alarms = with_reminders(|reminders| {
            scheduled = reminders.restore_after_boot(&repo, now_epoch_ms())?;
            Ok(())
        })?;
        Ok((scheduled, alarms))
    });
    match result {
        Ok((scheduled, alarms)) => ReminderRestoreResponse {
            ok: true,
            scheduled: u32::try_from(scheduled).unwrap_or(u32::MAX),
            alarms,
            message: format!("Restored {scheduled} reminder(s)."),
        },
        Err(err) => ReminderRestoreResponse {
            ok: false,
            scheduled: 0,
            alarms: Vec::new(),
            message: format!("reminder_restore_after_boot failed: {err}"),
        },
    }
}

/// Resolves a fired alarm into notification text.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_on_alarm_fired(task_id: i64) -> NotificationResponse {
    let result = with_db(|conn| {
        let repo = SqliteTaskRepository::try_new(conn).map_err(|err| err.to_string())?;
        ReminderService::new(RecordingAlarmScheduler::new())
            .on_alarm_fired(&repo, task_id, now_epoch_ms())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(content)) => NotificationResponse {
            ok: true,
            show: true,
            task_id: content.task_id,
            title: content.title,
            body: content.body,
            message: "Notification ready.".to_string(),
        },
        Ok(None) => NotificationResponse {
            ok: true,
            show: false,
            task_id,
            title: String::new(),
            body: String::new(),
            message: "Reminder no longer active.".to_string(),
        },
        Err(err) => NotificationResponse {
            ok: false,
            show: false,
            task_id,
            title: String::new(),
            body: String::new(),
            message: format!("reminder_on_alarm_fired failed: {err}"),
        },
    }
}

/// Applies a notification button press (`complete|snooze`).
#[flutter_rust_bridge::frb(sync)]
pub fn notification_action(task_id: i64, action: String) -> TaskResponse {
    let Some(action) = NotificationAction::parse(&action) else {
        return TaskResponse::failure(format!(
            "notification_action failed: unsupported action `{}`",
            action.trim()
        ));
    };
    let result = with_db(|conn| {
        let repo = SqliteTaskRepository::try_new(conn).map_err(|err| err.to_string())?;
        let mut updated = None;
        let alarms = with_reminders(|reminders| {
            updated = reminders.handle_action(&repo, task_id, action, now_epoch_ms())?;
            Ok(())
        })?;
        Ok((updated, alarms))
    });
    match result {
        Ok((Some(task), alarms)) => TaskResponse::success("Action applied.", Some(&task), alarms),
        Ok((None, alarms)) => TaskResponse::success("Task no longer active.", None, alarms),
        Err(err) => TaskResponse::failure(format!("notification_action failed: {err}")),
    }
}

/// Loads user preferences with defaults applied.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_get() -> SettingsResponse {
    match with_db(load_settings) {
        Ok(settings) => SettingsResponse {
            ok: true,
            settings: Some(to_settings_item(&settings)),
            message: "Settings loaded.".to_string(),
        },
        Err(err) => SettingsResponse {
            ok: false,
            settings: None,
            message: format!("settings_get failed: {err}"),
        },
    }
}

/// Applies a partial preference update and returns the result.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_update(request: SettingsUpdateRequest) -> SettingsResponse {
    let result = with_db(|conn| {
        // All fields land together or not at all.
        let tx = conn.unchecked_transaction().map_err(|err| err.to_string())?;
        let settings = {
            let repo = SqliteSettingsRepository::try_new(&tx).map_err(|err| err.to_string())?;
            let service = SettingsService::new(repo);
            apply_settings_update(&service, &request)?;
            service.load().map_err(|err| err.to_string())?
        };
        tx.commit().map_err(|err| err.to_string())?;
        Ok(settings)
    });
    match result {
        Ok(settings) => SettingsResponse {
            ok: true,
            settings: Some(to_settings_item(&settings)),
            message: "Settings saved.".to_string(),
        },
        Err(err) => SettingsResponse {
            ok: false,
            settings: None,
            message: format!("settings_update failed: {err}"),
        },
    }
}

fn apply_settings_update(
    service: &SettingsService<SqliteSettingsRepository<'_>>,
    request: &SettingsUpdateRequest,
) -> Result<(), String> {
    if let Some(hide) = request.hide_completed {
        service
            .set_hide_completed(hide)
            .map_err(|err| err.to_string())?;
    }
    if let Some(minutes) = request.default_lead_minutes {
        service
            .set_default_lead_minutes(minutes)
            .map_err(|err| err.to_string())?;
    }
    if let Some(category) = request.default_category.as_deref() {
        service
            .set_default_category(category)
            .map_err(|err| err.to_string())?;
    }
    if let Some(categories) = request.visible_categories.as_ref() {
        service
            .set_visible_categories(categories)
            .map_err(|err| err.to_string())?;
    }
    if let Some(raw) = request.theme_mode.as_deref() {
        let mode = ThemeMode::parse(raw).ok_or_else(|| format!("unsupported theme `{raw}`"))?;
        service.set_theme_mode(mode).map_err(|err| err.to_string())?;
    }
    if let Some(raw) = request.sort_order.as_deref() {
        let order =
            TaskSortOrder::parse(raw).ok_or_else(|| format!("unsupported sort `{raw}`"))?;
        service
            .set_sort_order(order)
            .map_err(|err| err.to_string())?;
    }
    Ok(())
}

fn complete_with(
    op: &str,
    id: i64,
    f: impl FnOnce(
        &TaskService<SqliteTaskRepository<'_>>,
    ) -> Result<Task, TaskServiceError>,
) -> TaskResponse {
    let result = with_db(|conn| {
        let tasks = task_service(conn)?;
        let task = f(&tasks).map_err(|err| err.to_string())?;
        let alarms = with_reminders(|reminders| {
            if task.is_completed {
                reminders.cancel_task(id)
            } else {
                reminders.reschedule_task(&task, now_epoch_ms()).map(|_| ())
            }
        })?;
        Ok((task, alarms))
    });
    match result {
        Ok((task, alarms)) => TaskResponse::success("Task updated.", Some(&task), alarms),
        Err(err) => TaskResponse::failure(format!("{op} failed: {err}")),
    }
}

fn resolve_path(cell: &'static OnceLock<PathBuf>, env_key: &str, fallback: &str) -> PathBuf {
    cell.get_or_init(|| {
        if let Ok(raw) = std::env::var(env_key) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        std::env::temp_dir().join(fallback)
    })
    .clone()
}

fn resolve_db_path() -> PathBuf {
    resolve_path(&DB_PATH, DB_PATH_ENV, DB_FILE_NAME)
}

fn attachment_store() -> AttachmentStore {
    AttachmentStore::new(resolve_path(
        &ATTACHMENTS_DIR,
        ATTACHMENTS_DIR_ENV,
        ATTACHMENTS_DIR_NAME,
    ))
}

fn with_db<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))?;
    f(&conn)
}

/// Runs `f` against a recording scheduler and returns the alarm commands
/// it produced.
fn with_reminders<T>(
    f: impl FnOnce(&ReminderService<RecordingAlarmScheduler>) -> ReminderResult<T>,
) -> Result<Vec<AlarmItem>, String> {
    let reminders = ReminderService::new(RecordingAlarmScheduler::new());
    if let Err(err) = f(&reminders) {
        warn!("event=reminder_apply module=ffi status=error error={err}");
        return Err(err.to_string());
    }
    Ok(reminders
        .scheduler()
        .take_commands()
        .into_iter()
        .map(to_alarm_item)
        .collect())
}

fn task_service(
    conn: &Connection,
) -> Result<TaskService<SqliteTaskRepository<'_>>, String> {
    SqliteTaskRepository::try_new(conn)
        .map(TaskService::new)
        .map_err(|err| format!("task repo init failed: {err}"))
}

fn attachment_service<'a>(
    conn: &'a Connection,
    store: &'a AttachmentStore,
) -> Result<AttachmentService<'a, SqliteAttachmentRepository<'a>, SqliteTaskRepository<'a>>, String>
{
    let attachments = SqliteAttachmentRepository::try_new(conn)
        .map_err(|err| format!("attachment repo init failed: {err}"))?;
    let tasks = SqliteTaskRepository::try_new(conn)
        .map_err(|err| format!("task repo init failed: {err}"))?;
    Ok(AttachmentService::new(attachments, tasks, store))
}

fn load_settings(conn: &Connection) -> Result<Settings, String> {
    let repo = SqliteSettingsRepository::try_new(conn)
        .map_err(|err| format!("settings repo init failed: {err}"))?;
    SettingsService::new(repo)
        .load()
        .map_err(|err| err.to_string())
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        created_at_ms: task.created_at_ms,
        due_at_ms: task.due_at_ms,
        is_completed: task.is_completed,
        is_overdue: task.is_overdue(now_epoch_ms()),
        notification_enabled: task.notification_enabled,
        lead_minutes: task.lead_minutes,
        category: task.category.clone(),
        has_attachments: task.has_attachments,
    }
}

fn to_attachment_item(attachment: &Attachment) -> AttachmentItem {
    AttachmentItem {
        id: attachment.id,
        task_id: attachment.task_id,
        file_name: attachment.file_name.clone(),
        file_path: attachment.file_path.clone(),
        file_type: attachment.file_type.as_str().to_string(),
        file_size: attachment.file_size,
        size_label: format_file_size(u64::try_from(attachment.file_size).unwrap_or(0)),
        created_at_ms: attachment.created_at_ms,
    }
}

fn to_alarm_item(command: AlarmCommand) -> AlarmItem {
    match command {
        AlarmCommand::Schedule(plan) => AlarmItem {
            kind: "schedule".to_string(),
            task_id: plan.task_id,
            fire_at_ms: Some(plan.fire_at_ms),
            due_at_ms: Some(plan.due_at_ms),
            title: Some(plan.title),
            description: Some(plan.description),
        },
        AlarmCommand::Cancel { task_id } => AlarmItem {
            kind: "cancel".to_string(),
            task_id,
            fire_at_ms: None,
            due_at_ms: None,
            title: None,
            description: None,
        },
    }
}

fn to_settings_item(settings: &Settings) -> SettingsItem {
    SettingsItem {
        hide_completed: settings.hide_completed,
        default_lead_minutes: settings.default_lead_minutes,
        default_category: settings.default_category.clone(),
        visible_categories: settings.visible_categories.iter().cloned().collect(),
        theme_mode: settings.theme_mode.as_str().to_string(),
        sort_order: settings.sort_order.as_str().to_string(),
    }
}
