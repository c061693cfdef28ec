use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use sedici_core::{Database, NewTask, RepoError, SqliteTaskRepository, Task, TaskRepository};
use std::collections::HashSet;
use uuid::Uuid;

fn repo() -> (Database, SqliteTaskRepository) {
    let db = Database::open_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(db.clone());
    (db, repo)
}

fn at(text: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(text).unwrap()
}

fn task_created_at(title: &str, created_at: &str) -> Task {
    let mut task = Task::new(title, "");
    task.created_at = at(created_at);
    task.updated_at = at(created_at);
    task
}

#[test]
fn save_new_task_then_get_returns_it_unchecked() {
    let (_db, repo) = repo();

    let id = repo
        .save_new_task(&NewTask::new("Hello world!", ""))
        .unwrap();

    let loaded = repo.get_task_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, "Hello world!");
    assert_eq!(loaded.description, "");
    assert!(!loaded.is_checked);
    assert_eq!(loaded.created_at, loaded.updated_at);
    assert_eq!(loaded.expires_on, None);
}

#[test]
fn save_new_task_generates_distinct_ids() {
    let (_db, repo) = repo();

    let ids: HashSet<_> = (0..10)
        .map(|index| {
            repo.save_new_task(&NewTask::new(format!("task {index}"), ""))
                .unwrap()
        })
        .collect();

    assert_eq!(ids.len(), 10);
    assert_eq!(repo.list_tasks().unwrap().len(), 10);
}

#[test]
fn save_new_task_with_expiration_stores_start_of_day() {
    let (_db, repo) = repo();
    let date = NaiveDate::from_ymd_opt(2026, 5, 17).unwrap();

    let id = repo
        .save_new_task(&NewTask::new("pay rent", "").with_expiration(Some(date)))
        .unwrap();

    let expires_on = repo.get_task_by_id(id).unwrap().unwrap().expires_on.unwrap();
    assert_eq!(expires_on.date_naive(), date);
    assert_eq!(expires_on.time(), chrono::NaiveTime::MIN);
}

#[test]
fn get_missing_task_returns_none() {
    let (_db, repo) = repo();
    assert!(repo.get_task_by_id(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn inserting_existing_id_keeps_original_row() {
    let (db, repo) = repo();
    let original = task_created_at("original", "2021-01-01T10:00:00Z");
    repo.insert_task(&original).unwrap();
    let version = db.change_version();

    let mut duplicate = original.clone();
    duplicate.title = "replacement".to_string();
    duplicate.is_checked = true;
    repo.insert_task(&duplicate).unwrap();

    assert_eq!(repo.get_task_by_id(original.id).unwrap().unwrap(), original);
    assert_eq!(db.change_version(), version);
}

#[test]
fn insert_tasks_inserts_all_and_skips_duplicates() {
    let (_db, repo) = repo();
    let first = task_created_at("first", "2021-01-01T10:00:00Z");
    let second = task_created_at("second", "2021-01-02T10:00:00Z");
    repo.insert_task(&first).unwrap();

    repo.insert_tasks(&[first.clone(), second.clone()]).unwrap();

    assert_eq!(repo.list_tasks().unwrap(), vec![second, first]);
}

#[test]
fn insert_rejects_invalid_task() {
    let (_db, repo) = repo();
    let mut task = Task::new("broken", "");
    task.updated_at = task.created_at - Duration::seconds(1);

    let err = repo.insert_task(&task).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.list_tasks().unwrap().is_empty());
}

#[test]
fn delete_first_of_two_leaves_exactly_the_second() {
    let (_db, repo) = repo();
    let first = task_created_at("first", "2021-01-01T10:00:00Z");
    let second = task_created_at("second", "2021-01-02T10:00:00Z");
    repo.insert_task(&first).unwrap();
    repo.insert_task(&second).unwrap();

    repo.delete_task_by_id(first.id).unwrap();

    assert_eq!(repo.list_tasks().unwrap(), vec![second]);
}

#[test]
fn deleting_missing_id_changes_nothing() {
    let (db, repo) = repo();
    let task = task_created_at("kept", "2021-01-01T10:00:00Z");
    repo.insert_task(&task).unwrap();
    let version = db.change_version();

    repo.delete_task_by_id(Uuid::new_v4()).unwrap();

    assert_eq!(repo.list_tasks().unwrap(), vec![task]);
    assert_eq!(db.change_version(), version);
}

#[test]
fn set_checked_updates_flag_and_ignores_missing_ids() {
    let (db, repo) = repo();
    let task = task_created_at("check me", "2021-01-01T10:00:00Z");
    repo.insert_task(&task).unwrap();

    repo.set_task_checked_by_id(task.id, true).unwrap();
    assert!(repo.get_task_by_id(task.id).unwrap().unwrap().is_checked);

    let version = db.change_version();
    let missing = Uuid::new_v4();
    repo.set_task_checked_by_id(missing, true).unwrap();

    assert!(repo.get_task_by_id(missing).unwrap().is_none());
    assert_eq!(repo.list_tasks().unwrap().len(), 1);
    assert_eq!(db.change_version(), version);
}

#[test]
fn field_setters_update_only_their_field_and_bump_updated_at() {
    let (_db, repo) = repo();
    let task = task_created_at("before", "2021-01-01T10:00:00Z");
    repo.insert_task(&task).unwrap();

    repo.set_task_title_by_id(task.id, "after").unwrap();
    repo.set_task_description_by_id(task.id, "details").unwrap();
    let date = NaiveDate::from_ymd_opt(2030, 2, 3).unwrap();
    repo.set_task_expiration_by_id(task.id, Some(date)).unwrap();

    let loaded = repo.get_task_by_id(task.id).unwrap().unwrap();
    assert_eq!(loaded.title, "after");
    assert_eq!(loaded.description, "details");
    assert!(!loaded.is_checked);
    assert_eq!(loaded.created_at, task.created_at);
    assert!(loaded.updated_at > task.updated_at);
    assert_eq!(loaded.expires_on.map(|value| value.date_naive()), Some(date));

    repo.set_task_expiration_by_id(task.id, None).unwrap();
    assert_eq!(repo.get_task_by_id(task.id).unwrap().unwrap().expires_on, None);
}

#[test]
fn field_updates_never_move_updated_at_backwards() {
    let (_db, repo) = repo();
    // Stamped far in the future so "now" is earlier than the stored value.
    let task = task_created_at("future", "2999-01-01T00:00:00Z");
    repo.insert_task(&task).unwrap();

    repo.set_task_title_by_id(task.id, "renamed").unwrap();

    let loaded = repo.get_task_by_id(task.id).unwrap().unwrap();
    assert_eq!(loaded.title, "renamed");
    assert_eq!(loaded.updated_at, task.updated_at);
}

#[test]
fn update_task_replaces_fields_and_ignores_missing_rows() {
    let (_db, repo) = repo();
    let task = task_created_at("draft", "2021-01-01T10:00:00Z");
    repo.insert_task(&task).unwrap();

    let mut edited = task.clone();
    edited.title = "final".to_string();
    edited.is_checked = true;
    edited.updated_at = at("2021-01-05T10:00:00Z");
    repo.update_task(&edited).unwrap();
    assert_eq!(repo.get_task_by_id(task.id).unwrap().unwrap(), edited);

    let stranger = task_created_at("stranger", "2021-01-01T10:00:00Z");
    repo.update_task(&stranger).unwrap();
    assert!(repo.get_task_by_id(stranger.id).unwrap().is_none());
}

#[test]
fn list_is_ordered_by_expiration_then_creation() {
    let (_db, repo) = repo();

    let mut soon = task_created_at("soon", "2021-01-01T10:00:00Z");
    soon.expires_on = Some(at("2021-02-01T00:00:00Z"));
    let mut later = task_created_at("later", "2021-01-01T09:00:00Z");
    later.expires_on = Some(at("2021-03-01T00:00:00Z"));
    let newest = task_created_at("newest", "2021-01-03T10:00:00Z");
    let oldest = task_created_at("oldest", "2021-01-02T10:00:00Z");
    let tie_b = task_created_at("b", "2021-01-01T08:00:00Z");
    let tie_a = task_created_at("a", "2021-01-01T08:00:00Z");

    repo.insert_tasks(&[
        oldest.clone(),
        tie_b.clone(),
        soon.clone(),
        newest.clone(),
        tie_a.clone(),
        later.clone(),
    ])
    .unwrap();

    let titles: Vec<_> = repo
        .list_tasks()
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["later", "soon", "newest", "oldest", "a", "b"]);
}

#[test]
fn corrupt_rows_are_reported_not_masked() {
    let db = Database::open_in_memory().unwrap();
    let repo = SqliteTaskRepository::new(db.clone());
    db.write(|conn| {
        conn.execute(
            "INSERT INTO Tasks (id, title, description, is_checked, created_at, updated_at)
             VALUES ('not-a-uuid', 't', '', 0, '2021-01-01T00:00:00Z', '2021-01-01T00:00:00Z');",
            [],
        )
    })
    .unwrap();

    assert!(matches!(repo.list_tasks(), Err(RepoError::InvalidData(_))));
}

#[tokio::test]
async fn observe_tasks_emits_current_list_then_changes() {
    let (_db, repo) = repo();
    let first = task_created_at("first", "2021-01-01T10:00:00Z");
    repo.insert_task(&first).unwrap();

    let mut live = repo.observe_tasks();
    assert_eq!(live.next().await.unwrap().unwrap(), vec![first.clone()]);

    let second = task_created_at("second", "2021-01-02T10:00:00Z");
    repo.insert_task(&second).unwrap();
    assert_eq!(live.next().await.unwrap().unwrap(), vec![second, first]);
}

#[tokio::test]
async fn observe_task_by_id_reports_deletion_as_none() {
    let (_db, repo) = repo();
    let task = task_created_at("doomed", "2021-01-01T10:00:00Z");
    repo.insert_task(&task).unwrap();

    let mut live = repo.observe_task_by_id(task.id);
    assert_eq!(live.next().await.unwrap().unwrap(), Some(task.clone()));

    repo.delete_task_by_id(task.id).unwrap();
    assert_eq!(live.next().await.unwrap().unwrap(), None);
}
