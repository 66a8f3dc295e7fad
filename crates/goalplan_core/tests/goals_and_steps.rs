use chrono::NaiveDate;
use goalplan_core::db::{open_db, open_db_in_memory};
use goalplan_core::{
    AccountService, GoalRepository, GoalService, GoalServiceError, GridConfig, NewStep,
    SqliteGoalRepository, SqliteUserRepository, StepValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn deadline() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn new_step(name: &str, hours: f64, priority: u8) -> NewStep {
    NewStep {
        name: name.to_string(),
        hours,
        priority,
        deadline: deadline(),
    }
}

fn register(conn: &Connection, username: &str) {
    AccountService::new(SqliteUserRepository::new(conn))
        .register(username, "pw")
        .unwrap();
}

#[test]
fn goals_and_steps_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("goalplan.sqlite3");

    let step_id = {
        let conn = open_db(&path).unwrap();
        register(&conn, "alice");
        let service = GoalService::new(SqliteGoalRepository::new(&conn));
        let mut session = service.open_session("alice", GridConfig::default()).unwrap();

        service.create_goal(&mut session, "thesis").unwrap();
        service
            .add_step(&mut session, "thesis", &new_step("outline", 2.0, 1))
            .unwrap();
        let second = service
            .add_step(&mut session, "thesis", &new_step("draft", 6.5, 2))
            .unwrap();
        service.set_step_done(&mut session, second, true).unwrap();
        second
    };

    let conn = open_db(&path).unwrap();
    let service = GoalService::new(SqliteGoalRepository::new(&conn));
    let session = service.open_session("alice", GridConfig::default()).unwrap();

    assert_eq!(session.goals().len(), 1);
    let plan = session.goal("thesis").unwrap();
    let names: Vec<&str> = plan.steps.iter().map(|step| step.name.as_str()).collect();
    assert_eq!(names, vec!["outline", "draft"]);
    assert_eq!(plan.steps[1].hours, 6.5);
    assert_eq!(plan.steps[1].priority, 2);
    assert_eq!(plan.steps[1].deadline, deadline());
    assert!(session.step(step_id).unwrap().done);
    assert!(!plan.steps[0].done);
}

#[test]
fn creating_existing_goal_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));
    let mut session = service.open_session("alice", GridConfig::default()).unwrap();
    // Opened before the goal exists, so its cache does not know about it.
    let mut stale = service.open_session("alice", GridConfig::default()).unwrap();

    let first = service.create_goal(&mut session, "gym").unwrap();
    let second = service.create_goal(&mut session, " gym ").unwrap();
    assert_eq!(first, second);
    assert_eq!(session.goals().len(), 1);

    assert_eq!(service.create_goal(&mut stale, "gym").unwrap(), first);
    assert_eq!(stale.goals().len(), 1);
}

#[test]
fn goal_names_are_scoped_per_user() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    register(&conn, "bob");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));

    let mut alice = service.open_session("alice", GridConfig::default()).unwrap();
    let mut bob = service.open_session("bob", GridConfig::default()).unwrap();
    let alice_goal = service.create_goal(&mut alice, "read").unwrap();
    let bob_goal = service.create_goal(&mut bob, "read").unwrap();
    assert_ne!(alice_goal, bob_goal);

    service
        .add_step(&mut alice, "read", &new_step("chapter 1", 1.0, 1))
        .unwrap();
    let bob_reloaded = service.open_session("bob", GridConfig::default()).unwrap();
    assert!(bob_reloaded.steps().is_empty());
}

#[test]
fn adding_step_to_unknown_goal_fails() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));
    let mut session = service.open_session("alice", GridConfig::default()).unwrap();

    let err = service
        .add_step(&mut session, "missing", &new_step("x", 1.0, 1))
        .unwrap_err();
    assert!(matches!(err, GoalServiceError::UnknownGoal(name) if name == "missing"));
}

#[test]
fn invalid_step_is_rejected_and_not_cached() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));
    let mut session = service.open_session("alice", GridConfig::default()).unwrap();
    service.create_goal(&mut session, "gym").unwrap();

    let err = service
        .add_step(&mut session, "gym", &new_step("run", 1.0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        GoalServiceError::InvalidStep(StepValidationError::PriorityOutOfRange(0))
    ));

    let err = service
        .add_step(&mut session, "gym", &new_step("   ", 1.0, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        GoalServiceError::InvalidStep(StepValidationError::EmptyName)
    ));
    assert!(session.steps().is_empty());
}

#[test]
fn empty_goal_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));
    let mut session = service.open_session("alice", GridConfig::default()).unwrap();

    let err = service.create_goal(&mut session, "  ").unwrap_err();
    assert!(matches!(err, GoalServiceError::InvalidGoal(_)));
}

#[test]
fn check_in_of_foreign_step_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    register(&conn, "bob");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));

    let mut alice = service.open_session("alice", GridConfig::default()).unwrap();
    service.create_goal(&mut alice, "read").unwrap();
    let step_id = service
        .add_step(&mut alice, "read", &new_step("chapter 1", 1.0, 1))
        .unwrap();

    let mut bob = service.open_session("bob", GridConfig::default()).unwrap();
    let err = service.set_step_done(&mut bob, step_id, true).unwrap_err();
    assert!(matches!(err, GoalServiceError::StepNotFound(id) if id == step_id));

    let stored = SqliteGoalRepository::new(&conn)
        .get_step(step_id)
        .unwrap()
        .unwrap();
    assert!(!stored.done);
}

#[test]
fn reload_picks_up_writes_from_other_sessions() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));

    let mut first = service.open_session("alice", GridConfig::default()).unwrap();
    let mut second = service.open_session("alice", GridConfig::default()).unwrap();
    service.create_goal(&mut first, "read").unwrap();
    assert!(second.goals().is_empty());

    service.reload(&mut second).unwrap();
    assert_eq!(second.goals().len(), 1);
}

#[test]
fn repo_rejects_step_for_missing_goal() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGoalRepository::new(&conn);
    let step = goalplan_core::Step::new(Uuid::new_v4(), "orphan", 1.0, 1, deadline());

    let err = repo.create_step(&step).unwrap_err();
    assert!(matches!(err, goalplan_core::RepoError::GoalNotFound(_)));
}

#[test]
fn repo_rejects_corrupt_rows() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, "alice");
    let service = GoalService::new(SqliteGoalRepository::new(&conn));
    let mut session = service.open_session("alice", GridConfig::default()).unwrap();
    service.create_goal(&mut session, "read").unwrap();
    let step_id = service
        .add_step(&mut session, "read", &new_step("chapter", 1.0, 1))
        .unwrap();

    conn.execute(
        "UPDATE steps SET deadline = 'soon' WHERE uuid = ?1;",
        [step_id.to_string()],
    )
    .unwrap();

    let err = SqliteGoalRepository::new(&conn)
        .get_step(step_id)
        .unwrap_err();
    assert!(matches!(err, goalplan_core::RepoError::InvalidData(_)));
}
