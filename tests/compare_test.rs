use mysqldiff::prelude::*;
use pretty_assertions::assert_eq;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn int(name: &str) -> Column {
    Column::new("", name).typed("int", "int(11)").not_null()
}

fn varchar(name: &str) -> Column {
    Column::new("", name).typed("varchar", "varchar(255)")
}

fn comparer(left: Snapshot, right: Snapshot) -> Comparer<SnapshotSource, SnapshotSource> {
    Comparer::new(SnapshotSource::new(left), SnapshotSource::new(right))
}

#[tokio::test]
async fn test_tables_added_and_deleted() {
    let left = Snapshot::new("staging")
        .table("users", vec![int("id")])
        .table("orders", vec![int("id")]);
    let right = Snapshot::new("production")
        .table("users", vec![int("id")])
        .table("legacy", vec![int("id")]);

    let report = comparer(left, right).table_report().await.unwrap();
    assert_eq!(report.added, names(&["orders"]));
    assert_eq!(report.deleted, names(&["legacy"]));
    assert!(report.changed.is_empty());
}

#[tokio::test]
async fn test_added_column_marks_table_changed() {
    let left = Snapshot::new("staging").table(
        "users",
        vec![int("id"), varchar("name"), varchar("email")],
    );
    // `name` also differs, but the added column alone decides the table.
    let right = Snapshot::new("production").table(
        "users",
        vec![int("id"), varchar("name").comment("legacy")],
    );
    let comparer = comparer(left, right);

    let columns = comparer.column_report("users").await.unwrap();
    assert_eq!(columns.table, "users");
    assert_eq!(columns.added, names(&["email"]));
    assert!(columns.deleted.is_empty());
    assert_eq!(columns.changed, names(&["name"]));

    let tables = comparer.table_report().await.unwrap();
    assert_eq!(tables.changed, names(&["users"]));
}

#[tokio::test]
async fn test_default_null_versus_empty_string() {
    let left = Snapshot::new("staging").table("users", vec![varchar("email")]);
    let right = Snapshot::new("production")
        .table("users", vec![varchar("email").default_value("")]);

    let report = comparer(left, right)
        .field_report("users", "email")
        .await
        .unwrap();
    assert_eq!(
        report.changed,
        vec![FieldChange {
            name: "DefaultValue".into(),
            old: "".into(),
            new: "NULL".into(),
        }]
    );
}

#[tokio::test]
async fn test_column_report_for_table_missing_on_one_side() {
    let left = Snapshot::new("staging").table("audit", vec![int("id"), varchar("actor")]);
    let right = Snapshot::new("production");

    let report = comparer(left, right).column_report("audit").await.unwrap();
    assert_eq!(report.added, names(&["id", "actor"]));
    assert!(report.deleted.is_empty());
    assert!(report.changed.is_empty());
}

#[tokio::test]
async fn test_field_report_missing_on_left_names_left() {
    let left = Snapshot::new("staging").table("users", vec![int("id")]);
    let right = Snapshot::new("production").table("users", vec![varchar("email")]);

    let err = comparer(left, right)
        .field_report("users", "email")
        .await
        .unwrap_err();
    assert!(matches!(err, DiffError::NotFound { side: Side::Left, .. }));
}

#[tokio::test]
async fn test_field_report_missing_column_aborts() {
    let left = Snapshot::new("staging").table("users", vec![varchar("email")]);
    let right = Snapshot::new("production").table("users", vec![int("id")]);

    let err = comparer(left, right)
        .field_report("users", "email")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiffError::NotFound { side: Side::Right, ref column, .. } if column == "email"
    ));
    assert_eq!(
        err.to_string(),
        "right get_column(users.email): column not found"
    );
}

#[tokio::test]
async fn test_reports_serialize_to_documented_shape() {
    let left = Snapshot::new("staging").table("users", vec![int("id"), varchar("email")]);
    let right = Snapshot::new("production").table("users", vec![int("id")]);
    let comparer = comparer(left, right);

    let tables = serde_json::to_value(comparer.table_report().await.unwrap()).unwrap();
    assert_eq!(
        tables,
        serde_json::json!({"added": [], "deleted": [], "changed": ["users"]})
    );

    let columns = serde_json::to_value(comparer.column_report("users").await.unwrap()).unwrap();
    assert_eq!(
        columns,
        serde_json::json!({"table": "users", "added": ["email"], "deleted": [], "changed": []})
    );
}
