use std::time::Duration;

use chrono::NaiveDate;
use scrollcal::{
    AnnotationError, AnnotationGateway, FileGateway, WeekStart, WindowSlot, build_annotated_window,
};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[tokio::test]
async fn missing_file_is_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = FileGateway::open(dir.path().join("none.txt")).await.unwrap();
    assert!(gateway.is_empty().await);
    assert!(gateway.fetch(ymd(2024, 2, 1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn reads_mixed_formats_and_skips_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.txt");
    std::fs::write(
        &path,
        "# lotto log\n\
         2023-08-23; [speetto] 10000\n\
         23-08-2023; [lotto] 5000\n\
         08/24/2023; [lotto] 1000\n\
         2023-08-25 [lotto] 1\n\
         2023-08-26; [lotto] many\n\
         \n",
    )
    .unwrap();

    let gateway = FileGateway::open(&path).await.unwrap();
    assert_eq!(gateway.len().await, 3);

    let day = gateway.fetch(ymd(2023, 8, 23)).await.unwrap();
    let kinds: Vec<_> = day.iter().map(|a| a.kind.as_str()).collect();
    assert_eq!(kinds, ["speetto", "lotto"]);
    assert!(gateway.fetch(ymd(2023, 8, 25)).await.unwrap().is_empty());
}

#[tokio::test]
async fn created_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.txt");

    let gateway = FileGateway::open(&path).await.unwrap();
    gateway.create(ymd(2024, 2, 29), "lotto", 3_000).await.unwrap();
    gateway.create(ymd(2024, 2, 29), "speetto", 10_000).await.unwrap();
    drop(gateway);

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "2024-02-29; [lotto] 3000\n2024-02-29; [speetto] 10000\n"
    );

    let reopened = FileGateway::open(&path).await.unwrap();
    let records = reopened.fetch(ymd(2024, 2, 29)).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].amount, 10_000);
}

#[tokio::test]
async fn rejected_write_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.txt");
    std::fs::write(&path, "2024-02-01; [lotto] 1\n").unwrap();

    let gateway = FileGateway::open(&path).await.unwrap();
    let err = gateway.create(ymd(2024, 2, 2), "lot;to", 5).await.unwrap_err();
    assert!(matches!(err, AnnotationError::InvalidRecord { .. }));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "2024-02-01; [lotto] 1\n");
    assert_eq!(gateway.len().await, 1);
}

#[tokio::test]
async fn append_after_unterminated_line_starts_a_new_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.txt");
    // A hand-edited last record and a torn write both leave no newline.
    std::fs::write(&path, "2024-02-01; [lotto] 1\n2024-02-02; [lot").unwrap();

    let gateway = FileGateway::open(&path).await.unwrap();
    assert_eq!(gateway.len().await, 1);
    gateway.create(ymd(2024, 2, 3), "speetto", 500).await.unwrap();
    drop(gateway);

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "2024-02-01; [lotto] 1\n2024-02-02; [lot\n2024-02-03; [speetto] 500\n"
    );
    let reopened = FileGateway::open(&path).await.unwrap();
    assert_eq!(reopened.len().await, 2);
    assert_eq!(reopened.fetch(ymd(2024, 2, 3)).await.unwrap()[0].amount, 500);
}

#[tokio::test]
async fn unwritable_store_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened for appending.
    let gateway = FileGateway::open(dir.path()).await;
    match gateway {
        Ok(gateway) => {
            let err = gateway.create(ymd(2024, 2, 2), "lotto", 5).await.unwrap_err();
            assert!(matches!(err, AnnotationError::Io(_)));
            assert!(gateway.is_empty().await);
        }
        Err(err) => assert!(matches!(err, AnnotationError::Io(_))),
    }
}

#[tokio::test]
async fn window_is_annotated_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.txt");
    std::fs::write(
        &path,
        "2023-07-31; [lotto] 7\n2023-08-20; [speetto] 10000\n2023-09-01; [lotto] 9\n",
    )
    .unwrap();
    let gateway = FileGateway::open(&path).await.unwrap();

    let window = build_annotated_window(
        ymd(2023, 8, 20),
        WeekStart::Monday,
        &gateway,
        Duration::from_secs(1),
    )
    .await
    .unwrap();

    let current = window.block(WindowSlot::Current);
    // 2023-07-31 is the single leading filler day of August.
    assert_eq!(current[0].date, ymd(2023, 7, 31));
    assert_eq!(current[0].annotations.len(), 1);
    assert_eq!(window.annotation_total(), 10_000);

    let next_first = window
        .block(WindowSlot::Next)
        .iter()
        .find(|c| c.belongs_to_reference_month)
        .unwrap();
    assert_eq!(next_first.annotations[0].amount, 9);
}
