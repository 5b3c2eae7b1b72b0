//! The async entry points, driven by a non-tokio executor

#![cfg(unix)]

mod common;

use common::{CollectingSink, executor_for, fake_maven};
use maven_exec::{CancellationToken, Error, ExecutionSpec};
use std::time::Duration;
use tempfile::TempDir;

#[smol_potat::test]
async fn test_run_on_smol() {
    let home = TempDir::new().unwrap();
    fake_maven(home.path(), "echo \"[INFO] $*\"");
    let sink = CollectingSink::default();
    let executor = executor_for(home.path()).with_sink(sink.clone());

    let spec = ExecutionSpec::builder()
        .goals(["clean", "verify"])
        .unwrap()
        .offline(true)
        .build();
    let result = executor.run(&spec, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(sink.stdout(), vec!["[INFO] --offline clean verify"]);
}

#[smol_potat::test]
async fn test_cancel_from_another_task() {
    let home = TempDir::new().unwrap();
    fake_maven(home.path(), "exec sleep 30");
    let executor = executor_for(home.path()).with_grace_period(Duration::from_secs(2));
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        smol::spawn(async move {
            smol::Timer::after(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let spec = ExecutionSpec::builder().goal("install").unwrap().build();
    let result = executor.run(&spec, &cancel).await;
    canceller.await;

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[smol_potat::test]
async fn test_concurrent_runs_share_one_executor() {
    let home = TempDir::new().unwrap();
    fake_maven(home.path(), "sleep 0.2\necho \"done $1\"");
    let sink = CollectingSink::default();
    let executor = executor_for(home.path()).with_sink(sink.clone());
    let cancel = CancellationToken::new();

    let first = ExecutionSpec::builder().goal("compile").unwrap().build();
    let second = ExecutionSpec::builder().goal("test").unwrap().build();
    let (a, b) = futures::future::join(
        executor.run(&first, &cancel),
        executor.run(&second, &cancel),
    )
    .await;

    assert_eq!(a.unwrap().exit_code, 0);
    assert_eq!(b.unwrap().exit_code, 0);
    let mut lines = sink.stdout();
    lines.sort();
    assert_eq!(lines, vec!["done compile", "done test"]);
}
