//! Failures that must happen before any process is spawned

mod common;

use common::RecordingLauncher;
use maven_exec::{
    CancellationToken, Error, ExecutableResolver, ExecutionSpec, LocalLauncher, MapEnvironment,
    MavenExecutor, Platform,
};
use std::sync::atomic::Ordering;
use tempfile::TempDir;

#[test]
fn test_empty_goals_never_launches() {
    let home = TempDir::new().unwrap();
    #[cfg(unix)]
    common::fake_maven(home.path(), "exit 0");

    let (launcher, launches) = RecordingLauncher::new(LocalLauncher);
    let executor = MavenExecutor::new(launcher, common::resolver_for(home.path()));

    let spec = ExecutionSpec::builder()
        .goals(Vec::<String>::new())
        .unwrap()
        .batch_mode(true)
        .build();
    let result = executor.execute(&spec, &CancellationToken::new());

    assert!(matches!(result, Err(Error::Configuration { .. })));
    assert_eq!(launches.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unresolvable_launcher_never_launches() {
    let empty = TempDir::new().unwrap();
    let resolver = ExecutableResolver::new(Platform::current())
        .environment(MapEnvironment::new().with("PATH", empty.path().as_os_str()));
    let (launcher, launches) = RecordingLauncher::new(LocalLauncher);
    let executor = MavenExecutor::new(launcher, resolver);

    let spec = ExecutionSpec::builder().goal("install").unwrap().build();
    let err = executor
        .execute(&spec, &CancellationToken::new())
        .unwrap_err();

    assert!(matches!(err, Error::ExecutableNotFound { .. }));
    assert!(err.is_pre_spawn());
    assert_eq!(launches.load(Ordering::SeqCst), 0);
}

#[cfg(unix)]
#[test]
fn test_cancelled_before_start_never_launches() {
    let home = TempDir::new().unwrap();
    common::fake_maven(home.path(), "exit 0");

    let (launcher, launches) = RecordingLauncher::new(LocalLauncher);
    let executor = MavenExecutor::new(launcher, common::resolver_for(home.path()));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let spec = ExecutionSpec::builder().goal("install").unwrap().build();

    assert!(matches!(
        executor.execute(&spec, &cancel),
        Err(Error::Cancelled)
    ));
    assert_eq!(launches.load(Ordering::SeqCst), 0);
}

#[test]
fn test_prepare_resolves_without_spawning() {
    let home = TempDir::new().unwrap();
    #[cfg(unix)]
    let launcher_path = common::fake_maven(home.path(), "exit 0");
    #[cfg(not(unix))]
    let launcher_path = {
        let bin = home.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let path = bin.join("mvn.cmd");
        std::fs::write(&path, "@exit /b 0\r\n").unwrap();
        path
    };

    let (launcher, launches) = RecordingLauncher::new(LocalLauncher);
    let executor = MavenExecutor::new(launcher, common::resolver_for(home.path()))
        .with_env("MAVEN_OPTS", "-Xmx512m");

    let spec = ExecutionSpec::builder()
        .goal("package")
        .unwrap()
        .env("MAVEN_OPTS", "-Xmx1g")
        .unwrap()
        .working_dir(home.path())
        .build();
    let command = executor.prepare(&spec).unwrap();

    assert_eq!(command.get_program(), launcher_path);
    assert_eq!(command.get_args(), ["package"]);
    assert_eq!(command.get_current_dir(), Some(home.path()));
    assert_eq!(
        command.get_envs().get(std::ffi::OsStr::new("MAVEN_OPTS")),
        Some(&std::ffi::OsString::from("-Xmx1g"))
    );
    assert_eq!(launches.load(Ordering::SeqCst), 0);
}
