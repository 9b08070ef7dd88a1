//! The discovery driven load loop

use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use eloader_di::{
    AbortOnError, Args, ChannelSink, Container, ContinueOnError, DiError, Directory, DynError,
    Escalation, LoadError, Severity, Unit, UnitCatalog,
};
use rstest::*;
use tempfile::TempDir;

/// `services/{db,cache}.rs` and `routes/{a_users,b_broken,c_orders}.rs`
#[fixture]
fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (folder, files) in [
        ("services", &["db.rs", "cache.rs"][..]),
        ("routes", &["a_users.rs", "b_broken.rs", "c_orders.rs"][..]),
    ] {
        fs::create_dir(dir.path().join(folder)).unwrap();
        for file in files {
            fs::write(dir.path().join(folder).join(file), "").unwrap();
        }
    }
    dir
}

fn roots(project: &Path) -> Vec<Directory> {
    vec![
        Directory::route(project.join("routes"), false),
        Directory::service(project.join("services"), false),
    ]
}

/// Catalog for the project fixture, counting successful route invocations
fn catalog(invoked: &Arc<AtomicUsize>) -> UnitCatalog {
    let route = |invoked: &Arc<AtomicUsize>| {
        let invoked = invoked.clone();
        move || {
            let invoked = invoked.clone();
            Unit::procedure(move |args: Args| {
                args.get::<String>(0)?;
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok::<_, DynError>(())
            })
            .inject(["db"])
        }
    };

    UnitCatalog::new()
        .add("db", || Unit::constructor(|_| Ok::<_, DynError>(String::from("pool"))))
        .add("cache", || Unit::value(16_usize))
        .add("a_users", route(invoked))
        .add("b_broken", Unit::empty)
        .add("c_orders", route(invoked))
}

#[rstest]
fn services_are_registered_before_routes_run(project: TempDir) {
    // Arrange
    let invoked = Arc::new(AtomicUsize::new(0));
    let mut container = Container::builder().loader(catalog(&invoked)).build();

    // Act
    let report = container
        .run(&roots(project.path()), &mut ContinueOnError)
        .unwrap();

    // Assert
    assert_eq!(report.registered, 2);
    assert_eq!(report.invoked, 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].ends_with("b_broken.rs"));
    assert_eq!(invoked.load(Ordering::SeqCst), 2);
    assert!(container.registry().lookup("db").unwrap().is_resolved());
    assert!(!container.registry().lookup("cache").unwrap().is_resolved());
}

#[rstest]
fn abort_stops_at_the_first_failure(project: TempDir) {
    // Arrange
    let invoked = Arc::new(AtomicUsize::new(0));
    let mut container = Container::builder().loader(catalog(&invoked)).build();

    // Act
    let result = container.run(&roots(project.path()), &mut AbortOnError);

    // Assert
    let Err(LoadError::Aborted { path, source }) = result else {
        panic!("expected the run to abort");
    };
    assert!(path.ends_with("b_broken.rs"));
    assert!(matches!(source, DiError::InvalidUnit { .. }));
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
}

#[rstest]
fn fallback_closure_sees_every_failure(project: TempDir) {
    // Arrange
    let invoked = Arc::new(AtomicUsize::new(0));
    let mut container = Container::builder().loader(catalog(&invoked)).build();
    let mut seen = Vec::new();
    let mut fallback = |path: &Path, _error: &DiError| {
        seen.push(path.to_path_buf());
        Escalation::Continue
    };

    // Act
    let report = container
        .run(&roots(project.path()), &mut fallback)
        .unwrap();

    // Assert
    assert_eq!(seen, report.failed);
}

#[rstest]
fn failures_carry_their_origin(project: TempDir) {
    // Arrange
    let (sink, mut events) = ChannelSink::channel();
    let invoked = Arc::new(AtomicUsize::new(0));
    let mut container = Container::builder()
        .sink(sink)
        .loader(catalog(&invoked))
        .build();

    // Act
    container
        .run(&roots(project.path()), &mut ContinueOnError)
        .unwrap();

    // Assert
    let events = events.drain();
    let failure = events
        .iter()
        .find(|event| event.severity == Severity::Error)
        .unwrap();
    assert!(failure.origin.as_ref().unwrap().ends_with("b_broken.rs"));
    assert_eq!(events.last().unwrap().severity, Severity::Info);
}

#[rstest]
fn missing_roots_are_reported_as_warnings(project: TempDir) {
    // Arrange
    let (sink, mut events) = ChannelSink::channel();
    let mut container = Container::builder().sink(sink).build();
    let missing = project.path().join("gone");
    let roots = vec![
        Directory::route(&missing, false),
        Directory::service(project.path().join("services"), false),
    ];

    // Act
    let report = container.run(&roots, &mut ContinueOnError).unwrap();

    // Assert
    assert_eq!(report.registered, 2);
    assert!(report.failed.is_empty());
    let warnings: Vec<_> = events
        .drain()
        .into_iter()
        .filter(|event| event.severity == Severity::Warn)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].origin.as_deref(), Some(missing.as_path()));
}

#[rstest]
fn unknown_units_fail_to_load(project: TempDir) {
    // Arrange
    let mut container = Container::builder().loader(UnitCatalog::new()).build();

    // Act
    let report = container
        .run(&roots(project.path()), &mut ContinueOnError)
        .unwrap();

    // Assert - services only fail once resolved, routes right away
    assert_eq!(report.registered, 2);
    assert_eq!(report.invoked, 0);
    assert_eq!(report.failed.len(), 3);
    assert!(container.get("db").is_none());
}

#[rstest]
fn duplicate_service_names_collide(project: TempDir) {
    // Arrange
    fs::create_dir(project.path().join("more")).unwrap();
    fs::write(project.path().join("more").join("db.rs"), "").unwrap();
    let mut container = Container::default();
    let roots = vec![
        Directory::service(project.path().join("services"), false),
        Directory::service(project.path().join("more"), false),
    ];

    // Act
    let report = container.run(&roots, &mut ContinueOnError).unwrap();

    // Assert
    assert_eq!(report.registered, 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].starts_with(project.path().join("more").canonicalize().unwrap()));
}
