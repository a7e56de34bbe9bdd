// Integration tests for DbContextFactory
// Covers construction, lookup and the one-time initializer

#![allow(clippy::unwrap_used, clippy::expect_used)]

use dataonion_core::{ContextKey, ExErrorKind, FactorySettings};
use dataonion_store::errors::from_rusqlite;
use dataonion_store::{
    ContextConfig, DatabaseInitializer, DbContext, DbContextFactory, InitializationGuard,
    NoopInitializer, SqlScriptInitializer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn key(k: &str) -> ContextKey {
    ContextKey::new(k).unwrap()
}

/// Initializer that counts how often it runs
#[derive(Default)]
struct CountingInitializer {
    calls: AtomicUsize,
}

impl DatabaseInitializer for CountingInitializer {
    fn initialize(&self, _context: &mut DbContext) -> dataonion_store::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Initializer that fails a set number of times before succeeding
struct FlakyInitializer {
    failures_left: AtomicUsize,
    successes: AtomicUsize,
}

impl DatabaseInitializer for FlakyInitializer {
    fn initialize(&self, context: &mut DbContext) -> dataonion_store::Result<()> {
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            // Fails with a real SQLite error
            context
                .connection()
                .execute_batch("INSERT INTO missing_table VALUES (1)")
                .map_err(from_rusqlite)?;
        }
        self.successes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn counting_factory(counter: Arc<CountingInitializer>) -> DbContextFactory {
    DbContextFactory::new(vec![
        ContextConfig::with_shared_initializer(key("orders"), "Data Source=:memory:", counter.clone()),
        ContextConfig::with_shared_initializer(key("reporting"), "Data Source=:memory:", counter),
    ])
    .unwrap()
}

#[test]
fn test_zero_configurations_fail() {
    // Given: no configuration entries
    // When: the factory is constructed
    let err = DbContextFactory::new(Vec::new()).unwrap_err();

    // Then: construction fails with the configuration error
    assert_eq!(err.kind(), ExErrorKind::InvalidConfiguration);
    assert_eq!(err.code(), "ERR_INVALID_CONFIGURATION");
    assert!(err.message().contains("At least one"));
}

#[test]
fn test_unknown_key_fails_naming_key() {
    // Given: a factory configured only for "orders"
    let factory = DbContextFactory::new(vec![ContextConfig::new(
        key("orders"),
        "Data Source=:memory:",
        NoopInitializer,
    )])
    .unwrap();

    // When: a context for "Orders" (different case) is requested
    let err = factory.create(&key("Orders")).unwrap_err();

    // Then: lookup fails naming the requested key
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.entity_id(), Some("Orders"));
    assert!(err.to_string().contains("Orders"));
}

#[test]
fn test_oversized_busy_timeout_is_an_error() {
    // Given: a busy timeout beyond what SQLite's busy handler accepts
    let factory = DbContextFactory::new(vec![ContextConfig::new(
        key("orders"),
        "Data Source=:memory:;Busy Timeout=3000000000",
        NoopInitializer,
    )])
    .unwrap();

    // When: a context is created
    let err = factory.create(&key("orders")).unwrap_err();

    // Then: creation fails cleanly and nothing was initialized
    assert_eq!(err.kind(), ExErrorKind::InvalidConnectionString);
    assert!(err.message().contains("Busy Timeout"));
    assert!(!factory.is_initialized());
}

#[test]
fn test_matching_key_returns_usable_context() {
    let factory = DbContextFactory::new(vec![ContextConfig::new(
        key("orders"),
        "Data Source=:memory:",
        SqlScriptInitializer::new("schema", "CREATE TABLE orders (id INTEGER PRIMARY KEY);"),
    )])
    .unwrap();

    let ctx = factory.create(&key("orders")).unwrap();

    assert_eq!(ctx.key().as_str(), "orders");
    ctx.health_check().unwrap();
    ctx.connection()
        .execute("INSERT INTO orders (id) VALUES (1)", [])
        .unwrap();
    ctx.dispose().unwrap();
}

#[test]
fn test_initializer_runs_once_across_creations() {
    // Given: a factory whose two entries share a counting initializer
    let counter = Arc::new(CountingInitializer::default());
    let factory = counting_factory(counter.clone());
    assert!(!factory.is_initialized());

    // When: many contexts are created for both keys
    for _ in 0..5 {
        factory.create(&key("orders")).unwrap();
        factory.create(&key("reporting")).unwrap();
    }

    // Then: the initializer ran exactly once
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    assert!(factory.is_initialized());
}

#[test]
fn test_only_first_created_configuration_is_initialized() {
    let orders_init = Arc::new(CountingInitializer::default());
    let reporting_init = Arc::new(CountingInitializer::default());
    let factory = DbContextFactory::new(vec![
        ContextConfig::with_shared_initializer(
            key("orders"),
            "Data Source=:memory:",
            orders_init.clone(),
        ),
        ContextConfig::with_shared_initializer(
            key("reporting"),
            "Data Source=:memory:",
            reporting_init.clone(),
        ),
    ])
    .unwrap();

    factory.create(&key("reporting")).unwrap();
    factory.create(&key("orders")).unwrap();

    assert_eq!(reporting_init.calls.load(Ordering::SeqCst), 1);
    assert_eq!(orders_init.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_separate_factories_have_separate_guards() {
    let counter = Arc::new(CountingInitializer::default());
    let a = counting_factory(counter.clone());
    let b = counting_factory(counter.clone());

    a.create(&key("orders")).unwrap();
    b.create(&key("orders")).unwrap();

    assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shared_guard_initializes_once_across_factories() {
    let counter = Arc::new(CountingInitializer::default());
    let guard = InitializationGuard::shared();
    let config = || {
        vec![ContextConfig::with_shared_initializer(
            key("orders"),
            "Data Source=:memory:",
            counter.clone(),
        )]
    };

    let a = DbContextFactory::with_guard(config(), guard.clone()).unwrap();
    let b = DbContextFactory::with_guard(config(), guard.clone()).unwrap();

    a.create(&key("orders")).unwrap();
    b.create(&key("orders")).unwrap();

    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    assert!(guard.is_initialized());
    assert!(b.is_initialized());
}

#[test]
fn test_initializer_creating_through_its_own_guard_fails_instead_of_blocking() {
    // Given: an "orders" initializer that creates an "audit" context through
    // a second factory sharing the same guard
    let guard = InitializationGuard::shared();
    let audit_factory = Arc::new(
        DbContextFactory::with_guard(
            vec![ContextConfig::new(key("audit"), "Data Source=:memory:", NoopInitializer)],
            guard.clone(),
        )
        .unwrap(),
    );
    let inner = audit_factory.clone();
    let orders_factory = DbContextFactory::with_guard(
        vec![ContextConfig::new(
            key("orders"),
            "Data Source=:memory:",
            move |_ctx: &mut DbContext| -> dataonion_store::Result<()> {
                inner.create(&key("audit")).map(|_| ())
            },
        )],
        guard.clone(),
    )
    .unwrap();

    // When: the first context is created
    let err = orders_factory.create(&key("orders")).unwrap_err();

    // Then: the nested creation is reported and the guard stays unset
    assert_eq!(err.kind(), ExErrorKind::InitializerFailed);
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::InitializerFailed)
    );
    assert!(!guard.is_initialized());

    // Outside an initializer the shared guard is usable again
    audit_factory.create(&key("audit")).unwrap();
    assert!(guard.is_initialized());
}

#[test]
fn test_failed_initializer_is_retried() {
    // Given: an initializer that fails on its first run
    let flaky = Arc::new(FlakyInitializer {
        failures_left: AtomicUsize::new(1),
        successes: AtomicUsize::new(0),
    });
    let factory = DbContextFactory::new(vec![ContextConfig::with_shared_initializer(
        key("orders"),
        "Data Source=:memory:",
        flaky.clone(),
    )])
    .unwrap();

    // When: the first creation runs it
    let err = factory.create(&key("orders")).unwrap_err();

    // Then: creation fails, carrying the cause, and the guard stays unset
    assert_eq!(err.kind(), ExErrorKind::InitializerFailed);
    assert_eq!(err.entity_id(), Some("orders"));
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::Persistence)
    );
    assert!(!factory.is_initialized());

    // And: the next creation retries and succeeds
    factory.create(&key("orders")).unwrap();
    assert!(factory.is_initialized());
    assert_eq!(flaky.successes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_use_initializes_once() {
    let counter = Arc::new(CountingInitializer::default());
    let factory = Arc::new(counting_factory(counter.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let factory = factory.clone();
            std::thread::spawn(move || {
                let k = if i % 2 == 0 { "orders" } else { "reporting" };
                factory.create(&key(k)).unwrap().dispose().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_initialized_schema_visible_to_later_contexts_on_disk() {
    // Given: a file database initialized with a schema
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db");
    let factory = DbContextFactory::new(vec![ContextConfig::new(
        key("orders"),
        format!("Data Source={};Journal Mode=Wal", path.display()),
        SqlScriptInitializer::new(
            "schema",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, total INTEGER NOT NULL);",
        ),
    )])
    .unwrap();

    // When: one context writes and is disposed
    let writer = factory.create(&key("orders")).unwrap();
    writer
        .connection()
        .execute("INSERT INTO orders (total) VALUES (42)", [])
        .unwrap();
    writer.dispose().unwrap();

    // Then: a fresh context reads the row without re-running the initializer
    let reader = factory.create(&key("orders")).unwrap();
    let total: i64 = reader
        .connection()
        .query_row("SELECT total FROM orders", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 42);
}

#[test]
fn test_factory_from_settings() {
    let mut settings = FactorySettings::from_toml_str(
        r#"
        [[contexts]]
        key = "orders"
        connection_string = "Data Source=nowhere/orders.db;Mode=ReadWrite"

        [[contexts]]
        key = "reporting"
        connection_string = "Data Source=:memory:"
        "#,
    )
    .unwrap();
    settings.apply_overrides_with(|name| {
        (name == "DATAONION_CONNECTION_ORDERS").then(|| "Data Source=:memory:".to_string())
    });

    let counter = Arc::new(CountingInitializer::default());
    let factory = DbContextFactory::from_settings(settings, |_key| {
        counter.clone() as Arc<dyn DatabaseInitializer>
    })
    .unwrap();

    let keys: Vec<_> = factory.keys().map(|k| k.as_str().to_string()).collect();
    assert_eq!(keys, vec!["orders", "reporting"]);

    // The override replaced the unopenable path
    factory.create(&key("orders")).unwrap();
    factory.create(&key("reporting")).unwrap();
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}
