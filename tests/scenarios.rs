//! End-to-end runs through the global container and recorder.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use appvisor::{
    App, AppConfig, AppError, BoxError, Container, Context, Dep, Initializer, InitializerFn,
    Introspector, Lifecycle, Phase, Report, Runnable, RunnableFn, StaticProvider, Wire, WireError,
    register,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serial_test::serial;

pub trait Logger: Send + Sync {
    fn line(&self, msg: &str) -> String;
}

struct Stdout;
impl Logger for Stdout {
    fn line(&self, msg: &str) -> String {
        format!("stdout: {msg}")
    }
}

fn fresh() {
    Container::global().clear();
}

fn cfg() -> AppConfig {
    AppConfig {
        readiness_poll: Duration::from_millis(5),
        handle_signals: false,
        ..AppConfig::default()
    }
}

fn thin<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc) as *const ()
}

#[derive(Default, Wire)]
struct LoggerInit {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Initializer for LoggerInit {
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        register!(dyn Logger, "", Stdout);
        Ok(ctx)
    }
}

#[derive(Default, Wire)]
struct LoggingWorker {
    #[resolve]
    logger: Dep<dyn Logger>,
    seen: Arc<Mutex<Vec<Arc<dyn Logger>>>>,
    clean_exits: Arc<AtomicUsize>,
}

#[async_trait]
impl Runnable for LoggingWorker {
    async fn run(&self, ctx: Context) -> Result<(), BoxError> {
        if let Some(logger) = self.logger.get() {
            self.seen.lock().push(Arc::clone(logger));
        }
        let _ = self.logger.line("started");
        ctx.cancelled().await;
        self.clean_exits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Keeps the report it was given.
#[derive(Default, Clone)]
struct Capture(Arc<Mutex<Option<Report>>>);

impl Capture {
    fn report(&self) -> Report {
        self.0.lock().clone().expect("introspector was not called")
    }
}

#[async_trait]
impl Introspector for Capture {
    async fn introspect(&self, _ctx: &Context, report: &Report) -> Result<(), BoxError> {
        *self.0.lock() = Some(report.clone());
        Ok(())
    }
}

#[tokio::test]
#[serial]
async fn happy_path_shares_one_logger() {
    fresh();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let exits = Arc::new(AtomicUsize::new(0));
    let worker = || LoggingWorker {
        seen: Arc::clone(&seen),
        clean_exits: Arc::clone(&exits),
        ..LoggingWorker::default()
    };

    let parent = Context::background();
    let app = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(LoggerInit {
            calls: Arc::clone(&calls),
        })
        .with_runnable(worker())
        .with_runnable(worker())
        .run_async(&parent);

    app.wait_for_readiness(&parent, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(app.state(), Lifecycle::Running);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    parent.cancel();
    app.wait().await.unwrap();

    assert_eq!(exits.load(Ordering::SeqCst), 2);
    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(thin(&seen[0]), thin(&seen[1]));
}

#[tokio::test]
#[serial]
async fn missing_dependency_aborts_before_run() {
    fresh();
    let exits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let err = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_runnable(LoggingWorker {
            seen: Arc::clone(&seen),
            clean_exits: Arc::clone(&exits),
            ..LoggingWorker::default()
        })
        .run()
        .await
        .unwrap_err();

    match &err {
        AppError::Wire {
            phase: Phase::Run,
            source: WireError::UnsatisfiedDependency {
                abstraction, name, ..
            },
            ..
        } => {
            assert!(abstraction.contains("Logger"), "{abstraction}");
            assert_eq!(name, "");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(seen.lock().is_empty());
}

#[derive(Default, Wire)]
struct Poller {
    #[config("POLL_INTERVAL", default = "2s")]
    interval: Duration,
    observed: Arc<Mutex<Option<Duration>>>,
}

#[async_trait]
impl Runnable for Poller {
    async fn run(&self, _ctx: Context) -> Result<(), BoxError> {
        *self.observed.lock() = Some(self.interval);
        Ok(())
    }
}

async fn run_poller(provider: Option<StaticProvider>) -> (Duration, Report) {
    fresh();
    let observed = Arc::new(Mutex::new(None));
    let capture = Capture::default();
    let mut app = App::new().with_config(cfg());
    if let Some(provider) = provider {
        app = app.with_provider(provider);
    }
    app.with_runnable(Poller {
            observed: Arc::clone(&observed),
            ..Poller::default()
        })
        .with_introspector(capture.clone())
        .run()
        .await
        .unwrap();
    let interval = observed.lock().expect("poller did not run");
    (interval, capture.report())
}

#[tokio::test]
#[serial]
async fn config_falls_back_to_default() {
    let (interval, report) = run_poller(Some(StaticProvider::new())).await;
    assert_eq!(interval, Duration::from_secs(2));
    assert_eq!(report.configs.len(), 1);
    let access = &report.configs[0];
    assert_eq!(access.key, "POLL_INTERVAL");
    assert!(access.used_default);
    assert_eq!(access.provider, "");
    assert!(access.component.ends_with("Poller"));
    assert_eq!(access.caller.file, file!());
}

#[tokio::test]
#[serial]
async fn provider_overrides_default() {
    let provider = StaticProvider::named("test-static").set("POLL_INTERVAL", "750ms");
    let (interval, report) = run_poller(Some(provider)).await;
    assert_eq!(interval, Duration::from_millis(750));
    assert_eq!(report.configs.len(), 1);
    assert!(!report.configs[0].used_default);
    assert_eq!(report.configs[0].provider, "test-static");
}

#[tokio::test]
#[serial]
async fn environment_is_the_default_provider() {
    // SAFETY: serialized with every other test touching the process environment.
    unsafe { std::env::set_var("POLL_INTERVAL", "40ms") };
    let (interval, report) = run_poller(None).await;
    unsafe { std::env::remove_var("POLL_INTERVAL") };

    assert_eq!(interval, Duration::from_millis(40));
    assert_eq!(report.configs.len(), 1);
    assert!(!report.configs[0].used_default);
    assert_eq!(report.configs[0].provider, "env");
}

#[tokio::test]
#[serial]
async fn initializer_failure_short_circuits() {
    fresh();
    let b_called = Arc::new(AtomicBool::new(false));
    let ran = Arc::new(AtomicBool::new(false));

    let b_flag = Arc::clone(&b_called);
    let run_flag = Arc::clone(&ran);
    let app = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(InitializerFn::new("A", |_ctx: Context| async {
            Err::<Context, BoxError>("database unreachable".into())
        }))
        .with_initializer(InitializerFn::new("B", move |ctx: Context| {
            b_flag.store(true, Ordering::SeqCst);
            async move { Ok::<_, BoxError>(ctx) }
        }))
        .with_runnable(RunnableFn::new("w", move |_ctx: Context| {
            run_flag.store(true, Ordering::SeqCst);
            async { Ok::<_, BoxError>(()) }
        }))
        .run_async(&Context::background());

    let mut states = app.watch_state();
    let err = app.wait().await.unwrap_err();

    assert_eq!(err.as_label(), "initializer_failure");
    assert_eq!(err.component(), Some("A"));
    assert!(err.to_string().starts_with("phase=initialize"));
    assert!(err.to_string().contains("database unreachable"));
    assert!(!b_called.load(Ordering::SeqCst));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(*states.borrow_and_update(), Lifecycle::Terminated);
}

#[tokio::test]
#[serial]
async fn runnable_failure_cancels_siblings() {
    fresh();
    let w2_clean = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&w2_clean);
    let returned: Arc<Mutex<Option<Context>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&returned);
    let background_stopped = Arc::new(AtomicBool::new(false));
    let stopped = Arc::clone(&background_stopped);

    let parent = Context::background();
    let app = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(InitializerFn::new("pool", move |ctx: Context| {
            *slot.lock() = Some(ctx.clone());
            let stopped = Arc::clone(&stopped);
            let watched = ctx.clone();
            tokio::spawn(async move {
                watched.cancelled().await;
                stopped.store(true, Ordering::SeqCst);
            });
            async move { Ok::<_, BoxError>(ctx) }
        }))
        .with_runnable(RunnableFn::new("w1", |_ctx: Context| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<(), BoxError>("E".into())
        }))
        .with_runnable(RunnableFn::new("w2", move |ctx: Context| {
            let flag = Arc::clone(&flag);
            async move {
                ctx.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        }))
        .run_async(&parent);

    let err = app.wait().await.unwrap_err();
    match err {
        AppError::Runnable { component, source } => {
            assert_eq!(component, "w1");
            assert_eq!(source.to_string(), "E");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(w2_clean.load(Ordering::SeqCst));
    assert!(!parent.is_cancelled());

    let root = returned.lock().clone().expect("initializer did not run");
    assert!(root.is_cancelled());
    tokio::time::timeout(Duration::from_secs(1), async {
        while !background_stopped.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("work tied to the initializer context kept running");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step(u8);

#[tokio::test]
#[serial]
async fn initializers_thread_context_in_order() {
    fresh();
    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2, o3) = (Arc::clone(&order), Arc::clone(&order), Arc::clone(&order));
    let got = Arc::new(Mutex::new(None));
    let got_run = Arc::clone(&got);

    App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(InitializerFn::new("a", move |ctx: Context| {
            o1.lock().push("a");
            async move { Ok::<_, BoxError>(ctx.with_value(Step(1))) }
        }))
        .with_initializer(InitializerFn::new("b", move |ctx: Context| {
            o2.lock().push("b");
            let prev = ctx.value::<Step>().copied();
            async move {
                let prev = prev.ok_or("missing step from a")?;
                Ok::<_, BoxError>(ctx.with_value(Step(prev.0 + 1)))
            }
        }))
        .with_initializer(InitializerFn::new("c", move |ctx: Context| {
            o3.lock().push("c");
            async move { Ok::<_, BoxError>(ctx) }
        }))
        .with_runnable(RunnableFn::new("reader", move |ctx: Context| {
            *got_run.lock() = ctx.value::<Step>().copied();
            async { Ok::<_, BoxError>(()) }
        }))
        .run()
        .await
        .unwrap();

    assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    assert_eq!(*got.lock(), Some(Step(2)));
}

#[derive(Default, Wire)]
struct NeedsLogger {
    #[resolve]
    logger: Dep<dyn Logger>,
    line: Arc<Mutex<String>>,
}

#[async_trait]
impl Initializer for NeedsLogger {
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
        *self.line.lock() = self.logger.line("init");
        Ok(ctx)
    }
}

#[tokio::test]
#[serial]
async fn registrations_are_visible_to_later_initializers_only() {
    fresh();
    let line = Arc::new(Mutex::new(String::new()));
    App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(LoggerInit::default())
        .with_initializer(NeedsLogger {
            line: Arc::clone(&line),
            ..NeedsLogger::default()
        })
        .run()
        .await
        .unwrap();
    assert_eq!(*line.lock(), "stdout: init");

    fresh();
    let err = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(NeedsLogger::default())
        .with_initializer(LoggerInit::default())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Wire {
            phase: Phase::Initialize,
            ..
        }
    ));
}

type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Wire)]
struct TrackedInit {
    id: &'static str,
    journal: Journal,
}

#[async_trait]
impl Initializer for TrackedInit {
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
        Ok(ctx)
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.journal.lock().push(format!("close:{}", self.id));
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.id
    }
}

#[derive(Wire)]
struct TrackedRun {
    id: &'static str,
    journal: Journal,
    fail_close: bool,
}

#[async_trait]
impl Runnable for TrackedRun {
    async fn run(&self, ctx: Context) -> Result<(), BoxError> {
        ctx.cancelled().await;
        Ok(())
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.journal.lock().push(format!("close:{}", self.id));
        if self.fail_close {
            return Err("flush failed".into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.id
    }
}

#[tokio::test]
#[serial]
async fn close_runs_in_reverse_registration_order() {
    fresh();
    let journal: Journal = Arc::default();
    let init = |id| TrackedInit {
        id,
        journal: Arc::clone(&journal),
    };
    let run = |id, fail_close| TrackedRun {
        id,
        journal: Arc::clone(&journal),
        fail_close,
    };

    let parent = Context::background();
    let app = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(init("i1"))
        .with_runnable(run("r1", true))
        .with_initializer(init("i2"))
        .with_runnable(run("r2", false))
        .run_async(&parent);

    app.wait_for_readiness(&parent, Duration::from_secs(1))
        .await
        .unwrap();
    let err = app.shutdown().await.unwrap_err();

    assert_eq!(err.as_label(), "close_failure");
    assert_eq!(err.component(), Some("r1"));
    assert_eq!(
        *journal.lock(),
        vec!["close:r2", "close:i2", "close:r1", "close:i1"]
    );
}

#[tokio::test]
#[serial]
async fn failed_initializer_is_not_closed_but_earlier_ones_are() {
    fresh();
    let journal: Journal = Arc::default();
    let err = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(TrackedInit {
            id: "ok",
            journal: Arc::clone(&journal),
        })
        .with_initializer(InitializerFn::new("broken", |_ctx: Context| async {
            Err::<Context, BoxError>("nope".into())
        }))
        .with_runnable(TrackedRun {
            id: "never",
            journal: Arc::clone(&journal),
            fail_close: false,
        })
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.component(), Some("broken"));
    assert_eq!(*journal.lock(), vec!["close:ok"]);
}

#[derive(Default, Wire)]
struct StickyInit {
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Initializer for StickyInit {
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
        Ok(ctx)
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        Err("flush failed".into())
    }
}

#[tokio::test]
#[serial]
async fn startup_error_wins_over_close_error() {
    fresh();
    let closed = Arc::new(AtomicBool::new(false));
    let err = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(StickyInit {
            closed: Arc::clone(&closed),
        })
        .with_initializer(InitializerFn::new("broken", |_ctx: Context| async {
            Err::<Context, BoxError>("nope".into())
        }))
        .run()
        .await
        .unwrap_err();

    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(err.as_label(), "initializer_failure");
    assert_eq!(err.component(), Some("broken"));
}

#[derive(Wire)]
struct Warming {
    ready: Arc<AtomicBool>,
}

#[async_trait]
impl Runnable for Warming {
    async fn run(&self, ctx: Context) -> Result<(), BoxError> {
        ctx.cancelled().await;
        Ok(())
    }

    async fn is_ready(&self, _ctx: &Context) -> Result<(), BoxError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err("warming up".into())
        }
    }

    fn name(&self) -> &'static str {
        "warming"
    }
}

#[tokio::test]
#[serial]
async fn readiness_waits_for_probes_and_times_out() {
    fresh();
    let ready = Arc::new(AtomicBool::new(false));
    let parent = Context::background();
    let app = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_runnable(Warming {
            ready: Arc::clone(&ready),
        })
        .run_async(&parent);

    let err = app
        .wait_for_readiness(&parent, Duration::from_millis(60))
        .await
        .unwrap_err();
    match &err {
        AppError::ReadinessTimeout { pending, .. } => {
            assert_eq!(pending, &vec!["warming: warming up".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(app.state(), Lifecycle::Running);

    ready.store(true, Ordering::SeqCst);
    app.wait_for_readiness(&parent, Duration::from_secs(1))
        .await
        .unwrap();

    parent.cancel();
    let mut states = app.watch_state();
    states
        .wait_for(|s| *s == Lifecycle::Terminated)
        .await
        .unwrap();
    let err = app
        .wait_for_readiness(&parent, Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::NotRunning {
            state: Lifecycle::Terminated
        }
    ));
    app.wait().await.unwrap();
}

#[tokio::test]
#[serial]
async fn panicking_runnable_is_a_runnable_failure() {
    fresh();
    let err = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_runnable(RunnableFn::new("explodes", |ctx: Context| async move {
            if !ctx.is_cancelled() {
                panic!("worker exploded");
            }
            Ok::<_, BoxError>(())
        }))
        .with_runnable(RunnableFn::new("steady", |ctx: Context| async move {
            ctx.cancelled().await;
            Ok::<_, BoxError>(())
        }))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.as_label(), "runnable_failure");
    assert_eq!(err.component(), Some("explodes"));
    assert!(err.to_string().contains("worker exploded"));
}

struct Refuse;

#[async_trait]
impl Introspector for Refuse {
    async fn introspect(&self, _ctx: &Context, _report: &Report) -> Result<(), BoxError> {
        Err("report rejected".into())
    }
}

#[tokio::test]
#[serial]
async fn introspector_failure_prevents_spawn() {
    fresh();
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let err = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_runnable(RunnableFn::new("w", move |_ctx: Context| {
            flag.store(true, Ordering::SeqCst);
            async { Ok::<_, BoxError>(()) }
        }))
        .with_introspector(Refuse)
        .run()
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "introspector_failure");
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
#[serial]
async fn report_covers_components_and_dependencies() {
    fresh();
    let capture = Capture::default();
    let parent = Context::background();
    let app = App::new()
        .with_config(cfg())
        .with_provider(StaticProvider::new())
        .with_initializer(LoggerInit::default())
        .with_runnable(LoggingWorker::default())
        .with_introspector(capture.clone())
        .run_async(&parent);
    app.wait_for_readiness(&parent, Duration::from_secs(1))
        .await
        .unwrap();
    app.shutdown().await.unwrap();

    let report = capture.report();
    assert_eq!(report.initializers.len(), 1);
    assert_eq!(report.runners.len(), 1);
    assert!(report.initializers[0].type_name.ends_with("LoggerInit"));

    let kinds: Vec<_> = report.deps.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            appvisor::DependencyKind::Register,
            appvisor::DependencyKind::Resolve
        ]
    );
    let register = &report.deps[0];
    assert!(register.implementation.ends_with("Stdout"));
    assert!(register.component.ends_with("LoggerInit"));
    assert!(register.caller.function.ends_with("LoggerInit::initialize"));
    assert_eq!(register.caller.file, file!());

    let resolve = &report.deps[1];
    assert!(resolve.component.ends_with("LoggingWorker"));
    assert!(resolve.caller.function.ends_with("LoggingWorker::wire"));

    let orders: Vec<u64> = report.events().iter().map(|e| e.order()).collect();
    assert!(orders.windows(2).all(|w| w[0] < w[1]));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["deps"][0]["kind"], "register");
    assert_eq!(json["deps"][1]["kind"], "resolve");
}
