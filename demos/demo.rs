//! Logger initializer, two ticking workers, readiness and a report dump.
//!
//! ```text
//! APPVISOR_LOG=debug TICK_EVERY=200ms cargo run --example demo --features logging
//! ```
//! Stops after a few seconds, or on Ctrl-C.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use appvisor::{
    App, AppConfig, BoxError, Context, Dep, EnvProvider, Initializer, LogIntrospector, Runnable,
    StaticProvider, Wire, logging, register,
};

pub trait Logger: Send + Sync {
    fn log(&self, who: &str, line: &str);
}

struct Prefixed {
    prefix: String,
}

impl Logger for Prefixed {
    fn log(&self, who: &str, line: &str) {
        println!("[{}] {who}: {line}", self.prefix);
    }
}

#[derive(Default, Wire)]
struct LoggerInit {
    #[config("LOG_PREFIX", default = "demo")]
    prefix: String,
}

#[async_trait]
impl Initializer for LoggerInit {
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
        register!(
            dyn Logger,
            "",
            Prefixed {
                prefix: self.prefix.clone(),
            }
        );
        Ok(ctx)
    }
}

#[derive(Default, Wire)]
struct Ticker {
    #[resolve]
    logger: Dep<dyn Logger>,
    #[config("TICK_EVERY", default = "500ms")]
    every: Duration,
    #[config("TICK_LIMIT", default = "6")]
    limit: u64,
    label: &'static str,
    ticks: AtomicU64,
    warm: AtomicBool,
}

impl Ticker {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Runnable for Ticker {
    async fn run(&self, ctx: Context) -> Result<(), BoxError> {
        let mut interval = tokio::time::interval(self.every);
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    self.logger.log(self.label, "cancelled");
                    return Ok(());
                }
                _ = interval.tick() => {
                    let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    self.warm.store(true, Ordering::Relaxed);
                    self.logger.log(self.label, &format!("tick #{n}"));
                    if n >= self.limit {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn is_ready(&self, _ctx: &Context) -> Result<(), BoxError> {
        if self.warm.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err("no tick yet".into())
        }
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.logger.log(
            self.label,
            &format!("closed after {} ticks", self.ticks.load(Ordering::Relaxed)),
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init("info", logging::Format::Text)?;

    let mut cfg = AppConfig::default();
    cfg.close_timeout = Duration::from_secs(2);

    let parent = Context::background();
    let app = App::new()
        .with_config(cfg)
        .with_provider(EnvProvider::new())
        .with_provider(StaticProvider::named("demo-defaults").set("TICK_LIMIT", "10"))
        .with_initializer(LoggerInit::default())
        .with_runnable(Ticker::new("fast"))
        .with_runnable(Ticker::new("slow"))
        .with_introspector(LogIntrospector::new())
        .run_async(&parent);

    let shutdown = parent.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    match app.wait_for_readiness(&parent, Duration::from_secs(3)).await {
        Ok(()) => println!("all workers ready"),
        Err(e) => println!("readiness: {e}"),
    }

    match app.wait().await {
        Ok(()) => println!("application stopped gracefully"),
        Err(e) => println!("application stopped with error [{}]: {e}", e.as_label()),
    }
    Ok(())
}
