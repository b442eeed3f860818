//! Full lifecycle walkthrough: a memory provider factory, startup tasks
//! (one deliberately failing), per-provider data migration, and one
//! programmatic restart.
//!
//! Run with: `cargo run --example headless --features logging`

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

use appvisor::events::wellknown::{CreateProvider, MOVE_PER_PROVIDER_DATA, MoveProviderData,
    REQUEST_CREATE_PROVIDER};
use appvisor::{
    AppContext, Config, CreateError, Frontend, LifecycleController, LogWriter, NullPlatform,
    PerProviderData, Provider, ProviderFactory, ProviderRef, RuntimeError, TaskError, TaskFn,
    TaskRef,
};

struct MemoryProvider;

impl Provider for MemoryProvider {
    fn kind(&self) -> &str {
        "memory"
    }
    fn display_name(&self) -> String {
        "In-memory scratch".to_string()
    }
}

struct MemoryFactory;

impl ProviderFactory for MemoryFactory {
    fn name(&self) -> &str {
        "memory"
    }
    fn load(&self) -> Result<ProviderRef, CreateError> {
        Ok(Arc::new(MemoryProvider))
    }
}

/// Runs once per boot: replaces a provider and carries its bookmarks over.
struct DemoFrontend {
    runs: AtomicU32,
}

#[async_trait]
impl Frontend for DemoFrontend {
    async fn run(&self, ctx: &Arc<AppContext>) -> Result<(), RuntimeError> {
        let boot = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        println!("--- running phase, boot #{boot} ---");
        println!("degraded-start markers: {:?}", ctx.init_markers());

        let bookmarks: PerProviderData<Vec<&'static str>> = PerProviderData::new(ctx.migrator());

        let old = ctx
            .requests()
            .request(REQUEST_CREATE_PROVIDER, &CreateProvider::headless("memory"))
            .ok_or_else(|| RuntimeError::Frontend {
                reason: "memory factory not registered".into(),
            })?;
        bookmarks.insert(old, vec!["header", "footer"]);

        // Replace the provider: create the successor, migrate, destroy.
        let new = ctx
            .requests()
            .request(REQUEST_CREATE_PROVIDER, &CreateProvider::headless("memory"))
            .ok_or_else(|| RuntimeError::Frontend {
                reason: "memory factory not registered".into(),
            })?;
        ctx.events()
            .publish(MOVE_PER_PROVIDER_DATA, &MoveProviderData { from: old, to: new });
        ctx.destroy_provider(old);

        println!(
            "bookmarks now live on {new}: {:?}",
            bookmarks.get(new).unwrap_or_default()
        );

        if boot == 1 {
            println!("requesting a full restart...");
            ctx.request_restart();
        }
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let register_factories: TaskRef = TaskFn::arc("register-factories", |ctx: Arc<AppContext>, _cancel: CancellationToken| async move {
        ctx.providers().register_factory(Arc::new(MemoryFactory));
        Ok(())
    });
    let attach_logger: TaskRef = TaskFn::arc("attach-logger", |ctx: Arc<AppContext>, _cancel: CancellationToken| async move {
        LogWriter::attach(&ctx);
        Ok(())
    });
    let slow_index: TaskRef = TaskFn::arc("rebuild-index", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async {
        sleep(Duration::from_millis(50)).await;
        Ok(())
    });
    let broken_plugin: TaskRef = TaskFn::arc("load-optional-plugin", |_ctx: Arc<AppContext>, _cancel: CancellationToken| async {
        Err(TaskError::Fail {
            error: "plugin directory missing".into(),
        })
    });

    let cfg = Config {
        max_concurrent: 2,
        task_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let controller = LifecycleController::new(
        cfg,
        NullPlatform,
        DemoFrontend {
            runs: AtomicU32::new(0),
        },
    )
    .with_startup_tasks(vec![
        register_factories,
        attach_logger,
        slow_index,
        broken_plugin,
    ]);

    controller.run().await?;
    println!("lifecycle finished after {} boot(s)", controller.boot_cycles());
    Ok(())
}
