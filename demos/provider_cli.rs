//! Process entry boundary: command-line arguments route to a non-interactive
//! provider-creation path; no arguments start the interactive lifecycle with
//! the headless frontend (stop with Ctrl-C).
//!
//! Run with: `cargo run --example provider_cli -- memory nonexistent`

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use appvisor::events::wellknown::{CreateProvider, REQUEST_CREATE_PROVIDER};
use appvisor::{
    AppContext, Config, CreateError, HeadlessFrontend, LifecycleController, NullPlatform,
    Provider, ProviderFactory, ProviderRef, TaskFn, TaskRef,
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

/// Tries to create one provider per argument, probing quietly like a
/// frontend cycling through candidate factories.
fn run_command_line(args: Vec<String>) -> ExitCode {
    let ctx = AppContext::new();
    ctx.providers().register_factory(Arc::new(MemoryFactory));

    let mut failures = 0;
    for name in args {
        let result = ctx.requests().request(
            REQUEST_CREATE_PROVIDER,
            &CreateProvider::headless(&name).quiet(),
        );
        match result {
            Some(handle) => {
                let display = ctx
                    .providers()
                    .get(handle)
                    .map(|p| p.display_name())
                    .unwrap_or_default();
                println!("{name}: created {handle} ({display})");
            }
            None => {
                eprintln!("{name}: no such provider factory");
                failures += 1;
            }
        }
    }
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_interactive() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .thread_name("appvisor-worker")
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let register_factories: TaskRef = TaskFn::arc(
        "register-factories",
        |ctx: Arc<AppContext>, _cancel: CancellationToken| async move {
            ctx.providers().register_factory(Arc::new(MemoryFactory));
            Ok(())
        },
    );

    let controller = LifecycleController::new(Config::default(), NullPlatform, HeadlessFrontend)
        .with_startup_tasks(vec![register_factories]);

    match runtime.block_on(controller.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        run_interactive()
    } else {
        run_command_line(args)
    }
}
