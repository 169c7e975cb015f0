mod app;

use cubix_engine::device::GpuInit;
use cubix_engine::logging::{init_logging, LoggingConfig};
use cubix_engine::window::{Runtime, RuntimeConfig};

use app::CubeApp;

/// 0 on a clean shutdown, -1 when anything in startup or the loop failed.
fn exit_code(result: &anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

fn main() {
    init_logging(LoggingConfig::default());

    let gpu_init = GpuInit {
        // Vertex colors are authored for a plain UNORM swapchain.
        prefer_srgb: false,
        ..GpuInit::default()
    };

    let result = Runtime::run(RuntimeConfig::default(), gpu_init, CubeApp::new());
    match &result {
        Ok(()) => log::info!("clean shutdown"),
        Err(e) => log::error!("{e:#}"),
    }

    std::process::exit(exit_code(&result));
}
