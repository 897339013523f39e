use image_service::features::image::ImageService;
use image_service::startup::run_startup_checks;
use image_service::{AppConfig, AppState, ShutdownManager, build_app};

#[tokio::main]
async fn main() {
    // Load config
    if let Err(e) = AppConfig::init_global() {
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .init();

    // 创建优雅退出管理器并启动信号处理器
    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.listen_for_signals() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let fonts = match run_startup_checks(config).await {
        Ok(fonts) => fonts,
        Err(e) => {
            tracing::error!("启动检查失败: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config.render.clone(), ImageService::new(fonts));
    let app = build_app(app_state, config);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    if config.docs.enabled {
        tracing::info!("Docs: http://{}/swagger", addr);
    }
    tracing::info!("Avatar: http://{}/avatar/Jane%20Doe.png", addr);
    tracing::info!("Cover: http://{}/cover/Dune.png?author=Frank%20Herbert", addr);

    // 退出开始后超过超时时间仍未结束则强制退出
    let shutdown_timeout = config.shutdown.timeout_duration();
    shutdown_manager.spawn_force_exit(shutdown_timeout);

    let signal = shutdown_manager.clone();
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = signal.wait().await;
        tracing::info!(
            "接收到退出信号: {:?}，开始优雅关闭HTTP服务器（超时 {}秒）...",
            reason,
            shutdown_timeout.as_secs()
        );
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
