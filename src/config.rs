use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        5000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 默认日志过滤规则（`RUST_LOG` 优先）
    #[serde(default = "LoggingConfig::default_filter")]
    pub filter: String,
}

impl LoggingConfig {
    fn default_filter() -> String {
        "image_service=info,tower_http=info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: Self::default_filter(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// 自定义字体目录（.ttf/.otf）
    #[serde(default = "RenderConfig::default_fonts_dir")]
    pub fonts_dir: String,
    /// 首选字体族
    #[serde(default = "RenderConfig::default_font_family")]
    pub font_family: String,
    /// 是否加载系统字体作为回退
    #[serde(default = "RenderConfig::default_load_system_fonts")]
    pub load_system_fonts: bool,
    /// 单边最大像素数（防止超大画布耗尽内存）
    #[serde(default = "RenderConfig::default_max_dimension")]
    pub max_dimension: u32,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl RenderConfig {
    fn default_fonts_dir() -> String {
        "resources/fonts".to_string()
    }
    fn default_font_family() -> String {
        "DejaVu Sans".to_string()
    }
    fn default_load_system_fonts() -> bool {
        true
    }
    fn default_max_dimension() -> u32 {
        4096
    }

    /// 实际生效的并发渲染许可数
    pub fn effective_parallelism(&self) -> usize {
        match self.max_parallel {
            0 => num_cpus::get().max(1),
            n => n as usize,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fonts_dir: Self::default_fonts_dir(),
            font_family: Self::default_font_family(),
            load_system_fonts: Self::default_load_system_fonts(),
            max_dimension: Self::default_max_dimension(),
            max_parallel: 0,
        }
    }
}

/// 静态演示页面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "StaticFilesConfig::default_enabled")]
    pub enabled: bool,
    /// 静态文件根目录
    #[serde(default = "StaticFilesConfig::default_dir")]
    pub dir: String,
}

impl StaticFilesConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_dir() -> String {
        "wwwroot".to_string()
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            dir: Self::default_dir(),
        }
    }
}

/// 接口文档配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// 是否挂载 Swagger UI（/swagger）与 OpenAPI JSON
    #[serde(default = "DocsConfig::default_enabled")]
    pub enabled: bool,
}

impl DocsConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 图片渲染配置
    #[serde(default)]
    pub render: RenderConfig,
    /// 静态文件配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
    /// 接口文档配置
    #[serde(default)]
    pub docs: DocsConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置（文件可缺省），支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            // 配置文件不存在时全部使用默认值
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_SERVER__PORT、APP_RENDER__MAX_DIMENSION
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;

        tracing::debug!(
            "配置加载完成: font_family = {}, max_dimension = {}",
            config.render.font_family,
            config.render.max_dimension
        );

        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径（可通过 APP_CONFIG_PATH 指定）
    fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取字体目录
    pub fn fonts_path(&self) -> PathBuf {
        PathBuf::from(&self.render.fonts_dir)
    }

    /// 获取静态文件目录
    pub fn static_files_path(&self) -> PathBuf {
        PathBuf::from(&self.static_files.dir)
    }
}
