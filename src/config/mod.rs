mod service;

pub use service::{
    BackupConfig, BackupFileConfig, ChecksConfig, ChecksFileConfig, ConfigFile,
    DEFAULT_CONFIG_FILE, ServiceConfig,
};
