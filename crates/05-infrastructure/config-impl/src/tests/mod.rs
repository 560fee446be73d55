//! 配置存储与资源包测试

mod hot_reload_tests;

use config_abstractions::ChangeDetector;
use infrastructure_common::ConfigResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::{Duration, UNIX_EPOCH};

/// 测试起始时间
pub(crate) const T0: i64 = 1_700_000_000;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("trace")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 写入文件并固定修改时间
pub(crate) fn write_file(dir: &Path, name: &str, content: &str, mtime: i64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    set_mtime(&path, mtime);
    path
}

/// 设置文件修改时间
pub(crate) fn set_mtime(path: &Path, secs: i64) {
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(u64::try_from(secs).unwrap()))
        .unwrap();
}

/// 总是报告文件已变更的检测器，记录被查询的次数
#[derive(Debug, Default)]
pub(crate) struct AlwaysChanged {
    pub(crate) calls: AtomicUsize,
}

impl ChangeDetector for AlwaysChanged {
    fn modified_secs(&self, _path: &Path) -> ConfigResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(i64::MAX)
    }
}
