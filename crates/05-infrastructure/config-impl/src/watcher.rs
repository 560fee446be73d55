//! 基于文件修改时间的变更检测器

use config_abstractions::ChangeDetector;
use infrastructure_common::{system_time_secs, ConfigError, ConfigResult};
use std::fs;
use std::path::Path;

/// 通过 `stat` 获取文件修改时间的检测器
///
/// 非普通文件（目录等）视为从未修改。
#[derive(Debug, Clone, Copy, Default)]
pub struct MtimeChangeDetector;

impl ChangeDetector for MtimeChangeDetector {
    fn modified_secs(&self, path: &Path) -> ConfigResult<i64> {
        let stat_failure = |source| ConfigError::StatFailure {
            path: path.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(path).map_err(stat_failure)?;
        if !metadata.is_file() {
            return Ok(i64::MIN);
        }
        let modified = metadata.modified().map_err(stat_failure)?;
        Ok(system_time_secs(modified))
    }
}
