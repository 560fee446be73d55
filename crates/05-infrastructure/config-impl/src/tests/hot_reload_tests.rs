//! 配置存储加载与热重载测试

use super::{init_test_logger, set_mtime, write_file, AlwaysChanged, T0};
use crate::store::ConfigStore;
use config_abstractions::{ConfigReloadEvent, ConfigStoreOptions, PropertySource, ReloadTrigger};
use infrastructure_common::{ConfigError, ManualClock};
use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const MASTER: &str = "sub1=sub1.properties\nsub2=sub2.properties\n";
const SUB1: &str = "sub1.value1=value 1\nsub1.value2=value 2/sub1\nshared=from sub1\n";
const SUB2: &str = "sub2.value1=value 2\nsub2.value2=value 1/sub2\nshared=from sub2\n";

struct Fixture {
    dir: TempDir,
    clock: Arc<ManualClock>,
    store: ConfigStore,
}

impl Fixture {
    /// 创建配置目录，所有文件的修改时间早于加载时间
    fn new() -> Self {
        init_test_logger();
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "master-config.properties", MASTER, T0 - 100);
        write_file(dir.path(), "sub1.properties", SUB1, T0 - 100);
        write_file(dir.path(), "sub2.properties", SUB2, T0 - 100);

        let clock = Arc::new(ManualClock::new(T0));
        let store = ConfigStore::with_clock(clock.clone());
        Self { dir, clock, store }
    }

    fn load(&self) {
        self.store
            .load_config(self.dir.path(), ConfigStoreOptions::default())
            .unwrap();
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// 测试加载主配置文件和所有子文件
#[test]
fn test_load_config_merges_all_files() {
    let fixture = Fixture::new();
    fixture.load();
    let store = &fixture.store;

    assert!(store.is_loaded());
    assert_eq!(store.get("sub1.value1").as_deref(), Some("value 1"));
    assert_eq!(store.get("sub1.value2").as_deref(), Some("value 2/sub1"));
    assert_eq!(store.get("sub2.value1").as_deref(), Some("value 2"));
    assert_eq!(store.get("sub2.value2").as_deref(), Some("value 1/sub2"));

    // 键为主配置文件与子文件的并集
    let keys = store.keys();
    for key in [
        "sub1",
        "sub2",
        "sub1.value1",
        "sub1.value2",
        "shared",
        "sub2.value1",
        "sub2.value2",
    ] {
        assert!(keys.iter().any(|k| k == key), "缺少键 {key}");
    }
    assert_eq!(keys.len(), 7);

    assert_eq!(
        store.tracked_files(),
        vec![
            fixture.path("master-config.properties"),
            fixture.path("sub1.properties"),
            fixture.path("sub2.properties"),
        ]
    );
}

/// 测试多文件定义同一个键时的取值顺序
#[test]
fn test_first_last_and_all_follow_load_order() {
    let fixture = Fixture::new();
    fixture.load();
    let store = &fixture.store;

    assert_eq!(store.get_first("shared").as_deref(), Some("from sub1"));
    assert_eq!(store.get_last("shared").as_deref(), Some("from sub2"));
    assert_eq!(store.get("shared").as_deref(), Some("from sub2"));
    assert_eq!(
        store.get_all("shared"),
        Some(vec!["from sub1".to_string(), "from sub2".to_string()])
    );
    assert_eq!(store.get_or("missing", "default"), "default");
    assert_eq!(store.get_all("missing"), None);
}

/// 测试类型化读取
#[test]
fn test_typed_getters() {
    let fixture = Fixture::new();
    write_file(
        fixture.dir.path(),
        "sub2.properties",
        "port=8080\nratio=0.5\nenabled=TRUE\nbad=abc\n",
        T0 - 100,
    );
    fixture.load();
    let store = &fixture.store;

    assert_eq!(store.get_int("port", 0), 8080);
    assert_eq!(store.get_int("bad", 42), 42);
    assert_eq!(store.get_int("missing", -1), -1);
    assert!((store.get_float("ratio", 0.0) - 0.5).abs() < f64::EPSILON);
    assert!((store.get_float("bad", 1.5) - 1.5).abs() < f64::EPSILON);
    assert!(store.get_boolean("enabled", false));
    assert!(!store.get_boolean("bad", false));
}

/// 测试主配置文件不存在
#[test]
fn test_missing_master_file_is_config_not_found() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new();

    let err = store
        .load_config(dir.path(), ConfigStoreOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
    assert!(store.config().is_empty());
    assert!(store.keys().is_empty());
    assert!(!store.is_loaded());
    assert_eq!(store.get("sub1.value1"), None);
}

/// 测试主配置文件是目录
#[test]
fn test_master_directory_is_config_not_found() {
    init_test_logger();
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("master-config.properties"))
        .unwrap();

    let err = ConfigStore::new()
        .load_config(dir.path(), ConfigStoreOptions::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

/// 测试加载失败不影响之前的配置
#[test]
fn test_failed_load_keeps_previous_config() {
    let fixture = Fixture::new();
    fixture.load();
    let empty = TempDir::new().unwrap();

    let err = fixture
        .store
        .load_config(empty.path(), ConfigStoreOptions::default())
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(fixture.store.get("sub1.value1").as_deref(), Some("value 1"));
    assert_eq!(fixture.store.directory().as_deref(), Some(fixture.dir.path()));

    // 子文件缺失同样不影响
    fs::remove_file(fixture.path("sub2.properties")).unwrap();
    let err = fixture
        .store
        .load_config(fixture.dir.path(), ConfigStoreOptions::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError { .. }));
    assert_eq!(fixture.store.get("sub2.value1").as_deref(), Some("value 2"));
}

/// 测试无效选项在访问文件系统前被拒绝
#[test]
fn test_invalid_options_rejected() {
    let fixture = Fixture::new();
    let options = ConfigStoreOptions::default().with_master_file_name("");
    let err = fixture
        .store
        .load_config(fixture.dir.path(), options)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOptions { .. }));
    assert!(!fixture.store.is_loaded());
}

/// 测试自定义主配置文件名
#[test]
fn test_custom_master_file_name() {
    let fixture = Fixture::new();
    write_file(
        fixture.dir.path(),
        "app.properties",
        "only=sub1.properties\n",
        T0 - 100,
    );
    let options = ConfigStoreOptions::default().with_master_file_name("app.properties");
    fixture
        .store
        .load_config(fixture.dir.path(), options.clone())
        .unwrap();

    assert_eq!(fixture.store.options(), Some(options));
    assert_eq!(fixture.store.get("sub1.value1").as_deref(), Some("value 1"));
    assert_eq!(fixture.store.get("sub2.value1"), None);
}

/// 测试检查间隔对文件变更检测的限制
#[test]
fn test_check_file_changes_respects_interval() {
    let fixture = Fixture::new();
    fixture.load();
    let store = &fixture.store;

    assert!(!store.check_file_changes());

    set_mtime(&fixture.path("sub2.properties"), T0 + 5);
    fixture.clock.set(T0 + 5);
    assert!(!store.check_file_changes(), "检查间隔未到时不应检测到变更");

    fixture.clock.set(T0 + 10);
    assert!(store.check_file_changes());
    // 检测本身不会重置时间表
    assert!(store.check_file_changes());
    assert_eq!(store.schedule().map(|s| s.last_check()), Some(T0));
}

/// 测试间隔到期但文件未变更
#[test]
fn test_unchanged_files_not_reported() {
    let fixture = Fixture::new();
    fixture.load();
    fixture.clock.set(T0 + 60);
    assert!(!fixture.store.check_file_changes());
}

/// 测试获取文件状态失败视为未变更
#[test]
fn test_stat_failure_treated_as_unchanged() {
    let fixture = Fixture::new();
    fixture.load();
    fs::remove_file(fixture.path("sub1.properties")).unwrap();
    fixture.clock.set(T0 + 10);
    assert!(!fixture.store.check_file_changes());

    set_mtime(&fixture.path("sub2.properties"), T0 + 1);
    assert!(fixture.store.check_file_changes());
}

/// 测试关闭自动重载
#[test]
fn test_reload_disabled() {
    let fixture = Fixture::new();
    fixture
        .store
        .load_config(
            fixture.dir.path(),
            ConfigStoreOptions::default()
                .with_reload_on_change(false)
                .with_check_interval(0),
        )
        .unwrap();

    write_file(fixture.dir.path(), "sub2.properties", "shared=changed\n", T0 + 5);
    fixture.clock.set(T0 + 5);
    assert!(!fixture.store.check_file_changes());
    assert_eq!(fixture.store.get("shared").as_deref(), Some("from sub2"));
}

/// 测试读取配置时自动重载
#[test]
fn test_getter_triggers_reload() {
    let fixture = Fixture::new();
    let events: Arc<Mutex<Vec<ConfigReloadEvent>>> = Arc::default();
    let sink = events.clone();
    fixture
        .store
        .add_listener(move |event: &ConfigReloadEvent| sink.lock().push(event.clone()));
    fixture.load();

    write_file(
        fixture.dir.path(),
        "sub2.properties",
        "sub2.value1=value 2\nshared=changed\nsub2.new=added\n",
        T0 + 5,
    );
    fixture.clock.set(T0 + 5);
    assert_eq!(fixture.store.get("shared").as_deref(), Some("from sub2"));

    fixture.clock.set(T0 + 10);
    assert_eq!(fixture.store.get("shared").as_deref(), Some("changed"));
    assert_eq!(fixture.store.get("sub2.new").as_deref(), Some("added"));
    // 整体重建，旧键不会残留
    assert_eq!(fixture.store.get("sub2.value2"), None);

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].trigger, ReloadTrigger::Explicit);
    assert_eq!(events[1].trigger, ReloadTrigger::FileChange);
    assert_eq!(events[1].files.len(), 3);

    let schedule = fixture.store.schedule().unwrap();
    assert_eq!(schedule.last_check(), T0 + 10);
    assert_eq!(schedule.next_check(), T0 + 20);
    assert!(!fixture.store.check_file_changes());
}

/// 测试自动重载失败时继续使用旧配置
#[test]
fn test_failed_implicit_reload_serves_previous_config() {
    let fixture = Fixture::new();
    let reloads = Arc::new(AtomicUsize::new(0));
    let counter = reloads.clone();
    fixture.store.add_listener(move |_: &ConfigReloadEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    fixture.load();

    fs::remove_file(fixture.path("sub2.properties")).unwrap();
    set_mtime(&fixture.path("master-config.properties"), T0 + 5);
    fixture.clock.set(T0 + 10);

    assert_eq!(fixture.store.get("sub2.value1").as_deref(), Some("value 2"));
    assert_eq!(reloads.load(Ordering::SeqCst), 1);

    // 时间表推迟，但保留上次成功加载的时间
    let schedule = fixture.store.schedule().unwrap();
    assert_eq!(schedule.last_check(), T0);
    assert_eq!(schedule.next_check(), T0 + 20);
    assert!(!fixture.store.check_file_changes());

    fixture.clock.set(T0 + 20);
    assert!(fixture.store.check_file_changes());
}

/// 测试监听器按注册顺序调用，每次加载调用一次
#[test]
fn test_listeners_called_in_registration_order() {
    let fixture = Fixture::new();
    let calls: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    for name in ["first", "second", "third"] {
        let calls = calls.clone();
        fixture
            .store
            .add_listener(move |_: &ConfigReloadEvent| calls.lock().push(name));
    }
    assert_eq!(fixture.store.listener_count(), 3);

    fixture.load();
    assert_eq!(*calls.lock(), vec!["first", "second", "third"]);

    fixture.load();
    assert_eq!(calls.lock().len(), 6);

    // 失败的加载不调用监听器
    let empty = TempDir::new().unwrap();
    let _ = fixture
        .store
        .load_config(empty.path(), ConfigStoreOptions::default());
    assert_eq!(calls.lock().len(), 6);
}

/// 测试监听器中读取配置
#[test]
fn test_listener_can_read_store() {
    let fixture = Fixture::new();
    let store = Arc::new(fixture.store);
    let seen: Arc<Mutex<Option<String>>> = Arc::default();

    let weak = Arc::downgrade(&store);
    let sink = seen.clone();
    store.add_listener(move |_: &ConfigReloadEvent| {
        if let Some(store) = weak.upgrade() {
            *sink.lock() = store.get("sub1.value1");
        }
    });

    store
        .load_config(fixture.dir.path(), ConfigStoreOptions::default())
        .unwrap();
    assert_eq!(seen.lock().as_deref(), Some("value 1"));
}

/// 测试通过 trait 对象访问配置
#[test]
fn test_store_as_property_source() {
    let fixture = Fixture::new();
    fixture.load();
    let source: &dyn PropertySource = &fixture.store;
    assert_eq!(source.name(), "ConfigStore");
    assert!(source.contains_key("sub1.value1"));
    assert_eq!(source.get("sub1.value1").as_deref(), Some("value 1"));
}

/// 测试未加载时显式重载返回 NotLoaded
#[test]
fn test_reload_config_requires_prior_load() {
    let fixture = Fixture::new();
    let err = fixture.store.reload_config().unwrap_err();
    assert!(matches!(err, ConfigError::NotLoaded));
    assert!(!fixture.store.is_loaded());
}

/// 测试用上次的目录和选项重新加载
#[test]
fn test_reload_config_uses_last_directory_and_options() {
    let fixture = Fixture::new();
    let options = ConfigStoreOptions::default().with_check_interval(60);
    fixture
        .store
        .load_config(fixture.dir.path(), options.clone())
        .unwrap();

    write_file(fixture.dir.path(), "sub1.properties", "sub1.value1=reloaded\n", T0 - 50);
    fixture.clock.set(T0 + 1);
    fixture.store.reload_config().unwrap();

    assert_eq!(fixture.store.get("sub1.value1").as_deref(), Some("reloaded"));
    assert_eq!(fixture.store.options(), Some(options));
    let schedule = fixture.store.schedule().unwrap();
    assert_eq!(schedule.last_check(), T0 + 1);
    assert_eq!(schedule.next_check(), T0 + 61);
}

/// 测试注入自定义的变更检测器
#[test]
fn test_custom_change_detector() {
    let fixture = Fixture::new();
    let detector = Arc::new(AlwaysChanged::default());
    let store = ConfigStore::with_clock(fixture.clock.clone())
        .with_change_detector(detector.clone());
    store
        .load_config(fixture.dir.path(), ConfigStoreOptions::default())
        .unwrap();

    let events: Arc<Mutex<Vec<ReloadTrigger>>> = Arc::default();
    let sink = events.clone();
    store.add_listener(move |event: &ConfigReloadEvent| sink.lock().push(event.trigger));

    // 文件没有变化，检查间隔内不查询检测器
    assert!(!store.check_file_changes());
    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);

    fixture.clock.set(T0 + 10);
    assert!(store.check_file_changes());
    assert_eq!(store.get("shared").as_deref(), Some("from sub2"));
    assert_eq!(*events.lock(), vec![ReloadTrigger::FileChange]);
    assert!(detector.calls.load(Ordering::SeqCst) >= 2);
}

/// 测试多个线程同时发现变更时只重载一次
#[test]
fn test_concurrent_readers_reload_once() {
    const READERS: usize = 8;
    let fixture = Fixture::new();
    fixture.load();
    let store = Arc::new(fixture.store);

    let reloads = Arc::new(AtomicUsize::new(0));
    let counter = reloads.clone();
    store.add_listener(move |_: &ConfigReloadEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    write_file(fixture.dir.path(), "sub2.properties", "shared=changed\n", T0 + 5);
    fixture.clock.set(T0 + 10);

    let barrier = Arc::new(Barrier::new(READERS));
    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store.get("shared")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("changed"));
    }
    assert_eq!(reloads.load(Ordering::SeqCst), 1);
}

/// 测试监听器执行期间其他线程仍会检查文件变更
#[test]
fn test_other_threads_check_while_listener_runs() {
    let fixture = Fixture::new();
    fixture.load();
    let store = Arc::new(fixture.store);
    let clock = fixture.clock.clone();
    let sub2 = fixture.dir.path().join("sub2.properties");

    let triggers: Arc<Mutex<Vec<ReloadTrigger>>> = Arc::default();
    let seen_by_other: Arc<Mutex<Option<String>>> = Arc::default();
    let weak = Arc::downgrade(&store);
    let sink = triggers.clone();
    let seen = seen_by_other.clone();
    store.add_listener(move |event: &ConfigReloadEvent| {
        let first = {
            let mut triggers = sink.lock();
            triggers.push(event.trigger);
            triggers.len() == 1
        };
        let Some(store) = weak.upgrade().filter(|_| first) else {
            return;
        };

        fs::write(&sub2, "shared=third\n").unwrap();
        set_mtime(&sub2, T0 + 15);
        clock.set(T0 + 20);
        let other = thread::spawn(move || store.get("shared"));
        *seen.lock() = other.join().unwrap();
    });

    write_file(fixture.dir.path(), "sub2.properties", "shared=second\n", T0 + 5);
    fixture.clock.set(T0 + 10);
    store.get("shared");

    assert_eq!(seen_by_other.lock().as_deref(), Some("third"));
    assert_eq!(
        *triggers.lock(),
        vec![ReloadTrigger::FileChange, ReloadTrigger::FileChange]
    );
    assert_eq!(store.get("shared").as_deref(), Some("third"));
}
