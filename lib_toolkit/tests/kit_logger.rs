//! # KitLogger Integration Tests
//!
//! Verifies level filtering across the info and error files, structured extras,
//! and pruning of older files when a new logger starts.

use std::fs;
use std::path::Path;

use lib_toolkit::loggers::kit_logger::{KitLogger, LogLevel, LoggerOptions};
use tempfile::tempdir;

fn files_matching(dir: &Path, needle: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read log directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(needle))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_levels_and_extras_reach_the_right_files() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");

    let options = LoggerOptions {
        console_level: None,
        file_level: Some(LogLevel::Info),
        error_file_level: Some(LogLevel::Error),
        log_dir: Some(temp_dir.path().to_path_buf()),
        keep_files: 3,
    };
    let logger = KitLogger::new("test_app", Some(options));

    logger.debug("This is a debug message", None).await;
    logger.info("This is an info message", None).await;
    logger.warn("This is a warning message", Some(serde_json::json!({"code": 101}))).await;
    logger.error("This is an error message", None).await;
    logger.fatal("This is a fatal message", None).await;

    let (info_path, error_path) = logger.log_files();
    let info = fs::read_to_string(info_path.expect("info file configured")).expect("info file written");
    let errors = fs::read_to_string(error_path.expect("error file configured")).expect("error file written");

    // Below the info threshold
    assert!(!info.contains("This is a debug message"));

    assert!(info.contains("INFO  [test_app] This is an info message"));
    assert!(info.contains("WARN  [test_app] This is a warning message"));
    assert!(info.contains(r#"{"code":101}"#));
    assert!(info.contains("ERROR [test_app] This is an error message"));
    assert!(info.contains("FATAL [test_app] This is a fatal message"));

    assert!(!errors.contains("This is an info message"));
    assert!(!errors.contains("This is a warning message"));
    assert!(errors.contains("This is an error message"));
    assert!(errors.contains("This is a fatal message"));

    temp_dir.close().expect("Failed to clean up temporary directory");
}

#[tokio::test]
async fn test_startup_prunes_older_files() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let dir = temp_dir.path();

    for ts in ["20200101_000000", "20200102_000000", "20200103_000000"] {
        fs::write(dir.join(format!("test_app-info-{}.log", ts)), "old\n").unwrap();
        fs::write(dir.join(format!("test_app-error-{}.log", ts)), "old\n").unwrap();
    }

    let logger = KitLogger::new(
        "test_app",
        Some(LoggerOptions {
            console_level: None,
            log_dir: Some(dir.to_path_buf()),
            keep_files: 1,
            ..Default::default()
        }),
    );

    assert_eq!(files_matching(dir, "-info-"), vec!["test_app-info-20200103_000000.log"]);
    assert_eq!(files_matching(dir, "-error-"), vec!["test_app-error-20200103_000000.log"]);

    logger.error("fresh", None).await;

    assert_eq!(files_matching(dir, "-info-").len(), 2);
    assert_eq!(files_matching(dir, "-error-").len(), 2);
}

#[tokio::test]
async fn test_concurrent_writes_keep_lines_whole() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let logger = std::sync::Arc::new(KitLogger::new(
        "test_app",
        Some(LoggerOptions {
            console_level: None,
            error_file_level: None,
            log_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        }),
    ));

    let mut handles = Vec::new();
    for task in 0..8 {
        let logger = logger.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                logger.info(&format!("task {} line {}", task, i), None).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let info = fs::read_to_string(logger.log_files().0.unwrap()).unwrap();
    let lines: Vec<&str> = info.lines().collect();
    assert_eq!(lines.len(), 200);
    assert!(lines.iter().all(|l| l.contains("INFO  [test_app] task ")));
}

#[tokio::test]
async fn test_line_is_on_disk_when_log_returns() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let logger = KitLogger::new(
        "test_app",
        Some(LoggerOptions {
            console_level: None,
            log_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        }),
    );
    let info_path = logger.log_files().0.expect("info file configured").to_path_buf();
    let error_path = logger.log_files().1.expect("error file configured").to_path_buf();

    for i in 0..200 {
        let message = format!("line {}", i);
        logger.error(&message, None).await;

        let info = fs::read_to_string(&info_path).expect("info file written");
        assert!(info.ends_with(&format!("[test_app] {}\n", message)), "missing {:?}", message);
        let errors = fs::read_to_string(&error_path).expect("error file written");
        assert!(errors.ends_with(&format!("[test_app] {}\n", message)), "missing {:?}", message);
    }
}
