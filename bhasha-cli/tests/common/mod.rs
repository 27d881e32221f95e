//! CLI 集成测试的共享工具

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// `bhasha` 二进制
pub fn bhasha() -> Command {
    Command::cargo_bin("bhasha").unwrap()
}

/// 在临时目录中写入文件，返回目录（需保持存活）与路径
pub fn write_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
