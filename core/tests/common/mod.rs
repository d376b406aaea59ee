//! Common test utilities and fixtures

#![allow(dead_code)]

use recdiff_core::{SnapshotPair, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ROSTER_COLUMNS: &[&str] = &["Name", "Chi Name", "Post", "Phone"];

/// Literal tables used across the integration tests
pub struct TestFixtures;

impl TestFixtures {
    /// Build a table from a header list and literal rows
    pub fn table(name: &str, columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_values(name, columns, rows.iter().map(|row| row.to_vec()))
    }

    pub fn pair(
        columns: &[&str],
        old_rows: &[&[&str]],
        new_rows: &[&[&str]],
    ) -> SnapshotPair {
        SnapshotPair::new(
            Self::table("old.csv", columns, old_rows),
            Self::table("new.csv", columns, new_rows),
        )
    }

    /// Staff roster as it looked in the earlier snapshot
    pub fn roster_old() -> Table {
        Self::table(
            "roster_2023.csv",
            ROSTER_COLUMNS,
            &[
                &["O'Brien, John", "", "Manager", "2345 6789"],
                &["Chan, Tai Man", "陳大文", "Sales-Rep", "9123 4567"],
                &["Chan, Tai Man", "陳泰文", "Clerk", "9000 0001"],
                &["Wong Siu Ming", "", "Engineer", "6111 2222"],
                &[" ", "", "Temp", ""],
            ],
        )
    }

    /// Staff roster in the later snapshot: one typo, one promotion, one
    /// cosmetic rename, one leaver, one joiner
    pub fn roster_new() -> Table {
        Self::table(
            "roster_2024.csv",
            ROSTER_COLUMNS,
            &[
                &["OBRIEN JOHN", "", "Mananger", "2345 6789"],
                &["CHAN TAI-MAN", "陳大文", "sales rep", "9123 4567"],
                &["Chan, Tai Man", "陳泰文", "Director", "9000 0001"],
                &["Lee Ka Yan", "李嘉欣", "Analyst", "6333 4444"],
            ],
        )
    }

    pub fn roster_pair() -> SnapshotPair {
        SnapshotPair::new(Self::roster_old(), Self::roster_new())
    }
}

/// Temporary directory holding a recdiff config file
pub struct TestWorkspace {
    pub temp_dir: TempDir,
    pub path: PathBuf,
    pub config_path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace whose `recdiff.toml` holds `config`
    pub fn new(config: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().to_path_buf();
        let config_path = path.join("recdiff.toml");

        fs::write(&config_path, config).expect("Failed to write config file");

        Self {
            temp_dir,
            path,
            config_path,
        }
    }

    /// Get the workspace path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
