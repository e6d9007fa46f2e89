//! Shared fixtures: service trees with Surefire and Jest reports.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use test_metrics_lib::config::PipelineOptions;

pub const SURE_FIRE_DIR: &str = "target/surefire-reports";

/// A temporary backend root with one directory per service.
pub struct ServiceTree {
    pub root: TempDir,
}

impl ServiceTree {
    pub fn new() -> Self {
        ServiceTree {
            root: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write a Surefire report for `service` and return its path.
    pub fn write_junit(
        &self,
        service: &str,
        name: &str,
        tests: u64,
        failures: u64,
        errors: u64,
        time: &str,
    ) -> PathBuf {
        self.write_raw(
            service,
            name,
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="com.foodfast.{service}.{name}" tests="{tests}" failures="{failures}" errors="{errors}" skipped="0" time="{time}">
  <testcase name="smoke" classname="{name}" time="0.01"/>
</testsuite>
"#
            ),
        )
    }

    /// Write arbitrary report content under the Surefire directory.
    pub fn write_raw(&self, service: &str, name: &str, content: &str) -> PathBuf {
        let dir = self.path().join(service).join(SURE_FIRE_DIR);
        fs::create_dir_all(&dir).expect("failed to create report dir");
        let path = dir.join(format!("TEST-{}.xml", name));
        fs::write(&path, content).expect("failed to write report");
        path
    }

    /// Pipeline options over this tree writing into `<root>/out/`.
    pub fn options(&self, services: &[&str]) -> PipelineOptions {
        let mut options =
            PipelineOptions::new(self.path(), self.path().join("out/test_metrics.txt"))
                .with_services(services.iter().copied());
        options.summary_json_path = Some(self.path().join("out/test_metrics.json"));
        options
    }
}

/// Sample lines of a rendered document, keyed by series, timestamps stripped.
pub fn samples(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|line| {
            let split = line.find('}').map(|i| i + 1).unwrap_or_else(|| {
                line.find(' ').expect("sample line without value")
            });
            let (series, rest) = line.split_at(split);
            let value = rest.split_whitespace().next().expect("missing value");
            (series.to_string(), value.to_string())
        })
        .collect()
}

/// Value of one series in a rendered document.
pub fn sample(text: &str, series: &str) -> Option<String> {
    samples(text)
        .into_iter()
        .find(|(name, _)| name == series)
        .map(|(_, value)| value)
}
