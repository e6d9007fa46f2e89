//! Command-line flags shared by the binaries that run the pipeline.

use std::path::PathBuf;

use clap::Args;

use crate::config::PipelineOptions;

/// Pipeline overrides. Every flag falls back to the environment configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Directory holding one sub-directory per service (TMS_ROOT_PATH)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Comma-separated ordered service list (TMS_SERVICES)
    #[arg(long, value_delimiter = ',')]
    pub services: Option<Vec<String>>,

    /// Report glob relative to each service directory (TMS_REPORT_GLOB)
    #[arg(long)]
    pub report_glob: Option<String>,

    /// Prometheus text artifact (TMS_METRICS_FILE)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON run summary (TMS_SUMMARY_JSON)
    #[arg(long, conflicts_with = "no_summary")]
    pub summary_json: Option<PathBuf>,

    /// Do not write the JSON run summary
    #[arg(long)]
    pub no_summary: bool,

    /// Metric name prefix (TMS_METRIC_PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Omit sample timestamps
    #[arg(long)]
    pub no_timestamps: bool,

    /// Coverage summary relative to each service directory (TMS_COVERAGE_FILE)
    #[arg(long)]
    pub coverage_file: Option<PathBuf>,
}

impl PipelineArgs {
    /// Apply the flags on top of `options`.
    pub fn apply(self, options: &mut PipelineOptions) {
        if let Some(root) = self.root {
            options.root_path = root;
        }
        if let Some(services) = self.services {
            options.services = services
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(glob) = self.report_glob {
            options.report_glob = glob;
        }
        if let Some(output) = self.output {
            options.output_path = output;
        }
        if let Some(summary) = self.summary_json {
            options.summary_json_path = Some(summary);
        }
        if self.no_summary {
            options.summary_json_path = None;
        }
        if let Some(prefix) = self.prefix {
            options.metric_prefix = prefix;
        }
        if self.no_timestamps {
            options.emit_timestamps = false;
        }
        if let Some(coverage) = self.coverage_file {
            options.coverage_file = Some(coverage);
        }
    }
}
