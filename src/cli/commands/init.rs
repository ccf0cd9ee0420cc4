//! Init command implementation
//!
//! Writes a commented configuration template.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "iot-exporter.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::template()) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set IOT_API_KEY and IOT_API_SECRET (or use a .env file)");
                println!("  2. Edit {} with your bucket and filters", self.output);
                println!("  3. Validate configuration: iot-exporter validate-config");
                println!("  4. Run export: iot-exporter export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Commented configuration template
    pub fn template() -> &'static str {
        r#"# IoT Exporter Configuration File
# Exports IoT thing telemetry to CSV files in object storage.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# IoT Cloud API
# ============================================================================
[iot]
# API base URL (IOT_API_URL overrides it)
api_url = "https://api2.arduino.cc"

# OAuth client credentials (use environment variables)
client_id = "${IOT_API_KEY}"
client_secret = "${IOT_API_SECRET}"

# Optional organization (space) id
# organization_id = "00000000-0000-0000-0000-000000000000"

# Only export things carrying all these tags
# tags = "site=turin,floor=2"

# Per-request timeout in seconds
timeout_seconds = 30

# ============================================================================
# Extraction
# ============================================================================
[extraction]
# Seconds, or: raw, 1 minute, 5 minutes, 15 minutes, 1 hour
resolution = "5 minutes"

# Window length in minutes, or: 5 minutes, 15 minutes, 1 hour, 1 day
schedule = "1 hour"

# Statistic for numeric properties (AVG, MIN, MAX, ...)
aggregation_statistic = "AVG"

# End the window on a multiple of its own length
align_with_time_window = false

# Things extracted concurrently
max_concurrency = 10

# Working directory for the CSV file
# output_dir = "/tmp"

# ============================================================================
# Rate-limit retry
# ============================================================================
[retry]
max_attempts = 5
base_delay_ms = 1000
jitter_ms = 500

# ============================================================================
# Destination
# ============================================================================
[destination]
# Files are stored under {bucket}/{YYYY-MM-DD}/{YYYY-MM-DD-HH-MM}.csv
bucket = "/var/lib/iot-exporter/bucket"

# Store .csv.gz instead of .csv
enable_compression = false

# ============================================================================
# Export
# ============================================================================
[export]
# Deadline for a whole run in seconds
timeout_seconds = 900

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON file logging in addition to the console
local_enabled = false
local_path = "./logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
    }
}
