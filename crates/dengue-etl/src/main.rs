mod bootstrap;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use dengue_core::settings::{PipelineConfig, Settings};
use dengue_data::store::FsObjectStore;
use dengue_runtime::handler::handle;

fn main() -> Result<ExitCode> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("dengue-etl v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Bucket: {}, prefix: {}, output: {}",
        settings.bucket.display(),
        settings.prefix,
        settings.output_key
    );

    let store = FsObjectStore::new(&settings.bucket);
    let config = PipelineConfig::from(&settings);

    let response = handle(&store, &config);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response.body)?;
    writeln!(stdout)?;

    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("Run failed with status {}", response.status_code);
        Ok(ExitCode::FAILURE)
    }
}
