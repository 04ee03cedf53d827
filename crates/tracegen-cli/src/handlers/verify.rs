//! Verify command handler

use crate::commands::VerifyArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use tracegen::GenerationManifest;

/// Execute the verify command
pub fn execute_verify(config: &CliConfig, args: &VerifyArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(config.use_color, config.is_quiet());

    let path = args.output.join(GenerationManifest::FILE_NAME);
    if !path.exists() {
        return Err(CliError::invalid_argument(format!(
            "no {} in {}",
            GenerationManifest::FILE_NAME,
            args.output.display()
        )));
    }
    let manifest = GenerationManifest::read(&path)?;
    if manifest.manifest_version != GenerationManifest::VERSION {
        return Err(CliError::config(format!(
            "unsupported manifest version {}",
            manifest.manifest_version
        )));
    }

    if let Err(e) = manifest.verify(&args.output) {
        reporter.failure(&e.to_string());
        return Err(e.into());
    }

    reporter.success(&format!(
        "{} files match manifest ({} {}, coverage {:.1}%)",
        manifest.files.len(),
        manifest.tool,
        manifest.version,
        manifest.achieved_pct * 100.0
    ));
    Ok(())
}
