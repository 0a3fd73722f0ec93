use crate::cli::TemplatesArgs;
use crate::error::{CliError, Result};
use pepforge::engine::templates::TemplateSet;
use std::io::Write;
use tracing::info;

pub fn run(args: TemplatesArgs) -> Result<()> {
    let templates = match &args.from {
        Some(path) => {
            info!("Validating template file {:?}", path);
            TemplateSet::load(path)?
        }
        None => TemplateSet::builtin(),
    };
    let text = render(&templates)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)?;
            println!("Templates written to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn render(templates: &TemplateSet) -> Result<String> {
    templates
        .to_toml_string()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to serialize templates: {}", e)))
}
