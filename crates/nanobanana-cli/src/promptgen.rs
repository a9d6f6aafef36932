use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use nanobanana_contracts::prompts::PromptTemplate;
use nanobanana_engine::validation::load_prompt;
use nanobanana_engine::{format_verbose_output, generate_prompt, PromptRequest};

use crate::PromptgenArgs;

pub(crate) fn run_promptgen(args: PromptgenArgs) -> Result<()> {
    if args.list_templates {
        print!("{}", render_templates());
        return Ok(());
    }

    let description = load_prompt(
        args.description.as_deref().or(args.description_opt.as_deref()),
        None,
        args.stdin,
    )?;

    let client = args.auth.client()?;
    let result = generate_prompt(
        &client,
        &PromptRequest {
            description,
            template: args.template,
            category: args.category.clone(),
            style: args.style.clone(),
            model: args.model.clone(),
        },
    )?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&result)?
    } else if args.verbose {
        format_verbose_output(&result)
    } else {
        result.prompt.clone()
    };
    emit(&rendered, args.output.as_deref())
}

/// Writes to `output` when given (with a notice on stderr), else to stdout.
/// Always ends with a newline.
fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    let mut text = rendered.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    match output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Prompt saved to: {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn render_templates() -> String {
    let mut out = String::from("Available Prompt Templates:\n\n");
    for template in PromptTemplate::ALL {
        out.push_str(&format!(
            "  {:12} - {}\n",
            template.as_str(),
            template.description()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{emit, render_templates};

    #[test]
    fn emit_writes_file_with_trailing_newline() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("prompt.txt");
        emit("A detailed castle at dusk", Some(&path))?;
        assert_eq!(fs::read_to_string(&path)?, "A detailed castle at dusk\n");

        emit("already terminated\n", Some(&path))?;
        assert_eq!(fs::read_to_string(&path)?, "already terminated\n");
        Ok(())
    }

    #[test]
    fn emit_reports_unwritable_destination() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let missing_dir = temp.path().join("missing").join("prompt.txt");
        assert!(emit("text", Some(&missing_dir)).is_err());
        Ok(())
    }

    #[test]
    fn templates_are_listed_in_declaration_order() {
        let listing = render_templates();
        let photography = listing.find("photography").unwrap_or(usize::MAX);
        let logo = listing.find("logo ").unwrap_or(usize::MAX);
        assert!(listing.starts_with("Available Prompt Templates:\n\n"));
        assert!(photography < logo);
        assert_eq!(listing.lines().count(), 8);
    }
}
