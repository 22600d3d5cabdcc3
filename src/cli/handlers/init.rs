use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;

/// Infer a project name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs, dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Note a parent project so nested projects are deliberate
    if let Some(parent) = dir.parent()
        && let Ok(parent_root) = config_io::discover_project(parent)
    {
        eprintln!(
            "note: parent project found at {}/",
            parent_root.join(config_io::DATA_DIR).display()
        );
    }

    let name = args
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .map(infer_name)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Untitled".to_string())
        });

    let root = config_io::init_project(dir, &name, args.force)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("Initialized fractal project: {}", name);
    }
    Ok(())
}
