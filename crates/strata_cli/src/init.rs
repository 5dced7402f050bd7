//! `strata init` — project scaffolding command.
//!
//! Creates a new Strata project directory with a `strata.toml` config
//! file and a template component under `src/`.

use std::fs;
use std::path::PathBuf;

/// Runs the `strata init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes in the current working directory.
/// Returns exit code 0 on success.
pub fn run(name: Option<String>) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{n}' already exists").into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my-project");

    eprintln!("  Creating new Strata project `{project_name}`");

    fs::create_dir_all(project_dir.join("src"))?;

    let config_path = project_dir.join("strata.toml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()).into());
    }
    fs::write(&config_path, config_template(project_name))?;
    fs::write(project_dir.join("src/my-card.tsx"), COMPONENT_TEMPLATE)?;

    eprintln!("     Created {}", config_path.display());
    eprintln!(
        "     Created {}",
        project_dir.join("src").join("my-card.tsx").display()
    );

    Ok(0)
}

fn config_template(project_name: &str) -> String {
    let namespace = namespace_from_name(project_name);
    format!(
        r#"[project]
name = "{project_name}"
namespace = "{namespace}"

[build]
generate_www = true
"#
    )
}

/// Derives a PascalCase namespace from a kebab- or snake-case name.
fn namespace_from_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    if out.is_empty() {
        out.push_str("App");
    }
    out
}

const COMPONENT_TEMPLATE: &str = r#"@Component({
  tag: 'my-card',
  styles: ':host { display: block }'
})
export class MyCard {
  render() {
    return <div>Hello from my-card</div>;
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_from_kebab_case() {
        assert_eq!(namespace_from_name("my-app"), "MyApp");
        assert_eq!(namespace_from_name("widgets"), "Widgets");
        assert_eq!(namespace_from_name("a_b_c"), "ABC");
    }

    #[test]
    fn namespace_from_empty_name() {
        assert_eq!(namespace_from_name(""), "App");
    }
}
