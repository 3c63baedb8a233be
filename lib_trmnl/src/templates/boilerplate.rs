//! Scaffolding for new views: a template already wired to the canvas and a
//! sample data file to go with it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::RenderResult;

/// Files produced by [`generate_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTemplate {
    pub template_path: PathBuf,
    pub data_path: PathBuf,
    /// False when a data file with the same name was already there.
    pub data_created: bool,
}

fn template_source(name: &str, width: u32, height: u32) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width={width}, height={height}, initial-scale=1.0">
  <title>{name}</title>
  <style>
{{{{ styles }}}}
    /* Custom styles go here. Leave body size, header height and
       content max-height to the base styles. */
  </style>
</head>
<body>
  <div class="header">
    <div class="header-title">{{{{ title }}}}</div>
    <div class="header-timestamp">{{{{ timestamp }}}}</div>
  </div>
  <div class="content">
    {{% for card in cards %}}
    <div class="card">
      <div class="card-label">{{{{ card.label }}}}</div>
      <div class="card-value-container">
        <div class="card-value">{{{{ card.value }}}}</div>
        {{% if card.unit %}}<span class="card-unit">{{{{ card.unit }}}}</span>{{% endif %}}
      </div>
    </div>
    {{% endfor %}}
    {{#
      Also available:
      fields.SampleField     values from the data file's "fields" object
      tasks                  list of {{text, completed, category}}
    #}}
  </div>
</body>
</html>
"#
    )
}

fn sample_data(name: &str) -> String {
    let sample = serde_json::json!({
        "title": name,
        "timestamp": "2024-01-16 12:00:00",
        "fields": {
            "SampleField": 42,
            "SampleFieldUnit": "%",
            "AnotherField": "Value",
            "AnotherFieldUnit": "unit"
        }
    });
    // Serializing a literal object cannot fail.
    serde_json::to_string_pretty(&sample).unwrap_or_default()
}

/// Writes `<templates_dir>/<name>.html` and `<data_dir>/<name>.json`.
///
/// An existing template is never overwritten (`AlreadyExists`); an existing
/// data file is left alone.
pub fn generate_template(
    name: &str,
    templates_dir: &Path,
    data_dir: &Path,
    width: u32,
    height: u32,
) -> RenderResult<GeneratedTemplate> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid template name '{}'", name),
        )
        .into());
    }

    fs::create_dir_all(templates_dir)?;
    let template_path = templates_dir.join(format!("{}.html", name));
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&template_path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                io::Error::new(
                    e.kind(),
                    format!("template file already exists: {}", template_path.display()),
                )
            } else {
                e
            }
        })?;
    file.write_all(template_source(name, width, height).as_bytes())?;
    log::info!("Template created: {}", template_path.display());

    fs::create_dir_all(data_dir)?;
    let data_path = data_dir.join(format!("{}.json", name));
    let data_created = if data_path.exists() {
        log::info!("Data file already exists: {} (not overwriting)", data_path.display());
        false
    } else {
        fs::write(&data_path, sample_data(name))?;
        log::info!("Sample data created: {}", data_path.display());
        true
    };

    Ok(GeneratedTemplate {
        template_path,
        data_path,
        data_created,
    })
}
