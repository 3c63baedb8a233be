//! # Template Validation
//!
//! Two layers of checks keep a view inside the panel's pixel grid:
//!
//! - [`TemplateValidator::validate`] runs on rendered HTML. A viewport
//!   directive for the canvas (or the legacy 800x480) and a `<body>` tag are
//!   required; stylesheet injection, body size overrides and the
//!   header/content containers only produce warnings.
//! - [`lint_view`] inspects a view's files before rendering and returns
//!   advisory warnings only. It backs the `validate-templates` command.

use std::sync::OnceLock;

use regex::Regex;

use super::styles::STYLESHEET_MARKER;
use crate::configs::config_app::ViewDescriptor;
use crate::errors::{RenderError, RenderResult};

/// Canvas size accepted regardless of configuration.
pub const LEGACY_CANVAS: (u32, u32) = (800, 480);

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn viewport_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"width\s*=\s*(\d+)\s*,\s*height\s*=\s*(\d+)")
}

fn meta_tag_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?is)<meta\b[^>]*>")
}

fn viewport_name_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r#"(?i)\bname\s*=\s*["']?viewport\b"#)
}

fn header_class_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r#"class\s*=\s*["'][^"']*\bheader\b"#)
}

fn content_class_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r#"class\s*=\s*["'][^"']*\bcontent\b"#)
}

fn body_block_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?:^|[\s}>;,])body\s*\{")
}

fn styles_slot_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"\{\{-?\s*styles\b")
}

/// Checks rendered HTML against a fixed canvas.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValidator {
    width: u32,
    height: u32,
}

impl TemplateValidator {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the non-fatal warnings, or `TemplateValidation` listing every
    /// hard failure.
    pub fn validate(&self, view: &str, html: &str) -> RenderResult<Vec<String>> {
        let mut problems = Vec::new();

        if !has_viewport_for(html, self.width, self.height) {
            problems.push(format!(
                "template must include viewport meta tag: width={}, height={}",
                self.width, self.height
            ));
        }
        if !html.to_ascii_lowercase().contains("<body") {
            problems.push("template must include <body> tag".to_string());
        }
        if !problems.is_empty() {
            return Err(RenderError::TemplateValidation {
                view: view.to_string(),
                problems,
            });
        }

        let mut warnings = Vec::new();
        if !html.contains(STYLESHEET_MARKER) {
            warnings.push("base styles not injected, canvas constraints may not apply".to_string());
        }
        warnings.extend(self.body_override_warnings(html));
        for container in ["header", "content"] {
            if !has_container(html, container) {
                warnings.push(format!("missing .{} container", container));
            }
        }
        Ok(warnings)
    }

    fn body_override_warnings(&self, source: &str) -> Vec<String> {
        let width = format!("{}px", self.width);
        let height = format!("{}px", self.height);
        let mut warnings = Vec::new();

        for block in body_blocks(source) {
            for (property, value) in declarations(block) {
                match property.as_str() {
                    "width" if !value.contains(&width) => warnings.push(format!(
                        "custom body width '{}' may break layout constraints",
                        value
                    )),
                    "height" if !value.contains(&height) => warnings.push(format!(
                        "custom body height '{}' may break layout constraints",
                        value
                    )),
                    "overflow" if value.contains("visible") => warnings.push(
                        "body overflow:visible detected, content may exceed display bounds".to_string(),
                    ),
                    _ => {}
                }
            }
        }
        warnings
    }
}

/// Whether a `<meta name="viewport">` tag in `html` names the canvas or the
/// legacy size. Text outside such tags never counts.
pub fn has_viewport_for(html: &str, width: u32, height: u32) -> bool {
    let (Some(meta), Some(name), Some(size)) = (meta_tag_re(), viewport_name_re(), viewport_re())
    else {
        return false;
    };
    let mut viewport_tags = meta.find_iter(html).filter(|tag| name.is_match(tag.as_str()));
    viewport_tags.any(|tag| viewport_names_canvas(size, tag.as_str(), width, height))
}

fn viewport_names_canvas(size: &Regex, tag: &str, width: u32, height: u32) -> bool {
    size.captures_iter(tag).any(|caps| {
        let w = caps[1].parse::<u32>().ok();
        let h = caps[2].parse::<u32>().ok();
        matches!((w, h), (Some(w), Some(h)) if (w, h) == (width, height) || (w, h) == LEGACY_CANVAS)
    })
}

fn has_container(html: &str, class: &str) -> bool {
    let re = match class {
        "header" => header_class_re(),
        "content" => content_class_re(),
        _ => None,
    };
    re.is_some_and(|re| re.is_match(html))
}

/// Inner text of every `body { ... }` rule, matched by brace depth.
fn body_blocks(source: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let Some(re) = body_block_re() else {
        return blocks;
    };
    for found in re.find_iter(source) {
        let open = found.end() - 1;
        let mut depth = 0usize;
        for (offset, byte) in source.as_bytes()[open..].iter().enumerate() {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        blocks.push(&source[open + 1..open + offset]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    blocks
}

/// `property: value` pairs of a CSS block, property lowercased.
fn declarations(block: &str) -> Vec<(String, String)> {
    block
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(p, v)| (p.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect()
}

/// Advisory checks on a view's files before rendering.
pub fn lint_view(view: &ViewDescriptor, width: u32, height: u32) -> Vec<String> {
    let mut warnings = Vec::new();

    if !view.template_path.exists() {
        warnings.push(format!("Template file missing: {}", view.template_path.display()));
        return warnings;
    }
    if !view.data_path.exists() {
        warnings.push(format!("Data file missing: {}", view.data_path.display()));
    }

    let content = match std::fs::read_to_string(&view.template_path) {
        Ok(content) => content,
        Err(e) => {
            warnings.push(format!("Could not read template file: {}", e));
            return warnings;
        }
    };

    if !has_viewport_for(&content, width, height) {
        warnings.push("Missing or incorrect viewport meta tag, should match render dimensions".to_string());
    }
    if !styles_slot_re().is_some_and(|re| re.is_match(&content)) {
        warnings.push("Missing {{ styles }}, base styles won't be applied automatically".to_string());
    }
    warnings.extend(TemplateValidator::new(width, height).body_override_warnings(&content));
    if !content.to_ascii_lowercase().contains("<body") {
        warnings.push("Missing <body> tag, required for proper layout".to_string());
    }
    if !content.contains("header") {
        warnings.push(r#"Missing header structure, consider using <div class="header">"#.to_string());
    }
    if !content.contains("content") {
        warnings.push(r#"Missing content container, consider using <div class="content">"#.to_string());
    }
    warnings
}
