//! Base stylesheet injected into every view as `{{ styles }}`.
//!
//! The sections tagged with [`STYLESHEET_MARKER`] pin the page, header and
//! content area to the canvas so that templates cannot grow past the panel.

/// Comment tag marking the enforced sections. Its presence in rendered HTML
/// is how the validator knows the stylesheet was injected.
pub const STYLESHEET_MARKER: &str = "ENFORCED:";

/// Fixed header height in pixels.
pub const HEADER_HEIGHT: u32 = 50;

/// Builds the stylesheet for a `width` x `height` canvas.
pub fn base_stylesheet(width: u32, height: u32) -> String {
    let content_max = height.saturating_sub(HEADER_HEIGHT + 10);
    format!(
        r#"    * {{
      margin: 0;
      padding: 0;
      box-sizing: border-box;
      max-width: {width}px;
    }}

    /* {marker} Root and body dimensions - DO NOT OVERRIDE */
    html {{
      width: {width}px !important;
      height: {height}px !important;
      max-width: {width}px !important;
      max-height: {height}px !important;
      overflow: hidden !important;
    }}

    body {{
      width: {width}px !important;
      height: {height}px !important;
      max-width: {width}px !important;
      max-height: {height}px !important;
      background: #ffffff;
      color: #000000;
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Arial, sans-serif;
      overflow: hidden !important;
      display: flex;
      flex-direction: column;
      position: relative;
    }}

    /* {marker} Header constraints - fixed height */
    .header {{
      height: {header}px !important;
      min-height: {header}px !important;
      max-height: {header}px !important;
      background: #000000;
      color: #ffffff;
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 0 12px;
      flex-shrink: 0 !important;
    }}

    .header-title {{
      font-size: 20px;
      font-weight: bold;
      overflow: hidden;
      text-overflow: ellipsis;
      white-space: nowrap;
    }}

    .header-timestamp {{
      font-size: 14px;
      font-weight: 500;
      white-space: nowrap;
    }}

    /* {marker} Content area constraints */
    .content {{
      flex: 1;
      display: grid;
      grid-template-columns: repeat(2, 1fr);
      gap: 10px;
      padding: 10px;
      min-height: 0 !important;
      overflow: hidden !important;
      max-height: {content_max}px !important;
    }}

    .content.single {{ grid-template-columns: 1fr; }}
    .content.three .card:first-child {{ grid-column: span 2; }}

    .card {{
      background: #ffffff;
      border: 2px solid #000000;
      padding: 8px 10px;
      display: flex;
      flex-direction: column;
      justify-content: center;
      min-height: 0;
      overflow: hidden;
    }}

    .card-label {{
      font-size: 12px;
      font-weight: bold;
      margin-bottom: 4px;
      text-transform: uppercase;
      letter-spacing: 0.3px;
    }}

    .card-value-container {{
      display: flex;
      align-items: flex-end;
      gap: 3px;
      flex-wrap: nowrap;
    }}

    .card-value {{
      font-size: 32px;
      font-weight: bold;
      line-height: 1;
      overflow: hidden;
      text-overflow: ellipsis;
    }}

    .card-unit {{
      font-size: 16px;
      font-weight: 600;
      padding-bottom: 2px;
    }}

    .card-trend {{ margin-top: 8px; font-size: 18px; }}
    .trend-up::before {{ content: '\25B2  '; }}
    .trend-down::before {{ content: '\25BC  '; }}

    .todo-container {{ width: 100%; padding: 20px; }}
    .todo-list {{ list-style: none; }}

    .todo-item {{
      display: flex;
      align-items: center;
      padding: 12px 0;
      border-bottom: 2px solid #000000;
      font-size: 24px;
      gap: 12px;
    }}

    .todo-item:last-child {{ border-bottom: none; }}
    .todo-checkbox {{ font-size: 28px; font-weight: bold; width: 40px; text-align: center; }}
    .todo-text {{ flex: 1; font-weight: 500; }}
    .todo-item.completed .todo-text {{ text-decoration: line-through; }}

    .todo-category {{
      font-size: 18px;
      padding: 4px 12px;
      background: #000000;
      color: #ffffff;
      font-weight: bold;
    }}"#,
        width = width,
        height = height,
        header = HEADER_HEIGHT,
        content_max = content_max,
        marker = STYLESHEET_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_follows_canvas() {
        let css = base_stylesheet(400, 300);
        assert!(css.contains("width: 400px !important"));
        assert!(css.contains("height: 300px !important"));
        assert!(css.contains("max-height: 240px !important"));
        assert!(css.contains(STYLESHEET_MARKER));
    }
}
