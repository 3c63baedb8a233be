//! Startup connection guide printed to the console.

use colored::Colorize;
use lib_trmnl::AppConfig;

/// Address a device on the LAN should use, or a placeholder when it cannot be determined.
pub fn lan_address() -> String {
    match local_ip_address::local_ip() {
        Ok(ip) => ip.to_string(),
        Err(e) => {
            log::debug!("Could not determine local IP: {}", e);
            "LAN-IP".to_string()
        }
    }
}

pub fn connection_guide(config: &AppConfig, lan_ip: &str) -> String {
    let base = format!("http://{}:{}", lan_ip, config.server.port);
    let views: Vec<&str> = config.views.iter().map(|v| v.name.as_str()).collect();
    let mut lines = vec![
        format!("TRMNL server listening on {}:{}", config.server.host, config.server.port),
        String::new(),
        "Point the device (BYOS) at:".to_string(),
        format!("  Server URL : {}", base),
        format!("  Setup      : {}/api/setup", base),
        format!("  Display    : {}/api/display", base),
        format!("  Image      : {}/screen.bmp", base),
        String::new(),
        format!(
            "Views: {} (rotating every 15 minutes, full render every {} minutes)",
            if views.is_empty() { "-".to_string() } else { views.join(", ") },
            config.render.refresh_interval_minutes
        ),
    ];
    if config.trmnl.api_key.is_empty() {
        lines.push("No apiKey configured: devices must send an empty Access-Token.".to_string());
    }
    lines.join("\n")
}

pub fn print_banner(config: &AppConfig) {
    let guide = connection_guide(config, &lan_address());
    println!("{}", "=".repeat(60).cyan());
    for line in guide.lines() {
        if line.starts_with("  ") {
            println!("{}", line.green());
        } else {
            println!("{}", line.bold());
        }
    }
    println!("{}", "=".repeat(60).cyan());
}
