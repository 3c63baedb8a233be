use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

mod trmnl_logic;
use trmnl_logic::{banner, config, downstream, monitor, state};

use lib_trmnl::loggers::setup_logging;
use lib_trmnl::templates::{generate_template, lint_view};
use lib_trmnl::RenderPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = config::Cli::parse();
    let settings = config::resolve(&cli)?;
    setup_logging("server_trmnl", Some(settings.log_dir.as_path()), &settings.log_level)?;
    log::info!("Configuration loaded from {}", settings.config_path.display());

    match cli.command.clone().unwrap_or(config::Command::Serve) {
        config::Command::Serve => serve(settings).await,
        config::Command::RenderOnce => render_once(settings).await,
        config::Command::RenderView { name } => render_view(settings, &name).await,
        config::Command::GenerateTemplate { name } => scaffold(settings, &name),
        config::Command::ValidateTemplates => validate_templates(settings),
    }
}

async fn serve(settings: config::Settings) -> Result<()> {
    let app = settings.app;
    std::fs::create_dir_all(&app.paths.output_dir)
        .with_context(|| format!("Failed to create {}", app.paths.output_dir.display()))?;
    let addr: SocketAddr = format!("{}:{}", app.server.host, app.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", app.server.host, app.server.port))?;

    let pipeline = Arc::new(RenderPipeline::from_config(app.clone())?);
    match pipeline.render_all().await {
        Ok(stats) => log::info!("Initial render done in {:?}", stats.total),
        Err(e) => log::warn!("Initial render failed: {}", e),
    }

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let app_state = state::AppState::new(pipeline);

    let refresh_handle = tokio::spawn(monitor::run_refresh(
        app_state.clone(),
        shutdown_tx.subscribe(),
    ));
    let rotation_handle = tokio::spawn(monitor::run_rotation(
        app_state.clone(),
        shutdown_tx.subscribe(),
    ));
    let downstream_handle = tokio::spawn(downstream::run(
        addr,
        app_state.clone(),
        shutdown_tx.subscribe(),
    ));

    banner::print_banner(&app);

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            log::info!("SIGTERM received, initiating shutdown.");
        }
    }

    let _ = shutdown_tx.send(());

    let (refresh, rotation, downstream) =
        tokio::join!(refresh_handle, rotation_handle, downstream_handle);
    refresh?;
    rotation?;
    if let Err(e) = downstream? {
        log::error!("Downstream server stopped with error: {}", e);
    }

    log::info!("Shutdown complete.");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            log::warn!("Could not install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

async fn render_once(settings: config::Settings) -> Result<()> {
    std::fs::create_dir_all(&settings.app.paths.output_dir)?;
    let pipeline = RenderPipeline::from_config(settings.app)?;
    let stats = pipeline.render_all().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn render_view(settings: config::Settings, name: &str) -> Result<()> {
    std::fs::create_dir_all(&settings.app.paths.output_dir)?;
    let pipeline = RenderPipeline::from_config(settings.app)?;
    let outcome = pipeline.render_named(name).await?;
    println!(
        "Rendered '{}' to {} ({} bytes)",
        outcome.view,
        outcome.output.display(),
        outcome.output_size
    );
    Ok(())
}

fn scaffold(settings: config::Settings, name: &str) -> Result<()> {
    let app = &settings.app;
    let generated = generate_template(
        name,
        &app.paths.templates_dir,
        &app.paths.data_dir,
        app.render.width,
        app.render.height,
    )?;

    println!("Created template {}", generated.template_path.display());
    if generated.data_created {
        println!("Created sample data {}", generated.data_path.display());
    } else {
        println!("Kept existing data {}", generated.data_path.display());
    }
    let entry = serde_json::json!({
        "name": name,
        "templatePath": generated.template_path,
        "dataPath": generated.data_path,
    });
    println!();
    println!("Next steps:");
    println!("  1. Edit the template and data file.");
    println!("  2. Add this entry to \"views\" in {}:", settings.config_path.display());
    println!("{}", serde_json::to_string_pretty(&entry)?);
    println!("  3. Run `server_trmnl validate-templates`, then `server_trmnl render-view {}`.", name);
    Ok(())
}

fn validate_templates(settings: config::Settings) -> Result<()> {
    let app = &settings.app;
    let mut failing = 0;
    for view in &app.views {
        let problems = lint_view(view, app.render.width, app.render.height);
        if problems.is_empty() {
            println!("[ok]   {}", view.name);
        } else {
            failing += 1;
            println!("[fail] {}", view.name);
            for problem in problems {
                println!("         - {}", problem);
            }
        }
    }
    if failing > 0 {
        anyhow::bail!("{} of {} views have template problems", failing, app.views.len());
    }
    Ok(())
}
