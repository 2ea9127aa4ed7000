use anyhow::{bail, Context, Result};
use picam_service::camera::SnapshotRequest;
use picam_service::testing::SyntheticSensor;
use picam_service::{init_logging, CameraService, ResolutionRequest, ServiceConfig};
use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

const USAGE: &str = "Usage: picam-sim [--config <path>] <command> [args]

Commands:
  serve                                   run until Ctrl-C
  status | capabilities | health          print JSON
  snapshot <out.jpg> [--width W] [--height H] [--no-autofocus]
  set-resolution <width> <height>
  set-framerate <fps>";

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = take_option(&mut args, "--config")?.map(PathBuf::from);
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let mut config = ServiceConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    init_logging(&config.log_level);

    let command = args.remove(0);
    if command != "serve" {
        config.stream_on_startup = false;
    }
    let sensor = SyntheticSensor::new();
    let service = CameraService::new(config, Box::new(sensor.provider()));
    service.startup().context("camera startup failed")?;

    match command.as_str() {
        "serve" => cmd_serve(&service),
        "status" => print_json(&service.status()?),
        "capabilities" => print_json(&service.camera().get_capabilities()?),
        "health" => print_json(&service.health()),
        "snapshot" => cmd_snapshot(&service, args),
        "set-resolution" => cmd_set_resolution(&service, &args),
        "set-framerate" => cmd_set_framerate(&service, &args),
        _ => {
            eprintln!("Unknown command: {}\n\n{USAGE}", command);
            std::process::exit(1);
        }
    }
}

fn take_option(args: &mut Vec<String>, flag: &str) -> Result<Option<String>> {
    let Some(index) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        bail!("{flag} requires a value");
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_serve(service: &CameraService) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to install Ctrl-C handler")?;

    println!(
        "Streaming to {} (Ctrl-C to stop)",
        service.streaming().settings().rtsp_url
    );
    let _ = rx.recv();
    service.shutdown();
    Ok(())
}

fn cmd_snapshot(service: &CameraService, mut args: Vec<String>) -> Result<()> {
    let autofocus = match args.iter().position(|a| a == "--no-autofocus") {
        Some(index) => {
            args.remove(index);
            false
        }
        None => true,
    };
    let mut request = SnapshotRequest::default().with_autofocus(autofocus);
    if let Some(width) = take_option(&mut args, "--width")? {
        request.width = width.parse().context("invalid --width")?;
    }
    if let Some(height) = take_option(&mut args, "--height")? {
        request.height = height.parse().context("invalid --height")?;
    }
    let Some(path) = args.first() else {
        bail!("Usage: picam-sim snapshot <out.jpg> [--width W] [--height H] [--no-autofocus]");
    };

    let jpeg = service.camera().capture_snapshot(request)?;
    std::fs::write(path, &jpeg).with_context(|| format!("failed to write {path}"))?;
    println!("Wrote {} bytes to {}", jpeg.len(), path);
    Ok(())
}

fn cmd_set_resolution(service: &CameraService, args: &[String]) -> Result<()> {
    if args.len() < 2 {
        bail!("Usage: picam-sim set-resolution <width> <height>");
    }
    let width = args[0].parse().context("invalid width")?;
    let height = args[1].parse().context("invalid height")?;
    service.set_resolution(ResolutionRequest::new(width, height))?;
    print_json(&service.status()?)
}

fn cmd_set_framerate(service: &CameraService, args: &[String]) -> Result<()> {
    let Some(fps) = args.first() else {
        bail!("Usage: picam-sim set-framerate <fps>");
    };
    let change = service.set_framerate(fps.parse().context("invalid fps")?, true)?;
    print_json(&change)
}
