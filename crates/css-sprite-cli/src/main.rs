use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use css_sprite_core::{
    ArtifactOutcome, FsLoader, RowHeightPolicy, SpriteConfig, build_sprite, parse_stylesheet,
    to_json_layout,
};
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "css-sprite",
    about = "Pack the background images of a stylesheet into one sprite and rewrite their rules",
    version,
    author
)]
struct Cli {
    // Input/Output
    /// Application root; stylesheet urls and output paths are resolved against it
    #[arg(long, default_value = ".", help_heading = "Input/Output")]
    app_root: PathBuf,
    /// Stylesheet to scan, relative to the app root
    #[arg(long, default_value = "public/stylesheets/main.css", help_heading = "Input/Output")]
    stylesheet: PathBuf,
    /// Directory of the generated image, relative to the app root
    #[arg(long, default_value = "public/images", help_heading = "Input/Output")]
    image_dir: PathBuf,
    /// Directory of the generated stylesheet, relative to the app root
    #[arg(long, default_value = "public/stylesheets", help_heading = "Input/Output")]
    css_dir: PathBuf,
    /// Base name of the generated files (name.png/.css)
    #[arg(short, long, default_value = "play-sprite", help_heading = "Input/Output")]
    sprite_name: String,
    /// YAML config file path (overrides the options above)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Output rules
    /// Atlas url written in the generated stylesheet (default: /<image-dir>/<sprite-name>.png)
    #[arg(long, help_heading = "Rules")]
    sprite_url: Option<String>,
    /// Fallback color of the shared background rule
    #[arg(long, default_value = "white", help_heading = "Rules")]
    background_color: String,

    // Layout
    /// Row height policy: last_placed | tallest
    #[arg(long, default_value = "last_placed", help_heading = "Layout")]
    row_height: String,

    // Export
    /// Print the merged configuration (after CLI/YAML) and exit: json|yaml
    #[arg(long, value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config: Option<String>,
    /// Dry run: print the layout as JSON but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);

    let cfg = build_config(&cli)?;
    cfg.validate()?;

    if let Some(format) = &cli.print_config {
        match format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    if cli.dry_run {
        return run_dry(&cfg);
    }

    let report = css_sprite_core::run(&cfg)
        .with_context(|| format!("build sprite from {}", cfg.stylesheet_path().display()))?;
    for (what, outcome) in [("image", &report.image), ("stylesheet", &report.stylesheet)] {
        match outcome {
            ArtifactOutcome::Written(path) => info!(?path, "{what} ready"),
            ArtifactOutcome::Skipped(path) => info!(?path, "{what} skipped"),
            ArtifactOutcome::Failed(e) => error!(error = %e, "{what} failed"),
        }
    }
    if report.atlas_missing() {
        warn!(
            images = report.placements,
            "stylesheet written but the atlas image is missing; try --row-height tallest"
        );
    }
    if let Some(e) = &report.blit_error {
        warn!(error = %e, "atlas image is partial");
    }
    info!(
        images = report.placements,
        width = report.atlas_size.0,
        height = report.atlas_size.1,
        "sprite done"
    );
    Ok(())
}

fn run_dry(cfg: &SpriteConfig) -> anyhow::Result<()> {
    let path = cfg.stylesheet_path();
    let text =
        fs::read_to_string(&path).with_context(|| format!("read stylesheet {}", path.display()))?;
    let sheet = parse_stylesheet(&text).with_context(|| format!("parse {}", path.display()))?;
    let out = build_sprite(&sheet, &FsLoader, cfg);
    let layout = to_json_layout(&out.atlas, &cfg.atlas_url());
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<SpriteConfig> {
    let row_height = parse_row_height(&cli.row_height)?;
    let cfg = SpriteConfig {
        app_root: cli.app_root.clone(),
        stylesheet: cli.stylesheet.clone(),
        image_dir: cli.image_dir.clone(),
        css_dir: cli.css_dir.clone(),
        sprite_name: cli.sprite_name.clone(),
        sprite_url: cli.sprite_url.clone(),
        background_color: cli.background_color.clone(),
        row_height,
    };
    // Load config file if provided; its keys override the flags
    let Some(path) = &cli.config else {
        return Ok(cfg);
    };
    let file = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let y: YamlConfig =
        serde_yaml::from_str(&file).with_context(|| format!("parse config {}", path.display()))?;
    y.into_sprite_config(cfg)
}

fn parse_row_height(s: &str) -> anyhow::Result<RowHeightPolicy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown row height policy: {s} (expected last_placed|tallest)"))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    app_root: Option<PathBuf>,
    stylesheet: Option<PathBuf>,
    image_dir: Option<PathBuf>,
    css_dir: Option<PathBuf>,
    sprite_name: Option<String>,
    sprite_url: Option<String>,
    background_color: Option<String>,
    row_height: Option<String>,
}

impl YamlConfig {
    fn into_sprite_config(self, mut cfg: SpriteConfig) -> anyhow::Result<SpriteConfig> {
        if let Some(v) = self.app_root {
            cfg.app_root = v;
        }
        if let Some(v) = self.stylesheet {
            cfg.stylesheet = v;
        }
        if let Some(v) = self.image_dir {
            cfg.image_dir = v;
        }
        if let Some(v) = self.css_dir {
            cfg.css_dir = v;
        }
        if let Some(v) = self.sprite_name {
            cfg.sprite_name = v;
        }
        if let Some(v) = self.sprite_url {
            cfg.sprite_url = Some(v);
        }
        if let Some(v) = self.background_color {
            cfg.background_color = v;
        }
        if let Some(v) = self.row_height {
            cfg.row_height = parse_row_height(&v)?;
        }
        Ok(cfg)
    }
}
