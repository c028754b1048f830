use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pastekit::gerber::{FiducialCandidate, LayerCandidates};
use pastekit::{
    extract, fit_auto, init_logging, select_origin, sequence_flat, sequence_safe,
    transform_sequence, ComponentHeightMap, Config, Correspondence, DispensingSequenceEntry,
    ExtractOptions, Extraction, FitReport, LayerKind, Point2D, ReferencePoint, SequenceSummary,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("PASTEKIT_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "pastekit", version, long_version = LONG_VERSION)]
#[command(about = "Plan solder paste dispensing from Gerber layers")]
struct Cli {
    /// Emit log events as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a dispensing plan and print G-code or JSON
    Plan(PlanArgs),
    /// Print what one layer file contains
    Inspect {
        layer: PathBuf,
    },
    /// Write the default configuration file
    InitConfig {
        /// Target file, `.toml` or `.json`
        path: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Copper or mask layer with the pad geometry
    #[arg(long)]
    structural: PathBuf,

    /// Paste layer marking the pads that take paste
    #[arg(long)]
    paste: Option<PathBuf>,

    /// Outline layer, defaults to the outline traced on the structural layer
    #[arg(long)]
    outline: Option<PathBuf>,

    /// Additional layers searched for fiducials
    #[arg(long = "fiducial-layer")]
    fiducial_layers: Vec<PathBuf>,

    /// Design-to-machine point pair, `dx,dy=mx,my`
    #[arg(long = "align", value_parser = parse_correspondence)]
    align: Vec<Correspondence>,

    /// Component height above a pad, `PAD_ID=height`
    #[arg(long = "height", value_parser = parse_height)]
    heights: Vec<(String, f64)>,

    /// Route around tall components
    #[arg(long)]
    safe: bool,

    /// Configuration file, defaults to the user config when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the plan as JSON instead of G-code
    #[arg(long)]
    json: bool,

    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Plan {
    origin: Option<ReferencePoint>,
    fiducials: Vec<ReferencePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alignment: Option<FitReport>,
    summary: SequenceSummary,
    sequence: Vec<DispensingSequenceEntry>,
}

#[derive(Serialize)]
struct LayerReport<'a> {
    file: String,
    kind: LayerKind,
    #[serde(flatten)]
    extraction: &'a Extraction,
}

fn parse_point(text: &str) -> Result<Point2D, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{}'", text))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate '{}': {}", v.trim(), e))
    };
    Ok(Point2D::new(coord(x)?, coord(y)?))
}

fn parse_correspondence(text: &str) -> Result<Correspondence, String> {
    let (design, machine) = text
        .split_once('=')
        .ok_or_else(|| format!("expected 'dx,dy=mx,my', got '{}'", text))?;
    Ok(Correspondence::new(parse_point(design)?, parse_point(machine)?))
}

fn parse_height(text: &str) -> Result<(String, f64), String> {
    let (id, height) = text
        .split_once('=')
        .ok_or_else(|| format!("expected 'PAD_ID=height', got '{}'", text))?;
    let height: f64 = height
        .trim()
        .parse()
        .map_err(|e| format!("bad height '{}': {}", height.trim(), e))?;
    if !(height.is_finite() && height >= 0.0) {
        return Err(format!("height must be >= 0, got {}", height));
    }
    Ok((id.trim().to_string(), height))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_layer(path: &Path, options: &ExtractOptions) -> Result<Extraction> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layer {}", path.display()))?;
    let extraction = extract(&text, options);
    if extraction.is_empty() {
        warn!("Layer {} yielded no geometry", path.display());
    }
    Ok(extraction)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)?,
            Err(e) => {
                warn!("{}, using default configuration", e);
                Config::default()
            }
        },
    };
    Ok(config)
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn plan(args: &PlanArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    config.sequencer.safe_path |= args.safe;
    config.validate()?;

    let scoring = config.extraction.scoring();
    let structural_options = ExtractOptions {
        fiducials: scoring,
        ..ExtractOptions::structural()
    };
    let structural = read_layer(&args.structural, &structural_options)?;
    let mut layers = vec![LayerCandidates::new(
        file_name(&args.structural),
        structural.fiducial_candidates.clone(),
    )];

    let pads = match &args.paste {
        Some(path) => {
            let paste = read_layer(
                path,
                &ExtractOptions {
                    fiducials: scoring,
                    ..ExtractOptions::dispensing_target()
                },
            )?;
            layers.push(LayerCandidates::new(
                file_name(path),
                paste.fiducial_candidates.clone(),
            ));
            let combined = config
                .combine
                .combiner()?
                .combine(&structural.pads, &paste.pads);
            info!(
                "Matched {} of {} structural pads to paste",
                combined.matched_count, combined.total_structural
            );
            combined.pads
        }
        None => structural.pads.clone(),
    };
    let pads: Vec<_> = pads.into_iter().filter(|p| p.needs_paste()).collect();

    let mut outline = structural.outline.clone();
    if let Some(path) = &args.outline {
        let layer = read_layer(path, &ExtractOptions::default())?;
        layers.push(LayerCandidates::new(
            file_name(path),
            layer.fiducial_candidates.clone(),
        ));
        if layer.outline.is_some() {
            outline = layer.outline;
        } else {
            warn!("Outline layer {} traced no outline", path.display());
        }
    }
    for path in &args.fiducial_layers {
        let layer = read_layer(
            path,
            &ExtractOptions {
                fiducials: scoring,
                ..ExtractOptions::default()
            },
        )?;
        layers.push(LayerCandidates::new(
            file_name(path),
            layer.fiducial_candidates,
        ));
    }

    let origin = select_origin(outline.as_ref());
    let reference = match &origin {
        Some(o) => o.position(),
        None => {
            warn!("No board outline found, sequencing from (0, 0)");
            Point2D::origin()
        }
    };
    let fiducials = config.fiducials.selector()?.select(&layers);

    let sequence = if config.sequencer.safe_path {
        let heights = ComponentHeightMap::from_pad_heights(
            &pads,
            args.heights.iter().map(|(id, h)| (id.as_str(), *h)),
            config.sequencer.heights.obstacle_radius,
        );
        sequence_safe(&reference, &pads, &heights, &config.sequencer.heights)?
    } else {
        if !args.heights.is_empty() {
            warn!("Component heights are only used with --safe");
        }
        sequence_flat(&reference, &pads)
    };

    let (alignment, reference, sequence) = if args.align.is_empty() {
        (None, reference, sequence)
    } else {
        let report = fit_auto(&args.align).context("Failed to fit board alignment")?;
        let mapped = transform_sequence(&reference, &sequence, &report.transform);
        let start = report.transform.apply(&reference);
        (Some(report), start, mapped)
    };

    let text = if args.json {
        let plan = Plan {
            origin,
            fiducials,
            alignment,
            summary: SequenceSummary::from_entries(&sequence),
            sequence,
        };
        let mut json = serde_json::to_string_pretty(&plan)?;
        json.push('\n');
        json
    } else {
        config.emitter().emit(&reference, &sequence)?
    };
    write_output(args.output.as_deref(), &text)
}

fn inspect(path: &Path) -> Result<()> {
    let kind = LayerKind::from_file_name(&file_name(path));
    let options = if kind.is_paste() {
        ExtractOptions::dispensing_target()
    } else {
        ExtractOptions::structural()
    };
    let extraction = read_layer(path, &options)?;
    let report = LayerReport {
        file: file_name(path),
        kind,
        extraction: &extraction,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    let best: Option<&FiducialCandidate> = extraction
        .fiducial_candidates
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
    if let Some(c) = best {
        info!(
            "Best fiducial candidate at ({:.3}, {:.3}), confidence {:.2}",
            c.x, c.y, c.confidence
        );
    }
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::default().save_to_file(&path)?;
    println!("{}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    match cli.command {
        Command::Plan(args) => plan(&args),
        Command::Inspect { layer } => inspect(&layer),
        Command::InitConfig { path } => init_config(path),
    }
}
