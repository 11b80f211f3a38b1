use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use archviz_contracts::catalog::{
    map_preset, OptionCategory, MAP_PRESETS, MAP_TO_3D_DEFAULT_PROMPT, UTILITIES,
};
use archviz_contracts::events::EventWriter;
use archviz_contracts::models::{AspectRatio, Resolution, VideoAspectRatio};
use archviz_contracts::store::{GeneratedArtifact, HistoryStore, LocalStore};
use archviz_contracts::workflow::{history_key_for_slug, HISTORY_SLUGS};
use archviz_contracts::{EditMode, UtilityKind, WorkflowKind, WorkflowSelection};
use archviz_engine::{
    new_run_id, AnalysisResult, ArtifactOutput, Credential, CredentialResolver, CredentialSource,
    EngineConfig, GeminiClient, GenerationError, HttpTransport, ImageBytes, ImageJob,
    KeySelectionHost, NoKeySelectionHost, Studio, VideoJob, WorkflowOutput,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_STORE: &str = ".archviz/store.json";
const VIDEO_FAILURE: &str =
    "Generation failed. Veo models require a paid billing account and a valid project API key.";

#[derive(Debug, Parser)]
#[command(
    name = "archviz",
    version,
    about = "Architectural visualization studio on the Gemini API"
)]
struct Cli {
    /// Local store file (defaults to $ARCHVIZ_STORE, then .archviz/store.json).
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Event log path (defaults to events.jsonl next to the store).
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Prompt for an API key on the terminal when none is saved.
    #[arg(long, global = true)]
    select_key: bool,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Photorealistic render of a sketch, photo or floorplan.
    Render(RenderArgs),
    /// Print the assembled prompt without calling the API.
    Prompt(PromptArgs),
    /// Enhance an existing render.
    Improve(ImproveArgs),
    /// Upscale an existing render.
    Upscale(UpscaleArgs),
    /// Apply a described change to an image.
    Edit(EditArgs),
    /// Specialised transformations (map to 3D, insert building, ...).
    Utility(UtilityArgs),
    /// Animate a still into a short clip.
    Video(VideoArgs),
    /// Describe an image as a rendering prompt.
    Analyze(AnalyzeArgs),
    #[command(subcommand)]
    History(HistoryCommand),
    #[command(subcommand)]
    Key(KeyCommand),
    /// List option categories or the choices of one category.
    Options(OptionsArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct SelectionArgs {
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    context: Option<String>,
    #[arg(long)]
    lighting: Option<String>,
    #[arg(long)]
    tone: Option<String>,
    #[arg(long)]
    angle: Option<String>,
    #[arg(long)]
    room_type: Option<String>,
    #[arg(long)]
    room_style: Option<String>,
    #[arg(long)]
    interior_preset: Option<String>,
    #[arg(long)]
    floorplan_view: Option<String>,
    #[arg(long)]
    floorplan_angle: Option<String>,
    #[arg(long)]
    time_of_day: Option<String>,
    /// Any category as CATEGORY=CHOICE; CHOICE is a label, its English half, the prompt text
    /// or a 1-based index.
    #[arg(long = "set", value_name = "CATEGORY=CHOICE")]
    set: Vec<String>,
}

impl SelectionArgs {
    fn overrides(&self) -> Result<Vec<(OptionCategory, String)>> {
        let named = [
            (OptionCategory::Style, &self.style),
            (OptionCategory::Context, &self.context),
            (OptionCategory::Lighting, &self.lighting),
            (OptionCategory::Tone, &self.tone),
            (OptionCategory::Angle, &self.angle),
            (OptionCategory::RoomType, &self.room_type),
            (OptionCategory::RoomStyle, &self.room_style),
            (OptionCategory::InteriorPreset, &self.interior_preset),
            (OptionCategory::FloorplanView, &self.floorplan_view),
            (OptionCategory::FloorplanAngle, &self.floorplan_angle),
            (OptionCategory::TimeOfDay, &self.time_of_day),
        ];
        let mut out: Vec<(OptionCategory, String)> = named
            .into_iter()
            .filter_map(|(category, value)| value.clone().map(|value| (category, value)))
            .collect();
        for entry in &self.set {
            out.push(parse_set_arg(entry)?);
        }
        Ok(out)
    }

    fn build(&self) -> Result<WorkflowSelection> {
        let mut selections = WorkflowSelection::new();
        for (category, choice) in self.overrides()? {
            selections.choose(category, &choice)?;
        }
        Ok(selections)
    }
}

#[derive(Debug, Clone, Args)]
struct OutputArgs {
    /// Directory receiving generated files.
    #[arg(long, default_value = "archviz-out")]
    out: PathBuf,
    /// Record results as data URIs instead of writing files.
    #[arg(long)]
    inline: bool,
}

impl OutputArgs {
    fn target(&self) -> ArtifactOutput {
        if self.inline {
            ArtifactOutput::DataUri
        } else {
            ArtifactOutput::Directory(self.out.clone())
        }
    }
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// exterior, interior, floorplan3d, 3d-floorplan or masterplan.
    #[arg(long, default_value = "exterior")]
    mode: String,
    #[arg(long)]
    image: PathBuf,
    /// Subject description merged into the template.
    #[arg(long)]
    prompt: Option<String>,
    #[command(flatten)]
    selections: SelectionArgs,
    #[arg(long, default_value_t = 2)]
    count: usize,
    #[arg(long)]
    aspect: Option<AspectRatio>,
    #[arg(long, default_value = "1K")]
    resolution: Resolution,
    /// Fill the prompt from image analysis when --prompt is absent.
    #[arg(long)]
    analyze: bool,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct PromptArgs {
    /// Render mode, improve, upscale, edit[:MODE], utility:ID or video.
    #[arg(long, default_value = "exterior")]
    mode: String,
    #[arg(long)]
    prompt: Option<String>,
    #[command(flatten)]
    selections: SelectionArgs,
    #[arg(long, default_value_t = 80)]
    intensity: u8,
    #[arg(long, default_value = "1K")]
    resolution: Resolution,
}

#[derive(Debug, Args)]
struct ImproveArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(0..=100))]
    intensity: u8,
    #[arg(long, default_value = "2K")]
    resolution: Resolution,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct UpscaleArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value = "4K")]
    resolution: Resolution,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct EditArgs {
    #[arg(long)]
    image: PathBuf,
    /// general, replace, add, material or notes.
    #[arg(long, default_value = "general")]
    mode: EditMode,
    instruction: String,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct UtilityArgs {
    /// MapTo3D, InsertBuilding, VirtualTour, FurniturePlacement or FillFloorplan.
    kind: UtilityKind,
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    prompt: Option<String>,
    /// Map scene preset (MapTo3D): coastal, urban, mountain or forest.
    #[arg(long)]
    preset: Option<String>,
    #[arg(long)]
    map_time: Option<String>,
    #[arg(long)]
    map_angle: Option<String>,
    #[arg(long)]
    aspect: Option<AspectRatio>,
    #[arg(long, default_value = "1K")]
    resolution: Resolution,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct VideoArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long, default_value = "16:9")]
    aspect: VideoAspectRatio,
    #[arg(long, default_value = "archviz-out")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    /// Workflow whose analysis context steers the description.
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    List {
        /// render, improve, upscale, edit, utilities or video.
        #[arg(default_value = "render")]
        workflow: String,
        #[arg(long)]
        json: bool,
    },
    Clear {
        #[arg(default_value = "render")]
        workflow: String,
    },
    /// Move an entry to the front and print its URL.
    Select { workflow: String, id: String },
}

#[derive(Debug, Subcommand)]
enum KeyCommand {
    Set { key: String },
    Clear,
    Status,
}

#[derive(Debug, Args)]
struct OptionsArgs {
    category: Option<String>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("archviz error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let session = Session::from_cli(&cli);
    match cli.command {
        Command::Render(args) => run_render(&session, args),
        Command::Prompt(args) => run_prompt(args),
        Command::Improve(args) => {
            let kind = WorkflowKind::Improve {
                intensity: args.intensity,
                resolution: args.resolution,
            };
            let job = image_job(kind, &args.image)?;
            run_image(&session, &job, &args.output)
        }
        Command::Upscale(args) => {
            let kind = WorkflowKind::Upscale {
                resolution: args.resolution,
            };
            let job = image_job(kind, &args.image)?;
            run_image(&session, &job, &args.output)
        }
        Command::Edit(args) => {
            let mut job = image_job(WorkflowKind::Edit(args.mode), &args.image)?;
            job.free_text = args.instruction;
            run_image(&session, &job, &args.output)
        }
        Command::Utility(args) => run_utility(&session, args),
        Command::Video(args) => run_video(&session, args),
        Command::Analyze(args) => run_analyze(&session, args),
        Command::History(command) => run_history(&session, command),
        Command::Key(command) => run_key(&session, command),
        Command::Options(args) => run_options(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    } else {
        EnvFilter::new(default_level)
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Paths and flags shared by every subcommand.
#[derive(Debug, Clone)]
struct Session {
    store_path: PathBuf,
    events_path: PathBuf,
    select_key: bool,
}

impl Session {
    fn from_cli(cli: &Cli) -> Self {
        let store_path = cli
            .store
            .clone()
            .or_else(|| {
                env::var("ARCHVIZ_STORE")
                    .ok()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));
        let events_path = cli.events.clone().unwrap_or_else(|| {
            store_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("events.jsonl")
        });
        Self {
            store_path,
            events_path,
            select_key: cli.select_key,
        }
    }

    fn credentials(&self) -> CredentialResolver {
        let host: Box<dyn KeySelectionHost> = if self.select_key {
            Box::new(TerminalKeySelectionHost::default())
        } else {
            Box::new(NoKeySelectionHost)
        };
        CredentialResolver::from_env(LocalStore::new(&self.store_path), host)
    }

    fn studio(&self) -> Studio {
        let config = EngineConfig::from_env();
        let transport = std::sync::Arc::new(HttpTransport::new(config.request_timeout));
        let events = EventWriter::new(&self.events_path, new_run_id());
        tracing::debug!(
            store = %self.store_path.display(),
            events = %self.events_path.display(),
            run_id = events.run_id(),
            "session opened"
        );
        Studio::new(
            GeminiClient::new(&config, transport),
            self.credentials(),
            &self.store_path,
            events,
            config.batch_stagger,
        )
    }

    fn history(&self, slug: &str) -> Result<HistoryStore> {
        let slug = normalize_history_slug(slug)?;
        Ok(HistoryStore::open(
            LocalStore::new(&self.store_path),
            history_key_for_slug(slug),
        ))
    }
}

/// Reads a key from the terminal when no key is saved.
#[derive(Debug, Default)]
struct TerminalKeySelectionHost {
    selected: Mutex<Option<Credential>>,
}

impl KeySelectionHost for TerminalKeySelectionHost {
    fn is_available(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn has_selected_key(&self) -> Result<bool> {
        let selected = self
            .selected
            .lock()
            .map_err(|_| anyhow!("key selection lock poisoned"))?;
        Ok(selected.is_some())
    }

    fn open_key_selection(&self) -> Result<()> {
        eprint!("Gemini API key: ");
        io::stderr().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let credential = Credential::new(&line);
        let mut selected = self
            .selected
            .lock()
            .map_err(|_| anyhow!("key selection lock poisoned"))?;
        *selected = credential;
        Ok(())
    }

    fn selected_key(&self) -> Option<Credential> {
        self.selected.lock().ok().and_then(|selected| selected.clone())
    }
}

fn run_render(session: &Session, args: RenderArgs) -> Result<i32> {
    let kind = WorkflowKind::parse_render_mode(&args.mode).map_err(anyhow::Error::msg)?;
    let mut job = image_job(kind, &args.image)?;
    job.selections = args.selections.build()?;
    job.aspect_ratio = args.aspect;
    job.resolution = args.resolution;
    job.quantity = args.count;

    let mut studio = session.studio();
    let free_text = match args.prompt {
        Some(prompt) => prompt,
        None if args.analyze => {
            let image = job
                .base_image
                .as_ref()
                .context("render requires a source image")?;
            analysis_free_text(studio.analyze(Some(kind), image))
        }
        None => String::new(),
    };
    job.free_text = free_text;

    let output = studio
        .run_image_workflow(&job, &args.output.target())
        .map_err(report)?;
    print_output(&output);
    Ok(0)
}

fn run_prompt(args: PromptArgs) -> Result<i32> {
    let kind = parse_workflow(&args.mode, args.intensity, args.resolution)?;
    let selections = args.selections.build()?;
    let free_text = args.prompt.unwrap_or_default();
    println!(
        "{}",
        archviz_contracts::assemble(kind, &selections, &free_text)
    );
    Ok(0)
}

fn run_image(session: &Session, job: &ImageJob, output: &OutputArgs) -> Result<i32> {
    let result = session
        .studio()
        .run_image_workflow(job, &output.target())
        .map_err(report)?;
    print_output(&result);
    Ok(0)
}

fn run_utility(session: &Session, args: UtilityArgs) -> Result<i32> {
    let kind = WorkflowKind::Utility(args.kind);
    let mut job = image_job(kind, &args.image)?;
    job.aspect_ratio = args.aspect;
    job.resolution = args.resolution;

    let mut selections = WorkflowSelection::new();
    if let Some(choice) = args.map_time.as_deref() {
        selections.choose(OptionCategory::MapTime, choice)?;
    }
    if let Some(choice) = args.map_angle.as_deref() {
        selections.choose(OptionCategory::MapAngle, choice)?;
    }
    job.selections = selections;

    let preset_prompt = match args.preset.as_deref() {
        Some(id) => {
            if args.kind != UtilityKind::MapTo3D {
                bail!("--preset only applies to MapTo3D");
            }
            let preset = map_preset(id).with_context(|| {
                let known: Vec<&str> = MAP_PRESETS.iter().map(|preset| preset.id).collect();
                format!("unknown map preset '{id}' (expected {})", known.join(", "))
            })?;
            Some(preset.prompt.to_string())
        }
        None => None,
    };
    job.free_text = args
        .prompt
        .or(preset_prompt)
        .unwrap_or_else(|| match args.kind {
            UtilityKind::MapTo3D => MAP_TO_3D_DEFAULT_PROMPT.to_string(),
            _ => String::new(),
        });

    run_image(session, &job, &args.output)
}

fn run_video(session: &Session, args: VideoArgs) -> Result<i32> {
    let job = VideoJob {
        free_text: args.prompt.unwrap_or_default(),
        base_image: read_image(&args.image)?,
        aspect_ratio: args.aspect,
    };
    println!("Generating video; this usually takes a few minutes.");
    let output = session
        .studio()
        .run_video(&job, &args.out)
        .map_err(report_video)?;
    println!("{}", output.artifact.url);
    println!("prompt: {}", output.prompt);
    Ok(0)
}

fn run_analyze(session: &Session, args: AnalyzeArgs) -> Result<i32> {
    let kind = args
        .mode
        .as_deref()
        .map(|mode| parse_workflow(mode, 80, Resolution::default()))
        .transpose()?;
    let image = read_image(&args.image)?;
    let analysis = session.studio().analyze(kind, &image).map_err(report)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("prompt: {}", analysis.prompt);
        println!("style: {}", analysis.style);
        println!("lighting: {}", analysis.lighting);
        println!("environment: {}", analysis.environment);
    }
    Ok(0)
}

fn run_history(session: &Session, command: HistoryCommand) -> Result<i32> {
    match command {
        HistoryCommand::List { workflow, json } => {
            let history = session.history(&workflow)?;
            if json {
                println!("{}", serde_json::to_string_pretty(history.list())?);
                return Ok(0);
            }
            if history.is_empty() {
                println!("No history for {workflow}.");
            }
            for artifact in history.list() {
                println!("{}", format_history_line(artifact));
            }
            Ok(0)
        }
        HistoryCommand::Clear { workflow } => {
            let mut history = session.history(&workflow)?;
            let count = history.len();
            history.clear()?;
            println!("Cleared {count} entries from {}.", history.key());
            Ok(0)
        }
        HistoryCommand::Select { workflow, id } => {
            let mut history = session.history(&workflow)?;
            match history.select(&id)? {
                Some(artifact) => {
                    println!("{}", artifact.url);
                    Ok(0)
                }
                None => {
                    eprintln!("No entry '{id}' in {}.", history.key());
                    Ok(1)
                }
            }
        }
    }
}

fn run_key(session: &Session, command: KeyCommand) -> Result<i32> {
    let mut resolver = session.credentials();
    match command {
        KeyCommand::Set { key } => {
            let credential = resolver.set_manual(&key).map_err(report)?;
            println!("API key saved ({}).", credential.redacted());
        }
        KeyCommand::Clear => {
            if resolver.clear_manual().map_err(report)? {
                println!("Saved API key removed.");
            } else {
                println!("No saved API key.");
            }
        }
        KeyCommand::Status => {
            println!("{}", describe_source(resolver.status()));
        }
    }
    Ok(0)
}

fn run_options(args: OptionsArgs) -> Result<i32> {
    let Some(raw) = args.category else {
        for category in OptionCategory::ALL {
            println!("{:<16} {} choices", category.name(), category.options().len());
        }
        println!("{:<16} {} choices", "utility", UTILITIES.len());
        println!("{:<16} {} choices", "map_preset", MAP_PRESETS.len());
        return Ok(0);
    };
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "utility" | "utilities" => {
            for (index, utility) in UTILITIES.iter().enumerate() {
                println!(
                    "{:>2}. {} ({} / {}): {}",
                    index + 1,
                    utility.id,
                    utility.title,
                    utility.burmese,
                    utility.description
                );
            }
        }
        "map_preset" | "map_presets" => {
            for preset in MAP_PRESETS {
                println!("{:<10} {}", preset.id, preset.label);
            }
        }
        _ => {
            let category = OptionCategory::parse(&raw)
                .with_context(|| format!("unknown option category '{raw}'"))?;
            for (index, option) in category.options().iter().enumerate() {
                println!("{:>2}. {}", index + 1, option.label);
            }
        }
    }
    Ok(0)
}

/// Reads `--image`: a path, a `file://` URL or a `data:` URI as printed by `history select`.
fn read_image(source: &Path) -> Result<ImageBytes> {
    match source.to_str() {
        Some(raw) if raw.starts_with("data:") => ImageBytes::from_data_uri(raw),
        Some(raw) => match raw.strip_prefix("file://") {
            Some(local) => ImageBytes::from_path(Path::new(local)),
            None => ImageBytes::from_path(source),
        },
        None => ImageBytes::from_path(source),
    }
}

/// Analysis only seeds the prompt; a failure leaves it empty and the render goes ahead.
fn analysis_free_text(result: Result<AnalysisResult, GenerationError>) -> String {
    match result {
        Ok(analysis) => {
            println!("analysis style: {}", analysis.style);
            analysis.prompt
        }
        Err(err) => {
            tracing::warn!(kind = err.kind(), error = %err, "analysis unavailable");
            eprintln!("{} Continuing without a prompt.", err.user_message());
            String::new()
        }
    }
}

fn image_job(kind: WorkflowKind, image: &Path) -> Result<ImageJob> {
    let mut job = ImageJob::new(kind);
    job.base_image = Some(read_image(image)?);
    Ok(job)
}

/// Collapses a workflow failure to its user-facing message; detail goes to the debug log.
fn report(err: GenerationError) -> anyhow::Error {
    tracing::debug!(kind = err.kind(), error = %err, "workflow failure detail");
    anyhow!(err.user_message())
}

/// Remote video failures other than key rejections usually mean the project lacks billing.
fn report_video(err: GenerationError) -> anyhow::Error {
    match err {
        GenerationError::Remote { status, .. } if !matches!(status, 401 | 403 | 404) => {
            tracing::debug!(error = %err, "video failure detail");
            anyhow!(VIDEO_FAILURE)
        }
        other => report(other),
    }
}

fn parse_set_arg(entry: &str) -> Result<(OptionCategory, String)> {
    let (category, choice) = entry
        .split_once('=')
        .with_context(|| format!("expected CATEGORY=CHOICE, got '{entry}'"))?;
    let category = OptionCategory::parse(category).with_context(|| {
        format!("unknown option category '{category}' (see `archviz options`)")
    })?;
    Ok((category, choice.trim().to_string()))
}

fn parse_workflow(raw: &str, intensity: u8, resolution: Resolution) -> Result<WorkflowKind> {
    let (head, tail) = match raw.split_once(':') {
        Some((head, tail)) => (head, Some(tail)),
        None => (raw, None),
    };
    let kind = match head.trim().to_ascii_lowercase().as_str() {
        "improve" => WorkflowKind::Improve {
            intensity: intensity.min(100),
            resolution,
        },
        "upscale" => WorkflowKind::Upscale { resolution },
        "edit" => WorkflowKind::Edit(
            tail.map(str::parse::<EditMode>)
                .transpose()
                .map_err(anyhow::Error::msg)?
                .unwrap_or(EditMode::General),
        ),
        "utility" => {
            let id = tail.context("utility mode needs an id, e.g. utility:MapTo3D")?;
            WorkflowKind::Utility(id.parse::<UtilityKind>().map_err(anyhow::Error::msg)?)
        }
        "video" => WorkflowKind::Video,
        _ => WorkflowKind::parse_render_mode(raw).map_err(anyhow::Error::msg)?,
    };
    Ok(kind)
}

fn normalize_history_slug(raw: &str) -> Result<&'static str> {
    let normalized = raw.trim().to_ascii_lowercase();
    let normalized = match normalized.as_str() {
        "utility" => "utilities",
        other => other,
    };
    HISTORY_SLUGS
        .iter()
        .copied()
        .find(|slug| *slug == normalized)
        .with_context(|| {
            format!(
                "unknown history '{raw}' (expected one of {})",
                HISTORY_SLUGS.join(", ")
            )
        })
}

fn describe_source(source: Option<CredentialSource>) -> &'static str {
    match source {
        Some(CredentialSource::Manual) => "Using the saved API key.",
        Some(CredentialSource::Host) => "Using the key chosen at the prompt.",
        Some(CredentialSource::Ambient) => "Using the API key from the environment.",
        None => "No API key configured.",
    }
}

fn format_history_line(artifact: &GeneratedArtifact) -> String {
    let when = artifact
        .created_at_utc()
        .map(|stamp| stamp.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| artifact.created_at.to_string());
    format!(
        "{}  {}  {}  {}",
        artifact.id,
        when,
        shorten(&artifact.url, 64),
        shorten(&artifact.prompt_used, 60)
    )
}

fn shorten(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn print_output(output: &WorkflowOutput) {
    for artifact in &output.artifacts {
        println!("{}", shorten(&artifact.url, 120));
    }
    println!("prompt: {}", output.prompt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_flags_parse() -> Result<()> {
        let cli = Cli::try_parse_from([
            "archviz",
            "--store",
            "/tmp/s.json",
            "render",
            "--mode",
            "interior",
            "--image",
            "room.jpg",
            "--room-type",
            "Kitchen",
            "--set",
            "lighting=2",
            "--count",
            "3",
            "--aspect",
            "16:9",
            "--resolution",
            "4k",
        ])?;
        let Command::Render(args) = cli.command else {
            bail!("expected render");
        };
        assert_eq!(args.count, 3);
        assert_eq!(args.aspect, Some(AspectRatio::Wide16x9));
        assert_eq!(args.resolution, Resolution::FourK);
        let overrides = args.selections.overrides()?;
        assert_eq!(
            overrides,
            vec![
                (OptionCategory::RoomType, "Kitchen".to_string()),
                (OptionCategory::Lighting, "2".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn bad_set_argument_is_rejected() {
        assert!(parse_set_arg("lighting").is_err());
        assert!(parse_set_arg("weather=sunny").is_err());
        assert!(matches!(
            parse_set_arg("room-type= Kitchen "),
            Ok((OptionCategory::RoomType, choice)) if choice == "Kitchen"
        ));
    }

    #[test]
    fn workflow_specs_parse() -> Result<()> {
        assert_eq!(
            parse_workflow("3d-floorplan", 50, Resolution::OneK)?,
            WorkflowKind::Floorplan3DAxonometric
        );
        assert_eq!(
            parse_workflow("edit:material", 50, Resolution::OneK)?,
            WorkflowKind::Edit(EditMode::Material)
        );
        assert_eq!(
            parse_workflow("utility:map-to-3d", 50, Resolution::OneK)?,
            WorkflowKind::Utility(UtilityKind::MapTo3D)
        );
        assert_eq!(
            parse_workflow("improve", 250, Resolution::TwoK)?,
            WorkflowKind::Improve {
                intensity: 100,
                resolution: Resolution::TwoK
            }
        );
        assert!(parse_workflow("utility", 50, Resolution::OneK).is_err());
        assert!(parse_workflow("sculpture", 50, Resolution::OneK).is_err());
        Ok(())
    }

    #[test]
    fn history_slugs_accept_aliases() -> Result<()> {
        assert_eq!(normalize_history_slug("Render")?, "render");
        assert_eq!(normalize_history_slug("utility")?, "utilities");
        assert!(normalize_history_slug("gallery").is_err());
        Ok(())
    }

    #[test]
    fn key_commands_round_trip_through_store() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let session = Session {
            store_path: temp.path().join("store.json"),
            events_path: temp.path().join("events.jsonl"),
            select_key: false,
        };
        run_key(
            &session,
            KeyCommand::Set {
                key: "AIzaSyLocalKey0001".to_string(),
            },
        )?;
        assert_eq!(
            session.credentials().status(),
            Some(CredentialSource::Manual)
        );
        run_key(&session, KeyCommand::Clear)?;
        assert_ne!(
            session.credentials().status(),
            Some(CredentialSource::Manual)
        );
        Ok(())
    }

    #[test]
    fn history_select_reports_missing_entry() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let session = Session {
            store_path: temp.path().join("store.json"),
            events_path: temp.path().join("events.jsonl"),
            select_key: false,
        };
        let mut history = session.history("render")?;
        history.append(GeneratedArtifact::new("1", "file:///a.png", "p", 1))?;
        let code = run_history(
            &session,
            HistoryCommand::Select {
                workflow: "render".to_string(),
                id: "2".to_string(),
            },
        )?;
        assert_eq!(code, 1);
        let code = run_history(
            &session,
            HistoryCommand::Select {
                workflow: "render".to_string(),
                id: "1".to_string(),
            },
        )?;
        assert_eq!(code, 0);
        Ok(())
    }

    #[test]
    fn store_and_events_default_next_to_each_other() -> Result<()> {
        let cli = Cli::try_parse_from(["archviz", "--store", "/data/a/store.json", "key", "status"])?;
        let session = Session::from_cli(&cli);
        assert_eq!(session.events_path, PathBuf::from("/data/a/events.jsonl"));
        Ok(())
    }

    #[test]
    fn render_and_improve_defaults() -> Result<()> {
        let cli = Cli::try_parse_from(["archviz", "render", "--image", "site.jpg"])?;
        let Command::Render(render) = cli.command else {
            bail!("expected render");
        };
        assert_eq!(render.count, 2);

        let cli = Cli::try_parse_from(["archviz", "improve", "--image", "site.jpg"])?;
        let Command::Improve(improve) = cli.command else {
            bail!("expected improve");
        };
        assert_eq!(improve.intensity, 80);
        Ok(())
    }

    #[test]
    fn video_key_rejections_keep_the_key_message() {
        let not_found = GenerationError::Remote {
            status: 404,
            message: "Requested entity was not found.".to_string(),
        };
        assert_eq!(
            report_video(not_found.clone()).to_string(),
            not_found.user_message()
        );

        let quota = GenerationError::Remote {
            status: 400,
            message: "billing not enabled".to_string(),
        };
        assert_eq!(report_video(quota).to_string(), VIDEO_FAILURE);

        let missing = report_video(GenerationError::NoVideoProduced).to_string();
        assert_eq!(missing, GenerationError::NoVideoProduced.user_message());
    }

    #[test]
    fn failed_analysis_leaves_prompt_empty() {
        let failed = analysis_free_text(Err(GenerationError::AnalysisError(
            "schema mismatch".to_string(),
        )));
        assert_eq!(failed, "");

        let analysis = AnalysisResult {
            prompt: "glass pavilion by a lake".to_string(),
            style: "Modernist".to_string(),
            lighting: "Dusk".to_string(),
            environment: "Lakeside".to_string(),
        };
        assert_eq!(analysis_free_text(Ok(analysis)), "glass pavilion by a lake");
    }

    #[test]
    fn image_source_accepts_history_urls() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("render.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0])?;

        let from_path = read_image(&path)?;
        let file_url = PathBuf::from(format!("file://{}", path.display()));
        assert_eq!(read_image(&file_url)?, from_path);

        let data_uri = PathBuf::from(from_path.data_uri());
        assert_eq!(read_image(&data_uri)?, from_path);
        assert!(read_image(Path::new("data:image/png,raw")).is_err());
        Ok(())
    }

    #[test]
    fn long_text_is_shortened() {
        assert_eq!(shorten("abcdef", 4), "abcd…");
        assert_eq!(shorten("abc", 4), "abc");
    }
}
