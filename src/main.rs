use clap::{Args, Parser, Subcommand};
use log::warn;
use panotour::config::{self, ToolConfig};
use panotour::imaging::{ImageQuality, RustBackend};
use panotour::package::{self, StaticAssets};
use panotour::project::{
    Hotspot, HotspotKind, HotspotType, LinkTarget, Position, Project, VideoType, ViewParameters,
};
use panotour::publish::Publisher;
use panotour::session::Session;
use panotour::storage::{self, FileStore, StorageError};
use panotour::{generate, media, output};
use std::error::Error;
use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "panotour")]
#[command(about = "Build and export 360° panoramic virtual tours")]
#[command(long_about = "\
Build and export 360° panoramic virtual tours

A tour is a JSON project file holding panoramic scenes and the hotspots
placed in them. Every command reads the project file, applies one change,
snapshots the result and writes the file back.

Hotspot types:
  info    tooltip with HTML content           --content
  link    opens a web page                    --url [--same-tab]
  scene   jumps to another scene              --target SCENE_ID
  photo   shows an image in a popup           --url [--description]
  video   YouTube, Vimeo, Podeduc or MP4      --url --video-type [--iframe]
  audio   plays a sound                       --url | --audio-file [--autoplay --loop]

Exported sites need js/marzipano.min.js and css/icons.css from the assets
directory (see [assets] in the config).

Run 'panotour gen-config' to generate a documented panotour.toml.")]
#[command(version)]
struct Cli {
    /// Project file
    #[arg(long, default_value = "tour.json", global = true)]
    project: PathBuf,

    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty project file
    New {
        /// Overwrite an existing project file
        #[arg(long)]
        force: bool,
    },
    /// Import a panorama from disk as a new scene
    AddScene { image: PathBuf },
    /// Add a scene whose panorama stays at a remote URL
    AddUrlScene {
        url: String,
        #[arg(long)]
        name: Option<String>,
    },
    RenameScene { id: String, name: String },
    /// Set the camera pose a scene opens with (radians)
    SetView {
        id: String,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        yaw: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pitch: f64,
        #[arg(long, default_value_t = FRAC_PI_2)]
        fov: f64,
    },
    /// Select a scene by its position in `list` (starting at 1)
    SelectScene { position: usize },
    DeleteScene { id: String },
    AddHotspot(HotspotArgs),
    DeleteHotspot { scene_id: String, hotspot_id: String },
    /// Print the project tree
    List,
    /// Export the tour as a static site
    Export(ExportArgs),
    /// Export the tour and upload it to the publish service
    Publish {
        #[arg(long)]
        name: String,
        #[arg(long)]
        token: String,
        /// Overrides [publish].endpoint from the config
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Overwrite the project file with the last auto-saved snapshot
    Restore,
    /// Print a stock panotour.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct HotspotArgs {
    scene_id: String,
    /// info, link, scene, photo, video or audio
    #[arg(long)]
    kind: HotspotType,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    yaw: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f64,
    #[arg(long)]
    title: Option<String>,
    /// HTML shown by an info hotspot
    #[arg(long)]
    content: Option<String>,
    /// Link, photo, video or audio URL
    #[arg(long)]
    url: Option<String>,
    /// Open a link in the viewer's tab instead of a new one
    #[arg(long)]
    same_tab: bool,
    /// Scene id a scene hotspot jumps to
    #[arg(long)]
    target: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// youtube, vimeo, podeduc or direct
    #[arg(long)]
    video_type: Option<VideoType>,
    /// Podeduc embed markup, used verbatim
    #[arg(long)]
    iframe: Option<String>,
    /// Audio file to embed (mp3, wav, ogg, aac, m4a)
    #[arg(long)]
    audio_file: Option<PathBuf>,
    #[arg(long)]
    autoplay: bool,
    #[arg(long = "loop")]
    looped: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Write a zip archive
    #[arg(long, conflicts_with = "dir", required_unless_present = "dir")]
    out: Option<PathBuf>,
    /// Write the site unpacked into a directory
    #[arg(long)]
    dir: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
    /// native, optimized or reduced
    #[arg(long)]
    quality: Option<ImageQuality>,
    /// Hide the title heading
    #[arg(long)]
    no_title: bool,
    /// Hide the scene menu
    #[arg(long)]
    no_scene_bar: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    init_thread_pool(&config.processing);

    match &cli.command {
        Command::New { force } => {
            if cli.project.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    cli.project.display()
                )
                .into());
            }
            write_project(&cli.project, &Project::new())?;
            println!("Created {}", cli.project.display());
        }
        Command::AddScene { image } => {
            let source = media::import_image(image, &RustBackend::new())?;
            let id = edit(&cli.project, &config, |s| Ok(s.create_scene(source)))?;
            println!("Added scene {id}");
        }
        Command::AddUrlScene { url, name } => {
            let source = media::url_scene(url, name.as_deref())?;
            let id = edit(&cli.project, &config, |s| Ok(s.create_scene(source)))?;
            println!("Added scene {id}");
        }
        Command::RenameScene { id, name } => {
            edit(&cli.project, &config, |s| Ok(s.rename_scene(id, name)?))?;
        }
        Command::SetView {
            id,
            yaw,
            pitch,
            fov,
        } => {
            let view = ViewParameters {
                yaw: *yaw,
                pitch: *pitch,
                fov: *fov,
            };
            edit(&cli.project, &config, |s| Ok(s.set_initial_view(id, view)?))?;
        }
        Command::SelectScene { position } => {
            let index = position
                .checked_sub(1)
                .ok_or("scene positions start at 1")?;
            edit(&cli.project, &config, |s| Ok(s.select_scene(index)?))?;
        }
        Command::DeleteScene { id } => {
            let removed = edit(&cli.project, &config, |s| Ok(s.delete_scene(id)?))?;
            println!("Deleted scene {} ({})", removed.name, removed.id);
        }
        Command::AddHotspot(args) => {
            let audio = args.audio_file.as_deref().map(media::load_audio).transpose()?;
            let id = edit(&cli.project, &config, |s| {
                let hotspot = build_hotspot(s.project(), args, audio)?;
                let id = hotspot.id.clone();
                s.add_hotspot(&args.scene_id, hotspot)?;
                Ok(id)
            })?;
            println!("Added hotspot {id}");
        }
        Command::DeleteHotspot {
            scene_id,
            hotspot_id,
        } => {
            edit(&cli.project, &config, |s| {
                Ok(s.delete_hotspot(scene_id, hotspot_id)?)
            })?;
        }
        Command::List => {
            output::print_project_tree(&read_project(&cli.project)?);
        }
        Command::Export(args) => export(&read_project(&cli.project)?, &config, args)?,
        Command::Publish {
            name,
            token,
            endpoint,
        } => {
            let project = read_project(&cli.project)?;
            let endpoint = endpoint
                .clone()
                .unwrap_or_else(|| config.publish.endpoint.clone());
            let assets = StaticAssets::from_dir(&config.assets.dir)?;
            let outcome =
                Publisher::new(endpoint)?.publish(&project, name, token, &RustBackend::new(), &assets)?;
            output::print_publish_outcome(&outcome);
        }
        Command::Restore => {
            let store = FileStore::new(&config.storage.snapshot);
            let project = storage::load(&store)?
                .ok_or_else(|| format!("No snapshot at {}", store.path().display()))?;
            write_project(&cli.project, &project)?;
            println!(
                "Restored {} scene(s) into {}",
                project.scenes.len(),
                cli.project.display()
            );
        }
        // printed before the config is loaded
        Command::GenConfig => {}
    }

    Ok(())
}

fn read_project(path: &Path) -> CliResult<Project> {
    let bytes = fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(storage::import_from_file(&bytes)?)
}

fn write_project(path: &Path, project: &Project) -> CliResult<()> {
    fs::write(path, storage::export_to_file(project)?)?;
    Ok(())
}

/// Run one named operation against the project file.
///
/// The result is snapshotted before the file is rewritten. A snapshot that
/// is too large is reported and skipped; the project file has no size limit.
fn edit<T>(
    path: &Path,
    config: &ToolConfig,
    op: impl FnOnce(&mut Session<FileStore>) -> CliResult<T>,
) -> CliResult<T> {
    let store = FileStore::new(&config.storage.snapshot);
    let mut session =
        Session::new(read_project(path)?, store).with_delay(config.storage.autosave_delay());
    let result = op(&mut session)?;
    match session.flush() {
        Ok(_) => {}
        Err(StorageError::Capacity { size, limit }) => output::print_snapshot_skipped(size, limit),
        Err(e) => return Err(e.into()),
    }
    write_project(path, session.project())?;
    Ok(result)
}

/// Build a hotspot of `args.kind`, starting from the editor defaults and
/// filling in whatever the flags provide.
fn build_hotspot(
    project: &Project,
    args: &HotspotArgs,
    audio_data_url: Option<String>,
) -> CliResult<Hotspot> {
    let position = Position {
        yaw: args.yaw,
        pitch: args.pitch,
    };
    let mut hotspot = project.new_hotspot(&args.scene_id, args.kind, position);
    if let Some(title) = &args.title {
        hotspot.title = title.clone();
    }

    match &mut hotspot.kind {
        HotspotKind::Info { content } => {
            if let Some(c) = &args.content {
                *content = c.clone();
            }
        }
        HotspotKind::Link { url, target } => {
            if let Some(u) = &args.url {
                *url = u.clone();
            }
            if args.same_tab {
                *target = LinkTarget::SelfFrame;
            }
        }
        HotspotKind::Scene { target } => {
            if let Some(t) = &args.target {
                if project.find_scene(t).is_none() {
                    warn!("Scene '{t}' does not exist; the hotspot will do nothing");
                }
                *target = Some(t.clone());
            }
        }
        HotspotKind::Photo {
            photo_url,
            photo_description,
        } => {
            if let Some(u) = &args.url {
                *photo_url = u.clone();
            }
            if let Some(d) = &args.description {
                *photo_description = d.clone();
            }
        }
        HotspotKind::Video {
            video_url,
            video_type,
            video_description,
            podeduc_iframe,
        } => {
            if let Some(u) = &args.url {
                *video_url = u.clone();
            }
            if let Some(t) = args.video_type {
                *video_type = t;
            }
            if let Some(d) = &args.description {
                *video_description = d.clone();
            }
            if args.iframe.is_some() {
                *podeduc_iframe = args.iframe.clone();
            }
        }
        HotspotKind::Audio {
            audio_url,
            audio_data_url: data,
            autoplay,
            looped,
            audio_description,
        } => {
            if let Some(u) = &args.url {
                *audio_url = u.clone();
            }
            *data = audio_data_url;
            *autoplay = args.autoplay;
            *looped = args.looped;
            if let Some(d) = &args.description {
                *audio_description = d.clone();
            }
        }
        HotspotKind::Unrecognized(_) => {}
    }
    Ok(hotspot)
}

fn export(project: &Project, config: &ToolConfig, args: &ExportArgs) -> CliResult<()> {
    let mut options = config.export.to_options();
    if let Some(title) = &args.title {
        options.title = title.clone();
    }
    if let Some(quality) = args.quality {
        options.image_quality = quality;
    }
    if args.no_title {
        options.show_title = false;
    }
    if args.no_scene_bar {
        options.show_scene_bar = false;
    }

    let assets = StaticAssets::from_dir(&config.assets.dir)?;
    let bundle = generate::generate(project, &options, &RustBackend::new())?;
    let files = package::manifest(&bundle, &assets)?;

    let destination = match (&args.out, &args.dir) {
        (Some(out), _) => {
            fs::write(out, package::pack(&bundle, &assets)?)?;
            out.display().to_string()
        }
        (None, Some(dir)) => {
            package::write_site(&bundle, &assets, dir)?;
            dir.display().to_string()
        }
        (None, None) => return Err("either --out or --dir is required".into()),
    };
    output::print_export_output(&bundle, &files, &destination);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
