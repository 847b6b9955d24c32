use duplicator::raster::{RasterOptions, ResvgRasterizer};
use duplicator::source::filter_images;
use duplicator::{Editor, EditorOptions, ImageId, ImageRef, ImageSource, Notice, NoticeLevel};
use futures::executor::block_on;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The input could not be loaded as an SVG document.
    Rejected(duplicator::Error),
    Duplicator(duplicator::Error),
    InvalidSize { field: &'static str, value: String },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Rejected(err) => write!(f, "Rejected SVG input: {err}"),
            CliError::Duplicator(err) => write!(f, "{err}"),
            CliError::InvalidSize { field, value } => {
                write!(f, "Invalid export {field} `{value}`: expected a positive integer")
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<duplicator::Error> for CliError {
    fn from(value: duplicator::Error) -> Self {
        Self::Duplicator(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Images,
    Preview,
    Markup,
    Export,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    out: Option<String>,
    config: Option<String>,
    width: Option<String>,
    height: Option<String>,
    unlock: bool,
    background: Option<String>,
    replacements: Vec<(ImageId, String)>,
    batch: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SizeOut {
    width: f64,
    height: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagesOut<'a> {
    natural_size: SizeOut,
    images: &'a [ImageRef],
}

fn usage() -> &'static str {
    "duplicator-cli\n\
\n\
USAGE:\n\
  duplicator-cli [images] [--pretty] [<replacement flags>] [<path>|-]\n\
  duplicator-cli preview [--out <path>] [<replacement flags>] [<path>|-]\n\
  duplicator-cli markup [--out <path>] [<replacement flags>] [<path>|-]\n\
  duplicator-cli export [--width <w>] [--height <h>] [--unlock] [--background <css-color>] [--out <path>] [<replacement flags>] [<path>|-]\n\
\n\
REPLACEMENT FLAGS:\n\
  --replace <image-id>=<file>   point one image (e.g. image-0) at <file>; repeatable\n\
  --batch <file>                add <file> to a batch replacing images from image-0 on; repeatable\n\
\n\
OPTIONS:\n\
  --config <path>               editor options as JSON (camelCase keys)\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Replacements run in order: every --replace, then the batch (non-images dropped, capped at the batch limit).\n\
  - preview and markup print to stdout by default; use --out to write a file.\n\
  - export writes ./edited-svg.png unless --out or the config names another file.\n\
  - The aspect ratio stays locked unless --unlock is given; --width and --height together imply --unlock.\n\
  - Log verbosity is read from DUPLICATOR_LOG (default: warn).\n\
"
}

fn parse_replacement(spec: &str) -> Option<(ImageId, String)> {
    let (id, file) = spec.split_once('=')?;
    let id = id.parse::<ImageId>().ok()?;
    (!file.is_empty()).then(|| (id, file.to_string()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "images" => args.command = Command::Images,
            "preview" => args.command = Command::Preview,
            "markup" => args.command = Command::Markup,
            "export" => args.command = Command::Export,
            "--pretty" => args.pretty = true,
            "--unlock" => args.unlock = true,
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.width = Some(w.clone());
            }
            "--height" => {
                let Some(h) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.height = Some(h.clone());
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--replace" => {
                let Some(spec) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let replacement = parse_replacement(spec).ok_or(CliError::Usage(usage()))?;
                args.replacements.push(replacement);
            }
            "--batch" => {
                let Some(file) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.batch.push(file.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("DUPLICATOR_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // A second init (e.g. from a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<Vec<u8>, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read(path)?),
    }
}

fn input_name(input: Option<&str>) -> String {
    match input {
        Some(path) if path != "-" => Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string()),
        _ => "stdin.svg".to_string(),
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned())
}

fn load_options(config: Option<&str>) -> Result<EditorOptions, CliError> {
    match config {
        None => Ok(EditorOptions::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(EditorOptions::from_json_str(&text)?)
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

/// Prints queued diagnostics to stderr. Error notices always accompany an `Err` that `main`
/// prints, so they are skipped here.
fn report_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice {
            Notice::Diagnostic {
                level: NoticeLevel::Info,
                message,
            } => eprintln!("{message}"),
            Notice::Diagnostic {
                level: NoticeLevel::Warn,
                message,
            } => eprintln!("warning: {message}"),
            Notice::Diagnostic {
                level: NoticeLevel::Error,
                ..
            } => {}
            Notice::Icon { href } => tracing::trace!(len = href.len(), "icon notice"),
        }
    }
}

fn apply_replacements(editor: &mut Editor, args: &Args) -> Result<(), CliError> {
    for (id, path) in &args.replacements {
        let bytes = std::fs::read(path)?;
        let source = ImageSource::from_bytes(file_name(path), &bytes)?;
        if !editor.replace_image(*id, &source)? {
            eprintln!("warning: {id} was not replaced (no such editable image); {path} skipped");
        }
    }

    if !args.batch.is_empty() {
        let mut files = Vec::with_capacity(args.batch.len());
        for path in &args.batch {
            files.push((file_name(path), std::fs::read(path)?));
        }
        let sources = filter_images(files);
        let replaced = editor.replace_images(&sources)?;
        tracing::debug!(replaced, "applied batch");
    }
    Ok(())
}

fn apply_dimensions(editor: &mut Editor, args: &Args) -> Result<(), CliError> {
    let dims = editor.dimensions_mut();
    if args.unlock || (args.width.is_some() && args.height.is_some()) {
        dims.set_locked(false);
    }
    if let Some(w) = &args.width {
        if !dims.set_width_text(w) {
            return Err(CliError::InvalidSize {
                field: "width",
                value: w.clone(),
            });
        }
    }
    if let Some(h) = &args.height {
        if !dims.set_height_text(h) {
            return Err(CliError::InvalidSize {
                field: "height",
                value: h.clone(),
            });
        }
    }
    Ok(())
}

fn export(editor: &mut Editor, args: &Args) -> Result<(), CliError> {
    apply_dimensions(editor, args)?;

    let background = args
        .background
        .clone()
        .or_else(|| editor.options().background.clone());
    let resources_dir = match args.input.as_deref() {
        Some(path) if path != "-" => Path::new(path).parent().map(Path::to_path_buf),
        _ => None,
    };
    let rasterizer = ResvgRasterizer::new(RasterOptions {
        background,
        resources_dir,
    });

    let png = block_on(editor.export_png(&rasterizer))?;
    let out = args
        .out
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(editor.export_file_name()));
    std::fs::write(&out, png)?;

    let size = editor.export_size();
    tracing::info!(path = %out.display(), width = size.width, height = size.height, "wrote PNG");
    Ok(())
}

fn run_command(editor: &mut Editor, args: &Args) -> Result<(), CliError> {
    let bytes = read_input(args.input.as_deref())?;
    editor
        .upload_svg(&input_name(args.input.as_deref()), None, &bytes)
        .map_err(CliError::Rejected)?;
    apply_replacements(editor, args)?;

    match args.command {
        Command::Images => {
            let natural = editor.natural_size().unwrap_or_default();
            write_json(
                &ImagesOut {
                    natural_size: SizeOut {
                        width: natural.width,
                        height: natural.height,
                    },
                    images: editor.images(),
                },
                args.pretty,
            )
        }
        Command::Preview => {
            let preview = editor.preview_markup().unwrap_or_default();
            write_text(&preview, args.out.as_deref())
        }
        Command::Markup => {
            let markup = editor.markup().unwrap_or_default().to_string();
            write_text(&markup, args.out.as_deref())
        }
        Command::Export => export(editor, args),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let options = load_options(args.config.as_deref())?;
    let mut editor = Editor::new(options);
    let result = run_command(&mut editor, &args);
    report_notices(editor.take_notices());
    result
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(err @ (CliError::Usage(_) | CliError::InvalidSize { .. })) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(err @ CliError::Rejected(_)) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
