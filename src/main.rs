use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use vmatrix::core::{
    config::Settings,
    engine::MatrixPair,
    history::HistoryFilter,
    session::Session,
};
use vmatrix::util::{
    linalg::{Matrix, MatrixSize, Vec3},
    setup_log,
};

#[derive(Parser)]
#[command(name = "vmatrix", version, about = "Matrix and vector calculator with a 3D view")]
struct Cli {
    /// The TOML settings file to load
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the history, overriding the settings file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// add, subtract, dot, cross, magnitudeA, magnitudeB, normalizeA, normalizeB or angle
    Vector {
        op: String,
        #[arg(long, default_value = "0,0,0", allow_hyphen_values = true)]
        a: Vec3,
        #[arg(long, default_value = "0,0,0", allow_hyphen_values = true)]
        b: Vec3,
        /// Also draw the vectors to this SVG file
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// add, subtract, multiply, determinantA or determinantB
    Matrix {
        op: String,
        /// 2 or 3; taken from the operands if omitted
        #[arg(long)]
        size: Option<MatrixSize>,
        /// Rows separated by `;`, values by `,`, e.g. `1,2;3,4`
        #[arg(long, allow_hyphen_values = true)]
        a: Option<Matrix>,
        #[arg(long, allow_hyphen_values = true)]
        b: Option<Matrix>,
    },
    #[command(subcommand)]
    History(HistoryCommand),
    /// Draws vectors A and B
    Render {
        #[arg(long, default_value = "0,0,0", allow_hyphen_values = true)]
        a: Vec3,
        #[arg(long, default_value = "0,0,0", allow_hyphen_values = true)]
        b: Vec3,
        /// Rotation about X, in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotate_x: f64,
        /// Rotation about Y, in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotate_y: f64,
        #[arg(long)]
        scale: Option<f64>,
        #[arg(long)]
        no_grid: bool,
        /// Write an SVG picture instead of the text summary
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    List {
        /// vector, matrix or all
        #[arg(long = "type", default_value = "all")]
        kind: String,
        #[arg(long, default_value = "all")]
        operation: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    Delete {
        id: u64,
    },
    Clear {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    Export {
        file: PathBuf,
    },
    Import {
        file: PathBuf,
    },
    Stats,
    /// Prints the result of an entry
    Copy {
        id: u64,
    },
    /// Draws the vectors of an entry again
    Reuse {
        id: u64,
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

fn write_svg(session: &Session, path: &Path) -> Result<()> {
    std::fs::write(path, session.frame().to_svg())
        .with_context(|| format!("could not write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}

fn matrix_pair(size: Option<MatrixSize>, a: Option<Matrix>, b: Option<Matrix>) -> Result<MatrixPair> {
    let size = size
        .or(a.map(|m| m.size()))
        .or(b.map(|m| m.size()))
        .unwrap_or_default();
    let a = a.unwrap_or_else(|| Matrix::zeros(size));
    let b = b.unwrap_or_else(|| Matrix::zeros(size));
    if a.size() != size {
        bail!("matrix A is {}, expected {size}", a.size());
    }
    MatrixPair::from_matrices(a, b)
}

fn run_history(session: &Session, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List {
            kind,
            operation,
            search,
        } => {
            let filter = HistoryFilter::from_controls(&kind, &operation, &search)?;
            let history = session.history().get();
            let entries = history.filter(&filter);
            if entries.is_empty() {
                println!("No se encontraron operaciones");
            }
            for entry in entries {
                println!("{entry}\n");
            }
        }
        HistoryCommand::Delete { id } => {
            if !session.history().get().delete(id) {
                println!("no entry with id {id}");
            }
        }
        HistoryCommand::Clear { yes } => {
            let mut confirm = |message: &str| yes || ask(message);
            if session.clear_history(&mut confirm) {
                println!("Historial eliminado");
            }
        }
        HistoryCommand::Export { file } => {
            let csv = session.history().get().export_csv()?;
            std::fs::write(&file, csv)
                .with_context(|| format!("could not write {}", file.display()))?;
            println!("Historial exportado a {}", file.display());
        }
        HistoryCommand::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            let count = session.history().get().import_csv(&contents)?;
            println!("{count} operaciones importadas");
        }
        HistoryCommand::Stats => println!("{}", session.history().get().stats()),
        HistoryCommand::Copy { id } => match session.history().get().copy_text(id) {
            Some(text) => println!("{text}"),
            None => bail!("no entry with id {id}"),
        },
        HistoryCommand::Reuse { id, svg } => {
            let Some(update) = session.reuse(id) else {
                bail!("entry {id} does not exist or is not a vector operation");
            };
            println!("A = {}\nB = {}", update.a.to_plain_string(), update.b.to_plain_string());
            match svg {
                Some(path) => write_svg(session, &path)?,
                None => print!("{}", session.frame()),
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let mut settings = Settings::load_or_default(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        settings.data_dir = dir;
    }
    setup_log(settings.log_file.as_deref())?;
    info!("starting vmatrix {}", env!("CARGO_PKG_VERSION"));

    let mut session = Session::open(settings);
    match args.command {
        Command::Vector { op, a, b, svg } => {
            let outcome = session.vector_operation(&op, a, b)?;
            println!("{outcome}");
            if let Some(path) = svg {
                write_svg(&session, &path)?;
            }
        }
        Command::Matrix { op, size, a, b } => {
            *session.matrices_mut() = matrix_pair(size, a, b)?;
            let outcome = session.matrix_operation(&op)?;
            println!("{outcome}");
        }
        Command::History(command) => run_history(&session, command)?,
        Command::Render {
            a,
            b,
            rotate_x,
            rotate_y,
            scale,
            no_grid,
            svg,
        } => {
            session.camera(|camera| {
                camera.set_rotation_x_degrees(rotate_x);
                camera.set_rotation_y_degrees(rotate_y);
                if let Some(scale) = scale {
                    camera.set_scale_slider(scale);
                }
                if no_grid {
                    camera.toggle_grid();
                }
                true
            });
            session.show_vectors(a, b);
            match svg {
                Some(path) => write_svg(&session, &path)?,
                None => print!("{}", session.frame()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_operands() {
        let cli = Cli::parse_from(["vmatrix", "vector", "cross", "--a", "-1,2,3", "--b", "4,-5,6"]);
        let Command::Vector { op, a, b, .. } = cli.command else {
            panic!("expected vector command");
        };
        assert_eq!(op, "cross");
        assert_eq!(a, Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(b, Vec3::new(4.0, -5.0, 6.0));
    }

    #[test]
    fn matrix_pair_sizes() {
        let pair = matrix_pair(None, Some("1,2;3,4".parse().unwrap()), None).unwrap();
        assert_eq!(pair.size(), MatrixSize::Two);
        assert_eq!(*pair.b(), Matrix::zeros(MatrixSize::Two));

        let pair = matrix_pair(Some(MatrixSize::Three), None, None).unwrap();
        assert_eq!(pair.a().size(), MatrixSize::Three);

        assert!(matrix_pair(Some(MatrixSize::Three), Some("1,2;3,4".parse().unwrap()), None).is_err());
        assert!(matrix_pair(None, Some("1,2;3,4".parse().unwrap()), Some(Matrix::identity(MatrixSize::Three))).is_err());
    }
}
