use anyhow::anyhow;
use clap::{Parser, Subcommand};
use colored::Colorize;
use mingit::areas::repository::{Repository, SetupOptions};
use mingit::commands::plumbing::cat_file::CatFileOperation;
use mingit::commands::plumbing::hash_object::HashObjectOptions;
use mingit::commands::plumbing::ls_files::LsFilesOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mingit",
    version,
    about = "Git plumbing: loose objects, the index, and the repository layout",
    long_about = "A Git-compatible plumbing implementation: a content-addressed \
    object database, the staging-area binary format, and the repository layout \
    that ties them together. Porcelain commands are out of scope.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "Creates the repository skeleton (HEAD, refs, objects) in the \
        given directory or the current one. Re-running on an existing repository \
        never overwrites anything."
    )]
    Init {
        #[arg(
            short = 'b',
            long = "initial-branch",
            help = "Name of the branch HEAD will reference",
            default_value = "main"
        )]
        initial_branch: String,
        #[arg(long, help = "Make the directory itself the git directory")]
        bare: bool,
        #[arg(index = 1, help = "The directory to initialize")]
        directory: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Hash content and optionally write it to the object database",
        long_about = "Frames the content as the chosen object type, prints its \
        object name, and with -w stores the compressed object."
    )]
    HashObject {
        #[arg(
            short = 't',
            long = "type",
            value_name = "TYPE",
            help = "Object type to hash as",
            default_value = "blob"
        )]
        object_type: String,
        #[arg(short = 'w', help = "Write the object into the database")]
        write: bool,
        #[arg(long, help = "Hash content read from standard input")]
        stdin: bool,
        #[arg(
            long,
            help = "Skip the canonical-format check for the chosen type",
            requires = "stdin"
        )]
        literally: bool,
        #[arg(index = 1, help = "Files to hash")]
        files: Vec<PathBuf>,
    },
    #[command(
        name = "cat-file",
        about = "Inspect or print an object",
        long_about = "Prints an object's content, type or size, or merely checks \
        its existence. Object names must be the full 40-character form."
    )]
    CatFile {
        #[arg(short = 'e', help = "Exit with zero status iff the object exists")]
        exists: bool,
        #[arg(short = 'p', help = "Pretty-print the object's content")]
        pretty: bool,
        #[arg(short = 't', help = "Print the object's type")]
        show_type: bool,
        #[arg(short = 's', help = "Print the object's size")]
        show_size: bool,
        #[arg(long, help = "Tolerate objects of unknown type with -t and -s")]
        allow_unknown_type: bool,
        #[arg(
            index = 1,
            value_name = "ARGS",
            help = "Either <type> <object>, or <object> when a flag selects the operation"
        )]
        args: Vec<String>,
    },
    #[command(
        name = "ls-files",
        about = "Show information about files in the index and the working tree"
    )]
    LsFiles {
        #[arg(short = 'c', long, help = "Show files staged in the index (default)")]
        cached: bool,
        #[arg(short = 'o', long, help = "Show untracked files")]
        others: bool,
        #[arg(short = 'd', long, help = "Show tracked files deleted from the working tree")]
        deleted: bool,
        #[arg(short = 'm', long, help = "Show tracked files with modifications")]
        modified: bool,
        #[arg(short = 'u', long, help = "Show unmerged (conflicted) entries")]
        unmerged: bool,
        #[arg(short = 'k', long, help = "Show files blocking tracked paths")]
        killed: bool,
        #[arg(short = 's', long, help = "Show staged mode, object name and stage")]
        stage: bool,
        #[arg(short = 'z', help = "Terminate entries with NUL")]
        zero: bool,
    },
    #[command(
        name = "inflate",
        about = "Print the decompressed on-disk form of an object",
        long_about = "Reads the object's file, undoes the zlib compression, and \
        prints the encoded frame (header and payload) verbatim."
    )]
    Inflate {
        #[arg(index = 1, help = "The object to inflate")]
        object: String,
    },
    #[command(name = "version", about = "Print version information")]
    Version,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // argument errors (unknown flags, missing values) go to stdout and
    // stop the command; help and version also land here and exit zero
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let code = error.exit_code();
            print!("{error}");
            std::process::exit(code);
        }
    };

    if let Err(error) = run(cli) {
        eprintln!("{} {error}", "fatal:".red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = || Box::new(std::io::stdout()) as Box<dyn std::io::Write>;

    match cli.command {
        Commands::Init {
            initial_branch,
            bare,
            directory,
        } => Repository::init(
            &SetupOptions {
                name: directory,
                initial_branch,
                bare,
            },
            stdout(),
        ),
        Commands::HashObject {
            object_type,
            write,
            stdin,
            literally,
            files,
        } => {
            if !stdin && files.is_empty() {
                return Err(anyhow!("nothing to hash: pass --stdin or at least one file"));
            }
            let repository = Repository::open(None, stdout())?;
            repository.hash_object(
                &files,
                &HashObjectOptions {
                    object_type,
                    write,
                    stdin,
                    literally,
                },
            )
        }
        Commands::CatFile {
            exists,
            pretty,
            show_type,
            show_size,
            allow_unknown_type,
            args,
        } => {
            let (operation, object) = parse_cat_file(
                exists,
                pretty,
                show_type,
                show_size,
                allow_unknown_type,
                &args,
            )?;
            let repository = Repository::open(None, stdout())?;
            repository.cat_file(&operation, &object)
        }
        Commands::LsFiles {
            cached,
            others,
            deleted,
            modified,
            unmerged,
            killed,
            stage,
            zero,
        } => {
            let repository = Repository::open(None, stdout())?;
            repository.ls_files(&LsFilesOptions {
                cached,
                others,
                deleted,
                modified,
                unmerged,
                killed,
                stage,
                zero,
            })
        }
        Commands::Inflate { object } => {
            let repository = Repository::open(None, stdout())?;
            repository.inflate(&object)
        }
        Commands::Version => {
            println!("mingit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Resolve the three forms of `cat-file` into an operation and object.
fn parse_cat_file(
    exists: bool,
    pretty: bool,
    show_type: bool,
    show_size: bool,
    allow_unknown_type: bool,
    args: &[String],
) -> anyhow::Result<(CatFileOperation, String)> {
    let flags = [exists, pretty, show_type, show_size]
        .iter()
        .filter(|&&flag| flag)
        .count();
    if flags > 1 {
        return Err(anyhow!("only one of -e, -p, -t, -s may be given"));
    }
    if allow_unknown_type && !(show_type || show_size) {
        return Err(anyhow!("--allow-unknown-type requires -t or -s"));
    }

    if flags == 1 {
        let [object] = args else {
            return Err(anyhow!("expected exactly one <object> argument"));
        };
        let operation = if exists {
            CatFileOperation::Exists
        } else if pretty {
            CatFileOperation::Pretty
        } else if show_type {
            CatFileOperation::Type {
                allow_unknown: allow_unknown_type,
            }
        } else {
            CatFileOperation::Size {
                allow_unknown: allow_unknown_type,
            }
        };
        return Ok((operation, object.clone()));
    }

    let [type_name, object] = args else {
        return Err(anyhow!("expected <type> <object> arguments"));
    };
    Ok((
        CatFileOperation::Typed(type_name.clone()),
        object.clone(),
    ))
}
