use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pdfmodel::{
    Algorithm, Document, Encrypt, EncryptOptions, KeyLength, LoadOptions, Page, Permission,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "pdfmodel",
    about = "Inspect and edit the object structure of PDF files",
    version,
    author
)]
struct Cli {
    /// Log engine and document activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Password for protected input files
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get information about a PDF file
    Info {
        /// Input PDF file
        input: PathBuf,

        /// Show catalog and trailer details
        #[arg(short, long)]
        detailed: bool,
    },

    /// List page geometry
    Pages {
        /// Input PDF file
        input: PathBuf,
    },

    /// Print the trailer dictionary
    Trailer {
        /// Input PDF file
        input: PathBuf,
    },

    /// Append PDFs to the first one
    Merge {
        /// Input PDF files, in order
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remove one page
    DeletePage {
        /// Input PDF file
        input: PathBuf,

        /// Page number to delete (1-based)
        #[arg(short, long)]
        page: usize,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rotate pages
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Rotation angle (multiple of 90)
        #[arg(short, long, default_value = "90", allow_negative_numbers = true)]
        angle: i64,

        /// Pages to rotate (e.g., "all", "1,3,5")
        #[arg(short = 'p', long, default_value = "all")]
        pages: String,
    },

    /// Write an encrypted copy
    Encrypt {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Owner password
        #[arg(long)]
        owner: String,

        /// User password (empty when omitted)
        #[arg(long)]
        user: Option<String>,

        /// rc4v1, rc4v2, aesv2 or aesv3
        #[arg(long, default_value = "aesv2")]
        algorithm: String,

        /// Key length in bits
        #[arg(long, default_value = "128")]
        key_length: u32,

        /// Granted permissions (e.g., print, copy, docassembly)
        #[arg(long, value_delimiter = ',')]
        allow: Vec<String>,
    },

    /// List interactive form fields
    Fields {
        /// Input PDF file
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let password = cli.password.as_deref();

    match cli.command {
        Commands::Info { input, detailed } => {
            let doc = open(&input, password).await?;
            println!("PDF Information for: {}", input.display());
            println!("==========================================");
            println!("PDF Version: {}", doc.get_version()?);
            println!("Pages: {}", doc.get_page_count()?);
            println!("Linearized: {}", yes_no(doc.is_linearized()?));
            match doc.encrypt()? {
                Some(encrypt) => {
                    let algorithm = encrypt
                        .algorithm()
                        .map_or_else(|| "unknown".to_string(), |a| a.to_string());
                    println!("Encrypted: {} ({} bits)", algorithm, encrypt.key_length());
                    let granted: Vec<String> = encrypt
                        .permissions()
                        .granted()
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    println!("Permissions: {}", granted.join(", "));
                }
                None => println!("Encrypted: No"),
            }

            if detailed {
                println!("\nDetailed Information:");
                println!("--------------------");
                let catalog = doc.get_catalog()?;
                for key in ["Outlines", "Names", "AcroForm", "ViewerPreferences", "Metadata"] {
                    if catalog.has_key(key)? {
                        println!("Has {key}: Yes");
                    }
                }
                println!("Objects: {}", doc.get_objects()?.len());
                if let Some(form) = doc.get_form()? {
                    println!("Form fields: {}", form.fields()?.len());
                }
            }
        }

        Commands::Pages { input } => {
            let doc = open(&input, password).await?;
            for page in doc.pages()? {
                print_page(&page)?;
            }
        }

        Commands::Trailer { input } => {
            let doc = open(&input, password).await?;
            let trailer = doc.get_trailer()?.as_dictionary()?;
            for (key, value) in trailer.to_map()? {
                let rendered = value.to_object()?.to_pdf_bytes();
                println!("/{key} {}", String::from_utf8_lossy(&rendered));
            }
        }

        Commands::Merge { files, output } => {
            let (first, rest) = files
                .split_first()
                .context("at least one input file is required")?;
            let mut doc = open(first, password).await?;
            for file in rest {
                let added = doc
                    .merge_document(file, password)
                    .await
                    .with_context(|| format!("failed to merge {}", file.display()))?;
                debug!("Appended {} pages from {}", added, file.display());
            }
            doc.write_to(&output).await?;
            println!(
                "Merged {} files ({} pages) into {}",
                files.len(),
                doc.get_page_count()?,
                output.display()
            );
        }

        Commands::DeletePage {
            input,
            page,
            output,
        } => {
            if page == 0 {
                bail!("page numbers start at 1");
            }
            let mut doc = open(&input, password).await?;
            doc.delete_page(page - 1)?;
            doc.write_to(&output).await?;
            println!(
                "Deleted page {page}; {} pages remain in {}",
                doc.get_page_count()?,
                output.display()
            );
        }

        Commands::Rotate {
            input,
            output,
            angle,
            pages,
        } => {
            let doc = open(&input, password).await?;
            let selected = parse_pages(&pages, doc.get_page_count()?)?;
            for index in &selected {
                let page = doc.get_page(*index)?;
                page.set_rotation(page.rotation()? + angle)?;
            }
            doc.write_to(&output).await?;
            println!("Rotated {} pages by {angle} degrees", selected.len());
        }

        Commands::Encrypt {
            input,
            output,
            owner,
            user,
            algorithm,
            key_length,
            allow,
        } => {
            let mut options = EncryptOptions::new(owner)
                .algorithm(algorithm.parse::<Algorithm>()?)
                .key_length(KeyLength::try_from(key_length)?);
            if let Some(user) = user {
                options = options.user_password(user);
            }
            for name in &allow {
                options = options.allow(name.parse::<Permission>()?);
            }
            let mut doc = open(&input, password).await?;
            doc.set_encrypt(Encrypt::new(options)?)?;
            doc.write_to(&output).await?;
            println!("Encrypted copy written to {}", output.display());
        }

        Commands::Fields { input } => {
            let doc = open(&input, password).await?;
            let mut total = 0;
            for page in doc.pages()? {
                for info in page.get_fields_info()? {
                    total += 1;
                    println!(
                        "page {} {} [{}] = {}{}{}",
                        page.number(),
                        info.name,
                        info.kind,
                        info.value.as_deref().unwrap_or(""),
                        if info.required { " (required)" } else { "" },
                        if info.read_only { " (read-only)" } else { "" },
                    );
                }
            }
            if total == 0 {
                println!("No form fields");
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pdfmodel=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open(path: &Path, password: Option<&str>) -> Result<Document> {
    let mut options = LoadOptions::new();
    if let Some(password) = password {
        options = options.password(password);
    }
    let mut doc = Document::default();
    doc.load(path, options)
        .with_context(|| format!("cannot open {}", path.display()))?
        .await
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(doc)
}

fn print_page(page: &Page<'_>) -> Result<()> {
    let media = page.media_box()?;
    println!(
        "Page {}: {:.0}x{:.0} pts, rotation {}, {} annotations, {} fields, box [{} {} {} {}]",
        page.number(),
        page.width()?,
        page.height()?,
        page.rotation()?,
        page.get_num_annots()?,
        page.get_num_fields()?,
        media.lower_left.x,
        media.lower_left.y,
        media.upper_right.x,
        media.upper_right.y,
    );
    Ok(())
}

/// Zero-based indices for "all" or a comma list of 1-based page numbers.
fn parse_pages(selection: &str, count: usize) -> Result<Vec<usize>> {
    if selection.eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }
    selection
        .split(',')
        .map(|part| {
            let number: usize = part
                .trim()
                .parse()
                .with_context(|| format!("invalid page number '{part}'"))?;
            if number == 0 || number > count {
                bail!("page {number} is out of range (1-{count})");
            }
            Ok(number - 1)
        })
        .collect()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}
