//! Command-line interface for xosc-validator

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use xosc_validator::builder::ElementFactory;
#[cfg(feature = "cli")]
use xosc_validator::error::ErrorCategory;
#[cfg(feature = "cli")]
use xosc_validator::schema::SchemaModel;
#[cfg(feature = "cli")]
use xosc_validator::validators::ValidationPipeline;
#[cfg(feature = "cli")]
use xosc_validator::xml;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xosc-validator")]
#[command(author, version, about = "OpenSCENARIO document validation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate documents against a schema
    Validate {
        /// Path to the schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Files or directories to validate (directories are scanned
        /// recursively for .xosc/.xml)
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,

        /// Stop after the first invalid file
        #[arg(long)]
        fail_fast: bool,

        /// Suppress per-file detail
        #[arg(short, long)]
        quiet: bool,

        /// Print per-category issue counts for invalid files
        #[arg(short, long)]
        verbose: bool,
    },

    /// Inspect a schema and display its structure
    Inspect {
        /// Path to the schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Show one element's definition
        #[arg(short, long)]
        element: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
const CATEGORIES: [ErrorCategory; 12] = [
    ErrorCategory::SchemaError,
    ErrorCategory::AttributeError,
    ErrorCategory::RequiredAttributeError,
    ErrorCategory::TypeError,
    ErrorCategory::ValueError,
    ErrorCategory::StructureError,
    ErrorCategory::OccurrenceError,
    ErrorCategory::SequenceOrderError,
    ErrorCategory::ReferenceError,
    ErrorCategory::DataTypeError,
    ErrorCategory::UniquenessError,
    ErrorCategory::ConfigurationError,
];

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            schema,
            paths,
            fail_fast,
            quiet,
            verbose,
        } => cmd_validate(schema, paths, fail_fast, quiet, verbose),
        Commands::Inspect {
            schema,
            element,
            json,
        } => cmd_inspect(schema, element, json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(
    schema_path: PathBuf,
    paths: Vec<PathBuf>,
    fail_fast: bool,
    quiet: bool,
    verbose: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let schema = SchemaModel::from_file(&schema_path)?;
    let pipeline = ValidationPipeline::standard();

    let mut files = Vec::new();
    for path in &paths {
        if path.is_dir() {
            scan_directory(path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        println!("No documents found");
        return Ok(0);
    }

    let mut valid = 0usize;
    let mut invalid = 0usize;

    for file in &files {
        match xml::read_file(file) {
            Ok(root) => {
                let outcome = pipeline.validate(&root, &schema);
                if outcome.is_valid {
                    valid += 1;
                    if !quiet {
                        println!("OK      {}", file.display());
                    }
                } else {
                    invalid += 1;
                    if !quiet {
                        println!(
                            "INVALID {} ({} issue(s))",
                            file.display(),
                            outcome.issues.len()
                        );
                        for issue in &outcome.issues {
                            println!("  [{}] {}", issue.path, issue);
                        }
                        if verbose {
                            for category in CATEGORIES {
                                let count = outcome.count_for(category);
                                if count > 0 {
                                    println!("    {}: {}", category, count);
                                }
                            }
                        }
                    }
                    if fail_fast {
                        break;
                    }
                }
            }
            Err(e) => {
                invalid += 1;
                eprintln!("Error reading {}: {}", file.display(), e);
                if fail_fast {
                    break;
                }
            }
        }
    }

    println!(
        "Checked {} file(s): {} valid, {} invalid",
        valid + invalid,
        valid,
        invalid
    );

    Ok(if invalid > 0 { 1 } else { 0 })
}

#[cfg(feature = "cli")]
fn scan_directory(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            scan_directory(&path, out)?;
        } else if is_document(&path) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn is_document(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("xosc") || ext.eq_ignore_ascii_case("xml")
    )
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    schema_path: PathBuf,
    element: Option<String>,
    json: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let schema = SchemaModel::from_file(&schema_path)?;

    if let Some(name) = element {
        let factory = ElementFactory::new(&schema);
        let Some(info) = factory.element_info(&name) else {
            return Err(format!("Element '{}' not found in schema", name).into());
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            println!("Element: {}", info.name);
            println!("  Content model: {}", info.content_model);
            if !info.description.is_empty() {
                println!("  Description: {}", info.description);
            }
            println!("  Attributes:");
            if info.attributes.is_empty() {
                println!("    (none)");
            }
            for attr in &info.attributes {
                let requirement = if attr.required { "required" } else { "optional" };
                println!("    {} : {} ({})", attr.name, attr.attr_type, requirement);
            }
            println!("  Declared children:");
            if info.children.is_empty() {
                println!("    (none)");
            }
            for child in &info.children {
                println!("    {} [{}]", child.reference, child.occurs);
            }
            if !info.allowed_children.is_empty() {
                println!(
                    "  Allowed children (expanded): {}",
                    info.allowed_children.join(", ")
                );
            }
        }
        return Ok(0);
    }

    if json {
        let summary = serde_json::json!({
            "elements": schema.element_count(),
            "groups": schema.group_count(),
            "simpleTypes": schema.simple_type_count(),
            "roots": schema.root_elements,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("xosc-validator v{}", xosc_validator::VERSION);
        println!();
        println!("Schema statistics:");
        println!("  Elements: {}", schema.element_count());
        println!("  Groups: {}", schema.group_count());
        println!("  Simple types: {}", schema.simple_type_count());
        println!("  Root elements: {}", schema.root_elements.join(", "));
    }

    Ok(0)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
